//! CLI binary for oak-pdf-lambdas.
//!
//! Runs the same pipelines as the Lambda functions from a workstation,
//! using the default AWS credential chain, and prints the JSON result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use oak_pdf_lambdas::config::{
    DEFAULT_DESTINATION_PREFIX, DEFAULT_MODEL_ID, DEFAULT_REGION, ENV_DESTINATION_BUCKET,
    ENV_DESTINATION_PREFIX, ENV_IMPORT_BUCKET, ENV_MODEL_ID, ENV_OAK_API_KEY, ENV_OAK_API_URL,
    ENV_REGION, ENV_SOURCE_BUCKET,
};
use oak_pdf_lambdas::{
    describe_quiz, extract_images, import_lessons, BedrockInferenceClient,
    ExtractImagesConfig, ExtractionProgressCallback, ImportConfig, OakApiClient, PdfiumParser,
    ProgressCallback, QuizConfig, QuizRequest, S3ObjectStore,
};
use serde::Serialize;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over the PDFs in the bucket plus one
/// log line per document.
struct CliProgressCallback {
    bar: ProgressBar,
    document_start: Mutex<Option<Instant>>,
    captions: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Listing");
        bar.set_message("Scanning source bucket…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            document_start: Mutex::new(None),
            captions: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.document_start
            .lock()
            .ok()
            .and_then(|mut start| start.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_documents: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} PDFs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_documents as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_documents} PDFs"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, key: &str) {
        if let Ok(mut start) = self.document_start.lock() {
            *start = Some(Instant::now());
        }
        self.bar.set_message(key.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, key: &str, records: usize) {
        self.captions.fetch_add(records, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            index,
            total,
            key,
            dim(&format!("{records} captions")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, key: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            key,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();
        let captions = self.captions.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {} PDFs processed, {} captions",
                green("✔"),
                bold(&success_count.to_string()),
                bold(&captions.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs processed  ({} failed), {} captions",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
                captions,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Describe the third question of an exit quiz
  oak-pdf describe-quiz s3://quiz-pdfs/perimeter/exitQuiz.pdf --bucket-owner 123456789012 -n 3

  # Extract and caption every image in a bucket
  oak-pdf extract-images --source-bucket pdf-storage --destination-bucket extracted-images

  # Copy lesson assets from the lesson API into a bucket
  OAK_API_KEY=... oak-pdf import-lessons --api-url https://open-api.example.org/lessons --bucket pdf-storage

ENVIRONMENT VARIABLES:
  SOURCE_S3_BUCKET        Bucket scanned by extract-images
  DESTINATION_S3_BUCKET   Bucket receiving extracted images
  DESTINATION_S3_PREFIX   Key prefix for extracted images (default extracted_images/)
  BEDROCK_MODEL_ID        Model used by describe-quiz (default us.amazon.nova-lite-v1:0)
  BEDROCK_REGION          Region used by describe-quiz (default us-east-1)
  OAK_API_URL             Lesson catalogue endpoint
  OAK_API_KEY             Bearer token for the lesson API
  S3_BUCKET_NAME          Bucket receiving imported lesson PDFs
  PDFIUM_LIB_PATH         Directory or file holding libpdfium
  RUST_LOG                Log filter, overrides --verbose/--quiet
"#;

#[derive(Parser, Debug)]
#[command(
    name = "oak-pdf",
    version,
    about = "Run the Oak PDF Lambda pipelines locally",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug-level logs on stderr.
    #[arg(short, long, global = true, env = "OAK_PDF_VERBOSE")]
    verbose: bool,

    /// Errors only; no progress bar.
    #[arg(short, long, global = true, env = "OAK_PDF_QUIET")]
    quiet: bool,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "OAK_PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Print compact instead of pretty JSON.
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe one question of a quiz PDF with a Bedrock model.
    DescribeQuiz(DescribeQuizArgs),

    /// Extract, upload and caption every image of every PDF in a bucket.
    ExtractImages(ExtractImagesArgs),

    /// Copy lesson asset PDFs from the lesson API into a bucket.
    ImportLessons(ImportLessonsArgs),
}

#[derive(Args, Debug)]
struct DescribeQuizArgs {
    /// `s3://bucket/key` of the quiz PDF.
    s3_uri: String,

    /// Account id owning the bucket.
    #[arg(long)]
    bucket_owner: String,

    /// 1-based question index.
    #[arg(short = 'n', long, default_value_t = 1)]
    question_number: i64,

    #[arg(long, env = ENV_MODEL_ID, default_value = DEFAULT_MODEL_ID)]
    model: String,

    #[arg(long, env = ENV_REGION, default_value = DEFAULT_REGION)]
    region: String,

    #[arg(long, default_value_t = 3000)]
    max_tokens: u32,

    #[arg(long, default_value_t = 0.3)]
    temperature: f32,
}

#[derive(Args, Debug)]
struct ExtractImagesArgs {
    #[arg(long, env = ENV_SOURCE_BUCKET)]
    source_bucket: String,

    #[arg(long, env = ENV_DESTINATION_BUCKET)]
    destination_bucket: String,

    #[arg(long, env = ENV_DESTINATION_PREFIX, default_value = DEFAULT_DESTINATION_PREFIX)]
    prefix: String,

    /// Print per-document outcomes and stats, not just the records.
    #[arg(long)]
    full: bool,
}

#[derive(Args, Debug)]
struct ImportLessonsArgs {
    #[arg(long, env = ENV_OAK_API_URL)]
    api_url: String,

    #[arg(long, env = ENV_OAK_API_KEY, hide_env_values = true)]
    api_key: String,

    #[arg(long, env = ENV_IMPORT_BUCKET)]
    bucket: String,

    #[arg(long, default_value_t = 4)]
    lesson_concurrency: usize,

    #[arg(long, default_value_t = 5)]
    asset_concurrency: usize,

    #[arg(long, default_value_t = 60)]
    http_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is up.
    let show_progress = !cli.quiet
        && !cli.no_progress
        && matches!(cli.command, Command::ExtractImages(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::DescribeQuiz(ref args) => {
            let config = QuizConfig::builder()
                .model_id(&args.model)
                .region(&args.region)
                .max_tokens(args.max_tokens)
                .temperature(args.temperature)
                .build()
                .context("Invalid quiz configuration")?;
            let client = BedrockInferenceClient::shared(&config.region).await;
            let request = QuizRequest::new(&args.s3_uri, &args.bucket_owner, args.question_number);

            let quiz = describe_quiz(&request, &client, &config)
                .await
                .context("Question extraction failed")?;
            print_json(&quiz, cli.compact)?;
        }

        Command::ExtractImages(ref args) => {
            let mut builder = ExtractImagesConfig::builder()
                .source_bucket(&args.source_bucket)
                .destination_bucket(&args.destination_bucket)
                .destination_prefix(&args.prefix);
            if show_progress {
                let cb: ProgressCallback = CliProgressCallback::new();
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid extraction configuration")?;

            let parser = Arc::new(PdfiumParser::bind().context("Failed to load the PDF engine")?);
            let store = S3ObjectStore::shared().await;

            let output = extract_images(&store, parser, &config)
                .await
                .context("Image extraction failed")?;

            if args.full {
                print_json(&output, cli.compact)?;
            } else {
                print_json(&output.records, cli.compact)?;
            }

            if !cli.quiet && !show_progress {
                eprintln!(
                    "{}  {}/{} PDFs  {} images  {} captions  {}ms",
                    if output.stats.failed_documents == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    output.stats.processed_documents,
                    output.stats.total_documents,
                    output.stats.images_uploaded,
                    output.stats.captions_emitted,
                    output.stats.total_duration_ms,
                );
            }
        }

        Command::ImportLessons(ref args) => {
            let config = ImportConfig::builder()
                .api_url(&args.api_url)
                .api_key(&args.api_key)
                .bucket(&args.bucket)
                .lesson_concurrency(args.lesson_concurrency)
                .asset_concurrency(args.asset_concurrency)
                .http_timeout_secs(args.http_timeout)
                .build()
                .context("Invalid import configuration")?;
            let source = OakApiClient::new(&config).context("Failed to build the HTTP client")?;
            let store = S3ObjectStore::shared().await;

            let output = import_lessons(&source, &store, &config)
                .await
                .context("Lesson import failed")?;
            print_json(&output, cli.compact)?;

            if !cli.quiet {
                let failed: usize = output
                    .results
                    .iter()
                    .flat_map(|l| l.results().iter())
                    .filter(|r| !r.is_success())
                    .count();
                eprintln!(
                    "{}  {} lessons  {}",
                    if failed == 0 { green("✔") } else { cyan("⚠") },
                    output.results.len(),
                    if failed == 0 {
                        dim("all assets uploaded")
                    } else {
                        red(&format!("{failed} assets failed"))
                    },
                );
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}
