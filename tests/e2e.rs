//! End-to-end tests for the image/caption extractor against a real pdfium
//! library.
//!
//! The fixture PDF is assembled in memory: one page holding a JPEG
//! (`DCTDecode`) image with "7 cm" printed just below it and a heading far
//! away. The tests need libpdfium and are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/lib cargo test --test e2e -- --nocapture

mod common;

use common::CountingStore;
use image::{DynamicImage, Rgb, RgbImage};
use oak_pdf_lambdas::{extract_images, DocumentParser, ExtractImagesConfig, PdfiumParser};
use std::io::Cursor;
use std::sync::Arc;

const SOURCE: &str = "pdf-storage";
const DESTINATION: &str = "extracted-images";
const PAGE_HEIGHT: f32 = 792.0;

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

// ── Fixture ──────────────────────────────────────────────────────────────────

fn jpeg_square() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 40, 40])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .expect("jpeg encode");
    buf
}

fn stream_object(dict: &str, data: &[u8]) -> Vec<u8> {
    let mut obj = format!("<< {dict} /Length {} >>\nstream\n", data.len()).into_bytes();
    obj.extend_from_slice(data);
    obj.extend_from_slice(b"\nendstream");
    obj
}

/// A one-page letter-size PDF. The image is drawn at x 100..200 and
/// y 592..692 in PDF space, which is 100..200 from the top.
fn fixture_pdf(jpeg: &[u8]) -> Vec<u8> {
    let content = b"q 100 0 0 100 100 592 cm /Im1 Do Q\n\
BT /F1 12 Tf 150 575 Td (7 cm) Tj ET\n\
BT /F1 12 Tf 400 100 Td (Question 1) Tj ET\n";

    let objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
/Resources << /Font << /F1 4 0 R >> /XObject << /Im1 5 0 R >> >> /Contents 6 0 R >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
        stream_object(
            "/Type /XObject /Subtype /Image /Width 8 /Height 8 /ColorSpace /DeviceRGB \
/BitsPerComponent 8 /Filter /DCTDecode",
            jpeg,
        ),
        stream_object("", content),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

// ── Parser ───────────────────────────────────────────────────────────────────

#[test]
fn test_pdfium_reads_image_and_words_top_down() {
    e2e_skip_unless_ready!();

    let jpeg = jpeg_square();
    let parser = PdfiumParser::bind().expect("pdfium should bind");
    let parsed = parser.parse("quiz.pdf", fixture_pdf(&jpeg));

    assert!(parsed.failure.is_none(), "parse failed: {:?}", parsed.failure);
    assert_eq!(parsed.pages.len(), 1);
    let page = &parsed.pages[0];

    assert_eq!(page.images.len(), 1);
    let image = &page.images[0];
    assert_eq!(image.filetype, "jpg");
    assert_eq!(image.content, jpeg, "DCT stream should be uploaded as stored");
    assert!((image.bbox.left - 100.0).abs() < 0.5);
    assert!((image.bbox.top - 100.0).abs() < 0.5);
    assert!((image.bbox.right - 200.0).abs() < 0.5);
    assert!((image.bbox.bottom - 200.0).abs() < 0.5);

    let texts: Vec<&str> = page.words.iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["7", "cm", "Question", "1"]);

    // Baseline 575 in PDF space is 217 from the top; glyphs sit just above it.
    let seven = &page.words[0];
    assert!(seven.bbox.top > 200.0 && seven.bbox.bottom <= PAGE_HEIGHT - 570.0);
    assert!(seven.bbox.left >= 149.0 && seven.bbox.right < page.words[1].bbox.left);

    println!("words: {:?}", page.words);
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_images_from_real_pdf() {
    e2e_skip_unless_ready!();

    let jpeg = jpeg_square();
    let store = CountingStore::new();
    store
        .inner
        .insert(SOURCE, "year-3/quiz.pdf", fixture_pdf(&jpeg));
    let config = ExtractImagesConfig::builder()
        .source_bucket(SOURCE)
        .destination_bucket(DESTINATION)
        .build()
        .unwrap();
    let parser = Arc::new(PdfiumParser::bind().expect("pdfium should bind"));

    let output = extract_images(&store, parser, &config).await.unwrap();

    assert_eq!(output.stats.failed_documents, 0);
    assert_eq!(output.records.len(), 1);
    assert_eq!(
        output.records[0].image_ref,
        "s3://extracted-images/extracted_images/quiz_page_1_image_1.jpg"
    );
    assert_eq!(output.records[0].caption, "7 cm");

    let stored = store
        .inner
        .object(DESTINATION, "extracted_images/quiz_page_1_image_1.jpg")
        .expect("image uploaded");
    assert_eq!(stored.body, jpeg);
    assert_eq!(stored.content_type.as_deref(), Some("image/jpeg"));
}
