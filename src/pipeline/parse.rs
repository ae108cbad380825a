//! PDF parsing: pull embedded images and positioned words out of each page
//! via pdfium.
//!
//! ## Binding
//!
//! A `Pdfium` instance is not `Send`, so none is kept between documents.
//! The first [`PdfiumParser::bind`] probes the candidate library locations
//! once and remembers which one loaded; each [`DocumentParser::parse`] call
//! then binds that library afresh on the blocking thread it runs on.
//!
//! Parsing is CPU-bound and blocking; callers run [`DocumentParser::parse`]
//! inside `tokio::task::spawn_blocking`.

use crate::error::{DocumentError, PipelineError};
use crate::pipeline::encode::{encode_png, is_jpeg_stream, ImageKind};
use crate::pipeline::layout::{
    group_words, BoundingBox, Glyph, PageImage, ParsedDocument, ParsedPage,
};
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Environment variable pointing at a directory or file holding libpdfium.
pub const ENV_PDFIUM_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// Where Lambda layers are mounted.
const LAMBDA_LAYER_LIB_DIR: &str = "/opt/lib/";

static PDFIUM_LIBRARY: OnceCell<PdfiumLibrary> = OnceCell::new();

/// Turns PDF bytes into per-page images and words.
pub trait DocumentParser: Send + Sync {
    /// Parse `pdf` page by page. `key` only labels errors.
    ///
    /// A page that fails stops the walk; the pages before it are returned
    /// alongside the error.
    fn parse(&self, key: &str, pdf: Vec<u8>) -> ParsedDocument;
}

/// Which pdfium library loaded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PdfiumLibrary {
    File(PathBuf),
    System,
}

impl PdfiumLibrary {
    fn bind(&self) -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
        match self {
            PdfiumLibrary::File(path) => Pdfium::bind_to_library(path),
            PdfiumLibrary::System => Pdfium::bind_to_system_library(),
        }
    }
}

/// [`DocumentParser`] backed by pdfium.
#[derive(Debug, Clone, Copy)]
pub struct PdfiumParser {
    library: &'static PdfiumLibrary,
}

impl PdfiumParser {
    /// Locate pdfium on first call; later calls reuse the location.
    pub fn bind() -> Result<Self, PipelineError> {
        let library = PDFIUM_LIBRARY.get_or_try_init(resolve_library)?;
        Ok(Self { library })
    }
}

/// Candidate library locations, most specific first.
fn library_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var(ENV_PDFIUM_LIB_PATH) {
        if !path.is_empty() {
            let path = PathBuf::from(path);
            if path.is_dir() {
                candidates.push(Pdfium::pdfium_platform_library_name_at_path(&path));
            } else {
                candidates.push(path);
            }
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path(
        LAMBDA_LAYER_LIB_DIR,
    ));
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));
    candidates
}

fn resolve_library() -> Result<PdfiumLibrary, PipelineError> {
    let mut failures = Vec::new();
    for candidate in library_candidates() {
        match Pdfium::bind_to_library(&candidate) {
            Ok(_) => {
                info!("Found pdfium at {}", candidate.display());
                return Ok(PdfiumLibrary::File(candidate));
            }
            Err(e) => failures.push(format!("{}: {:?}", candidate.display(), e)),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(_) => {
            info!("Using the system pdfium library");
            Ok(PdfiumLibrary::System)
        }
        Err(e) => {
            failures.push(format!("system library: {:?}", e));
            Err(PipelineError::PdfiumBindingFailed(failures.join("; ")))
        }
    }
}

impl DocumentParser for PdfiumParser {
    fn parse(&self, key: &str, pdf: Vec<u8>) -> ParsedDocument {
        let parse_err = |detail: String| DocumentError::ParseFailed {
            key: key.to_string(),
            detail,
        };

        let pdfium = match self.library.bind() {
            Ok(bindings) => Pdfium::new(bindings),
            Err(e) => return ParsedDocument::failed(parse_err(format!("pdfium binding: {:?}", e))),
        };
        let document = match pdfium.load_pdf_from_byte_vec(pdf, None) {
            Ok(document) => document,
            Err(e) => return ParsedDocument::failed(parse_err(format!("{:?}", e))),
        };

        let pages = document.pages();
        debug!("{}: {} pages", key, pages.len());

        let mut parsed = ParsedDocument::default();
        for (index, page) in pages.iter().enumerate() {
            let page_num = index + 1;
            match parse_page(pdfium.bindings(), &page, page_num) {
                Ok(page) => {
                    debug!(
                        "{} page {}: {} images, {} words",
                        key,
                        page_num,
                        page.images.len(),
                        page.words.len()
                    );
                    parsed.pages.push(page);
                }
                Err(detail) => {
                    parsed.failure = Some(parse_err(format!("page {page_num}: {detail}")));
                    break;
                }
            }
        }
        parsed
    }
}

fn parse_page(
    bindings: &dyn PdfiumLibraryBindings,
    page: &PdfPage,
    page_num: usize,
) -> Result<ParsedPage, String> {
    let page_height = page.height().value;

    let mut images = Vec::new();
    for object in page.objects().iter() {
        let Some(image) = object.as_image_object() else {
            continue;
        };

        let bounds = object
            .bounds()
            .map_err(|e| format!("image bounds: {:?}", e))?;
        let bbox = BoundingBox::from_pdf_space(
            bounds.left().value,
            bounds.top().value,
            bounds.right().value,
            bounds.bottom().value,
            page_height,
        );

        let filter_names: Vec<String> = image
            .filters()
            .iter()
            .map(|f| f.name().to_string())
            .collect();

        let stored_jpeg = match ImageKind::from_filters(filter_names.iter().map(String::as_str)) {
            ImageKind::Jpeg => raw_image_stream(bindings, &object).filter(|raw| is_jpeg_stream(raw)),
            ImageKind::Png => None,
        };

        let (kind, content) = match stored_jpeg {
            Some(raw) => (ImageKind::Jpeg, raw),
            None => {
                if filter_names.iter().any(|f| f == "DCTDecode") {
                    warn!("Page {}: DCT image stream unreadable, re-encoding as png", page_num);
                }
                let bitmap = image
                    .get_raw_image()
                    .map_err(|e| format!("image decode: {:?}", e))?;
                let png = encode_png(&bitmap).map_err(|e| format!("image encode: {e}"))?;
                (ImageKind::Png, png)
            }
        };

        images.push(PageImage {
            filetype: kind.extension().to_string(),
            content,
            bbox,
        });
    }

    let text = page
        .text()
        .map_err(|e| format!("text layer: {:?}", e))?;
    let glyphs: Vec<Glyph> = text
        .chars()
        .iter()
        .filter_map(|ch| {
            let c = ch.unicode_char()?;
            let rect = ch.loose_bounds().ok()?;
            Some(Glyph {
                ch: c,
                bbox: BoundingBox::from_pdf_space(
                    rect.left().value,
                    rect.top().value,
                    rect.right().value,
                    rect.bottom().value,
                    page_height,
                ),
            })
        })
        .collect();

    Ok(ParsedPage {
        images,
        words: group_words(&glyphs),
    })
}

/// The image object's stream exactly as stored in the file, filters not
/// applied.
fn raw_image_stream(bindings: &dyn PdfiumLibraryBindings, object: &PdfPageObject) -> Option<Vec<u8>> {
    let handle = bindings.get_handle_from_object(object);

    // Size query first, then fill.
    #[allow(unused_unsafe)]
    let len = unsafe { bindings.FPDFImageObj_GetImageDataRaw(handle, std::ptr::null_mut(), 0) };
    if len == 0 {
        return None;
    }

    let mut buffer = vec![0u8; len as usize];
    #[allow(unused_unsafe)]
    let written = unsafe {
        bindings.FPDFImageObj_GetImageDataRaw(handle, buffer.as_mut_ptr() as *mut std::ffi::c_void, len)
    };
    (written == len).then_some(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lambda_layer_and_working_directory_are_always_candidates() {
        let candidates = library_candidates();
        assert!(candidates.len() >= 2);
        assert!(candidates
            .iter()
            .any(|c| c.starts_with(LAMBDA_LAYER_LIB_DIR)));
        assert!(candidates.iter().any(|c| c.starts_with("./")));
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfiumParser>();
    }
}
