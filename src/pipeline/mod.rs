//! Pipeline stages shared by the three entry points.
//!
//! Each submodule implements exactly one step. Keeping stages separate
//! makes each independently testable and lets tests swap the I/O-bound
//! ones (parser, model, lesson API) for fakes through their traits.
//!
//! ## Data Flow
//!
//! ```text
//! image extraction:  parse ──▶ encode ──▶ naming ──▶ layout (caption)
//!                   (pdfium)  (png/jpg)   (keys)     (proximity)
//!
//! quiz description:  inference (request) ──▶ Bedrock ──▶ postprocess ──▶ inference (reply)
//!
//! lesson import:     lessons (catalogue) ──▶ lessons (asset bytes) ──▶ naming
//! ```
//!
//! 1. [`parse`]  — open a PDF with pdfium and collect images and words per
//!    page; blocking, so callers use `spawn_blocking`
//! 2. [`encode`] — turn decoded bitmaps into upload-ready PNG/JPEG bytes
//! 3. [`layout`] — bounding boxes, word grouping and the caption proximity test
//! 4. [`naming`] — destination keys and the `.pdf` filter
//! 5. [`inference`] — Nova request/reply types and the Bedrock client
//! 6. [`postprocess`] — deterministic cleanup of the model's text
//! 7. [`lessons`] — lesson catalogue and asset downloads

pub mod encode;
pub mod inference;
pub mod layout;
pub mod lessons;
pub mod naming;
pub mod parse;
pub mod postprocess;
