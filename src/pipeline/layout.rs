//! Page layout: bounding boxes, word grouping and caption proximity.
//!
//! All coordinates here are top-down page space: `left < right` and
//! `top < bottom`, with `top` measured from the top edge of the page. The
//! parser converts pdfium's bottom-up coordinates before anything in this
//! module sees them.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// How far apart, in page units, a word and an image may be and still be
/// paired as caption text.
pub const CAPTION_TOLERANCE: f32 = 50.0;

/// Largest horizontal gap between two glyphs of the same word.
pub const WORD_X_TOLERANCE: f32 = 3.0;

/// Largest vertical drift between two glyphs of the same word.
pub const WORD_Y_TOLERANCE: f32 = 3.0;

/// Axis-aligned rectangle `(left, top, right, bottom)` in top-down page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Convert a bottom-up PDF rectangle on a page of `page_height` units.
    pub fn from_pdf_space(left: f32, top: f32, right: f32, bottom: f32, page_height: f32) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
            top: page_height - top.max(bottom),
            bottom: page_height - top.min(bottom),
        }
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// One positioned character as reported by the PDF engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BoundingBox,
}

/// A run of glyphs with no whitespace or gap between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// An image embedded in a page, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// Lowercase file extension, e.g. `png` or `jpg`.
    pub filetype: String,
    pub content: Vec<u8>,
    pub bbox: BoundingBox,
}

/// Everything the extractor needs from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Images in content-stream order.
    pub images: Vec<PageImage>,
    /// Words in the engine's text order.
    pub words: Vec<Word>,
}

/// The pages a parser read from one PDF, in order, and the error that
/// stopped it early, if any.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub pages: Vec<ParsedPage>,
    pub failure: Option<DocumentError>,
}

impl ParsedDocument {
    pub fn complete(pages: Vec<ParsedPage>) -> Self {
        Self {
            pages,
            failure: None,
        }
    }

    /// Nothing could be read.
    pub fn failed(error: DocumentError) -> Self {
        Self {
            pages: Vec::new(),
            failure: Some(error),
        }
    }
}

/// Whether `word` sits close enough to `image` to be part of its caption.
///
/// The boxes' overlap interval on each axis, with its upper end pushed out
/// by [`CAPTION_TOLERANCE`], must be non-empty:
///
/// ```text
/// max(ix0, wx0) < min(ix1, wx1) + 50  &&  max(iy0, wy0) < min(iy1, wy1) + 50
/// ```
///
/// The comparison is strict, so a word exactly 50 units away is not near.
pub fn is_near(image: &BoundingBox, word: &BoundingBox) -> bool {
    image.left.max(word.left) < image.right.min(word.right) + CAPTION_TOLERANCE
        && image.top.max(word.top) < image.bottom.min(word.bottom) + CAPTION_TOLERANCE
}

/// Caption for `image`: the text of every near word, in the order given,
/// joined by single spaces and trimmed. Empty when nothing is near.
pub fn caption_for(image: &BoundingBox, words: &[Word]) -> String {
    words
        .iter()
        .filter(|word| is_near(image, &word.bbox))
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Group positioned glyphs into words.
///
/// Glyphs are taken in the order given. A word ends at whitespace or
/// control characters, when the next glyph starts more than
/// [`WORD_X_TOLERANCE`] past the previous one's right edge or before its
/// left edge, or when it drifts more than [`WORD_Y_TOLERANCE`] vertically.
pub fn group_words(glyphs: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut text = String::new();
    let mut bbox: Option<BoundingBox> = None;
    let mut previous: Option<BoundingBox> = None;

    let mut flush = |text: &mut String, bbox: &mut Option<BoundingBox>| {
        if let Some(b) = bbox.take() {
            if !text.is_empty() {
                words.push(Word::new(std::mem::take(text), b));
            }
        }
        text.clear();
    };

    for glyph in glyphs {
        if glyph.ch.is_whitespace() || glyph.ch.is_control() {
            flush(&mut text, &mut bbox);
            previous = None;
            continue;
        }

        if let Some(prev) = previous {
            let gap = glyph.bbox.left - prev.right;
            let backwards = glyph.bbox.left < prev.left;
            let drift = (glyph.bbox.top - prev.top).abs();
            if gap > WORD_X_TOLERANCE || backwards || drift > WORD_Y_TOLERANCE {
                flush(&mut text, &mut bbox);
            }
        }

        text.push(glyph.ch);
        bbox = Some(match bbox {
            Some(b) => b.union(&glyph.bbox),
            None => glyph.bbox,
        });
        previous = Some(glyph.bbox);
    }
    flush(&mut text, &mut bbox);

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(left: f32, top: f32, right: f32, bottom: f32) -> BoundingBox {
        BoundingBox::new(left, top, right, bottom)
    }

    fn glyphs(text: &str, left: f32, top: f32, advance: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let x = left + i as f32 * advance;
                Glyph {
                    ch,
                    bbox: bx(x, top, x + advance, top + 10.0),
                }
            })
            .collect()
    }

    // ── Proximity ────────────────────────────────────────────────────────

    #[test]
    fn overlapping_word_is_near() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        assert!(is_near(&image, &bx(150.0, 150.0, 170.0, 160.0)));
    }

    #[test]
    fn word_just_below_image_is_near() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        // 49 units below the bottom edge
        assert!(is_near(&image, &bx(120.0, 249.0, 160.0, 259.0)));
    }

    #[test]
    fn gap_of_exactly_tolerance_is_not_near() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        assert!(!is_near(&image, &bx(250.0, 120.0, 290.0, 130.0)));
        assert!(is_near(&image, &bx(249.9, 120.0, 290.0, 130.0)));
        assert!(!is_near(&image, &bx(120.0, 250.0, 160.0, 260.0)));
    }

    #[test]
    fn tolerance_also_covers_words_left_of_and_above_the_image() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        // word ends 49 units left of the image
        assert!(is_near(&image, &bx(20.0, 150.0, 51.0, 160.0)));
        // word ends 60 units above the image
        assert!(!is_near(&image, &bx(120.0, 20.0, 160.0, 40.0)));
    }

    #[test]
    fn far_word_is_not_near() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        assert!(!is_near(&image, &bx(400.0, 400.0, 420.0, 410.0)));
    }

    #[test]
    fn swapping_image_and_word_roles_gives_the_same_answer() {
        // max/min are commutative, so the formula does not depend on which
        // box is the image. Pinned here so a rewrite into a one-sided
        // expansion shows up as a test failure.
        let cases = [
            (bx(100.0, 100.0, 200.0, 200.0), bx(150.0, 150.0, 170.0, 160.0)),
            (bx(100.0, 100.0, 200.0, 200.0), bx(249.0, 120.0, 290.0, 130.0)),
            (bx(100.0, 100.0, 200.0, 200.0), bx(250.0, 120.0, 290.0, 130.0)),
            (bx(0.0, 0.0, 10.0, 10.0), bx(55.0, 55.0, 70.0, 70.0)),
            (bx(300.0, 300.0, 310.0, 305.0), bx(0.0, 0.0, 260.0, 260.0)),
        ];
        for (a, b) in cases {
            assert_eq!(is_near(&a, &b), is_near(&b, &a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn is_near_is_deterministic() {
        let image = bx(10.5, 20.25, 110.75, 90.0);
        let word = bx(130.0, 60.0, 150.0, 70.0);
        let first = is_near(&image, &word);
        for _ in 0..10 {
            assert_eq!(is_near(&image, &word), first);
        }
    }

    // ── Captions ─────────────────────────────────────────────────────────

    #[test]
    fn caption_joins_near_words_with_single_spaces() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        let words = vec![
            Word::new("7", bx(140.0, 205.0, 146.0, 215.0)),
            Word::new("cm", bx(148.0, 205.0, 160.0, 215.0)),
        ];
        assert_eq!(caption_for(&image, &words), "7 cm");
    }

    #[test]
    fn caption_keeps_extraction_order() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        // right-hand word comes first in the engine's order
        let words = vec![
            Word::new("cm", bx(160.0, 205.0, 172.0, 215.0)),
            Word::new("7", bx(140.0, 205.0, 146.0, 215.0)),
        ];
        assert_eq!(caption_for(&image, &words), "cm 7");
    }

    #[test]
    fn caption_skips_far_words() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        let words = vec![
            Word::new("Question", bx(20.0, 20.0, 80.0, 30.0)),
            Word::new("5", bx(150.0, 210.0, 156.0, 220.0)),
            Word::new("Footer", bx(20.0, 780.0, 80.0, 790.0)),
        ];
        assert_eq!(caption_for(&image, &words), "5");
    }

    #[test]
    fn caption_is_empty_without_near_words() {
        let image = bx(100.0, 100.0, 200.0, 200.0);
        assert_eq!(caption_for(&image, &[]), "");
        let words = vec![Word::new("far", bx(500.0, 500.0, 520.0, 510.0))];
        assert_eq!(caption_for(&image, &words), "");
    }

    // ── Coordinates ──────────────────────────────────────────────────────

    #[test]
    fn pdf_space_is_flipped_to_top_down() {
        // 100×50 box whose top edge is 700 units up an 842-unit page
        let b = BoundingBox::from_pdf_space(72.0, 700.0, 172.0, 650.0, 842.0);
        assert_eq!(b, bx(72.0, 142.0, 172.0, 192.0));
    }

    #[test]
    fn union_covers_both_boxes() {
        let u = bx(0.0, 5.0, 10.0, 15.0).union(&bx(8.0, 0.0, 20.0, 12.0));
        assert_eq!(u, bx(0.0, 0.0, 20.0, 15.0));
    }

    // ── Word grouping ────────────────────────────────────────────────────

    #[test]
    fn spaces_split_words() {
        let words = group_words(&glyphs("7 cm", 100.0, 200.0, 5.0));
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["7", "cm"]);
        assert_eq!(words[1].bbox, bx(110.0, 200.0, 120.0, 210.0));
    }

    #[test]
    fn horizontal_gap_splits_words() {
        let mut g = glyphs("ab", 0.0, 0.0, 5.0);
        g.extend(glyphs("cd", 20.0, 0.0, 5.0));
        let words = group_words(&g);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "cd"]);
    }

    #[test]
    fn small_gap_keeps_word_together() {
        let mut g = glyphs("ab", 0.0, 0.0, 5.0);
        g.extend(glyphs("cd", 12.0, 0.0, 5.0));
        let words = group_words(&g);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "abcd");
    }

    #[test]
    fn line_change_splits_words() {
        let mut g = glyphs("end", 300.0, 100.0, 5.0);
        g.extend(glyphs("start", 50.0, 115.0, 5.0));
        let words = group_words(&g);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["end", "start"]);
    }

    #[test]
    fn control_characters_and_blank_input_produce_no_words() {
        assert!(group_words(&[]).is_empty());
        assert!(group_words(&glyphs(" \r\n ", 0.0, 0.0, 5.0)).is_empty());
    }
}
