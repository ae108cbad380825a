//! Destination keys for uploaded images and imported assets.

/// Final path segment of `key` without its last extension.
///
/// `lessons/year-3/exit.quiz.pdf` → `exit.quiz`. A name with no dot, or
/// whose only dot is the first character, is returned whole.
pub fn pdf_basename(key: &str) -> &str {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

/// `{prefix}{basename}_page_{page}_image_{index}.{ext}`, with 1-based
/// `page` and `index` and a lowercased extension.
pub fn image_key(prefix: &str, pdf_key: &str, page: usize, index: usize, ext: &str) -> String {
    format!(
        "{}{}_page_{}_image_{}.{}",
        prefix,
        pdf_basename(pdf_key),
        page,
        index,
        ext.to_ascii_lowercase()
    )
}

/// `{lessonSlug}/{type}.pdf`
pub fn asset_key(lesson_slug: &str, asset_type: &str) -> String {
    format!("{lesson_slug}/{asset_type}.pdf")
}

/// True when `key` names a PDF, ignoring case.
pub fn is_pdf_key(key: &str) -> bool {
    key.len() >= 4
        && key
            .get(key.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}
