//! Extension-based classification of object keys.

use crate::models::Category;

/// Extension tables in precedence order. The first table containing the
/// extension wins.
const EXTENSION_TABLE: &[(Category, &[&str])] = &[
    (Category::Image, &["jpeg", "jpg", "png", "gif"]),
    (Category::Video, &["mp4", "webm", "ogg"]),
    (Category::Audio, &["mp3"]),
    (Category::Document, &["pdf", "doc", "docx", "txt"]),
];

/// Maps an object key to its category. Total: unknown or missing extensions
/// yield [`Category::Other`].
pub fn classify(key: &str) -> Category {
    let Some(extension) = extension_of(key) else {
        return Category::Other;
    };

    EXTENSION_TABLE
        .iter()
        .find(|(_, extensions)| {
            extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(extension))
        })
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Per-file glyph. Documents get a finer split than [`Category::icon`].
pub fn icon_for(key: &str) -> &'static str {
    let category = classify(key);
    if category != Category::Document {
        return category.icon();
    }

    match extension_of(key).map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "📕",
        Some("txt") => "📜",
        _ => category.icon(),
    }
}

/// Text after the last '.' of the final path segment.
fn extension_of(key: &str) -> Option<&str> {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .filter(|extension| !extension.is_empty())
}
