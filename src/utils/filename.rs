use std::path::Path;

use uuid::Uuid;

use crate::entity::image::ImageFormat;

const MAX_STEM_LEN: usize = 50;
const FALLBACK_STEM: &str = "upload";

/// Builds the storage filename for an upload: a sanitized fragment of the
/// client name for readability, plus a random UUID for collision freedom.
/// The client-supplied name is never used as the storage key itself.
pub fn storage_filename(original_name: &str, format: ImageFormat) -> String {
    format!(
        "{}_{}{}",
        sanitize_stem(original_name),
        Uuid::new_v4(),
        format.extension()
    )
}

/// Lowercases the client filename's stem and strips everything outside
/// `[a-z0-9_-]`, capped at 50 characters.
fn sanitize_stem(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let cleaned: String = stem
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .take(MAX_STEM_LEN)
        .collect();

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned
    }
}

/// Whether a path parameter is a plain filename we could ever have stored.
/// Rejects path separators, traversal, hidden names and control characters;
/// generated names always pass.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\', '\0'])
        && !filename.chars().any(|c| c.is_ascii_control())
}
