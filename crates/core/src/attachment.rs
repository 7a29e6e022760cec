//! Attachment filename rules.

use std::sync::LazyLock;

use regex::Regex;

/// Fallback when an upload carries no usable filename.
pub const DEFAULT_FILENAME: &str = "file";

/// Content type used when the client sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

static UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Strip any directory part and replace runs of unsafe characters with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned = UNSAFE_RE.replace_all(base, "_").into_owned();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned
    }
}

/// Longest extension carried over to a stored name, without the dot.
pub const MAX_EXTENSION_CHARS: usize = 16;

/// Last extension of a sanitized filename with its dot, e.g. `.gz`.
///
/// Empty when there is none or when it is longer than
/// [`MAX_EXTENSION_CHARS`].
pub fn stored_extension(filename: &str) -> String {
    let name = filename.trim_start_matches('.');
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= MAX_EXTENSION_CHARS => format!(".{ext}"),
        _ => String::new(),
    }
}
