//! Filename derivation, sanitization, and collision handling for saved images.
//!
//! Saved files are named after the final path segment of their source URL.
//! Collisions are resolved by [`unique_name`], a pure function of the desired
//! name and the names already taken.

use std::collections::HashSet;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use url::Url;

use super::constants::FALLBACK_EXTENSION;

/// Longest filename (in chars, before any collision suffix) we will write.
const MAX_FILENAME_CHARS: usize = 150;

/// Derives the local filename for an image URL.
///
/// 1. Final path segment, percent-decoded and sanitized.
/// 2. Missing extension: taken from the Content-Type, else [`FALLBACK_EXTENSION`].
/// 3. No usable segment (empty, or only an extension like `.png`):
///    `image_<hash>.<ext>` with a stable hash of the URL.
#[must_use]
pub fn filename_from_url(url: &Url, content_type: Option<&str>) -> String {
    let type_extension = content_type.and_then(extension_from_content_type);

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(|last| {
            urlencoding::decode(last)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or_else(|_| last.to_string())
        })
        .map(|decoded| sanitize_filename(&decoded))
        .filter(|name| !name.starts_with('.'))
        .filter(|name| name.trim_matches('_').chars().any(char::is_alphanumeric));

    match segment {
        Some(name) => {
            let name = truncate_stem(&name);
            if split_extension(&name).1.is_empty() {
                let ext = type_extension.unwrap_or(FALLBACK_EXTENSION);
                format!("{name}{ext}")
            } else {
                name
            }
        }
        None => {
            let ext = type_extension
                .map(str::to_string)
                .or_else(|| extension_from_url(url))
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
            hashed_name(url, &ext)
        }
    }
}

/// Returns a name not present in `existing`, suffixing `_1`, `_2`, ... before
/// the extension on collision.
///
/// `photo.png` taken -> `photo_1.png`; `photo.png` and `photo_1.png` taken ->
/// `photo_2.png`.
#[must_use]
pub fn unique_name<S>(desired: &str, existing: &HashSet<String, S>) -> String
where
    S: std::hash::BuildHasher,
{
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let (stem, ext) = split_extension(desired);
    (1usize..)
        .map(|i| format!("{stem}_{i}{ext}"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| desired.to_string())
}

/// Lower-cased extension (with leading dot) of the URL's last path segment.
pub(crate) fn extension_from_url(url: &Url) -> Option<String> {
    let last_segment = url.path_segments()?.next_back()?;
    let ext = &last_segment[last_segment.rfind('.')?..];
    if ext.len() <= 1 || ext.len() > 12 || !ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Guess an image file extension from a Content-Type header.
pub(crate) fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        "image/svg+xml" => Some(".svg"),
        "image/bmp" | "image/x-ms-bmp" => Some(".bmp"),
        "image/tiff" => Some(".tiff"),
        "image/avif" => Some(".avif"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some(".ico"),
        _ => None,
    }
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Splits `name.ext` into (`name`, `.ext`). Leading-dot names have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

fn truncate_stem(name: &str) -> String {
    if name.chars().count() <= MAX_FILENAME_CHARS {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    let keep = MAX_FILENAME_CHARS.saturating_sub(ext.chars().count());
    let stem: String = stem.chars().take(keep).collect();
    format!("{stem}{ext}")
}

fn hashed_name(url: &Url, ext: &str) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("image_{hex}{ext}")
}
