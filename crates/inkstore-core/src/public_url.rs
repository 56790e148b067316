//! Public URL convention for stored blobs.
//!
//! A blob's externally visible address is a fixed path prefix followed by its
//! id. Id extraction is the inverse string operation and tolerates empty or
//! malformed input by returning `None`.

use crate::models::FileResourceId;

/// Fixed path prefix under which blobs are served.
pub const PUBLIC_FILE_PREFIX: &str = "/files/";

/// Externally visible path for a blob.
pub fn public_url(id: &FileResourceId) -> String {
    format!("{}{}", PUBLIC_FILE_PREFIX, id)
}

/// Extract the blob id from a public path, if any.
///
/// Accepts both the bare id and the prefixed path form; trailing path
/// segments after the id are ignored.
pub fn id_from_public_url(path: &str) -> Option<FileResourceId> {
    let rest = path.strip_prefix(PUBLIC_FILE_PREFIX).unwrap_or(path);
    let candidate = rest.split('/').next()?.trim();
    if candidate.is_empty() {
        return None;
    }
    candidate.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_roundtrip() {
        let id = FileResourceId::generate();
        let url = public_url(&id);
        assert!(url.starts_with(PUBLIC_FILE_PREFIX));
        assert_eq!(id_from_public_url(&url), Some(id));
    }

    #[test]
    fn test_extract_tolerates_empty_input() {
        assert_eq!(id_from_public_url(""), None);
        assert_eq!(id_from_public_url("/files/"), None);
        assert_eq!(id_from_public_url("   "), None);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert_eq!(id_from_public_url("/files/not-a-uuid"), None);
    }

    #[test]
    fn test_extract_ignores_trailing_segments() {
        let id = FileResourceId::generate();
        let url = format!("{}{}/download", PUBLIC_FILE_PREFIX, id);
        assert_eq!(id_from_public_url(&url), Some(id));
    }
}
