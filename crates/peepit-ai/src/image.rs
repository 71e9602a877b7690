//! Reading images from disk for analysis

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AiError, Result};

/// An image ready to be sent to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: &'static str,
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read and base64-encode an image file
///
/// Only `.png`, `.jpg`, `.jpeg` and `.webp` files are accepted.
pub async fn load_image(path: &Path) -> Result<EncodedImage> {
    let mime_type = mime_type_for(path).ok_or_else(|| {
        let ext = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| "(none)".to_string());
        AiError::UnsupportedImageFormat(ext)
    })?;

    let bytes = tokio::fs::read(path).await.map_err(|source| AiError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(EncodedImage {
        base64: STANDARD.encode(bytes),
        mime_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("shot.png", Some("image/png"))]
    #[case("shot.JPG", Some("image/jpeg"))]
    #[case("shot.jpeg", Some("image/jpeg"))]
    #[case("shot.webp", Some("image/webp"))]
    #[case("shot.gif", None)]
    #[case("shot", None)]
    fn test_mime_type_for(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(mime_type_for(Path::new(name)), expected);
    }

    #[tokio::test]
    async fn test_load_image_encodes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, b"abc").unwrap();

        let image = load_image(&path).await.unwrap();
        assert_eq!(image.base64, "YWJj");
        assert_eq!(image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_load_image_rejects_unsupported_extension() {
        let err = load_image(Path::new("/tmp/notes.txt")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported image format: .txt. Supported formats: .png, .jpg, .jpeg, .webp"
        );
    }

    #[tokio::test]
    async fn test_load_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, AiError::Io { .. }));
    }
}
