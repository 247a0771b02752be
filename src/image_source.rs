//! Decoding user-supplied photos (uploads or camera captures saved to disk).

use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors loading an input image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unreadable or unsupported image: {0}")]
    Decode(String),

    #[error("Image has no pixels")]
    Empty,
}

/// Decode an image from a file, detecting the format from its contents
pub fn load_from_path(path: &Path) -> Result<DynamicImage, ImageError> {
    let bytes = std::fs::read(path).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    load_from_bytes(&bytes)
}

/// Decode an image from memory (JPEG or PNG)
pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(ImageError::Decode("unrecognised image format".to_string()));
    }

    let image = reader
        .decode()
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::Empty);
    }

    debug!(
        "Decoded {}x{} image ({:?})",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}
