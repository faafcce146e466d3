//! Generated or edited raster images.

use chorus_error::{StorageError, StorageErrorKind};
use std::path::Path;
use tracing::{debug, instrument};

/// An RGB8 image returned by the image-generation path.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct GeneratedImage {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Row-major RGB bytes, `width * height * 3` long
    rgb: Vec<u8>,
}

impl GeneratedImage {
    /// Wraps raw RGB bytes, checking the buffer matches the geometry.
    #[track_caller]
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, StorageError> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(StorageError::new(StorageErrorKind::Decode(format!(
                "RGB buffer of {} bytes does not match {}x{} ({} bytes)",
                rgb.len(),
                width,
                height,
                expected
            ))));
        }
        Ok(Self { width, height, rgb })
    }

    /// Writes the image; the format follows the file extension.
    #[instrument(skip_all, fields(width = self.width, height = self.height))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::new(StorageErrorKind::Io(e.to_string())))?;
        }
        let buffer = image::RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::Encode(
                    "RGB buffer does not match image geometry".to_string(),
                ))
            })?;
        buffer
            .save(path)
            .map_err(|e| StorageError::new(StorageErrorKind::Encode(e.to_string())))?;
        debug!(path = %path.display(), "Saved generated image");
        Ok(())
    }
}
