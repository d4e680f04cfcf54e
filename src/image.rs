use anyhow::{Context, Result};
use base64::Engine;
use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::constants::IMAGE_EXTENSIONS;
use crate::logging::{log_debug, log_info};

/// An image staged for submission, always held as JPEG bytes
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    jpeg: Vec<u8>,
    source: Option<String>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("bytes", &self.jpeg.len())
            .field("source", &self.source)
            .finish()
    }
}

fn extension_of(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .context("File has no extension")?;

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(anyhow::anyhow!(
            "Unsupported image format: {}. Supported formats: {}",
            extension,
            IMAGE_EXTENSIONS.join(", ")
        ));
    }
    Ok(extension)
}

impl ImageAttachment {
    /// Load an image file; anything that is not already JPEG is re-encoded
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = extension_of(path)?;
        log_info(&format!("Reading image file: {}", path.display()));

        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read image file: {}", path.display()))?;

        let jpeg = if matches!(extension.as_str(), "jpg" | "jpeg") {
            bytes
        } else {
            log_debug(&format!("Re-encoding {extension} image as JPEG"));
            encode_jpeg(&bytes)
                .with_context(|| format!("Failed to convert {} to JPEG", path.display()))?
        };

        Ok(Self {
            jpeg,
            source: Some(path.display().to_string()),
        })
    }

    pub fn from_jpeg_bytes(jpeg: Vec<u8>) -> Self {
        Self { jpeg, source: None }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.jpeg)
    }
}

fn encode_jpeg(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;
    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .context("Failed to encode JPEG")?;
    Ok(out.into_inner())
}
