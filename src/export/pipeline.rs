// Export pipeline - platform-sized transparent deliverables

use super::background::{BackgroundRemover, WhiteKeyRemover};
use super::compositor;
use crate::error::{Result, StickerError};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// One fixed output size required by the platform's upload rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProfile {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ExportProfile {
    pub fn filename(&self) -> String {
        format!("{}_{}x{}.png", self.name, self.width, self.height)
    }
}

/// The fixed target dimensions; not user-configurable
pub const EXPORT_PROFILES: [ExportProfile; 3] = [
    ExportProfile {
        name: "sticker",
        width: 370,
        height: 320,
    },
    ExportProfile {
        name: "main",
        width: 240,
        height: 240,
    },
    ExportProfile {
        name: "tab",
        width: 96,
        height: 74,
    },
];

/// One encoded deliverable
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub profile: ExportProfile,
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Applies background removal and compositing to a selected image and
/// encodes one lossless PNG per export profile
pub struct ExportPipeline {
    remover: Box<dyn BackgroundRemover>,
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self::with_remover(Box::new(WhiteKeyRemover::new()))
    }

    pub fn with_remover(remover: Box<dyn BackgroundRemover>) -> Self {
        Self { remover }
    }

    /// Produce all fixed-size deliverables for one selected image
    pub fn export(&self, image: &RgbaImage) -> Result<Vec<ExportArtifact>> {
        EXPORT_PROFILES
            .iter()
            .map(|profile| self.export_profile(image, *profile))
            .collect()
    }

    /// Decode an already-encoded image and export it; the upload path
    pub fn export_encoded(&self, bytes: &[u8]) -> Result<Vec<ExportArtifact>> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StickerError::Decode(e.to_string()))?
            .to_rgba8();
        self.export(&image)
    }

    // Removal runs independently for every profile; no cross-profile cache.
    fn export_profile(&self, image: &RgbaImage, profile: ExportProfile) -> Result<ExportArtifact> {
        let foreground = self.remover.remove(image)?;
        let canvas = compositor::composite(&foreground, profile.width, profile.height);
        tracing::debug!(
            profile = profile.name,
            width = profile.width,
            height = profile.height,
            "encoded export artifact"
        );
        Ok(ExportArtifact {
            profile,
            filename: profile.filename(),
            mime_type: "image/png",
            bytes: encode_png(&canvas)?,
        })
    }
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode as PNG, the lossless format every profile ships in
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| StickerError::ImageProcessing(e.to_string()))?;
    Ok(buf.into_inner())
}
