// stickerforge - AI Sticker Batch Library
// Turns a character description into a batch of themed images and exports
// them as platform-sized transparent stickers

pub mod error;
pub mod export;
pub mod generation;

pub use error::{Result, StickerError};
pub use export::{
    BackgroundRemover, ExportArtifact, ExportPipeline, ExportProfile, WhiteKeyRemover,
    EXPORT_PROFILES,
};
pub use generation::{
    backend::{GenerationBackend, GenerationRequest, HuggingFaceBackend, PollinationsBackend},
    BatchRequest, GenerationSlot, OrchestratorConfig, SlotState, StickerOrchestrator,
    StickerSession, StyleChoice, StylePreset, SLOT_COUNT,
};
