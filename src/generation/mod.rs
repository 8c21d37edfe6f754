// Sticker generation - prompt assembly, service backends, batch orchestration

pub mod backend;
mod orchestrator;
mod prompt;
mod types;

pub use orchestrator::StickerOrchestrator;
pub use prompt::compose;
pub use types::{
    BatchRequest, GenerationSlot, OrchestratorConfig, Selection, SlotState, StickerSession,
    StyleChoice, StylePreset, SLOT_COUNT,
};
