// Export - background removal, compositing, fixed-size encoding

mod background;
mod compositor;
mod pipeline;

pub use background::{BackgroundRemover, WhiteKeyRemover};
pub use compositor::composite;
pub use pipeline::{encode_png, ExportArtifact, ExportPipeline, ExportProfile, EXPORT_PROFILES};
