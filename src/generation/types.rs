// Core types for sticker batch generation

use crate::error::{Result, StickerError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Number of positions in a batch; fixed regardless of requested quantity
pub const SLOT_COUNT: usize = 8;

/// Built-in rendering styles offered to the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StylePreset {
    FlatVector,
    Crayon,
    Cartoon3d,
    KawaiiAnime,
}

impl StylePreset {
    pub fn as_str(&self) -> &str {
        match self {
            StylePreset::FlatVector => "flat-vector",
            StylePreset::Crayon => "crayon",
            StylePreset::Cartoon3d => "3d-cartoon",
            StylePreset::KawaiiAnime => "kawaii-anime",
        }
    }

    /// Text inserted into the generation prompt for this preset
    pub fn prompt_text(&self) -> &str {
        match self {
            StylePreset::FlatVector => "Flat Vector (Minimalist)",
            StylePreset::Crayon => "Crayon & Hand-drawn",
            StylePreset::Cartoon3d => "3D Cartoon Render",
            StylePreset::KawaiiAnime => "Kawaii Anime Style",
        }
    }
}

/// Style selection: a preset, optionally overridden by free text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleChoice {
    pub preset: StylePreset,

    /// Free-text style; wins over the preset whenever non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl StyleChoice {
    pub fn preset(preset: StylePreset) -> Self {
        Self {
            preset,
            custom: None,
        }
    }

    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            preset: StylePreset::FlatVector,
            custom: Some(text.into()),
        }
    }

    /// The style text that ends up in the prompt
    pub fn resolved(&self) -> &str {
        match &self.custom {
            Some(text) if !text.trim().is_empty() => text,
            _ => self.preset.prompt_text(),
        }
    }
}

impl Default for StyleChoice {
    fn default() -> Self {
        Self::preset(StylePreset::FlatVector)
    }
}

/// Input to one batch orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Who the stickers depict, e.g. "a cool shiba inu wearing a hoodie"
    pub character: String,

    /// Extra description appended to every slot's prompt
    #[serde(default)]
    pub detail: String,

    #[serde(default)]
    pub style: StyleChoice,

    /// One mood tag per slot, in order; may be shorter than `quantity`
    #[serde(default)]
    pub moods: Vec<String>,

    /// Number of slots to fill, 1 to 8
    #[serde(default = "default_quantity")]
    pub quantity: usize,
}

fn default_quantity() -> usize {
    4
}

impl BatchRequest {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            detail: String::new(),
            style: StyleChoice::default(),
            moods: Vec::new(),
            quantity: default_quantity(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_style(mut self, style: StyleChoice) -> Self {
        self.style = style;
        self
    }

    pub fn with_moods(mut self, moods: Vec<String>) -> Self {
        self.moods = moods;
        self
    }

    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Reject malformed requests before anything is dispatched
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 || self.quantity > SLOT_COUNT {
            return Err(StickerError::InvalidRequest(format!(
                "quantity must be between 1 and {}, got {}",
                SLOT_COUNT, self.quantity
            )));
        }
        if self.moods.len() > self.quantity {
            return Err(StickerError::InvalidRequest(format!(
                "{} mood tags exceed the requested quantity {}",
                self.moods.len(),
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Lifecycle of one slot within a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Empty,
    Pending,
    Ready,
    Failed,
}

/// One of the 8 fixed positions in a generation batch
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSlot {
    pub index: usize,

    /// Mood tag assigned to this slot; empty when none was requested
    pub mood: String,

    /// Fully composed prompt, kept for regeneration
    pub prompt: String,

    /// Seed sent with this slot's request
    pub seed: u64,

    pub state: SlotState,

    /// Present only when the slot is Ready
    pub image: Option<RgbaImage>,

    /// Failure message when the slot is Failed
    pub error: Option<String>,
}

impl GenerationSlot {
    pub(crate) fn empty(index: usize) -> Self {
        Self {
            index,
            mood: String::new(),
            prompt: String::new(),
            seed: 0,
            state: SlotState::Empty,
            image: None,
            error: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == SlotState::Ready
    }

    /// Move the slot to Pending with its request parameters fixed
    pub(crate) fn begin(&mut self, mood: String, prompt: String, seed: u64) {
        self.mood = mood;
        self.prompt = prompt;
        self.seed = seed;
        self.state = SlotState::Pending;
        self.image = None;
        self.error = None;
    }

    pub(crate) fn complete(&mut self, image: RgbaImage) {
        self.state = SlotState::Ready;
        self.image = Some(image);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.state = SlotState::Failed;
        self.image = None;
        self.error = Some(error.into());
    }
}

/// The user's chosen export source
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Image of a Ready slot
    Slot(usize),
    /// User-supplied image that bypassed generation
    Uploaded(RgbaImage),
}

/// Session-scoped orchestration context: the 8-slot array plus the current
/// selection. Created at session start, dropped at session end; every
/// operation takes it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerSession {
    slots: [GenerationSlot; SLOT_COUNT],
    selection: Option<Selection>,
}

impl StickerSession {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(GenerationSlot::empty),
            selection: None,
        }
    }

    pub fn slots(&self) -> &[GenerationSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&GenerationSlot> {
        self.slots.get(index)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [GenerationSlot; SLOT_COUNT] {
        &mut self.slots
    }

    /// Clear all slots and drop the selection
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = GenerationSlot::empty(slot.index);
        }
        self.selection = None;
    }

    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_ready()).count()
    }

    pub fn first_ready(&self) -> Option<usize> {
        self.slots.iter().position(GenerationSlot::is_ready)
    }

    /// Select a Ready slot's image as the export source
    pub fn select(&mut self, index: usize) -> Result<()> {
        let slot = self.slot(index).ok_or_else(|| {
            StickerError::InvalidRequest(format!("slot index {index} out of range"))
        })?;
        if !slot.is_ready() {
            return Err(StickerError::InvalidRequest(format!(
                "slot {index} has no image to select"
            )));
        }
        self.selection = Some(Selection::Slot(index));
        Ok(())
    }

    /// Decode a user-supplied image and make it the export source,
    /// bypassing generation entirely
    pub fn select_uploaded(&mut self, bytes: &[u8]) -> Result<()> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StickerError::Decode(e.to_string()))?
            .to_rgba8();
        self.selection = Some(Selection::Uploaded(image));
        Ok(())
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_image(&self) -> Option<&RgbaImage> {
        match self.selection.as_ref()? {
            Selection::Slot(index) => self.slots.get(*index)?.image.as_ref(),
            Selection::Uploaded(image) => Some(image),
        }
    }
}

impl Default for StickerSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the batch orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Pixel width requested from the generation service
    #[serde(default = "default_request_size")]
    pub request_width: u32,

    /// Pixel height requested from the generation service
    #[serde(default = "default_request_size")]
    pub request_height: u32,

    /// Flat delay between consecutive slot dispatches, milliseconds
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Attempt ceiling per slot dispatch, retryable failures only
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before retrying after a network failure, milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Delay before retrying while the service is warming up, milliseconds
    #[serde(default = "default_warmup_delay_ms")]
    pub warmup_delay_ms: u64,

    /// Per-request network timeout, milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_size() -> u32 {
    512
}

fn default_pacing_ms() -> u64 {
    1500
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_warmup_delay_ms() -> u64 {
    10000
}

fn default_request_timeout_ms() -> u64 {
    60000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            request_width: default_request_size(),
            request_height: default_request_size(),
            pacing_ms: default_pacing_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            warmup_delay_ms: default_warmup_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
