// stickerforge - CLI for generating and exporting sticker batches

use clap::Parser;
use stickerforge::{
    BatchRequest, ExportPipeline, GenerationBackend, HuggingFaceBackend, OrchestratorConfig,
    PollinationsBackend, SlotState, StickerOrchestrator, StickerSession, StyleChoice, StylePreset,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate themed character stickers and export them at platform upload sizes", long_about = None)]
struct Args {
    /// Character description, e.g. "a cool shiba inu wearing a hoodie"
    #[arg(short, long, default_value = "")]
    character: String,

    /// Extra detail appended to every prompt
    #[arg(short, long, default_value = "")]
    detail: String,

    /// Style preset
    #[arg(short, long, value_enum, default_value = "flat-vector")]
    style: StyleArg,

    /// Free-text style override; wins over --style when set
    #[arg(long)]
    style_text: Option<String>,

    /// Comma-separated mood tags, one per slot
    #[arg(short, long, value_delimiter = ',')]
    moods: Vec<String>,

    /// Number of stickers to generate (1-8)
    #[arg(short, long, default_value = "4")]
    quantity: usize,

    /// Generation backend
    #[arg(short, long, value_enum, default_value = "pollinations")]
    backend: BackendArg,

    /// Output directory
    #[arg(short, long, default_value = "stickers")]
    output: PathBuf,

    /// Slot to export (defaults to the first ready slot)
    #[arg(long)]
    select: Option<usize>,

    /// Export an existing image file instead of generating
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Flat delay between generation requests, milliseconds
    #[arg(long, default_value = "1500")]
    pacing_ms: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StyleArg {
    /// Flat vector, minimalist
    FlatVector,
    /// Crayon and hand-drawn
    Crayon,
    /// 3D cartoon render
    Cartoon3d,
    /// Kawaii anime style
    KawaiiAnime,
}

impl From<StyleArg> for StylePreset {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::FlatVector => StylePreset::FlatVector,
            StyleArg::Crayon => StylePreset::Crayon,
            StyleArg::Cartoon3d => StylePreset::Cartoon3d,
            StyleArg::KawaiiAnime => StylePreset::KawaiiAnime,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BackendArg {
    /// GET-templated service, no credential required
    Pollinations,
    /// HuggingFace inference API, needs HF_TOKEN
    Huggingface,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present, for HF_TOKEN and friends
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded .env from: {}", path.display());
    }

    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stickerforge={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    std::fs::create_dir_all(&args.output)?;
    let pipeline = ExportPipeline::new();

    // Upload path: export an existing file, skipping generation entirely
    if let Some(input) = &args.input {
        let bytes = std::fs::read(input)?;
        let mut session = StickerSession::new();
        session.select_uploaded(&bytes)?;
        let image = session
            .selected_image()
            .expect("uploaded selection has an image");
        write_exports(&pipeline, image, &args.output)?;
        return Ok(());
    }

    if args.character.is_empty() {
        return Err("provide --character or --input".into());
    }

    let config = OrchestratorConfig {
        pacing_ms: args.pacing_ms,
        ..OrchestratorConfig::default()
    };
    let backend: Arc<dyn GenerationBackend> = match args.backend {
        BackendArg::Pollinations => Arc::new(PollinationsBackend::with_options(
            "https://image.pollinations.ai",
            Duration::from_millis(config.request_timeout_ms),
        )),
        BackendArg::Huggingface => Arc::new(HuggingFaceBackend::from_env()?),
    };

    let mut style = StyleChoice::preset(args.style.into());
    style.custom = args.style_text.clone();

    let request = BatchRequest::new(&args.character)
        .with_detail(&args.detail)
        .with_style(style)
        .with_moods(args.moods.clone())
        .with_quantity(args.quantity);

    println!("🎨 Generating {} sticker(s)...", args.quantity);
    let orchestrator = StickerOrchestrator::with_config(backend, config);
    let mut session = StickerSession::new();
    orchestrator.run_batch(&mut session, &request).await?;

    for slot in &session.slots()[..args.quantity] {
        match slot.state {
            SlotState::Ready => {
                let path = args.output.join(format!("slot_{}.png", slot.index));
                let image = slot.image.as_ref().expect("ready slot has an image");
                std::fs::write(&path, stickerforge::export::encode_png(image)?)?;
                println!(
                    "  ✓ slot {} [{}] seed {} -> {}",
                    slot.index,
                    if slot.mood.is_empty() { "-" } else { &slot.mood },
                    slot.seed,
                    path.display()
                );
            }
            _ => {
                println!(
                    "  ✗ slot {} failed: {}",
                    slot.index,
                    slot.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    let selected = match args.select {
        Some(index) => index,
        None => match session.first_ready() {
            Some(index) => index,
            None => {
                println!("No slot became ready; nothing to export.");
                return Ok(());
            }
        },
    };
    session.select(selected)?;
    println!("📦 Exporting slot {selected}...");

    let image = session
        .selected_image()
        .expect("selection points at a ready slot");
    write_exports(&pipeline, image, &args.output)?;
    Ok(())
}

fn write_exports(
    pipeline: &ExportPipeline,
    image: &image::RgbaImage,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    for artifact in pipeline.export(image)? {
        let path = output.join(&artifact.filename);
        std::fs::write(&path, &artifact.bytes)?;
        println!(
            "  ✓ {} ({}x{}) -> {}",
            artifact.profile.name,
            artifact.profile.width,
            artifact.profile.height,
            path.display()
        );
    }
    Ok(())
}
