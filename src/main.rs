use anyhow::{anyhow, Context};
use clap::Parser;
use markit::config::EngineConfig;
use markit::watermark::{save_image, WatermarkSession, WatermarkSettings};
use std::path::{Path, PathBuf};

/// Markit - text watermark compositing
#[derive(Parser, Debug)]
#[command(name = "markit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Image to open at startup
    image: Option<PathBuf>,

    /// Path to engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark settings as JSON (defaults are used when omitted)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Where to write the watermarked image
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the fitted preview frame to this file
    #[arg(long)]
    preview: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    markit::logging::init_subscriber()
        .map_err(|e| anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let mut session = WatermarkSession::from_config(&config);
    tracing::info!(
        config_file = ?args.config,
        default_font = %config.default_font,
        fonts = ?session.fonts().font_ids(),
        jpeg_quality = config.jpeg_quality,
        "Configuration loaded successfully"
    );

    if let Some(path) = &args.settings {
        let settings = read_settings(path)?;
        session.update_settings(settings.into());
    }

    let Some(image) = &args.image else {
        tracing::info!("No image given, nothing to do");
        return Ok(());
    };

    session
        .load(image)
        .with_context(|| format!("Failed to open {}", image.display()))?;

    if let Some(preview_path) = &args.preview {
        let frame = session.preview_in(config.preview.canvas())?;
        save_image(preview_path, &frame.image, config.jpeg_quality)
            .with_context(|| format!("Failed to write preview {}", preview_path.display()))?;
        tracing::info!(
            path = %preview_path.display(),
            width = frame.viewport.display.width,
            height = frame.viewport.display.height,
            "Preview written"
        );
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| image.with_file_name(session.suggested_output_name()));
    session
        .bake_and_save(&output)
        .with_context(|| format!("Failed to save {}", output.display()))?;

    tracing::info!(
        input = %image.display(),
        output = %output.display(),
        "Watermark applied"
    );
    Ok(())
}

fn read_settings(path: &Path) -> anyhow::Result<WatermarkSettings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings {}", path.display()))?;
    WatermarkSettings::from_json(&json)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}
