use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
mod preprocessing;
mod server;

#[derive(Parser, Debug)]
#[command(name = "plate-preprocess-server")]
#[command(about = "License-plate preprocessing and recognition server")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "PLATE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PLATE_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "PLATE_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Gaussian blur radius used by the denoise stage (0-64)
    #[arg(long, env = "PLATE_DENOISE_RADIUS", default_value = "1",
          value_parser = clap::value_parser!(u32).range(0..=64))]
    pub denoise_radius: u32,

    /// Contrast factor used by the contrast stage
    #[arg(long, env = "PLATE_CONTRAST_FACTOR", default_value = "1.5")]
    pub contrast_factor: f32,

    /// Width of the normalized plate raster
    #[arg(long, env = "PLATE_TARGET_WIDTH", default_value = "400",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub target_width: u32,

    /// Height of the normalized plate raster
    #[arg(long, env = "PLATE_TARGET_HEIGHT", default_value = "120",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub target_height: u32,

    /// Do not load the recognition engine (preprocessing endpoints only)
    #[arg(long, env = "PLATE_NO_OCR")]
    pub no_ocr: bool,

    /// Directory for cached OCR models (defaults to the user cache dir)
    #[arg(long, env = "PLATE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!(
        "Starting plate-preprocess-server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
