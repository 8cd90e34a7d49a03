//! # invite-cli
//!
//! Validate invitation documents and render preview thumbnails.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use invite_cli::{parse_multiplier, thumbnail, validate, ThumbnailArgs};
use invite_renderer::PreviewOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tools for invitation documents
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a document deserializes and summarize its objects
    Validate {
        /// Path to the document (.json)
        file: PathBuf,
    },

    /// Render a preview thumbnail to PNG
    Thumbnail {
        /// Path to the document (.json)
        file: PathBuf,

        /// Output path for the PNG image
        #[arg(short, long)]
        output: PathBuf,

        /// Scale relative to the 600x800 canvas, at most 4
        #[arg(
            long,
            env = "INVITE_PREVIEW_MULTIPLIER",
            default_value_t = 0.5,
            value_parser = parse_multiplier
        )]
        multiplier: f64,

        /// Give up and write the placeholder after this many milliseconds
        #[arg(long, env = "INVITE_PREVIEW_TIMEOUT_MS", default_value_t = 5000)]
        timeout_ms: u64,

        /// Directory relative asset references resolve against
        #[arg(long, env = "INVITE_ASSET_DIR")]
        asset_dir: Option<PathBuf>,
    },
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,invite_core=debug,invite_renderer=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,invite_core=debug,invite_renderer=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    match Cli::parse().command {
        Commands::Validate { file } => {
            let report = validate(&file)?;
            println!("{report}");
        }
        Commands::Thumbnail {
            file,
            output,
            multiplier,
            timeout_ms,
            asset_dir,
        } => {
            let args = ThumbnailArgs {
                preview: PreviewOptions {
                    multiplier,
                    timeout: Duration::from_millis(timeout_ms),
                },
                asset_dir,
            };
            let outcome = thumbnail(&file, &output, &args).await?;
            if outcome.is_placeholder() {
                println!("placeholder written to {}", output.display());
            } else {
                println!("preview written to {}", output.display());
            }
        }
    }
    Ok(())
}
