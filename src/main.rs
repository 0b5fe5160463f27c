//! # padview
//!
//! Live gamepad input visualizer.
//!
//! Draws a controller skin in a window and animates its buttons, sticks and
//! triggers as the connected gamepad is used.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use padview::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH};
use padview::error::PadError;
use padview::history::{self, HistoryStrip};
use padview::input::device::Gamepad;
use padview::input::mapping::MappingTable;
use padview::session::Session;
use padview::skin::Skin;
use padview::viewer::{self, HistoryView, ViewerOptions};

#[derive(Parser, Debug)]
#[command(name = "padview")]
#[command(author, version, about = "Live gamepad input visualizer")]
struct Args {
    /// Skin to draw (a directory under the configured skins directory)
    skin: String,

    /// Which detected gamepad to show, in /dev/input order
    #[arg(default_value_t = 0)]
    device_index: usize,
}

/// Installs the stderr subscriber, plus a daily log file when enabled.
///
/// The returned guard must be kept alive for file logs to be flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if config.file_enabled {
        let appender = tracing_appender::rolling::daily(&config.dir, "padview.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Main entry point for padview
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when `config/default.toml` is absent)
///    - Set up logging
///    - Load the skin and its mapping table, open the gamepad
///
/// 2. **Main Loop**
///    - The device reader task forwards events to the viewer
///    - The viewer steps the session once per frame
///    - Distinct input states scroll through the history window
///
/// 3. **Shutdown**
///    - Window closed, Ctrl+C, or gamepad disconnected
///    - The device reader is stopped
///
/// # Errors
///
/// Returns error if the configuration, skin, or mapping table is invalid, if
/// no gamepad exists at the requested index, or if the window cannot open.
/// A gamepad missing from the mapping table is not an error: the mapper
/// instruction is printed and the process exits normally.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_or_default(DEFAULT_CONFIG_PATH)
        .with_context(|| format!("Invalid configuration in {}", DEFAULT_CONFIG_PATH))?;
    let _log_guard = init_logging(&config.logging);

    info!("padview v{} starting...", env!("CARGO_PKG_VERSION"));

    let skin = Skin::load(&config.skins.dir, &args.skin)
        .with_context(|| format!("Failed to load skin '{}'", args.skin))?;
    let table = MappingTable::load(&skin)?;

    let gamepad = Gamepad::open(args.device_index)?;
    info!("Using '{}' at {}", gamepad.name(), gamepad.device_path());

    let mapping = match table.device(gamepad.name(), &skin.name) {
        Ok(mapping) => mapping,
        Err(e @ PadError::UnmappedDevice { .. }) => {
            println!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // History strip
    let (publisher, history_view) = if config.history.enabled {
        let (publisher, receiver) = history::channel(config.history.channel_capacity);
        let strip = HistoryStrip::new(&skin, config.history.rows)?;
        (Some(publisher), Some(HistoryView::new(strip, receiver)))
    } else {
        (None, None)
    };

    let session = Session::new(&skin, mapping, publisher)?;

    // Device reader
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let reader = gamepad.spawn_reader(event_tx)?;

    // Ctrl+C raises the quit flag; the viewer polls it every frame
    let (quit_tx, quit_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            let _ = quit_tx.send(true);
        }
    });

    info!("Press Ctrl+C or close the window to exit");
    viewer::run(
        session,
        event_rx,
        quit_rx,
        history_view,
        ViewerOptions {
            skin_name: skin.name.clone(),
            fps: config.display.fps,
            anti_aliasing: skin.anti_aliasing,
        },
    )?;

    reader.abort();

    info!("padview stopped");
    Ok(())
}
