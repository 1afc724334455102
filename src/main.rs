//! mdox - markdown viewer and editor
//!
//! Opens local and remote markdown documents, follows links between them with
//! back/forward history, and edits local files with a synchronized preview.

mod app;
mod core;
mod ui;

use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use app::MdoxApp;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::JsonSettingsStore;
use crate::core::discovery::LinkCrawler;
use crate::core::file_system::LocalContentStore;
use crate::core::links::is_remote_locator;
use crate::core::markdown::MarkdownRenderer;
use crate::core::ports::{ContentStore, RemoteFetchService, Services};
use crate::core::remote::HttpFetcher;
use crate::core::session::DocumentSessionController;
use crate::core::tasks::TokioSpawner;
use crate::ui::dialogs::RfdDialogs;

#[derive(Debug, Parser)]
#[command(name = "mdox", version, about = "Markdown viewer and editor")]
struct Cli {
    /// Markdown file or http(s) URL to open
    file: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Absolute path for local files so relative links resolve from the right place
fn startup_locator(file: String) -> String {
    if is_remote_locator(&file) {
        return file;
    }
    std::fs::canonicalize(Path::new(&file))
        .map(|path| path.to_string_lossy().to_string())
        .unwrap_or(file)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    tracing::info!("Starting mdox...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .thread_name("mdox-worker")
        .build()
        .context("failed to start worker runtime")?;

    let content: Arc<dyn ContentStore> = Arc::new(LocalContentStore::new());
    let remote: Arc<dyn RemoteFetchService> = Arc::new(HttpFetcher::new()?);
    let services = Services {
        content: Arc::clone(&content),
        render: Arc::new(MarkdownRenderer::new()),
        remote: Arc::clone(&remote),
        discovery: Arc::new(LinkCrawler::new(content, remote)),
    };
    let settings = JsonSettingsStore::new()?;
    let startup = cli.file.map(startup_locator);
    let handle = runtime.handle().clone();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("mdox")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "mdox",
        native_options,
        Box::new(move |cc| {
            let (sender, receiver) = mpsc::channel();
            let spawner = TokioSpawner::new(handle, sender).with_repaint(cc.egui_ctx.clone());
            let controller = DocumentSessionController::new(
                services,
                Box::new(RfdDialogs),
                Box::new(settings),
                Box::new(spawner),
            );
            Ok(Box::new(MdoxApp::new(cc, controller, receiver, startup)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to run mdox: {e}"))?;

    tracing::info!("mdox exited");
    Ok(())
}
