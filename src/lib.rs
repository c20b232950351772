pub mod chat;
pub mod codec;
pub mod comparison;
pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod service;
pub mod studio;
pub mod styles;
pub mod tui;
pub mod upload;
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{load_settings_from_dir, process_env, save_settings_to_dir};
use crate::gemini::GeminiClient;
use crate::studio::Studio;
use crate::utils::{ensure_data_dir, log_dir};

#[derive(Debug, Default)]
pub struct RunOptions {
    pub data_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub remember_key: bool,
    pub verbose: bool,
    pub image: Option<PathBuf>,
}

// ===== Startup =====

pub fn run(options: RunOptions) -> Result<()> {
    let data_dir = ensure_data_dir(options.data_dir.as_deref())?;
    let _log_guard = logging::init(&log_dir(&data_dir), options.verbose);

    let mut settings = load_settings_from_dir(&data_dir).with_model(options.model);
    if let Some(key) = options.api_key {
        settings.gemini_api_key = Some(key);
        if options.remember_key {
            save_settings_to_dir(&data_dir, &settings)?;
            tracing::info!("api key saved to settings");
        }
    }

    // A missing key is fatal here, before any UI is shown.
    let service_config = settings.into_service_config(process_env).map_err(|e| {
        tracing::error!(kind = e.kind(), "startup configuration incomplete");
        e
    })?;
    tracing::info!(
        model = %service_config.model,
        data_dir = %data_dir.display(),
        "starting design studio"
    );
    let client = GeminiClient::new(service_config)?;

    let image = options.image;
    let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    let result = rt.block_on(async move {
        let (handle, task) = Studio::spawn(Arc::new(client));
        let result = tui::run(handle, image).await;
        // The UI owned the last handle, so the intent channel is closed.
        task.await.ok();
        result
    });
    // An in-flight request must not hold the process open.
    rt.shutdown_timeout(Duration::from_millis(500));
    result
}
