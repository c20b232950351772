use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StudioError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Everything the generation client needs, with defaults applied.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

pub fn load_settings_from_dir(data_dir: &Path) -> Settings {
    let path = settings_path(data_dir);
    if let Ok(bytes) = fs::read(&path) {
        if let Ok(s) = serde_json::from_slice::<Settings>(&bytes) {
            return s;
        }
        tracing::warn!(path = %path.display(), "ignoring unparsable settings file");
    }
    Settings::default()
}

pub fn save_settings_to_dir(data_dir: &Path, s: &Settings) -> Result<()> {
    let path = settings_path(data_dir);
    let json = serde_json::to_vec_pretty(s)?;
    fs::write(path, json).context("write settings")?;
    Ok(())
}

impl Settings {
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if model.is_some() {
            self.model = model;
        }
        self
    }

    /// Settings file first, then the environment.
    pub fn resolve_api_key(&self, env: impl Fn(&str) -> Option<String>) -> Result<String, StudioError> {
        self.gemini_api_key
            .clone()
            .or_else(|| API_KEY_VARS.iter().find_map(|var| env(var)))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                StudioError::ConfigurationMissing(format!(
                    "API key not set (add gemini_api_key to settings.json or export {})",
                    API_KEY_VARS.join(" / ")
                ))
            })
    }

    pub fn into_service_config(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ServiceConfig, StudioError> {
        let api_key = self.resolve_api_key(env)?;
        Ok(ServiceConfig {
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

pub fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}
