use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

pub fn app_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("app", "design-studio", "design-studio")
        .ok_or_else(|| anyhow!("cannot resolve project dirs"))
}

pub fn ensure_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let data_dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => app_dirs()?.data_dir().to_path_buf(),
    };
    fs::create_dir_all(&data_dir).context("create data dir")?;
    Ok(data_dir)
}

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}
