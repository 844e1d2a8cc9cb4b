//! Configuration loading for charla: project `.env` plus the `[env]` table
//! of `$XDG_CONFIG_HOME/charla/config.toml`, applied to the process
//! environment with priority: **existing env > .env > config.toml**.
//!
//! Keys consumed elsewhere in the workspace: `GEMINI_API_KEY`,
//! `CHARLA_TRANSPORT`, `CHARLA_API_URL`, `CHARLA_WS_URL`, `PORT`.

mod env_file;
mod xdg;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read config.toml: {0}")]
    ConfigRead(std::io::Error),
    #[error("parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    EnvFileRead(std::io::Error),
}

/// Loads both sources and sets every key that is not already present in the
/// process environment (existing env always wins; `.env` beats config.toml).
///
/// * `app_name`: XDG path component, e.g. `"charla"`.
/// * `project_dir`: where to look for `.env`; current directory when `None`.
pub fn load_and_apply(app_name: &str, project_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_table = xdg::load_env_table(app_name)?;
    let env_table = env_file::load(project_dir).map_err(LoadError::EnvFileRead)?;

    let mut keys: Vec<&String> = xdg_table.keys().chain(env_table.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        if std::env::var(key).is_ok() {
            continue; // existing env wins
        }
        if let Some(value) = env_table.get(key).or_else(|| xdg_table.get(key)) {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}
