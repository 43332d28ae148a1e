//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! The XDG file is `$XDG_CONFIG_HOME/<app>/config.toml` (platform config dir when unset)
//! and only its `[env]` table is read:
//!
//! ```toml
//! [env]
//! OPENAI_BASE_URL = "http://localhost:11434/v1"
//! TEXT2SQL_DATABASE = "/srv/uicinfocenter.db"
//! ```

mod env_file;
mod xdg_toml;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env {path}: {message}")]
    Dotenv { path: String, message: String },
}

/// Path of `<app_name>`'s XDG `config.toml`.
pub fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    xdg_toml::config_path(app_name)
}

/// Picks, for each key in either map, the `.env` value over the XDG value, skipping keys
/// for which `is_set` is true.
fn merge(
    dotenv_map: HashMap<String, String>,
    xdg_map: HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for (key, value) in xdg_map.into_iter().chain(dotenv_map) {
        if !is_set(&key) {
            out.insert(key, value);
        }
    }
    out
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set.
///
/// * `app_name`: e.g. `"text2sql"`; used for the XDG path.
/// * `override_dir`: if `Some`, look for `.env` in this directory instead of the current one.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;
    let apply = merge(dotenv_map, xdg_map, |k| std::env::var_os(k).is_some());
    for (key, value) in apply {
        std::env::set_var(key, value);
    }
    Ok(())
}
