//! Load `[env]` table from `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set and non-empty, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".to_string()))
}

/// Path of the app's `config.toml` (whether or not it exists).
pub fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    Ok(config_home()?.join(app_name).join("config.toml"))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Returns `[env]` pairs from the file at `path`. Missing file or section gives an empty map.
pub fn read_env_table(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), keys = config.env.len(), "xdg config loaded");
    Ok(config.env)
}

/// Returns env key-value pairs from the app's `[env]` section.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    read_env_table(&config_path(app_name)?)
}
