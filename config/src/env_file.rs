//! Read a project `.env` into a key-value map (applied to the environment in lib).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `.env` in `override_dir` if given, else in the current directory.
fn env_file_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Parses `.env` with the `dotenv` crate without touching the environment. A missing
/// file yields an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = env_file_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let iter = dotenv::from_path_iter(&path).map_err(|e| LoadError::Dotenv {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let mut out = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| LoadError::Dotenv {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        out.insert(key, value);
    }
    tracing::debug!(path = %path.display(), keys = out.len(), ".env loaded");
    Ok(out)
}
