//! Locating and reading the sheet configuration.

use directories::ProjectDirs;
use gridcalc_core::SheetConfig;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Load the configuration from `explicit`, or from the user config dir when
/// `explicit` is None and `user_config` is set.
///
/// Problems are returned as warnings alongside the defaults; a missing user
/// config file is not a problem.
pub fn load_config(explicit: Option<&Path>, user_config: bool) -> (SheetConfig, Vec<String>) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None if user_config => match user_config_path() {
            Some(path) if path.exists() => path,
            _ => return (SheetConfig::default(), Vec::new()),
        },
        None => return (SheetConfig::default(), Vec::new()),
    };

    match read_config(&path) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            (config, Vec::new())
        }
        Err(err) => (SheetConfig::default(), vec![err.to_string()]),
    }
}

pub fn read_config(path: &Path) -> Result<SheetConfig, ConfigError> {
    let meta = std::fs::metadata(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: MAX_CONFIG_FILE_BYTES,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("me", "gridcalc", "gridcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}
