//! Configuration file locations and startup loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::script::{ScriptEngine, ScriptError};

/// Default user configuration, written on first run
const DEFAULT_RC: &str = include_str!("../python/gilrc.py");

const SYSTEM_DIR: &str = "/usr/share/gil";
const RC_NAME: &str = ".gilrc.py";
const PRELOAD_NAME: &str = "preload.py";
const HISTORY_NAME: &str = ".gil_history";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration {}: {source}", path.display())]
    UserConfig { path: PathBuf, source: ScriptError },
    #[error("failed to create configuration {}: {source}", path.display())]
    Seed { path: PathBuf, source: io::Error },
}

/// Where the shell looks for its scripts and history
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Preload scripts, tried in order until one loads
    pub preloads: Vec<PathBuf>,
    /// Per-user configuration; failing to load it is fatal
    pub user_config: PathBuf,
    /// Templates copied to `user_config` when it does not exist yet
    pub templates: Vec<PathBuf>,
    pub history: Option<PathBuf>,
    /// Directories appended to the script module search path
    pub lib_dirs: Vec<PathBuf>,
}

impl ConfigPaths {
    /// Standard locations relative to `home`, with an optional override for the user file
    pub fn new(home: Option<&Path>, user_config: Option<PathBuf>) -> Self {
        let system = PathBuf::from(SYSTEM_DIR);
        let home_or_cwd = home.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Self {
            preloads: vec![system.join(PRELOAD_NAME), PathBuf::from(PRELOAD_NAME)],
            user_config: user_config.unwrap_or_else(|| home_or_cwd.join(RC_NAME)),
            templates: vec![PathBuf::from(RC_NAME), system.join(RC_NAME)],
            history: home.map(|home| home.join(HISTORY_NAME)),
            lib_dirs: vec![PathBuf::from("lib"), system.join("lib")],
        }
    }
}

/// Create the user configuration if it does not exist yet
///
/// The first template that can be read is copied; otherwise the built-in
/// default is written. An existing file is never touched.
pub fn seed_user_config(paths: &ConfigPaths) -> Result<(), ConfigError> {
    let target = &paths.user_config;
    if target.exists() {
        return Ok(());
    }

    let contents = paths
        .templates
        .iter()
        .find_map(|template| fs::read_to_string(template).ok())
        .unwrap_or_else(|| DEFAULT_RC.to_string());

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Seed {
            path: target.clone(),
            source,
        })?;
    }
    fs::write(target, contents).map_err(|source| ConfigError::Seed {
        path: target.clone(),
        source,
    })?;

    tracing::info!(path = %target.display(), "created user configuration");
    Ok(())
}

/// Run the preload script, then the user configuration
///
/// A missing preload only warns; the user configuration must load.
pub fn load_configuration(
    engine: &mut impl ScriptEngine,
    paths: &ConfigPaths,
) -> Result<(), ConfigError> {
    let preloaded = paths.preloads.iter().any(|path| match engine.load_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded preload script");
            true
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "preload script not loaded");
            false
        }
    });

    if !preloaded {
        tracing::warn!("missing preload file, builtins may be missing");
    }

    engine
        .load_file(&paths.user_config)
        .map_err(|source| ConfigError::UserConfig {
            path: paths.user_config.clone(),
            source,
        })
}
