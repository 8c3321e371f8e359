//! Locating and loading the session store configuration.
//!
//! An explicit file (`--config`) is the only file read when given, and it
//! must exist and parse. Otherwise the user file is read and
//! `./cassession.toml` is merged over it; either may be absent.
//!
//! Problems that do not stop loading are collected as [`LoadWarning`]s. The
//! merged `[session_handler]` section is checked the way the store will check
//! it, so a bad keyspace or lifetime is reported without contacting a cluster.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::PASSWORD_ENV;
use crate::{CassessionConfig, ConfigError, Result};

/// File name looked up in the working (or project) directory.
pub const PROJECT_CONFIG_FILE: &str = "cassession.toml";

/// File name inside the user config directory.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the user config directory.
pub const CONFIG_DIR_ENV: &str = "CASSESSION_CONFIG_DIR";

/// Where a config file sits in the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Passed explicitly; no other file is read.
    Explicit,
    /// The user config directory.
    User,
    /// The project directory, merged over the user file.
    Project,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Origin::Explicit => "explicit",
            Origin::User => "user",
            Origin::Project => "project",
        })
    }
}

/// A file that was considered while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: Origin,
    pub path: PathBuf,
    pub loaded: bool,
}

/// A problem found while loading that did not abort it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A discovered file could not be read or parsed and was skipped.
    Skipped { path: PathBuf, reason: String },
    /// A file stores the cluster password in plain text.
    PlaintextPassword { path: PathBuf },
    /// The merged `[session_handler]` section would be rejected by the store.
    InvalidSessionHandler { reason: String },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::Skipped { path, reason } => {
                write!(f, "Failed to load {}: {reason}", path.display())
            }
            LoadWarning::PlaintextPassword { path } => write!(
                f,
                "{} contains a plaintext cluster password. Consider setting {PASSWORD_ENV} instead.",
                path.display()
            ),
            LoadWarning::InvalidSessionHandler { reason } => {
                write!(f, "[session_handler] is not usable: {reason}")
            }
        }
    }
}

/// Merged configuration plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CassessionConfig,
    /// Files considered, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadedConfig {
    /// Paths of the files that were actually read.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Builder for a configuration lookup.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    user_dir: Option<PathBuf>,
    project_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read only `path`, skipping discovery.
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    /// Use `dir` instead of `CASSESSION_CONFIG_DIR` or the platform default.
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    /// Look for the project file in `dir` instead of the working directory.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// Files this loader will consider, lowest precedence first.
    pub fn candidates(&self) -> Vec<(Origin, PathBuf)> {
        if let Some(ref file) = self.file {
            return vec![(Origin::Explicit, file.clone())];
        }

        let user = self
            .user_dir
            .clone()
            .or_else(user_config_dir)
            .map(|dir| (Origin::User, dir.join(USER_CONFIG_FILE)));
        let project = match self.project_dir {
            Some(ref dir) => dir.join(PROJECT_CONFIG_FILE),
            None => PathBuf::from(PROJECT_CONFIG_FILE),
        };

        user.into_iter()
            .chain(std::iter::once((Origin::Project, project)))
            .collect()
    }

    /// Read and merge the candidate files.
    ///
    /// Fails only when an explicit file cannot be read or parsed.
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut loaded = LoadedConfig {
            config: CassessionConfig::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        };

        for (origin, path) in self.candidates() {
            let layer = match origin {
                Origin::Explicit => Some(load_config_file(&path)?),
                _ if !path.is_file() => None,
                _ => match load_config_file(&path) {
                    Ok(layer) => Some(layer),
                    Err(e) => {
                        loaded.warnings.push(LoadWarning::Skipped {
                            path: path.clone(),
                            reason: e.to_string(),
                        });
                        None
                    }
                },
            };

            let read = layer.is_some();
            if let Some(layer) = layer {
                if layer
                    .cassandra_cluster
                    .as_ref()
                    .is_some_and(|c| c.has_plaintext_password())
                {
                    loaded
                        .warnings
                        .push(LoadWarning::PlaintextPassword { path: path.clone() });
                }
                loaded.config.merge(layer);
            }
            loaded.sources.push(ConfigSource {
                origin,
                path,
                loaded: read,
            });
        }

        if let Err(e) = loaded.config.session_handler().resolve() {
            loaded.warnings.push(LoadWarning::InvalidSessionHandler {
                reason: e.to_string(),
            });
        }

        Ok(loaded)
    }
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<CassessionConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    CassessionConfig::from_toml(&contents)
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &CassessionConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    }
}

/// The user config directory: `CASSESSION_CONFIG_DIR`, else `<config dir>/cassession`.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("cassession")),
    }
}

/// The user config file.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}
