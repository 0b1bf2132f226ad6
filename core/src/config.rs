//! Runtime settings and the paths derived from them.

use crate::dispatch::{Action, Scope, RESET_DELAY};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LIBRARY_DIR: &str = "/usr/lib/powerman/";
pub const DEFAULT_CONFIG_FILE: &str = "etc/etherwake.conf";
pub const DEFAULT_HELPER: &str = "lib/ether-wake";
pub const DEFAULT_FANOUT: usize = 256;

/// Environment variable overriding the library directory.
pub const LIBRARY_DIR_ENV: &str = "POWERMANDIR";

/// Optional TOML defaults file.
///
/// Expected TOML keys, all optional:
/// - `library_dir` as a path
/// - `config_file` and `helper` as paths, relative ones resolved under `library_dir`
/// - `reset_delay_secs` as an integer
/// - `fanout` as an integer
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub library_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub helper: Option<PathBuf>,
    pub reset_delay_secs: Option<u64>,
    pub fanout: Option<usize>,
}

/// Load a [`SettingsFile`] from disk.
pub fn load_settings_file(path: impl AsRef<Path>) -> Result<SettingsFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| Error::SettingsParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Everything one invocation needs, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub library_dir: PathBuf,
    pub config_file: PathBuf,
    pub helper: PathBuf,
    pub reset_delay: Duration,
    /// Accepted for compatibility with the other powerman tools; sends stay sequential.
    pub fanout: usize,
    pub action: Action,
    pub scope: Scope,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from(DEFAULT_LIBRARY_DIR),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            helper: PathBuf::from(DEFAULT_HELPER),
            reset_delay: RESET_DELAY,
            fanout: DEFAULT_FANOUT,
            action: Action::default(),
            scope: Scope::Nodes(Vec::new()),
        }
    }
}

/// Absolute locations checked before any trigger is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub library_dir: PathBuf,
    pub config_file: PathBuf,
    pub helper: PathBuf,
}

impl Settings {
    /// Overlay values present in a settings file.
    pub fn apply_file(&mut self, file: SettingsFile) {
        if let Some(dir) = file.library_dir {
            self.library_dir = dir;
        }
        if let Some(config) = file.config_file {
            self.config_file = config;
        }
        if let Some(helper) = file.helper {
            self.helper = helper;
        }
        if let Some(secs) = file.reset_delay_secs {
            self.reset_delay = Duration::from_secs(secs);
        }
        if let Some(fanout) = file.fanout {
            self.fanout = fanout;
        }
    }

    /// Take the library directory from `POWERMANDIR`-style input, but only
    /// when it names an existing directory.
    pub fn apply_env_library_dir(&mut self, value: Option<impl Into<PathBuf>>) {
        if let Some(dir) = value.map(Into::into) {
            if dir.is_dir() {
                self.library_dir = dir;
            } else {
                tracing::debug!(dir = %dir.display(), "ignoring {LIBRARY_DIR_ENV}, not a directory");
            }
        }
    }

    /// Check the library directory and helper, and place relative paths under
    /// the library directory.
    pub fn resolve(&self) -> Result<ResolvedPaths> {
        if !self.library_dir.is_dir() {
            return Err(Error::LibraryDirNotFound(self.library_dir.clone()));
        }
        let helper = self.library_dir.join(&self.helper);
        if !helper.is_file() {
            return Err(Error::MissingHelper(helper));
        }
        Ok(ResolvedPaths {
            library_dir: self.library_dir.clone(),
            config_file: self.library_dir.join(&self.config_file),
            helper,
        })
    }
}
