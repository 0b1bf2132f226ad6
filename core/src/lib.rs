//! Core crate for `etherwake`: node registry, trigger dispatch and the
//! settings that tie them to the powerman library layout.

pub mod config;
pub mod dispatch;
pub mod privilege;
pub mod registry;
pub mod runner;

pub use config::{load_settings_file, ResolvedPaths, Settings, SettingsFile};
pub use dispatch::{Action, DispatchReport, Dispatcher, Scope, RESET_DELAY};
pub use registry::Registry;
pub use runner::{HelperCommand, Pause, SendOutcome, ThreadSleep, TriggerSender};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Common error type for the etherwake core.
#[derive(Debug, Error)]
pub enum Error {
    /// The node configuration file could not be opened.
    #[error("Couldn't find configuration file: {}", path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The trigger-send utility is not a regular file.
    #[error("Couldn't find the utility: {}", .0.display())]
    MissingHelper(PathBuf),

    /// The powerman library directory does not exist.
    #[error("Couldn't find library directory: {}", .0.display())]
    LibraryDirNotFound(PathBuf),

    /// The action keyword is not `on`, `off` or `reset`.
    #[error("{0} is not a recognized command")]
    InvalidAction(String),

    /// The caller is not uid 0.
    #[error("You must be root to run this")]
    PermissionDenied,

    /// `id -u` could not be run or exited nonzero.
    #[error("error attempting to determine id -u: {0}")]
    PrivilegeCheck(String),

    /// The helper binary could not be started at all.
    #[error("failed to run {}: {source}", path.display())]
    HelperSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML settings file could not be read.
    #[error("failed to read settings file {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML settings file is malformed or has unknown keys.
    #[error("invalid settings file {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Read failure while parsing the node table.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Resolve paths, load the registry and send `settings.action` to
/// `settings.scope` through the configured helper.
///
/// Every fatal condition is raised before the first send.
pub fn run(settings: &Settings) -> Result<DispatchReport> {
    let paths = settings.resolve()?;
    tracing::debug!(
        library_dir = %paths.library_dir.display(),
        config = %paths.config_file.display(),
        helper = %paths.helper.display(),
        fanout = settings.fanout,
        "resolved paths"
    );
    run_with(settings, &paths.config_file, HelperCommand::new(paths.helper), ThreadSleep)
}

/// Load the registry at `config_file` and dispatch with the given sender.
pub fn run_with<S: TriggerSender, P: Pause>(
    settings: &Settings,
    config_file: &Path,
    sender: S,
    pause: P,
) -> Result<DispatchReport> {
    let registry = Registry::load(config_file)?;
    tracing::debug!(nodes = registry.len(), "registry loaded");
    Ok(Dispatcher::new(&registry, sender, pause)
        .with_reset_delay(settings.reset_delay)
        .run(&settings.scope, settings.action))
}
