//! Trigger-send abstractions.

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// Trait describing how a wake trigger reaches a single MAC address.
pub trait TriggerSender {
    fn send(&self, mac: &str) -> Result<SendOutcome>;
}

/// Exit status reported by one helper invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// `None` when the helper was terminated by a signal.
    pub code: Option<i32>,
}

impl SendOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the external `ether-wake` helper with the MAC as its only argument.
#[derive(Debug, Clone)]
pub struct HelperCommand {
    path: PathBuf,
}

impl HelperCommand {
    /// Helper at `path`; it is not checked until the first send.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TriggerSender for HelperCommand {
    fn send(&self, mac: &str) -> Result<SendOutcome> {
        tracing::debug!(helper = %self.path.display(), mac, "running helper");
        let status = Command::new(&self.path)
            .arg(mac)
            .status()
            .map_err(|source| Error::HelperSpawn {
                path: self.path.clone(),
                source,
            })?;
        Ok(SendOutcome {
            code: status.code(),
        })
    }
}

/// Blocking wait between the two sends of a reset.
pub trait Pause {
    fn pause(&self, delay: Duration);
}

/// Sleeps the calling thread.
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn outcome_success_needs_zero_exit() {
        assert!(SendOutcome { code: Some(0) }.success());
        assert!(!SendOutcome { code: Some(1) }.success());
        assert!(!SendOutcome { code: None }.success());
    }

    #[test]
    fn helper_exit_status_is_reported() {
        let (truthy, falsy) = (Path::new("/bin/true"), Path::new("/bin/false"));
        if !truthy.is_file() || !falsy.is_file() {
            return;
        }
        let ok = HelperCommand::new(truthy).send("00:11:22:33:44:55").unwrap();
        assert_eq!(ok.code, Some(0));
        let failed = HelperCommand::new(falsy).send("00:11:22:33:44:55").unwrap();
        assert!(!failed.success());
    }

    #[test]
    fn missing_helper_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let helper = HelperCommand::new(dir.path().join("ether-wake"));
        assert!(matches!(
            helper.send("00:11:22:33:44:55"),
            Err(Error::HelperSpawn { .. })
        ));
    }
}
