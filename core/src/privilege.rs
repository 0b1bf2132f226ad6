//! Root check performed once before anything is sent.

use crate::{Error, Result};
use std::process::Command;

/// Fail with [`Error::PermissionDenied`] unless the caller runs as uid 0.
pub fn ensure_root() -> Result<()> {
    let output = Command::new("id")
        .arg("-u")
        .output()
        .map_err(|err| Error::PrivilegeCheck(err.to_string()))?;
    if !output.status.success() {
        return Err(Error::PrivilegeCheck(format!("id -u exited with {}", output.status)));
    }
    if uid_is_root(&String::from_utf8_lossy(&output.stdout)) {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

/// Interpret the stdout of `id -u`.
pub fn uid_is_root(id_output: &str) -> bool {
    id_output.trim() == "0"
}
