//! Asking the OS to pick up the new network configuration.

use std::process::Command;

use crate::error::{Error, Result};

/// Triggers a reload of the network configuration.
pub trait Applier {
    /// # Errors
    ///
    /// Returns [`Error::ReloadFailed`] if the reload did not succeed.
    fn reload(&self) -> Result<()>;
}

impl<F> Applier for F
where
    F: Fn() -> Result<()>,
{
    fn reload(&self) -> Result<()> {
        self()
    }
}

/// Reloads a systemd unit with `systemctl reload`.
#[derive(Debug, Clone)]
pub struct Systemctl {
    unit: String,
}

impl Systemctl {
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    /// The unit this applier reloads.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new("networking.service")
    }
}

impl Applier for Systemctl {
    fn reload(&self) -> Result<()> {
        tracing::info!(unit = %self.unit, "Reloading network configuration");
        let status = Command::new("systemctl")
            .args(["reload", self.unit.as_str()])
            .status()
            .map_err(|e| Error::ReloadFailed {
                reason: format!("systemctl: {e}"),
            })?;

        if !status.success() {
            tracing::error!(unit = %self.unit, %status, "Reload failed");
            return Err(Error::ReloadFailed {
                reason: format!("systemctl reload {}: {status}", self.unit),
            });
        }
        Ok(())
    }
}
