//! The full reconcile-and-apply cycle.
//!
//! # Lifecycle
//!
//! 1. The UI (unprivileged) writes the staging file.
//! 2. [`Reconciler::run`] validates it, builds the context, writes the three
//!    target files and reloads networking.
//! 3. The staging file is deleted only after the reload succeeded; on any
//!    earlier failure it is left in place.

use std::path::Path;

use crate::apply::{Applier, Systemctl};
use crate::command::{CommandRunner, SystemRunner};
use crate::config::Deployment;
use crate::context::{Context, ContextBuilder};
use crate::error::{Error, Result};
use crate::params::Settings;
use crate::system_state::SystemState;
use crate::writer::ConfigWriter;

/// Drives one reconcile cycle.
///
/// # Example
///
/// ```rust,ignore
/// use netcop_configurador::{Deployment, Reconciler};
///
/// let reconciler = Reconciler::from_deployment(Deployment::default());
/// if reconciler.has_pending_input() {
///     reconciler.run()?;
/// }
/// ```
pub struct Reconciler<R, A> {
    deployment: Deployment,
    state: SystemState<R>,
    writer: ConfigWriter,
    applier: A,
}

impl Reconciler<SystemRunner, Systemctl> {
    /// A reconciler that queries the host with `ip` and reloads via `systemctl`.
    #[must_use]
    pub fn from_deployment(deployment: Deployment) -> Self {
        let runner = SystemRunner::new(deployment.network.query_timeout());
        let applier = Systemctl::new(deployment.network.reload_unit.clone());
        Self::new(deployment, runner, applier)
    }
}

impl<R: CommandRunner, A: Applier> Reconciler<R, A> {
    #[must_use]
    pub fn new(deployment: Deployment, runner: R, applier: A) -> Self {
        let state = SystemState::new(deployment.paths.clone(), runner)
            .with_probe_host(deployment.network.probe_host.clone());
        let writer = ConfigWriter::new(deployment.paths.clone());
        Self {
            deployment,
            state,
            writer,
            applier,
        }
    }

    /// Location of the staging file.
    #[must_use]
    pub fn temp_file(&self) -> &Path {
        &self.deployment.paths.temp_file
    }

    /// Returns `true` if the UI has left a staging file to process.
    #[must_use]
    pub fn has_pending_input(&self) -> bool {
        self.temp_file().is_file()
    }

    /// Runs the whole cycle and returns the context that was applied.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingInputFile`] if there is no staging file.
    /// - Any validation error, unchanged.
    /// - [`Error::NetworkQueryFailed`] if the network backfill fails.
    /// - [`Error::Io`] if a target cannot be written.
    /// - [`Error::ReloadFailed`] if networking could not be reloaded.
    pub fn run(&self) -> Result<Context> {
        if !self.has_pending_input() {
            return Err(Error::MissingInputFile {
                path: self.temp_file().to_path_buf(),
            });
        }

        let ctx = ContextBuilder::new(&self.deployment, &self.state).build_context()?;
        self.writer.write_all(&ctx)?;
        self.applier.reload()?;
        self.remove_temp_file();

        tracing::info!(dhcp = ?ctx.settings.dhcp, "Configuration applied");
        Ok(ctx)
    }

    /// Reads the configuration currently applied to the host.
    ///
    /// # Errors
    ///
    /// See [`SystemState::read_current_state`].
    pub fn current_state(&self) -> Result<Settings> {
        self.state.read_current_state()
    }

    fn remove_temp_file(&self) {
        let path = self.temp_file();
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed staging file"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove staging file"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::Paths;

    fn no_network(_: &str, _: &[&str]) -> Result<String> {
        Err(Error::query("network unavailable in test"))
    }

    #[test]
    fn full_cycle_writes_reloads_and_removes_input() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = Deployment::default().with_paths(Paths::under(dir.path()));
        std::fs::write(
            &deployment.paths.temp_file,
            "dhcp=si\ndns=1.1.1.1\nsubida=1024\nbajada=0\n",
        )
        .unwrap();

        let reloads = Cell::new(0);
        let applier = || -> Result<()> {
            reloads.set(reloads.get() + 1);
            Ok(())
        };
        let reconciler = Reconciler::new(deployment.clone(), no_network, applier);

        let ctx = reconciler.run().unwrap();
        assert_eq!(ctx.settings.dns1.as_deref(), Some("1.1.1.1"));
        assert_eq!(reloads.get(), 1);
        assert!(!reconciler.has_pending_input());

        let resolv = std::fs::read_to_string(&deployment.paths.resolv_conf).unwrap();
        assert!(resolv.contains("nameserver 1.1.1.1"));
    }

    #[test]
    fn missing_input_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = Deployment::default().with_paths(Paths::under(dir.path()));
        let applier = || -> Result<()> { panic!("reloaded without input") };
        let reconciler = Reconciler::new(deployment.clone(), no_network, applier);

        assert!(matches!(
            reconciler.run(),
            Err(Error::MissingInputFile { .. })
        ));
        assert!(!deployment.paths.resolv_conf.exists());
    }

    #[test]
    fn invalid_input_is_kept_and_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = Deployment::default().with_paths(Paths::under(dir.path()));
        std::fs::write(&deployment.paths.temp_file, "dhcp=maybe\nsubida=1\nbajada=1\n").unwrap();
        let applier = || -> Result<()> { panic!("reloaded after invalid input") };
        let reconciler = Reconciler::new(deployment.clone(), no_network, applier);

        let err = reconciler.run().unwrap_err();
        assert!(err.is_invalid_input());
        assert!(reconciler.has_pending_input());
        assert!(!deployment.paths.interfaces.exists());
        assert!(!deployment.paths.netcop_config.exists());
    }

    #[test]
    fn reload_failure_is_fatal_and_keeps_input() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = Deployment::default().with_paths(Paths::under(dir.path()));
        std::fs::write(&deployment.paths.temp_file, "dhcp=si\nsubida=1\nbajada=1\n").unwrap();
        let applier = || -> Result<()> {
            Err(Error::ReloadFailed {
                reason: "exit status: 1".into(),
            })
        };
        let reconciler = Reconciler::new(deployment, no_network, applier);

        assert!(matches!(reconciler.run(), Err(Error::ReloadFailed { .. })));
        assert!(reconciler.has_pending_input());
    }

    #[test]
    fn backfill_failure_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = Deployment::default().with_paths(Paths::under(dir.path()));
        std::fs::write(&deployment.paths.temp_file, "subida=1\nbajada=1\n").unwrap();
        let applier = || -> Result<()> { panic!("reloaded after failed query") };
        let reconciler = Reconciler::new(deployment.clone(), no_network, applier);

        let err = reconciler.run().unwrap_err();
        assert!(err.is_environment());
        assert!(!deployment.paths.resolv_conf.exists());
    }
}
