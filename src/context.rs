//! Building the rendering context from the staging file.

use crate::command::CommandRunner;
use crate::config::{Database, Deployment, Network};
use crate::error::Result;
use crate::merge::{merge, normalize_dhcp};
use crate::params::{Field, Params, Settings};
use crate::system_state::SystemState;
use crate::validate::Validator;

/// Everything the renderers need: validated settings plus deployment constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub settings: Settings,
    pub network: Network,
    pub database: Database,
}

/// Turns the staging file into a complete [`Context`].
///
/// The pipeline is linear and fail-stop:
/// read, validate, optionally backfill the live network settings, add the
/// deployment constants.
pub struct ContextBuilder<'a, R> {
    deployment: &'a Deployment,
    state: &'a SystemState<R>,
}

impl<'a, R: CommandRunner> ContextBuilder<'a, R> {
    #[must_use]
    pub const fn new(deployment: &'a Deployment, state: &'a SystemState<R>) -> Self {
        Self { deployment, state }
    }

    /// Reads the staging file and builds the context from it.
    ///
    /// # Errors
    ///
    /// Propagates read and validation errors unchanged, and
    /// [`Error::NetworkQueryFailed`](crate::Error::NetworkQueryFailed) when
    /// the backfill lookup fails.
    pub fn build_context(&self) -> Result<Context> {
        let params = Params::read(&self.deployment.paths.temp_file)?;
        self.build_from(&params)
    }

    /// Builds the context from already-parsed parameters.
    ///
    /// # Errors
    ///
    /// See [`build_context`](Self::build_context).
    pub fn build_from(&self, params: &Params) -> Result<Context> {
        Validator::new()
            .strict_static(self.deployment.validation.strict_static)
            .validate(params)?;

        let mut settings = Settings::default();
        merge(&mut settings, params);

        // No network fields at all means "leave the network as it is".
        if params.non_empty(Field::Dhcp).is_none() && params.non_empty(Field::Ip).is_none() {
            let snapshot = self.state.network_snapshot()?;
            tracing::info!(
                ip = %snapshot.ip,
                gateway = %snapshot.gateway,
                "No network settings supplied, keeping current addressing"
            );
            merge(&mut settings, &snapshot.to_params());
        }
        normalize_dhcp(&mut settings);

        Ok(Context {
            settings,
            network: self.deployment.network.clone(),
            database: self.deployment.database.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::Paths;
    use crate::error::Error;

    const ROUTE: &str = "8.8.8.8 via 192.168.0.1 dev br0 src 192.168.0.10 uid 0\n";
    const ADDR: &str = "    inet 192.168.0.10/24 brd 192.168.0.255 scope global br0\n";

    fn deployment(dir: &std::path::Path) -> Deployment {
        Deployment::default().with_paths(Paths::under(dir))
    }

    #[test]
    fn dhcp_supplied_skips_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        std::fs::write(
            &deployment.paths.temp_file,
            "dhcp=si\nsubida=1024\nbajada=0\n",
        )
        .unwrap();

        let calls = Cell::new(0);
        let runner = |_: &str, _: &[&str]| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok(String::new())
        };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_context()
            .unwrap();

        assert_eq!(ctx.settings.dhcp.as_deref(), Some("si"));
        assert_eq!(ctx.settings.subida.as_deref(), Some("1024"));
        assert_eq!(ctx.settings.bajada.as_deref(), Some("0"));
        assert_eq!(ctx.settings.ip, None);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn static_supplied_skips_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        let params = Params::parse(
            "ip=1.1.1.1\nmascara=255.0.0.0\ngateway=1.0.0.1\ndns1=1.0.0.1\nsubida=1\nbajada=1\n",
        )
        .unwrap();

        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_from(&params)
            .unwrap();

        assert_eq!(ctx.settings.ip.as_deref(), Some("1.1.1.1"));
        assert_eq!(ctx.settings.mascara.as_deref(), Some("255.0.0.0"));
        assert_eq!(ctx.settings.dhcp.as_deref(), Some("no"));
    }

    #[test]
    fn omitted_network_is_backfilled_from_live_query() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        std::fs::write(&deployment.paths.temp_file, "subida=1\nbajada=1\n").unwrap();

        let runner = |_: &str, args: &[&str]| -> Result<String> {
            Ok(if args.contains(&"route") { ROUTE } else { ADDR }.to_string())
        };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_context()
            .unwrap();

        assert_eq!(ctx.settings.ip.as_deref(), Some("192.168.0.10"));
        assert_eq!(ctx.settings.mascara.as_deref(), Some("255.255.255.0"));
        assert_eq!(ctx.settings.gateway.as_deref(), Some("192.168.0.1"));
        assert_eq!(ctx.settings.dhcp.as_deref(), Some("no"));
    }

    #[test]
    fn empty_ip_counts_as_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        let params = Params::parse("ip=\nsubida=1\nbajada=1").unwrap();

        let calls = Cell::new(0);
        let runner = |_: &str, args: &[&str]| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok(if args.contains(&"route") { ROUTE } else { ADDR }.to_string())
        };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_from(&params)
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(ctx.settings.ip.as_deref(), Some("192.168.0.10"));
        assert_eq!(ctx.settings.gateway.as_deref(), Some("192.168.0.1"));
    }

    #[test]
    fn dns_input_lands_in_a_slot() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        let params = Params::parse("dhcp=SI\ndns=8.8.4.4\nsubida=1\nbajada=2\n").unwrap();

        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_from(&params)
            .unwrap();

        assert_eq!(ctx.settings.dhcp.as_deref(), Some("si"));
        assert_eq!(ctx.settings.dns1.as_deref(), Some("8.8.4.4"));
        assert_eq!(ctx.settings.dns2, None);
    }

    #[test]
    fn validation_failure_aborts_before_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        std::fs::write(&deployment.paths.temp_file, "subida=1\n").unwrap();

        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let err = ContextBuilder::new(&deployment, &state)
            .build_context()
            .unwrap_err();
        assert!(matches!(err, Error::MissingBandwidthLimits));
    }

    #[test]
    fn strict_policy_comes_from_deployment() {
        let dir = tempfile::tempdir().unwrap();
        let mut deployment = deployment(dir.path());
        deployment.validation.strict_static = true;
        let params = Params::parse("dhcp=no\nsubida=1\nbajada=1\n").unwrap();

        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let err = ContextBuilder::new(&deployment, &state)
            .build_from(&params)
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteStaticConfig));
    }

    #[test]
    fn missing_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = deployment(dir.path());
        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let err = ContextBuilder::new(&deployment, &state)
            .build_context()
            .unwrap_err();
        assert!(matches!(err, Error::MissingInputFile { .. }));
    }

    #[test]
    fn deployment_constants_are_carried() {
        let dir = tempfile::tempdir().unwrap();
        let mut deployment = deployment(dir.path());
        deployment.database.host = "db.lan".into();
        let params = Params::parse("dhcp=si\nsubida=1\nbajada=1\n").unwrap();

        let runner = |_: &str, _: &[&str]| -> Result<String> { panic!("queried the network") };
        let state = SystemState::new(deployment.paths.clone(), runner);
        let ctx = ContextBuilder::new(&deployment, &state)
            .build_from(&params)
            .unwrap();
        assert_eq!(ctx.database.host, "db.lan");
        assert_eq!(ctx.network.bridge, "br0");
    }
}
