//! Deployment configuration.
//!
//! Everything here is fixed per installation and loaded once from
//! `/etc/netcop/configurador.toml`. A missing file means the built-in
//! defaults, which match a stock Debian bridge deployment.
//!
//! # Example
//!
//! ```
//! use netcop_configurador::Deployment;
//!
//! let deployment = Deployment::from_toml_str(
//!     r#"
//!     [network]
//!     bridge = "br1"
//!
//!     [validation]
//!     strict_static = true
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(deployment.network.bridge, "br1");
//! assert_eq!(deployment.network.inside, "eth1");
//! assert!(deployment.validation.strict_static);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default location of the deployment config file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/netcop/configurador.toml";

/// Complete deployment configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Deployment {
    pub paths: Paths,
    pub network: Network,
    pub database: Database,
    pub validation: Validation,
}

impl Deployment {
    /// Loads `path`, falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No deployment config, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        Self::from_toml_str(&raw).map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns the parser's message on malformed input or unknown keys.
    pub fn from_toml_str(raw: &str) -> std::result::Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }

    /// Overrides the file locations.
    #[must_use]
    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths = paths;
        self
    }
}

/// Files read and written by the reconcile cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    /// Staging file written by the UI.
    pub temp_file: PathBuf,
    /// Network interface descriptor.
    pub interfaces: PathBuf,
    /// Resolver file.
    pub resolv_conf: PathBuf,
    /// Application file carrying the bandwidth limits.
    pub netcop_config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            temp_file: PathBuf::from("/tmp/netcop-cfg.tmp"),
            interfaces: PathBuf::from("/etc/network/interfaces.d/br0"),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
            netcop_config: PathBuf::from("/etc/netcop/netcop.config"),
        }
    }
}

impl Paths {
    /// Places every file under `dir`, keeping the default file names.
    /// Useful for testing.
    #[must_use]
    pub fn under(dir: &Path) -> Self {
        Self {
            temp_file: dir.join("netcop-cfg.tmp"),
            interfaces: dir.join("br0"),
            resolv_conf: dir.join("resolv.conf"),
            netcop_config: dir.join("netcop.config"),
        }
    }
}

/// Bridge layout and OS query settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Network {
    /// Bridge interface the descriptor configures.
    pub bridge: String,
    /// LAN-facing port.
    pub inside: String,
    /// WAN-facing port.
    pub outside: String,
    /// External host whose route reveals the default gateway.
    pub probe_host: String,
    /// Upper bound for each `ip` query.
    pub query_timeout_secs: u64,
    /// systemd unit reloaded after writing.
    pub reload_unit: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            bridge: "br0".to_string(),
            inside: "eth1".to_string(),
            outside: "eth0".to_string(),
            probe_host: "8.8.8.8".to_string(),
            query_timeout_secs: 5,
            reload_unit: "networking.service".to_string(),
        }
    }
}

impl Network {
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Database connection constants handed through to the application file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Database {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "netcop".to_string(),
            user: "netcop".to_string(),
            password: String::new(),
        }
    }
}

/// Validation policy switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Validation {
    /// When set, `dhcp=no` requires ip, mascara, gateway and dns1 instead of
    /// falling back to the live network settings.
    pub strict_static: bool,
}
