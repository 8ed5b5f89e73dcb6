//! # netcop-configurador
//!
//! Reconcile the host's network, resolver and bandwidth settings against a
//! staging file written by an unprivileged UI.
//!
//! The UI cannot touch `/etc`, so it drops `key=value` pairs into
//! `/tmp/netcop-cfg.tmp` and this crate, running as root, turns them into
//! validated configuration. Anything the UI leaves out is taken from the
//! state currently applied to the host.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use netcop_configurador::{Deployment, Reconciler};
//!
//! let deployment = Deployment::load("/etc/netcop/configurador.toml".as_ref())?;
//! let reconciler = Reconciler::from_deployment(deployment);
//!
//! // Validate, write interfaces/resolv.conf/netcop.config, reload networking.
//! let ctx = reconciler.run()?;
//! ```
//!
//! ## Staging file
//!
//! ```text
//! dhcp=no
//! ip=192.168.1.253
//! mascara=255.255.255.0
//! gateway=192.168.1.1
//! dns1=192.168.1.1
//! subida=100
//! bajada=50
//! ```
//!
//! `subida` and `bajada` are always required. Static addressing is
//! all-or-nothing: `ip`, `mascara`, `gateway` and `dns1` together. When
//! neither `dhcp` nor `ip` is given, the current address, mask and gateway
//! are kept.
//!
//! ## Pipeline
//!
//! - [`validate`]: format and cross-field checks, no I/O.
//! - [`merge`]: precedence between sources and `dns` slot assignment.
//! - [`system_state`]: current settings from files and `ip` queries.
//! - [`context`]: read, validate, backfill, add deployment constants.
//! - [`render`] / [`writer`] / [`apply`]: output and reload.
//!
//! ## Permissions
//!
//! Writing the targets and reloading networking require root. The caller is
//! responsible for privilege elevation and for making sure only one
//! invocation runs at a time.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod apply;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod merge;
pub mod params;
pub mod reconcile;
pub mod render;
pub mod system_state;
pub mod util;
pub mod validate;
pub mod writer;

pub use apply::{Applier, Systemctl};
pub use command::{CommandRunner, SystemRunner};
pub use config::{Deployment, Paths};
pub use context::{Context, ContextBuilder};
pub use error::{Error, Result};
pub use params::{Field, Params, Settings};
pub use reconcile::Reconciler;
pub use system_state::{NetworkSnapshot, SystemState, prefix_to_mask};
pub use validate::Validator;
pub use writer::ConfigWriter;
