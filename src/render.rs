//! Rendering the context into the three target file formats.
//!
//! Output is deterministic: the same context always renders to the same
//! bytes, and every file reads back through the system-state scanner to the
//! values it was rendered from.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::Paths;
use crate::context::Context;

/// Marker comment at the top of every rendered file.
pub const MANAGED_BY_MARKER: &str = "# managed by netcop-configurador, do not edit";

/// One of the files produced by a reconcile cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Network interface descriptor.
    Interfaces,
    /// Resolver file.
    ResolvConf,
    /// Application file with the bandwidth limits.
    NetcopConfig,
}

impl Target {
    /// All targets, in write order.
    pub const ALL: [Self; 3] = [Self::Interfaces, Self::ResolvConf, Self::NetcopConfig];

    /// Where this target lives.
    #[must_use]
    pub fn path(self, paths: &Paths) -> &Path {
        match self {
            Self::Interfaces => &paths.interfaces,
            Self::ResolvConf => &paths.resolv_conf,
            Self::NetcopConfig => &paths.netcop_config,
        }
    }

    /// Renders this target's content.
    #[must_use]
    pub fn render(self, ctx: &Context) -> String {
        match self {
            Self::Interfaces => render_interfaces(ctx),
            Self::ResolvConf => render_resolv_conf(ctx),
            Self::NetcopConfig => render_netcop_config(ctx),
        }
    }
}

/// ```text
/// auto br0
/// iface br0 inet static
///     bridge_ports eth0 eth1
///     address 192.168.1.253
///     netmask 255.255.255.0
///     gateway 192.168.1.1
/// ```
fn render_interfaces(ctx: &Context) -> String {
    let net = &ctx.network;
    let s = &ctx.settings;
    let method = if s.is_dhcp() { "dhcp" } else { "static" };

    let mut out = format!(
        "{MANAGED_BY_MARKER}\nauto {bridge}\niface {bridge} inet {method}\n    bridge_ports {outside} {inside}\n",
        bridge = net.bridge,
        outside = net.outside,
        inside = net.inside,
    );
    if !s.is_dhcp() {
        for (key, value) in [
            ("address", &s.ip),
            ("netmask", &s.mascara),
            ("gateway", &s.gateway),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "    {key} {value}");
            }
        }
    }
    out
}

fn render_resolv_conf(ctx: &Context) -> String {
    let mut out = format!("{MANAGED_BY_MARKER}\n");
    for ns in [&ctx.settings.dns1, &ctx.settings.dns2].into_iter().flatten() {
        let _ = writeln!(out, "nameserver {ns}");
    }
    out
}

fn render_netcop_config(ctx: &Context) -> String {
    let s = &ctx.settings;
    let db = &ctx.database;
    format!(
        "{MANAGED_BY_MARKER}\n\
         [netcop]\n\
         velocidad_bajada={bajada}\n\
         velocidad_subida={subida}\n\
         inside={inside}\n\
         outside={outside}\n\
         \n\
         [database]\n\
         host={host}\n\
         port={port}\n\
         name={name}\n\
         user={user}\n\
         password={password}\n",
        bajada = s.bajada.as_deref().unwrap_or("0"),
        subida = s.subida.as_deref().unwrap_or("0"),
        inside = ctx.network.inside,
        outside = ctx.network.outside,
        host = db.host,
        port = db.port,
        name = db.name,
        user = db.user,
        password = db.password,
    )
}
