//! Reading the configuration currently applied to the host.
//!
//! Two independent inputs are combined:
//!
//! 1. Text sources, scanned in a fixed order: the interface descriptor, the
//!    application file and the resolver file. Each line is offered to a small
//!    set of matchers; hits are merged in textual order, so the first
//!    `nameserver` seen becomes `dns1`.
//! 2. The live network stack, queried through `ip`: the default route gives
//!    the gateway and egress device, the device's primary address gives the
//!    ip and prefix length.

use std::net::Ipv4Addr;
use std::path::Path;

use crate::command::CommandRunner;
use crate::config::Paths;
use crate::error::{Error, Result};
use crate::merge::{merge, normalize_dhcp};
use crate::params::{Field, Params, Settings};
use crate::validate::{is_decimal, is_dotted_quad};

/// Addressing facts taken from the running network stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub ip: String,
    pub mascara: String,
    pub gateway: String,
}

impl NetworkSnapshot {
    /// The snapshot as mergeable parameters.
    #[must_use]
    pub fn to_params(&self) -> Params {
        Params::default()
            .with(Field::Ip, &self.ip)
            .with(Field::Mascara, &self.mascara)
            .with(Field::Gateway, &self.gateway)
    }
}

/// Reads the host's current configuration.
#[derive(Debug)]
pub struct SystemState<R> {
    paths: Paths,
    runner: R,
    probe_host: String,
}

impl<R: CommandRunner> SystemState<R> {
    /// Creates a reader over the given source files, querying through `runner`.
    #[must_use]
    pub fn new(paths: Paths, runner: R) -> Self {
        Self {
            paths,
            runner,
            probe_host: "8.8.8.8".to_string(),
        }
    }

    /// Overrides the external host used for the default-route lookup.
    #[must_use]
    pub fn with_probe_host(mut self, host: impl Into<String>) -> Self {
        self.probe_host = host.into();
        self
    }

    /// Scans every source and the live network stack.
    ///
    /// # Errors
    ///
    /// - [`Error::SourceUnreadable`] if a source file cannot be opened.
    /// - [`Error::SourceUnparseable`] if the application file lacks either
    ///   bandwidth limit.
    /// - [`Error::NetworkQueryFailed`] if a live query fails.
    pub fn read_current_state(&self) -> Result<Settings> {
        let mut config = Settings::default();

        scan_source(&self.paths.interfaces, &mut config)?;

        let limits = scan_source(&self.paths.netcop_config, &mut config)?;
        if limits.subida.is_none() || limits.bajada.is_none() {
            return Err(Error::SourceUnparseable {
                path: self.paths.netcop_config.clone(),
            });
        }

        scan_source(&self.paths.resolv_conf, &mut config)?;

        normalize_dhcp(&mut config);
        merge(&mut config, &self.network_snapshot()?.to_params());

        tracing::debug!(?config, "Current configuration");
        Ok(config)
    }

    /// Queries the gateway, address and mask of the primary interface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NetworkQueryFailed`] if a command fails or its output
    /// lacks the expected fields.
    pub fn network_snapshot(&self) -> Result<NetworkSnapshot> {
        let route = self
            .runner
            .run("ip", &["-4", "route", "get", self.probe_host.as_str()])?;
        let (gateway, dev) = parse_route(&route).ok_or_else(|| {
            Error::query(format!("no gateway in route to {}", self.probe_host))
        })?;

        let addr = self
            .runner
            .run("ip", &["-4", "addr", "show", "dev", dev, "primary"])?;
        let (ip, prefix) =
            parse_inet(&addr).ok_or_else(|| Error::query(format!("no IPv4 address on {dev}")))?;

        let snapshot = NetworkSnapshot {
            ip: ip.to_string(),
            mascara: prefix_to_mask(prefix).to_string(),
            gateway: gateway.to_string(),
        };
        tracing::debug!(dev = %dev, ?snapshot, "Live network settings");
        Ok(snapshot)
    }
}

/// Converts a CIDR prefix length into a dotted-quad subnet mask.
///
/// Lengths above 32 saturate to `255.255.255.255`.
#[must_use]
pub fn prefix_to_mask(prefix: u8) -> Ipv4Addr {
    Ipv4Addr::from(!u32::MAX.checked_shr(u32::from(prefix)).unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Text sources
// ---------------------------------------------------------------------------

type LineMatcher = fn(&str) -> Option<(Field, String)>;

const MATCHERS: [LineMatcher; 3] = [match_bandwidth, match_dhcp_iface, match_nameserver];

/// Merges every marker found in `path` into `config`; returns what this
/// source alone contributed.
fn scan_source(path: &Path, config: &mut Settings) -> Result<Params> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::unreadable(path, e))?;
    let mut found = Params::default();

    for line in text.lines().map(str::trim) {
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        for (field, value) in MATCHERS.iter().filter_map(|m| m(line)) {
            merge(config, &Params::default().with(field, value.as_str()));
            found.set(field, value);
        }
    }

    tracing::debug!(path = %path.display(), ?config, "Scanned source");
    Ok(found)
}

/// `bajada=<n>` / `subida=<n>`, bare or prefixed (`velocidad_bajada=<n>`).
fn match_bandwidth(line: &str) -> Option<(Field, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if !is_decimal(value) {
        return None;
    }
    [Field::Bajada, Field::Subida]
        .into_iter()
        .find(|f| {
            key == f.as_str()
                || key
                    .strip_suffix(f.as_str())
                    .is_some_and(|p| p.ends_with('_'))
        })
        .map(|f| (f, value.to_string()))
}

/// `iface <name> inet dhcp`
fn match_dhcp_iface(line: &str) -> Option<(Field, String)> {
    let mut tokens = line.split_whitespace();
    let is_dhcp = tokens.next() == Some("iface")
        && tokens.next().is_some()
        && tokens.next() == Some("inet")
        && tokens.next() == Some("dhcp");
    is_dhcp.then(|| (Field::Dhcp, "dhcp".to_string()))
}

/// `nameserver <ipv4>`
fn match_nameserver(line: &str) -> Option<(Field, String)> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("nameserver") {
        return None;
    }
    tokens
        .next()
        .filter(|addr| is_dotted_quad(addr))
        .map(|addr| (Field::Dns, addr.to_string()))
}

// ---------------------------------------------------------------------------
// `ip` output
// ---------------------------------------------------------------------------

/// Finds `via <gateway> dev <ifname>` in `ip route get` output.
fn parse_route(output: &str) -> Option<(&str, &str)> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    tokens.windows(4).find_map(|w| match w {
        ["via", gw, "dev", dev] if is_dotted_quad(gw) => Some((*gw, *dev)),
        _ => None,
    })
}

/// Finds `inet <ip>/<prefix>` in `ip addr show` output.
fn parse_inet(output: &str) -> Option<(&str, u8)> {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    tokens.windows(2).find_map(|w| match w {
        ["inet", cidr] => {
            let (ip, prefix) = cidr.split_once('/')?;
            let prefix = prefix.parse::<u8>().ok().filter(|p| *p <= 32)?;
            is_dotted_quad(ip).then_some((ip, prefix))
        }
        _ => None,
    })
}
