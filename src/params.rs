//! Field vocabulary and the two records built from it.
//!
//! [`Params`] holds what a single source supplied, including the input-only
//! `dns` slot. [`Settings`] is the accumulated configuration mapping that
//! rendering consumes; it has no `dns` field, so a bare `dns` can never leak
//! into the final context.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A recognised configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// `si` / `no`: dynamic addressing.
    Dhcp,
    /// Static IPv4 address.
    Ip,
    /// Subnet mask.
    Mascara,
    /// Default route.
    Gateway,
    /// Single resolver supplied by a source; resolved into `dns1` or `dns2`.
    Dns,
    /// Primary resolver.
    Dns1,
    /// Secondary resolver.
    Dns2,
    /// Upload limit.
    Subida,
    /// Download limit.
    Bajada,
}

impl Field {
    /// Every field, in rendering order.
    pub const ALL: [Self; 9] = [
        Self::Dhcp,
        Self::Ip,
        Self::Mascara,
        Self::Gateway,
        Self::Dns,
        Self::Dns1,
        Self::Dns2,
        Self::Subida,
        Self::Bajada,
    ];

    /// The key as written in the staging file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dhcp => "dhcp",
            Self::Ip => "ip",
            Self::Mascara => "mascara",
            Self::Gateway => "gateway",
            Self::Dns => "dns",
            Self::Dns1 => "dns1",
            Self::Dns2 => "dns2",
            Self::Subida => "subida",
            Self::Bajada => "bajada",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or(())
    }
}

/// Values supplied by one source.
///
/// `None` means the key was absent; `Some("")` means it was present but
/// empty. The validator treats the two differently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pub dhcp: Option<String>,
    pub ip: Option<String>,
    pub mascara: Option<String>,
    pub gateway: Option<String>,
    pub dns: Option<String>,
    pub dns1: Option<String>,
    pub dns2: Option<String>,
    pub subida: Option<String>,
    pub bajada: Option<String>,
}

impl Params {
    /// Returns the raw value of `field`, if present.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Returns the value of `field` only when present and non-empty.
    #[must_use]
    pub fn non_empty(&self, field: Field) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }

    /// Sets `field`, replacing any previous value.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Iterates over present fields in [`Field::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    /// Parses a flat `key=value` staging file.
    ///
    /// Leading and trailing whitespace is ignored on every line, as are blank
    /// lines, `#`/`;` comments and `[section]` headers. Keys are matched
    /// case-insensitively; unknown keys are skipped with a warning. When a key
    /// repeats, the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] for a line without `=`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut params = Self::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || (line.starts_with('[') && line.ends_with(']'))
            {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::MalformedInput {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            let key = key.trim().to_ascii_lowercase();
            match key.parse::<Field>() {
                Ok(field) => params.set(field, value.trim()),
                Err(()) => tracing::warn!(key = %key, line = idx + 1, "Ignoring unknown key"),
            }
        }
        Ok(params)
    }

    /// Reads and parses the staging file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInputFile`] if the file does not exist,
    /// [`Error::Io`] if it cannot be read, or any error from [`parse`](Self::parse).
    pub fn read(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingInputFile {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let params = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), ?params, "Read staging file");
        Ok(params)
    }

    const fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Dhcp => &self.dhcp,
            Field::Ip => &self.ip,
            Field::Mascara => &self.mascara,
            Field::Gateway => &self.gateway,
            Field::Dns => &self.dns,
            Field::Dns1 => &self.dns1,
            Field::Dns2 => &self.dns2,
            Field::Subida => &self.subida,
            Field::Bajada => &self.bajada,
        }
    }

    const fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Dhcp => &mut self.dhcp,
            Field::Ip => &mut self.ip,
            Field::Mascara => &mut self.mascara,
            Field::Gateway => &mut self.gateway,
            Field::Dns => &mut self.dns,
            Field::Dns1 => &mut self.dns1,
            Field::Dns2 => &mut self.dns2,
            Field::Subida => &mut self.subida,
            Field::Bajada => &mut self.bajada,
        }
    }
}

/// The accumulated configuration mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub dhcp: Option<String>,
    pub ip: Option<String>,
    pub mascara: Option<String>,
    pub gateway: Option<String>,
    pub dns1: Option<String>,
    pub dns2: Option<String>,
    pub subida: Option<String>,
    pub bajada: Option<String>,
}

impl Settings {
    /// Returns the value of `field`. Always `None` for [`Field::Dns`].
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Dhcp => self.dhcp.as_deref(),
            Field::Ip => self.ip.as_deref(),
            Field::Mascara => self.mascara.as_deref(),
            Field::Gateway => self.gateway.as_deref(),
            Field::Dns => None,
            Field::Dns1 => self.dns1.as_deref(),
            Field::Dns2 => self.dns2.as_deref(),
            Field::Subida => self.subida.as_deref(),
            Field::Bajada => self.bajada.as_deref(),
        }
    }

    /// `true` when `dhcp` has been normalised to `si`.
    #[must_use]
    pub fn is_dhcp(&self) -> bool {
        self.dhcp.as_deref() == Some("si")
    }

    /// Iterates over set fields in [`Field::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }
}

impl fmt::Display for Settings {
    /// Renders as `key=value` lines, the same shape the UI writes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, value) in self.iter() {
            writeln!(f, "{field}={value}")?;
        }
        Ok(())
    }
}
