//! Field validation for UI-supplied parameters.
//!
//! Pure checks over exactly the parameters given: no normalisation and no
//! defaulting happens here.

use crate::error::{Error, Result};
use crate::params::{Field, Params};

/// Gate applied to the staging file before anything else is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    strict_static: bool,
}

impl Validator {
    /// The permissive policy: omitting every network field is legal and means
    /// "keep the current network settings".
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_static: false,
        }
    }

    /// Additionally requires ip, mascara, gateway and dns1 whenever `dhcp=no`.
    #[must_use]
    pub const fn strict_static(mut self, strict: bool) -> Self {
        self.strict_static = strict;
        self
    }

    /// Checks formats and cross-field obligations.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFormat`] if a non-empty value does not match its field.
    /// - [`Error::IncompleteStaticConfig`] if static addressing is partial.
    /// - [`Error::MissingBandwidthLimits`] if `subida` or `bajada` is missing.
    pub fn validate(&self, params: &Params) -> Result<()> {
        for (field, value) in params.iter() {
            if !value.is_empty() && !matches_format(field, value) {
                return Err(Error::InvalidFormat {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        let has = |f: Field| params.non_empty(f).is_some();
        let static_requested = has(Field::Ip) || has(Field::Mascara) || has(Field::Gateway);
        let dhcp_off = params
            .non_empty(Field::Dhcp)
            .is_some_and(|v| v.eq_ignore_ascii_case("no"));

        if (static_requested || (self.strict_static && dhcp_off))
            && ![Field::Ip, Field::Mascara, Field::Gateway, Field::Dns1]
                .into_iter()
                .all(has)
        {
            return Err(Error::IncompleteStaticConfig);
        }

        if !has(Field::Subida) || !has(Field::Bajada) {
            return Err(Error::MissingBandwidthLimits);
        }
        Ok(())
    }
}

/// Convenience wrapper for the permissive policy.
///
/// # Errors
///
/// See [`Validator::validate`].
pub fn validate(params: &Params) -> Result<()> {
    Validator::new().validate(params)
}

fn matches_format(field: Field, value: &str) -> bool {
    match field {
        Field::Dhcp => value.eq_ignore_ascii_case("si") || value.eq_ignore_ascii_case("no"),
        Field::Ip | Field::Mascara | Field::Gateway | Field::Dns | Field::Dns1 | Field::Dns2 => {
            is_dotted_quad(value)
        }
        Field::Subida | Field::Bajada => is_decimal(value),
    }
}

/// Non-empty run of ASCII digits: no sign, no decimal point.
pub(crate) fn is_decimal(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Four dot-separated octets of one to three digits, each in `0..=255`.
///
/// Leading zeros are accepted (`010.1.1.1`), which `Ipv4Addr::from_str`
/// would reject.
pub(crate) fn is_dotted_quad(value: &str) -> bool {
    let mut octets = 0;
    for part in value.split('.') {
        octets += 1;
        if octets > 4 || part.len() > 3 || !is_decimal(part) {
            return false;
        }
        if part.parse::<u16>().map_or(true, |n| n > 255) {
            return false;
        }
    }
    octets == 4
}
