//! Merge precedence between sources.

use crate::params::{Field, Params, Settings};

/// Merges `incoming` into `accumulated`.
///
/// Every present, non-empty field overwrites, so the caller's call order
/// decides precedence. A `dns` value picks its slot from `accumulated` as it
/// was before this merge: `dns1` when that is still unset, otherwise `dns2`.
/// Explicit `dns1`/`dns2` in the same source are applied afterwards and win.
/// `dns` itself is never copied.
pub fn merge(accumulated: &mut Settings, incoming: &Params) {
    if let Some(dns) = incoming.non_empty(Field::Dns) {
        let slot = if accumulated.dns1.is_none() {
            &mut accumulated.dns1
        } else {
            &mut accumulated.dns2
        };
        *slot = Some(dns.to_string());
    }

    for (field, value) in incoming.iter() {
        if value.is_empty() {
            continue;
        }
        let slot = match field {
            Field::Dns => continue,
            Field::Dhcp => &mut accumulated.dhcp,
            Field::Ip => &mut accumulated.ip,
            Field::Mascara => &mut accumulated.mascara,
            Field::Gateway => &mut accumulated.gateway,
            Field::Dns1 => &mut accumulated.dns1,
            Field::Dns2 => &mut accumulated.dns2,
            Field::Subida => &mut accumulated.subida,
            Field::Bajada => &mut accumulated.bajada,
        };
        *slot = Some(value.to_string());
    }
}

/// Collapses whatever was recorded under `dhcp` to exactly `si` or `no`.
///
/// Any marker other than an explicit `no` counts as dynamic addressing;
/// no marker at all means static. Call once after every source is merged.
pub fn normalize_dhcp(settings: &mut Settings) {
    let on = settings
        .dhcp
        .as_deref()
        .is_some_and(|v| !v.is_empty() && !v.eq_ignore_ascii_case("no"));
    settings.dhcp = Some(if on { "si" } else { "no" }.to_string());
}
