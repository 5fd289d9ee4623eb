//! Name normalization shared by sync, DDNS and the challenge hook.
//!
//! Zone names are compared lowercase without a trailing dot; record names
//! are relative to their zone with `@` for the apex.

/// `Example.COM.` -> `example.com`
pub fn normalize_zone(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Lowercase, no trailing dot, `@` for empty.
pub fn normalize_record_name(name: &str) -> String {
    let name = normalize_zone(name);
    if name.is_empty() {
        "@".to_string()
    } else {
        name
    }
}

/// Whether `name` is the zone itself or lies below it.
pub fn is_within_zone(name: &str, zone: &str) -> bool {
    let name = normalize_zone(name);
    let zone = normalize_zone(zone);
    !zone.is_empty() && (name == zone || name.ends_with(&format!(".{zone}")))
}

/// `home.example.com` in `example.com` -> `home`; the apex -> `@`.
///
/// Names outside the zone are returned normalized but otherwise unchanged.
pub fn relative_name(fqdn: &str, zone: &str) -> String {
    let name = normalize_zone(fqdn);
    let zone = normalize_zone(zone);
    if name == zone {
        return "@".to_string();
    }
    name.strip_suffix(&format!(".{zone}"))
        .map_or_else(|| normalize_record_name(&name), str::to_string)
}

/// `home` in `example.com` -> `home.example.com`; `@` -> `example.com`.
pub fn fqdn(relative: &str, zone: &str) -> String {
    let zone = normalize_zone(zone);
    match normalize_record_name(relative).as_str() {
        "@" => zone,
        name => format!("{name}.{zone}"),
    }
}

/// Picks the zone owning `name`: the longest candidate that contains it.
pub fn longest_zone_match<'a, I>(name: &str, zones: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    zones
        .into_iter()
        .filter(|zone| is_within_zone(name, zone))
        .max_by_key(|zone| normalize_zone(zone).len())
}

/// The last two labels of `name`, used when no zone is known locally.
pub fn registrable_guess(name: &str) -> String {
    let name = normalize_zone(name);
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() <= 2 {
        name
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

/// `_acme-challenge.<name>` with any wildcard label removed.
pub fn acme_challenge_name(domain: &str) -> String {
    let base = normalize_zone(domain);
    let base = base.strip_prefix("*.").unwrap_or(&base);
    format!("_acme-challenge.{base}")
}
