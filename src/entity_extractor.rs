/// Entity extraction for ticket text
///
/// Pulls infrastructure references out of free text so that two tickets that
/// mention the same machine can be pulled closer together during grouping:
/// - IPv4-shaped dotted quads ("10.24.66.14")
/// - URLs with an explicit scheme ("https://srv-pingfed-01/auth")
/// - Hostnames ending in a known public or internal suffix ("login.auth0.com")
/// - Service hosts starting with a known role prefix ("mfa-gateway-01")
///
/// All matches are lower-cased, so the same entity written with different
/// casing collapses to one tag.
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

/// Normalized entity strings found in one text
pub type EntityTags = BTreeSet<String>;

/// Suffixes accepted as the last label of a hostname
pub const HOST_SUFFIXES: &[&str] = &[
    "com", "net", "org", "io", "local", "internal", "corp", "lan", "intranet", "cloud",
];

/// Role prefixes used in host naming conventions (directory, identity,
/// authentication, gateways)
pub const SERVICE_PREFIXES: &[&str] = &[
    "srv", "idm", "dir", "ldap", "ad", "auth", "sso", "mfa", "iam", "gw", "gateway", "vpn", "proxy",
];

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid IPv4 regex")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s<>"'()\[\]{}]+"#).expect("valid URL regex")
});

static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?:[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?\.)+(?:{})\b",
        HOST_SUFFIXES.join("|")
    );
    Regex::new(&pattern).expect("valid hostname regex")
});

static SERVICE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b(?:{})(?:-[a-z0-9]+)*-\d+\b",
        SERVICE_PREFIXES.join("|")
    );
    Regex::new(&pattern).expect("valid service-name regex")
});

/// Extract the set of entity tags mentioned in `text`
///
/// Never fails: text with no recognisable entity yields an empty set.
pub fn extract_entities(text: &str) -> EntityTags {
    let mut tags = EntityTags::new();

    if text.is_empty() {
        return tags;
    }

    for m in IPV4_RE.find_iter(text) {
        tags.insert(m.as_str().to_string());
    }

    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(&['.', ',', ';', ':', '!', '?'][..]);
        if !url.ends_with("://") {
            tags.insert(url.to_lowercase());
        }
    }

    for m in HOSTNAME_RE.find_iter(text) {
        // The domain part of an email address is not a host
        if text[..m.start()].ends_with('@') {
            continue;
        }
        tags.insert(m.as_str().to_lowercase());
    }

    for m in SERVICE_RE.find_iter(text) {
        tags.insert(m.as_str().to_lowercase());
    }

    tags
}

/// Extract entities for a whole batch, one call per text in parallel
pub fn extract_all<S>(texts: &[S]) -> Vec<EntityTags>
where
    S: AsRef<str> + Sync,
{
    texts
        .par_iter()
        .map(|text| extract_entities(text.as_ref()))
        .collect()
}

/// Whether two tag sets share at least one entity
#[inline]
pub fn shares_entity(a: &EntityTags, b: &EntityTags) -> bool {
    !a.is_disjoint(b)
}
