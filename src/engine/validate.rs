//! Structural checks shared by resource validators
//!
//! Each helper records path-qualified errors in a [`Diagnostics`] so one pass
//! reports every problem of a configuration.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;

use super::block::{Block, Keyed};
use crate::diagnostics::{AttributePath, Diagnostics};

/// At most one of the named flags may be set
pub fn exclusive(diags: &mut Diagnostics, base: &AttributePath, fields: &[(&str, bool)]) {
    let set: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| *value)
        .map(|(name, _)| *name)
        .collect();
    if set.len() > 1 {
        diags.error_at(
            base.attr(set[1]),
            format!("only one of {} can be set", set.join(", ")),
        );
    }
}

/// A present block must hold at least one attribute
pub fn not_empty<B: Block>(diags: &mut Diagnostics, path: AttributePath, block: Option<&B>) {
    if block.map(Block::is_empty).unwrap_or(false) {
        let name = path.to_string();
        diags.error_at(path, format!("{} block is empty", name));
    }
}

/// Names of a keyed list must be unique
pub fn unique_keys<K: Keyed>(diags: &mut Diagnostics, path: AttributePath, entries: &[K]) {
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if !seen.insert(entry.key()) {
            diags.error_at(
                path.index(index),
                format!("multiple blocks with the same name {}", entry.key()),
            );
        }
    }
}

/// A required string must be set and free of whitespace
pub fn name(diags: &mut Diagnostics, path: AttributePath, value: &str) {
    if value.is_empty() {
        diags.error_at(path, "must not be empty");
    } else if value.chars().any(char::is_whitespace) {
        diags.error_at(path, format!("'{}' must not contain whitespace", value));
    }
}

/// An optional integer must lie in `min..=max`
pub fn range(diags: &mut Diagnostics, path: AttributePath, value: Option<i64>, min: i64, max: i64) {
    if let Some(value) = value {
        if value < min || value > max {
            diags.error_at(
                path,
                format!("expected to be in the range ({} - {}), got {}", min, max, value),
            );
        }
    }
}

/// An optional string must be one of `allowed`
pub fn one_of(diags: &mut Diagnostics, path: AttributePath, value: Option<&str>, allowed: &[&str]) {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            diags.error_at(
                path,
                format!("expected to be one of {:?}, got {}", allowed, value),
            );
        }
    }
}

/// Value must be an IPv4 or IPv6 address
pub fn ip_address(diags: &mut Diagnostics, path: AttributePath, value: &str) {
    if value.parse::<IpAddr>().is_err() {
        diags.error_at(path, format!("'{}' is not a valid IP address", value));
    }
}

fn is_cidr(value: &str) -> bool {
    value.split_once('/').is_some_and(|(address, length)| {
        match (address.parse::<IpAddr>(), length.parse::<u8>()) {
            (Ok(IpAddr::V4(_)), Ok(length)) => length <= 32,
            (Ok(IpAddr::V6(_)), Ok(length)) => length <= 128,
            _ => false,
        }
    })
}

/// Whether `value` is a bare address or an address with a prefix length
pub fn is_network(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok() || is_cidr(value)
}

/// Value must be an address with a prefix length, such as `192.0.2.0/24`
pub fn cidr(diags: &mut Diagnostics, path: AttributePath, value: &str) {
    if !is_cidr(value) {
        diags.error_at(path, format!("'{}' is not a valid CIDR network", value));
    }
}

static DNS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.?$")
        .expect("Invalid DNS name regex")
});

/// Value must be a host name such as `repo.example.com`
pub fn dns_name(diags: &mut Diagnostics, path: AttributePath, value: &str) {
    if value.len() > 253 || !DNS_NAME.is_match(value) {
        diags.error_at(path, format!("'{}' is not a valid DNS name", value));
    }
}
