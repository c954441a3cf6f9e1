//! Shared test utilities for the junos-provider test suite.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use junos_provider::engine::{Provider, ProviderOptions, ReadCoordinator};
use junos_provider::resources::security_zone::SecurityZoneConfig;
use junos_provider::session::{MemoryDevice, SessionCall};

/// Provider on `device` with the read coordinator disabled, so tests can
/// run concurrently without sharing the process-wide lock
pub fn provider(device: &MemoryDevice) -> Provider {
    Provider::new(Arc::new(device.clone())).with_reads(ReadCoordinator::disabled())
}

/// Same as [`provider`] with custom options
pub fn provider_with(device: &MemoryDevice, options: ProviderOptions) -> Provider {
    provider(device).with_options(options)
}

/// Owned lines from string literals
pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Zone `dmz` with one flag set
pub fn dmz() -> SecurityZoneConfig {
    SecurityZoneConfig {
        name: "dmz".to_string(),
        tcp_rst: true,
        ..Default::default()
    }
}

/// Journal entries without the `show configuration` commands
pub fn transaction_calls(device: &MemoryDevice) -> Vec<SessionCall> {
    device
        .journal()
        .into_iter()
        .filter(|call| !matches!(call, SessionCall::Command(_)))
        .collect()
}

/// Whether the journal holds a `Clear` call
pub fn cleared(device: &MemoryDevice) -> bool {
    device.journal().contains(&SessionCall::Clear)
}
