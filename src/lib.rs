//! # junos-provider - Junos Configuration Resources
//!
//! junos-provider manages pieces of a Junos device configuration as typed
//! resources. Each resource knows how to turn its configuration into `set`
//! lines, how to remove itself with `delete` lines and how to rebuild its
//! configuration from `show configuration ... | display set relative` output.
//! Changes are applied in lock/load/commit/unlock transactions that roll the
//! candidate configuration back on any failure.
//!
//! ## Core Concepts
//!
//! - **Resources**: typed configurations with validation, serializer, deleter and reader
//! - **Rules**: ordered pattern tables that map `set` statements back to fields
//! - **Provider**: the transaction orchestrator for create, read, update, delete and import
//! - **Sessions**: NETCONF RPCs to a device, or an in-memory device for tests
//! - **Connections**: framed transport to the device (SSH or on-box)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  CLI / Registry (JSON configurations)                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                 Provider (transaction orchestrator)                  │
//! │        validate → lock → load → commit → unlock / clear on error     │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                         │                         │
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │   Serializers   │   │      Readers        │   │   Read coordinator  │
//! │   (set/delete   │   │   (rules tables     │   │   (one read at a    │
//! │     lines)      │   │   over display set) │   │    time)            │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              Device session (NETCONF over SSH / local)               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use junos_provider::prelude::*;
//! use junos_provider::resources::routing_options::{AutonomousSystem, RoutingOptionsConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ProviderConfig::load(None)?;
//!     let provider = Provider::new(Arc::new(config.session_factory()))
//!         .with_options(config.provider_options()?);
//!
//!     let desired = RoutingOptionsConfig {
//!         autonomous_system: Some(AutonomousSystem {
//!             number: "65000".to_string(),
//!             ..Default::default()
//!         }),
//!         ..Default::default()
//!     };
//!     let state = provider.create(&RoutingOptions, desired).await.into_result()?;
//!     println!("created {}", state.id);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.
    //!
    //! - **Engine**: the provider, resource trait and rules tables
    //! - **Resources**: built-in resource types and the registry
    //! - **Sessions**: session traits and the in-memory device
    //! - **Errors**: error and diagnostic types

    pub use crate::config::ProviderConfig;
    pub use crate::diagnostics::{AttributePath, Diagnostic, Diagnostics, Outcome};
    pub use crate::engine::{
        Provider, ProviderOptions, ReadCoordinator, ReadState, Resource, Rules, State,
    };
    pub use crate::error::{Error, Result};
    pub use crate::resources::{
        BgpNeighbor, DynResource, Registry, RoutingOptions, SecurityZone, StaticRoute,
    };
    pub use crate::session::{DeviceSession, MemoryDevice, SessionFactory};

    pub use std::sync::Arc;
}

pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod resources;
pub mod session;

pub use engine::Provider;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
