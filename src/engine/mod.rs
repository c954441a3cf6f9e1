//! Configuration synchronization engine
//!
//! Every resource type plugs into the same machinery:
//!
//! - [`Resource`]: typed configuration, validation, `set`/`delete` lines and
//!   the reader for `display set relative` output
//! - [`Rules`]: ordered `(pattern, handler)` tables used by readers
//! - [`Provider`]: the transaction orchestrator driving a [`DeviceSession`]
//!   through lock, load, commit and unlock
//!
//! [`DeviceSession`]: crate::session::DeviceSession

pub mod block;
pub mod coordinator;
pub mod ident;
pub mod provider;
pub mod resource;
pub mod rules;
pub mod text;
pub mod validate;
pub mod value;

pub use block::{find_or_create, Block, Keyed};
pub use coordinator::{ReadCoordinator, ReadGuard};
pub use ident::{join_id, split_id, ID_SEPARATOR};
pub use provider::{Provider, ProviderOptions, ReadState, State};
pub use resource::{Prerequisite, Resource};
pub use rules::{ReadReport, Rules};
