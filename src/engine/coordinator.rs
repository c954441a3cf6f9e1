//! Process-wide serialization of reads

use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

static GLOBAL_READS: Lazy<Arc<Mutex<()>>> = Lazy::new(|| Arc::new(Mutex::new(())));

/// Serializes reads of device state
///
/// Clones of a shared coordinator hold the same lock. The disabled variant
/// never blocks.
#[derive(Debug, Clone)]
pub enum ReadCoordinator {
    Shared(Arc<Mutex<()>>),
    Disabled,
}

impl Default for ReadCoordinator {
    fn default() -> Self {
        Self::global()
    }
}

impl ReadCoordinator {
    /// Coordinator shared by the whole process
    pub fn global() -> Self {
        Self::Shared(GLOBAL_READS.clone())
    }

    /// Fresh coordinator independent from the process-wide one
    pub fn shared() -> Self {
        Self::Shared(Arc::new(Mutex::new(())))
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Wait for the read lock
    pub async fn acquire(&self) -> ReadGuard {
        match self {
            Self::Shared(lock) => ReadGuard(Some(lock.clone().lock_owned().await)),
            Self::Disabled => ReadGuard(None),
        }
    }
}

/// Held for the duration of one read; releases the lock on drop
#[derive(Debug)]
pub struct ReadGuard(Option<OwnedMutexGuard<()>>);

impl ReadGuard {
    pub fn is_held(&self) -> bool {
        self.0.is_some()
    }
}
