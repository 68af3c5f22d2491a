//! Admission control for inbound connections

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{InterposeError, Result};

/// Caps how many connections the server serves at once
///
/// Clones share the same permits.
#[derive(Clone)]
pub struct ConnectionLimit {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ConnectionLimit {
    /// Allow up to `capacity` concurrent connections
    ///
    /// # Errors
    ///
    /// Returns error if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(InterposeError::ConfigError(
                "limits.max_connections must be > 0".to_string(),
            ));
        }

        Ok(Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Admit one connection without waiting
    ///
    /// The slot is released when the returned permit is dropped. Returns
    /// `None` when every slot is taken.
    #[must_use]
    pub fn try_admit(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.permits).try_acquire_owned().ok()
    }

    /// Connections currently admitted
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Maximum concurrent connections
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
