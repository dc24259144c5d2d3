//! Named, time-bounded locks over a [`SharedLock`] service
//!
//! `LockCoordinator` turns the raw lease operations of a shared lock service
//! into scoped acquisition: [`LockCoordinator::acquire`] returns a
//! [`LockGuard`] that releases the lock when it goes out of scope, on every
//! exit path including unwinding.
//!
//! Failure semantics:
//! - contention for the whole wait timeout is reported as
//!   [`LockError::Timeout`]
//! - an unreachable lock service is reported as [`LockError::Unavailable`];
//!   the coordinator never proceeds as if the lock were held
//! - release is idempotent; releasing an expired or unheld lock is logged,
//!   release failures are logged and never propagated

use super::traits::SharedLock;
use crate::types::LockError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Timeouts and key namespace used by a [`LockCoordinator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// How long `acquire` blocks before giving up
    pub wait_timeout: Duration,

    /// How long a lease is honored without an explicit release
    pub hold_timeout: Duration,

    /// Prefix prepended to every lock name
    pub key_prefix: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(1),
            hold_timeout: Duration::from_secs(15),
            key_prefix: "lock:".to_string(),
        }
    }
}

impl LockConfig {
    pub fn new(wait_timeout: Duration, hold_timeout: Duration) -> Self {
        Self {
            wait_timeout,
            hold_timeout,
            ..Self::default()
        }
    }
}

/// Acquires and releases named locks on a shared lock service
#[derive(Clone)]
pub struct LockCoordinator {
    service: Arc<dyn SharedLock>,
    config: LockConfig,
}

impl fmt::Debug for LockCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LockCoordinator {
    pub fn new(service: Arc<dyn SharedLock>, config: LockConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Full lock key for a lock name (e.g. an account number)
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.config.key_prefix, name)
    }

    /// Acquire `key` with the configured timeouts
    pub fn acquire(&self, key: &str) -> Result<LockGuard<'_>, LockError> {
        self.acquire_with(key, self.config.wait_timeout, self.config.hold_timeout)
    }

    /// Acquire `key`, blocking up to `wait`; the lease expires after `hold`
    pub fn acquire_with(
        &self,
        key: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<LockGuard<'_>, LockError> {
        let token = Uuid::new_v4().simple().to_string();
        debug!(key, "trying lock");

        let started = Instant::now();
        match self.service.try_acquire(key, &token, wait, hold) {
            Ok(true) => {
                debug!(key, waited = ?started.elapsed(), "lock acquired");
                Ok(LockGuard {
                    coordinator: self,
                    key: key.to_string(),
                    token,
                    released: false,
                })
            }
            Ok(false) => {
                warn!(key, waited = ?wait, "lock acquisition timed out");
                Err(LockError::Timeout {
                    key: key.to_string(),
                    waited: wait,
                })
            }
            Err(e) => {
                error!(key, reason = %e, "lock service failed during acquire");
                Err(LockError::Unavailable {
                    key: key.to_string(),
                    message: e.message,
                })
            }
        }
    }

    /// Release the lease `token` holds on `key`
    ///
    /// Never fails: an unheld or expired lock and a failing lock service are
    /// only logged.
    fn release(&self, key: &str, token: &str) {
        debug!(key, "unlocking");
        match self.service.release(key, token) {
            Ok(true) => {}
            Ok(false) => {
                warn!(key, "released lock was not held (expired or already released)");
            }
            Err(e) => {
                error!(key, reason = %e, "lock service failed during release");
            }
        }
    }
}

/// Scoped ownership of a named lock
///
/// The lock is released when the guard is dropped, or earlier through
/// [`LockGuard::release`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    coordinator: &'a LockCoordinator,
    key: String,
    token: String,
    released: bool,
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl LockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock now instead of at the end of the scope
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.coordinator.release(&self.key, &self.token);
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.release_once();
    }
}
