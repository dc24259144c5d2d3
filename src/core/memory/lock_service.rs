//! In-process TTL lock service
//!
//! `MemoryLockService` implements [`SharedLock`] with a `DashMap` of leases.
//! Each lease carries the holder's token and an expiry instant; an expired
//! lease is treated as absent the next time someone looks at it, so a
//! crashed holder can never stall a key for longer than its hold timeout.
//!
//! # Waiting
//!
//! `try_acquire` polls at a short interval until the key becomes free or the
//! wait timeout runs out. No fairness is provided between waiters: whichever
//! poller finds the key free first takes it.

use crate::core::traits::SharedLock;
use crate::types::LockServiceError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    expires_at: Instant,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Thread-safe lease table standing in for a shared lock server
#[derive(Debug)]
pub struct MemoryLockService {
    /// Leases by lock key
    ///
    /// Expired leases are left in place until they are taken over or
    /// released.
    leases: DashMap<String, Lease>,
    poll_interval: Duration,
}

impl MemoryLockService {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            leases: DashMap::new(),
            poll_interval,
        }
    }

    /// Whether `key` currently has a live lease
    pub fn is_held(&self, key: &str) -> bool {
        let now = Instant::now();
        self.leases
            .get(key)
            .map(|lease| lease.is_live(now))
            .unwrap_or(false)
    }

    /// Single non-blocking attempt to take `key`
    ///
    /// Succeeds when the key is free, its lease expired, or `token` already
    /// holds it (the lease is then extended).
    fn try_take(&self, key: &str, token: &str, hold: Duration) -> bool {
        let now = Instant::now();
        let lease = Lease {
            token: token.to_string(),
            expires_at: now + hold,
        };

        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let takeable = {
                    let current = occupied.get();
                    !current.is_live(now) || current.token == token
                };
                if takeable {
                    occupied.insert(lease);
                }
                takeable
            }
            Entry::Vacant(vacant) => {
                vacant.insert(lease);
                true
            }
        }
    }
}

impl Default for MemoryLockService {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedLock for MemoryLockService {
    fn try_acquire(
        &self,
        key: &str,
        token: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<bool, LockServiceError> {
        let deadline = Instant::now() + wait;

        loop {
            if self.try_take(key, token, hold) {
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            // The shard lock is not held here, so other workers can release.
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn release(&self, key: &str, token: &str) -> Result<bool, LockServiceError> {
        let removed = self.leases.remove_if(key, |_, lease| lease.token == token);
        Ok(removed
            .map(|(_, lease)| lease.is_live(Instant::now()))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const HOLD: Duration = Duration::from_secs(5);

    #[test]
    fn test_acquire_free_key() {
        let service = MemoryLockService::new();

        let acquired = service
            .try_acquire("k", "t1", Duration::ZERO, HOLD)
            .unwrap();

        assert!(acquired);
        assert!(service.is_held("k"));
    }

    #[test]
    fn test_acquire_held_key_times_out() {
        let service = MemoryLockService::new();
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        let started = Instant::now();
        let acquired = service
            .try_acquire("k", "t2", Duration::from_millis(30), HOLD)
            .unwrap();

        assert!(!acquired);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_same_token_reacquires() {
        let service = MemoryLockService::new();
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        assert!(service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap());
    }

    #[test]
    fn test_expired_lease_is_taken_over() {
        let service = MemoryLockService::new();
        service
            .try_acquire("k", "t1", Duration::ZERO, Duration::from_millis(10))
            .unwrap();

        thread::sleep(Duration::from_millis(20));

        assert!(!service.is_held("k"));
        assert!(service.try_acquire("k", "t2", Duration::ZERO, HOLD).unwrap());
    }

    #[test]
    fn test_release_by_holder() {
        let service = MemoryLockService::new();
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        assert!(service.release("k", "t1").unwrap());
        assert!(!service.is_held("k"));
    }

    #[test]
    fn test_release_is_idempotent() {
        let service = MemoryLockService::new();
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        assert!(service.release("k", "t1").unwrap());
        assert!(!service.release("k", "t1").unwrap());
        assert!(!service.release("never-taken", "t1").unwrap());
    }

    #[test]
    fn test_release_by_other_token_keeps_lease() {
        let service = MemoryLockService::new();
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        assert!(!service.release("k", "t2").unwrap());
        assert!(service.is_held("k"));
    }

    #[test]
    fn test_release_of_expired_lease_reports_not_held() {
        let service = MemoryLockService::new();
        service
            .try_acquire("k", "t1", Duration::ZERO, Duration::from_millis(5))
            .unwrap();
        thread::sleep(Duration::from_millis(15));

        assert!(!service.release("k", "t1").unwrap());
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let service = Arc::new(MemoryLockService::new());
        service.try_acquire("k", "t1", Duration::ZERO, HOLD).unwrap();

        let waiter = {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .try_acquire("k", "t2", Duration::from_secs(2), HOLD)
                    .unwrap()
            })
        };

        thread::sleep(Duration::from_millis(20));
        service.release("k", "t1").unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_only_one_concurrent_acquirer_wins() {
        let service = Arc::new(MemoryLockService::new());
        let winners = AtomicUsize::new(0);

        thread::scope(|scope| {
            for i in 0..8 {
                let service = &service;
                let winners = &winners;
                scope.spawn(move || {
                    let token = format!("t{}", i);
                    if service
                        .try_acquire("k", &token, Duration::ZERO, HOLD)
                        .unwrap()
                    {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
