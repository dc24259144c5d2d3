//! Lock-guarded execution of account operations
//!
//! [`RequestGate::guarded`] acquires the lock of an account number, runs the
//! operation and releases the lock on every exit path. When the lock cannot
//! be taken the operation is not run at all:
//!
//! - contention for the whole wait timeout becomes `AccountBusy`
//! - an unreachable lock service becomes `LockUnavailable`

use super::lock::LockCoordinator;
use crate::types::ProcessingError;

#[derive(Debug, Clone)]
pub struct RequestGate {
    coordinator: LockCoordinator,
}

impl RequestGate {
    pub fn new(coordinator: LockCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &LockCoordinator {
        &self.coordinator
    }

    /// Run `f` while holding the lock of `account_number`
    pub fn guarded<T, F>(&self, account_number: &str, f: F) -> Result<T, ProcessingError>
    where
        F: FnOnce() -> Result<T, ProcessingError>,
    {
        self.guarded_key(account_number, f)
    }

    /// Run `f` while holding the lock named `name`
    ///
    /// Lock failures are reported against `name`.
    pub fn guarded_key<T, F>(&self, name: &str, f: F) -> Result<T, ProcessingError>
    where
        F: FnOnce() -> Result<T, ProcessingError>,
    {
        let key = self.coordinator.key_for(name);
        let _guard = self
            .coordinator
            .acquire(&key)
            .map_err(|e| ProcessingError::from_lock(name, e))?;

        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lock::LockConfig;
    use crate::core::memory::MemoryLockService;
    use crate::core::traits::SharedLock;
    use crate::types::{BusinessError, LockServiceError};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::time::Duration;

    fn gate(service: Arc<dyn SharedLock>) -> RequestGate {
        let config = LockConfig::new(Duration::from_millis(20), Duration::from_secs(5));
        RequestGate::new(LockCoordinator::new(service, config))
    }

    #[test]
    fn test_runs_under_lock_and_releases() {
        let service = Arc::new(MemoryLockService::new());
        let gate = gate(service.clone());

        let held = gate
            .guarded("1000000000", || Ok(service.is_held("lock:1000000000")))
            .unwrap();

        assert!(held);
        assert!(!service.is_held("lock:1000000000"));
    }

    #[test]
    fn test_releases_after_business_error() {
        let service = Arc::new(MemoryLockService::new());
        let gate = gate(service.clone());

        let result: Result<(), _> = gate.guarded("1000000000", || {
            Err(BusinessError::account_not_found("1000000000").into())
        });

        assert!(matches!(result, Err(ProcessingError::Business(_))));
        assert!(!service.is_held("lock:1000000000"));
    }

    #[test]
    fn test_releases_after_panic() {
        let service = Arc::new(MemoryLockService::new());
        let gate = gate(service.clone());

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), ProcessingError> =
                gate.guarded("1000000000", || panic!("boom"));
        }));

        assert!(outcome.is_err());
        assert!(!service.is_held("lock:1000000000"));
    }

    #[test]
    fn test_contention_is_account_busy() {
        let service = Arc::new(MemoryLockService::new());
        service
            .try_acquire("lock:1000000000", "other", Duration::ZERO, Duration::from_secs(5))
            .unwrap();
        let gate = gate(service.clone());
        let mut ran = false;

        let result = gate.guarded("1000000000", || {
            ran = true;
            Ok(())
        });

        assert_eq!(
            result,
            Err(ProcessingError::AccountBusy {
                account: "1000000000".to_string()
            })
        );
        assert!(!ran);
        assert!(result.unwrap_err().is_retryable());
    }

    struct DownLockService;

    impl SharedLock for DownLockService {
        fn try_acquire(
            &self,
            _key: &str,
            _token: &str,
            _wait: Duration,
            _hold: Duration,
        ) -> Result<bool, LockServiceError> {
            Err(LockServiceError::new("connection refused"))
        }

        fn release(&self, _key: &str, _token: &str) -> Result<bool, LockServiceError> {
            Err(LockServiceError::new("connection refused"))
        }
    }

    #[test]
    fn test_unreachable_lock_service_fails_closed() {
        let gate = gate(Arc::new(DownLockService));
        let mut ran = false;

        let result = gate.guarded("1000000000", || {
            ran = true;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(ProcessingError::LockUnavailable { ref account, .. }) if account == "1000000000"
        ));
        assert!(!ran);
    }
}
