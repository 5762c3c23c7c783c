//! Concurrency envelope around collection passes.
//!
//! The interpreter itself is single-threaded per call; what makes it safe
//! to run across many hosts in parallel is the discipline enforced here:
//! collection for a given connector namespace runs under a lock with a
//! bounded wait, and the operations that produce rows are wrapped in a
//! bounded retry. Failure to acquire the lock is non-fatal — the pass is
//! skipped and logged, never blocked forever.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Default bounded wait when acquiring a connector namespace lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Default)]
struct NamespaceSlot {
    busy: Mutex<bool>,
    released: Condvar,
}

/// Per-connector-namespace mutual exclusion with bounded wait.
///
/// Each namespace gets its own slot; acquiring a held slot waits up to the
/// given timeout and then gives up with `None`.
#[derive(Default)]
pub struct NamespaceLocks {
    slots: Mutex<HashMap<String, Arc<NamespaceSlot>>>,
}

/// Guard for one acquired namespace; releases on drop.
pub struct NamespaceGuard {
    slot: Arc<NamespaceSlot>,
    namespace: String,
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `namespace`, waiting at most `timeout`.
    ///
    /// Returns `None` when the wait expires; callers are expected to skip
    /// the collection pass and try again on the next cycle.
    pub fn acquire(&self, namespace: &str, timeout: Duration) -> Option<NamespaceGuard> {
        let slot = {
            let mut slots = match self.slots.lock() {
                Ok(slots) => slots,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(slots.entry(namespace.to_string()).or_default())
        };

        let busy = match slot.busy.lock() {
            Ok(busy) => busy,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (mut busy, wait) = match slot
            .released
            .wait_timeout_while(busy, timeout, |busy| *busy)
        {
            Ok(result) => result,
            Err(poisoned) => poisoned.into_inner(),
        };
        if wait.timed_out() && *busy {
            log::warn!(
                "could not acquire lock for namespace '{}' within {:?}; skipping this pass",
                namespace,
                timeout
            );
            return None;
        }
        *busy = true;
        drop(busy);

        Some(NamespaceGuard {
            slot,
            namespace: namespace.to_string(),
        })
    }
}

impl Drop for NamespaceGuard {
    fn drop(&mut self) {
        match self.slot.busy.lock() {
            Ok(mut busy) => *busy = false,
            Err(poisoned) => *poisoned.into_inner() = false,
        }
        self.slot.released.notify_one();
        log::debug!("released namespace lock '{}'", self.namespace);
    }
}

/// Bounded retry for the operations that produce rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Optional fixed wait between attempts
    pub retry_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_wait: None,
        }
    }
}

/// Run `operation` up to `1 + max_retries` times, waiting `retry_wait`
/// after each failure. The last error is returned unchanged.
pub fn execute_with_retry<T, E, F>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}; retrying",
                    what,
                    attempt,
                    attempts,
                    err
                );
                if let Some(wait) = policy.retry_wait {
                    std::thread::sleep(wait);
                }
            }
            Err(err) => {
                log::warn!("{} failed after {} attempts: {}", what, attempt, err);
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_acquire_and_release() {
        let locks = NamespaceLocks::new();
        let guard = locks.acquire("snmp:server-1", Duration::from_millis(50));
        assert!(guard.is_some());
        drop(guard);
        assert!(locks
            .acquire("snmp:server-1", Duration::from_millis(50))
            .is_some());
    }

    #[test]
    fn test_acquire_times_out_while_held() {
        let locks = NamespaceLocks::new();
        let _held = locks
            .acquire("snmp:server-1", Duration::from_millis(50))
            .expect("first acquire");
        assert!(locks
            .acquire("snmp:server-1", Duration::from_millis(50))
            .is_none());
    }

    #[test]
    fn test_namespaces_are_independent() {
        let locks = NamespaceLocks::new();
        let _held = locks
            .acquire("snmp:server-1", Duration::from_millis(50))
            .expect("first namespace");
        assert!(locks
            .acquire("wmi:server-2", Duration::from_millis(50))
            .is_some());
    }

    #[test]
    fn test_retry_counts_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            retry_wait: None,
        };
        let result: Result<(), String> = execute_with_retry(&policy, "poll", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_stops_on_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 3,
            retry_wait: None,
        };
        let result: Result<u32, String> = execute_with_retry(&policy, "poll", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 1 {
                Err("transient".to_string())
            } else {
                Ok(n)
            }
        });
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
