//! Single-flight guard for sync passes
//!
//! At most one sync pass may run at a time process-wide. Acquisition is
//! scoped: the permit releases the flag on drop, so every exit path of a
//! pass (success, error, early abort) releases the guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide "synchronizing" flag with scoped acquisition.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    flag: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the guard. Returns `None` if a pass is already
    /// in flight.
    pub fn try_acquire(&self) -> Option<SyncPermit> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncPermit { flag: Arc::clone(&self.flag) })
    }

    /// Whether a pass currently holds the guard.
    pub fn is_held(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// RAII permit for a running sync pass. Dropping it releases the guard.
#[derive(Debug)]
pub struct SyncPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = SingleFlight::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn drop_releases_on_early_exit() {
        let guard = SingleFlight::new();
        {
            let _permit = guard.try_acquire().unwrap();
            // simulated early abort: permit dropped at end of scope
        }
        assert!(!guard.is_held());
    }

    #[test]
    fn concurrent_acquire_admits_exactly_one() {
        let guard = SingleFlight::new();
        let winners: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                std::thread::spawn(move || guard.try_acquire().is_some())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        assert_eq!(winners.iter().filter(|won| **won).count(), 1);
    }
}
