//! Process and ownership lifecycle guards
//!
//! Native toolkits keep global state that must be initialized once and torn
//! down once. [`InstanceSlot`] makes "one live instance per process" a checked
//! condition instead of an assumption: claiming an occupied slot fails, and the
//! returned [`SlotClaim`] frees the slot when dropped.
//!
//! [`OwnerScope`] covers the other ordering rule, that a presentation owner
//! (a window) outlives every GPU object built on it. Dependents hold a
//! [`Dependent`] token; dropping the owner while tokens are alive is a
//! programming error and is treated as fatal.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::error;

/// Lifecycle contract violations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// A second instance was requested while one is alive
    #[error("an instance is already alive in this process")]
    AlreadyInitialized,

    /// An owner was torn down while dependents were still alive
    #[error("{owner} still has {live} live dependent(s)")]
    LiveDependents {
        /// Owner description
        owner: &'static str,
        /// Number of live dependents
        live: usize,
    },
}

/// Process-wide "at most one live instance" slot
#[derive(Debug)]
pub struct InstanceSlot {
    live: AtomicBool,
}

/// The slot used by [`crate::platform::get_instance`]
pub static PROCESS_INSTANCE: InstanceSlot = InstanceSlot::new();

impl InstanceSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            live: AtomicBool::new(false),
        }
    }

    /// Occupy the slot, failing if it is already occupied
    pub fn claim(&'static self) -> Result<SlotClaim, LifecycleError> {
        self.live
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LifecycleError::AlreadyInitialized)?;
        Ok(SlotClaim { slot: self })
    }

    /// Whether an instance currently holds the slot
    pub fn is_claimed(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Default for InstanceSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of slot ownership; releases the slot on drop
#[derive(Debug)]
pub struct SlotClaim {
    slot: &'static InstanceSlot,
}

impl Drop for SlotClaim {
    fn drop(&mut self) {
        self.slot.live.store(false, Ordering::Release);
    }
}

/// Tracks dependents of an owner that must be dropped first
#[derive(Debug)]
pub struct OwnerScope {
    owner: &'static str,
    live: Rc<Cell<usize>>,
}

impl OwnerScope {
    /// Create a scope with no dependents
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            live: Rc::new(Cell::new(0)),
        }
    }

    /// Register a new dependent
    pub fn dependent(&self) -> Dependent {
        self.live.set(self.live.get() + 1);
        Dependent {
            live: Rc::clone(&self.live),
        }
    }

    /// Number of dependents still alive
    pub fn live_dependents(&self) -> usize {
        self.live.get()
    }

    /// Check that the owner may be torn down now
    pub fn check_release(&self) -> Result<(), LifecycleError> {
        match self.live.get() {
            0 => Ok(()),
            live => Err(LifecycleError::LiveDependents {
                owner: self.owner,
                live,
            }),
        }
    }
}

impl Drop for OwnerScope {
    fn drop(&mut self) {
        if let Err(e) = self.check_release() {
            error!("Teardown order violated: {}", e);
            // Native handles of the dependents are about to dangle
            if !std::thread::panicking() {
                panic!("{e}");
            }
        }
    }
}

/// Token held by an object that depends on an [`OwnerScope`]
#[derive(Debug)]
pub struct Dependent {
    live: Rc<Cell<usize>>,
}

impl Drop for Dependent {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused() {
        static SLOT: InstanceSlot = InstanceSlot::new();
        let first = SLOT.claim().unwrap();
        assert!(SLOT.is_claimed());
        assert_eq!(SLOT.claim().unwrap_err(), LifecycleError::AlreadyInitialized);
        drop(first);
    }

    #[test]
    fn test_claim_released_on_drop() {
        static SLOT: InstanceSlot = InstanceSlot::new();
        {
            let _claim = SLOT.claim().unwrap();
        }
        assert!(!SLOT.is_claimed());
        let again = SLOT.claim();
        assert!(again.is_ok());
    }

    #[test]
    fn test_owner_counts_dependents() {
        let owner = OwnerScope::new("window");
        let a = owner.dependent();
        let b = owner.dependent();
        assert_eq!(owner.live_dependents(), 2);
        assert_eq!(
            owner.check_release(),
            Err(LifecycleError::LiveDependents { owner: "window", live: 2 })
        );
        drop(a);
        drop(b);
        assert!(owner.check_release().is_ok());
    }

    #[test]
    fn test_owner_dropped_after_dependents() {
        let owner = OwnerScope::new("window");
        let dependent = owner.dependent();
        drop(dependent);
        drop(owner);
    }

    #[test]
    #[should_panic(expected = "live dependent")]
    fn test_owner_dropped_before_dependent_panics() {
        let owner = OwnerScope::new("window");
        let dependent = owner.dependent();
        drop(owner);
        drop(dependent);
    }
}
