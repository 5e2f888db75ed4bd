//! Stable identifiers for actors and components.
//!
//! A [`Uid`] survives storage relocation: systems keep their instances in
//! growable `Vec`s that compact on removal, so anything outside a system
//! (backends, hierarchy links, the world's lookup tables) refers to an instance
//! by `Uid` and resolves it through the owning system on each use.
//!
//! Ids come from a process-wide counter that starts at 1. Zero is reserved for
//! [`Uid::NONE`], which save files use for "no reference".

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_UID: AtomicU32 = AtomicU32::new(1);

/// A process-unique identifier for an actor or component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(u32);

impl Uid {
    /// The reserved "no reference" id.
    pub const NONE: Self = Self(0);

    /// Allocate a fresh id.
    ///
    /// # Panics
    ///
    /// When all ids below `u32::MAX` have been handed out.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        match allocate(&NEXT_UID) {
            Some(raw) => Self(raw),
            None => panic!("UID space exhausted"),
        }
    }

    /// Wrap a raw value, e.g. one read back from a save file.
    ///
    /// The counter is bumped past `raw` so later [`Uid::new`] calls never hand
    /// out the same value. `u32::MAX` is never allocated, so it leaves the
    /// counter alone.
    pub fn from_raw(raw: u32) -> Self {
        if raw < u32::MAX {
            NEXT_UID.fetch_max(raw + 1, Ordering::Relaxed);
        }
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Take the next value from `counter`, or `None` once it reaches `u32::MAX`.
fn allocate(counter: &AtomicU32) -> Option<u32> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            (n < u32::MAX).then_some(n + 1)
        })
        .ok()
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_uids_are_unique_and_nonzero() {
        let a = Uid::new();
        let b = Uid::new();
        assert_ne!(a, b);
        assert!(!a.is_none());
        assert!(!b.is_none());
    }

    #[test]
    fn from_raw_bumps_counter() {
        let loaded = Uid::from_raw(Uid::new().raw() + 1000);
        let next = Uid::new();
        assert!(next.raw() > loaded.raw());
    }

    #[test]
    fn max_raw_does_not_exhaust_the_counter() {
        let loaded = Uid::from_raw(u32::MAX);
        let next = Uid::new();
        assert_ne!(next, loaded);
        assert!(!next.is_none());
    }

    #[test]
    fn allocation_stops_at_max() {
        let counter = AtomicU32::new(u32::MAX - 1);
        assert_eq!(allocate(&counter), Some(u32::MAX - 1));
        assert_eq!(allocate(&counter), None);
        assert_eq!(allocate(&counter), None);
    }

    #[test]
    fn none_is_zero() {
        assert!(Uid::NONE.is_none());
        assert_eq!(Uid::default(), Uid::NONE);
        assert_eq!(Uid::NONE.to_string(), "0");
    }
}
