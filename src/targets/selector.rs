//! Round-robin target selection.
//!
//! The selector owns the rotation cursor; nothing else can read or move it.
//! The cursor is advanced with a single atomic read-modify-write, so
//! concurrent handlers on the multi-threaded runtime never skip or repeat a
//! position.
//!
//! # Invalid Entries
//!
//! When the cursor lands on an entry that failed validation, the selector
//! logs it and returns the fallback target. The cursor has already moved
//! past the bad entry at that point, and no extra step is taken to find a
//! valid one.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};

use super::registry::{BackendTarget, TargetRegistry};
use crate::metrics;

/// Stateful round-robin picker over a [`TargetRegistry`].
#[derive(Debug)]
pub struct TargetSelector {
    registry: TargetRegistry,
    cursor: AtomicUsize,
}

impl TargetSelector {
    pub fn new(registry: TargetRegistry) -> Self {
        Self {
            registry,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Pick the next target.
    ///
    /// Always advances the rotation by exactly one position, then returns
    /// the entry it advanced from, or the fallback target if that entry is
    /// invalid.
    pub fn select(&self) -> &BackendTarget {
        let len = self.registry.len();
        if len == 0 {
            error!("No backend targets defined, using fallback");
            metrics::record_target_fallback();
            return self.registry.fallback();
        }

        let index = self.advance(len);

        match self.registry.targets().get(index) {
            Some(entry) => match &entry.target {
                Some(target) => {
                    debug!(index, target_url = %target, "Selected backend target");
                    target
                }
                None => {
                    error!(
                        index,
                        entry = %entry.raw,
                        fallback = %self.registry.fallback(),
                        "Invalid backend target, using fallback"
                    );
                    metrics::record_target_fallback();
                    self.registry.fallback()
                }
            },
            None => {
                error!(index, len, "Rotation cursor out of range, using fallback");
                metrics::record_target_fallback();
                self.registry.fallback()
            }
        }
    }

    /// Move the cursor one step and return the position it held before.
    fn advance(&self, len: usize) -> usize {
        // The closure never returns None, so both arms carry the old value
        match self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % len))
        {
            Ok(previous) | Err(previous) => previous % len,
        }
    }
}
