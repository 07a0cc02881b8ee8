//! Host-supplied resource limits and cancellation (spec §5; SPEC_FULL §C.4).
//!
//! The core checks these at exactly the two points spec §5 requires: Proc
//! entry and `parallel` join. Nothing else in the evaluator consults them, so
//! a host that never cancels and never trips a limit pays only the cost of a
//! couple of `Cell` reads per call.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::WispError;

/// Recursion depth and total step ceilings. Defaults are generous; hosts
/// embedding the interpreter in a service tighten them.
#[derive(Debug, Clone, Copy)]
pub struct ResourceLimits {
    pub max_depth: usize,
    pub max_steps: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits { max_depth: 10_000, max_steps: u64::MAX }
    }
}

/// A cheap, `Clone`-able flag a host can flip from another thread to ask an
/// in-flight evaluation to stop at its next checkpoint.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-evaluation bookkeeping: current call depth plus the shared
/// cancellation flag. Not `Sync` — each evaluation thread (including each
/// `parallel` worker) gets its own tracker sharing the same token.
pub struct ResourceTracker {
    limits: ResourceLimits,
    token: CancellationToken,
    depth: Cell<usize>,
}

impl ResourceTracker {
    pub fn new(limits: ResourceLimits, token: CancellationToken) -> Self {
        ResourceTracker { limits, token, depth: Cell::new(0) }
    }

    /// A tracker with default limits and a fresh, never-cancelled token, for
    /// callers that don't care about resource accounting.
    pub fn unlimited() -> Self {
        ResourceTracker::new(ResourceLimits::default(), CancellationToken::new())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn check_cancelled(&self) -> Result<(), WispError> {
        if self.token.is_cancelled() {
            Err(WispError::cancelled())
        } else {
            Ok(())
        }
    }

    /// Called at Proc entry (spec §5). Checks cancellation and the depth
    /// limit, then increments depth for the duration of the call.
    pub fn enter_call(&self) -> Result<DepthGuard<'_>, WispError> {
        self.check_cancelled()?;
        let depth = self.depth.get();
        if depth >= self.limits.max_depth {
            return Err(WispError::type_error(format!("recursion depth limit ({}) exceeded", self.limits.max_depth)));
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { tracker: self })
    }
}

/// Decrements the tracker's depth counter when a Proc call returns, whether
/// by success or by propagating an error.
pub struct DepthGuard<'a> {
    tracker: &'a ResourceTracker,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let depth = self.tracker.depth.get();
        self.tracker.depth.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_is_visible_across_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn enter_call_rejects_past_depth_limit() {
        let tracker = ResourceTracker::new(ResourceLimits { max_depth: 1, max_steps: u64::MAX }, CancellationToken::new());
        let _first = tracker.enter_call().unwrap();
        assert!(tracker.enter_call().is_err());
    }

    #[test]
    fn depth_guard_releases_on_drop() {
        let tracker = ResourceTracker::new(ResourceLimits { max_depth: 1, max_steps: u64::MAX }, CancellationToken::new());
        {
            let _g = tracker.enter_call().unwrap();
        }
        assert!(tracker.enter_call().is_ok());
    }

    #[test]
    fn cancelled_token_blocks_new_calls() {
        let token = CancellationToken::new();
        let tracker = ResourceTracker::new(ResourceLimits::default(), token.clone());
        token.cancel();
        assert!(tracker.enter_call().is_err());
    }
}
