//! Effect handles and the isolation combinator

use std::panic::{self, AssertUnwindSafe};

/// Run a closure with failures contained
///
/// Every phase-level entry point wraps its unit invocations with this so a
/// broken effect never aborts the remaining units in the same phase, and
/// never propagates into the transition engine's own handlers (an unhandled
/// failure there can leave the page stuck behind the transition overlay).
///
/// Returns `None` if the closure panicked; the panic is logged, not rethrown.
pub fn run_isolated<R>(what: &str, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(unit = what, error = %message, "effect unit failed; continuing");
            None
        }
    }
}

/// An active effect
///
/// Opaque proof that an effect is currently live: it owns the teardown that
/// reverses everything the effect's setup attached (listeners, timers, tween
/// instances, transient nodes). Consumed at most once - the owning slot
/// tracks "already torn down" by removing the handle, so teardown is never
/// invoked twice even when the underlying action is not idempotent.
pub struct EffectHandle {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl EffectHandle {
    /// Wrap a teardown action
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A handle for permanent effects that have nothing to tear down
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Invoke the teardown action, isolated
    pub fn teardown(mut self, name: &str) {
        if let Some(action) = self.teardown.take() {
            run_isolated(name, action);
        }
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("has_teardown", &self.teardown.is_some())
            .finish()
    }
}
