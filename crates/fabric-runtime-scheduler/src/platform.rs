//! Host services the scheduler relies on.
//!
//! The scheduler never spawns threads or reads the system clock itself; the
//! host provides both so the same scheduler runs on a dedicated JS thread in
//! production and deterministically in tests.

use std::time::Instant;

/// Runs work on the thread that owns the JavaScript runtime.
pub trait RuntimeExecutor: Send + Sync {
    /// Queue `work` for execution on the runtime thread. Work items posted
    /// from one thread must run in posting order.
    fn post(&self, work: Box<dyn FnOnce() + Send + 'static>);
}

/// Provides timing information for task expiration.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}
