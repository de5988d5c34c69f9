//! Deterministic executor and clock for tests and single-threaded hosts.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::platform::{Clock, RuntimeExecutor};

type Work = Box<dyn FnOnce() + Send + 'static>;

/// Collects posted work until the owner runs it.
#[derive(Default)]
pub struct ManualRuntimeExecutor {
    queue: Mutex<VecDeque<Work>>,
}

impl ManualRuntimeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs the oldest posted item. Returns false when nothing was posted.
    pub fn run_next(&self) -> bool {
        let work = self.queue.lock().pop_front();
        match work {
            Some(work) => {
                work();
                true
            }
            None => false,
        }
    }

    /// Runs posted work, including work posted meanwhile, until none is left.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl RuntimeExecutor for ManualRuntimeExecutor {
    fn post(&self, work: Box<dyn FnOnce() + Send + 'static>) {
        self.queue.lock().push_back(work);
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}
