//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform traits
//! defined in `fabric-runtime-scheduler`: a dedicated runtime thread that
//! runs the scheduler's work loop and a wall clock. [`StdRuntimeScheduler`]
//! bundles both with a [`RuntimeScheduler`].

use std::fmt;
use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use parking_lot::Mutex;

use fabric_runtime_scheduler::{Clock, RuntimeExecutor, RuntimeScheduler, RuntimeSchedulerConfig};

/// Name given to the runtime thread unless the caller picks another one.
pub const DEFAULT_RUNTIME_THREAD_NAME: &str = "fabric-js";

type Work = Box<dyn FnOnce() + Send + 'static>;

/// Executor that runs posted work, in order, on one named thread.
pub struct ThreadRuntimeExecutor {
    sender: Mutex<Option<mpsc::Sender<Work>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
    name: String,
}

impl ThreadRuntimeExecutor {
    /// Spawns the runtime thread.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<Work>();
        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Ok(work) = receiver.recv() {
                work();
            }
            log::debug!("runtime thread exiting");
        })?;
        log::debug!("spawned runtime thread {:?}", name);
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            thread_id: thread.thread().id(),
            thread: Mutex::new(Some(thread)),
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the calling thread is the runtime thread.
    pub fn is_runtime_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Stops accepting work and waits for already posted work to finish.
    /// Called from the runtime thread itself, the thread is detached instead.
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());
        let Some(handle) = self.thread.lock().take() else {
            return;
        };
        if self.is_runtime_thread() {
            return;
        }
        if handle.join().is_err() {
            log::error!("runtime thread {:?} panicked", self.name);
        }
    }
}

impl RuntimeExecutor for ThreadRuntimeExecutor {
    fn post(&self, work: Box<dyn FnOnce() + Send + 'static>) {
        let sender = self.sender.lock();
        let delivered = sender
            .as_ref()
            .is_some_and(|sender| sender.send(work).is_ok());
        if !delivered {
            log::warn!("runtime thread {:?} is gone, dropping posted work", self.name);
        }
    }
}

impl Drop for ThreadRuntimeExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadRuntimeExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadRuntimeExecutor")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdClock;

impl Clock for StdClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Convenience container bundling a runtime thread, the standard clock and
/// the scheduler that feeds the thread.
pub struct StdRuntimeScheduler<R: Send + 'static> {
    scheduler: RuntimeScheduler<R>,
    executor: Arc<ThreadRuntimeExecutor>,
    clock: Arc<StdClock>,
}

impl<R: Send + 'static> StdRuntimeScheduler<R> {
    pub fn new(runtime: R) -> io::Result<Self> {
        Self::with_config(
            runtime,
            DEFAULT_RUNTIME_THREAD_NAME,
            RuntimeSchedulerConfig::default(),
        )
    }

    pub fn with_config(
        runtime: R,
        thread_name: impl Into<String>,
        config: RuntimeSchedulerConfig,
    ) -> io::Result<Self> {
        let executor = Arc::new(ThreadRuntimeExecutor::spawn(thread_name)?);
        let clock = Arc::new(StdClock);
        let scheduler =
            RuntimeScheduler::with_config(runtime, executor.clone(), clock.clone(), config);
        Ok(Self {
            scheduler,
            executor,
            clock,
        })
    }

    /// Returns a handle to the scheduler.
    pub fn scheduler(&self) -> RuntimeScheduler<R> {
        self.scheduler.clone()
    }

    /// Returns the executor driving the runtime thread.
    pub fn executor(&self) -> Arc<ThreadRuntimeExecutor> {
        Arc::clone(&self.executor)
    }

    /// Returns the clock implementation.
    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Tears the scheduler down and joins the runtime thread.
    pub fn shutdown(&self) {
        self.scheduler.tear_down();
        self.executor.shutdown();
    }
}

impl<R: Send + 'static> fmt::Debug for StdRuntimeScheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntimeScheduler")
            .field("scheduler", &self.scheduler)
            .field("executor", &self.executor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_runtime_scheduler::{SchedulerError, SchedulerPriority};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn tasks_run_on_the_runtime_thread() {
        let runtime = StdRuntimeScheduler::new(()).expect("spawn runtime thread");
        let (sender, receiver) = mpsc::channel();
        runtime
            .scheduler()
            .schedule_task(SchedulerPriority::Normal, move |_, _| {
                let name = thread::current().name().map(str::to_owned);
                let _ = sender.send(name);
            });
        let name = receiver.recv_timeout(WAIT).expect("task ran");
        assert_eq!(name.as_deref(), Some(DEFAULT_RUNTIME_THREAD_NAME));
        runtime.shutdown();
    }

    #[test]
    fn synchronous_access_from_another_thread_interleaves_with_tasks() {
        let runtime = StdRuntimeScheduler::new(Vec::<u32>::new()).expect("spawn runtime thread");
        let scheduler = runtime.scheduler();
        for value in 0..200 {
            scheduler.schedule_task(SchedulerPriority::Normal, move |log, _| log.push(value));
        }

        let seen = scheduler
            .execute_now_on_the_same_thread(|log| log.len())
            .expect("runtime alive");
        assert!(seen <= 200);

        let (sender, receiver) = mpsc::channel();
        scheduler.schedule_task(SchedulerPriority::Idle, move |_, _| {
            let _ = sender.send(());
        });
        receiver.recv_timeout(WAIT).expect("queue drained");

        let log = scheduler
            .execute_now_on_the_same_thread(|log| log.clone())
            .expect("runtime alive");
        assert_eq!(log, (0..200).collect::<Vec<_>>());
        runtime.shutdown();
    }

    #[test]
    fn shutdown_stops_the_runtime() {
        let runtime = StdRuntimeScheduler::new(()).expect("spawn runtime thread");
        let scheduler = runtime.scheduler();
        runtime.shutdown();

        assert!(!runtime.executor().is_running());
        assert!(scheduler
            .schedule_task(SchedulerPriority::Immediate, |_, _| {})
            .is_inert());
        assert_eq!(
            scheduler.execute_now_on_the_same_thread(|_| ()),
            Err(SchedulerError::RuntimeTornDown)
        );
    }

    #[test]
    fn work_posted_after_shutdown_is_dropped() {
        let executor = ThreadRuntimeExecutor::spawn("fabric-test").expect("spawn thread");
        executor.shutdown();
        let (sender, receiver) = mpsc::channel::<()>();
        executor.post(Box::new(move || {
            let _ = sender.send(());
        }));
        assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
