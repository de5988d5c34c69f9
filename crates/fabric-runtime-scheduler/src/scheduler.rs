//! Arbitrates access to the single JavaScript runtime.
//!
//! Any thread may schedule tasks; they run one at a time on the executor's
//! thread, most urgent first and FIFO within a priority. Tasks are never
//! preempted: a more urgent task scheduled while another runs waits for it to
//! return, which is why long tasks should poll [`RuntimeScheduler::should_yield`]
//! and hand the rest of their work back as a continuation.

use std::cell::RefCell;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::SchedulerError;
use crate::platform::{Clock, RuntimeExecutor};
use crate::priority::SchedulerPriority;
use crate::task::{
    ExecutionResult, Task, TaskCallback, TaskContext, TaskHandle, TaskOutcome, TaskStatus,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeSchedulerConfig {
    /// Log a warning for every task that starts after its expiration time.
    pub report_missed_deadlines: bool,
}

impl Default for RuntimeSchedulerConfig {
    fn default() -> Self {
        Self {
            report_missed_deadlines: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub executed: u64,
    pub cancelled: u64,
    pub continuations: u64,
    pub missed_deadlines: u64,
}

#[derive(Default)]
struct StatCounters {
    executed: AtomicU64,
    cancelled: AtomicU64,
    continuations: AtomicU64,
    missed_deadlines: AtomicU64,
}

impl StatCounters {
    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            executed: self.executed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            continuations: self.continuations.load(Ordering::Relaxed),
            missed_deadlines: self.missed_deadlines.load(Ordering::Relaxed),
        }
    }
}

/// Heap entry: more urgent first, then lower id (earlier enqueue) first.
struct QueuedTask<R>(Arc<Task<R>>);

impl<R> PartialEq for QueuedTask<R> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl<R> Eq for QueuedTask<R> {}

impl<R> PartialOrd for QueuedTask<R> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<R> Ord for QueuedTask<R> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .0
            .priority()
            .cmp(&self.0.priority())
            .then_with(|| other.0.id().cmp(&self.0.id()))
    }
}

type RenderingUpdate = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    // Schedulers whose runtime is borrowed by the current thread.
    static ACTIVE_SCHEDULERS: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

struct ActiveScope {
    id: usize,
}

impl ActiveScope {
    fn enter(id: usize) -> Self {
        ACTIVE_SCHEDULERS.with(|stack| stack.borrow_mut().push(id));
        Self { id }
    }

    fn is_active(id: usize) -> bool {
        ACTIVE_SCHEDULERS.with(|stack| stack.borrow().contains(&id))
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        ACTIVE_SCHEDULERS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|id| *id == self.id) {
                stack.remove(position);
            }
        });
    }
}

struct SyncRequest<'a>(&'a AtomicUsize);

impl<'a> SyncRequest<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        SyncRequest(counter)
    }
}

impl Drop for SyncRequest<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

struct SchedulerInner<R> {
    runtime: Mutex<Option<R>>,
    queue: Mutex<BinaryHeap<QueuedTask<R>>>,
    next_task_id: AtomicU64,
    executor: Arc<dyn RuntimeExecutor>,
    clock: Arc<dyn Clock>,
    config: RuntimeSchedulerConfig,
    work_loop_scheduled: AtomicBool,
    sync_requests: AtomicUsize,
    current_priority: AtomicU8,
    rendering_updates: Mutex<VecDeque<RenderingUpdate>>,
    torn_down: AtomicBool,
    stats: StatCounters,
}

impl<R: Send + 'static> SchedulerInner<R> {
    fn id(&self) -> usize {
        self as *const Self as usize
    }

    fn schedule(
        self: &Arc<Self>,
        priority: SchedulerPriority,
        timeout: Duration,
        callback: TaskCallback<R>,
    ) -> TaskHandle<R> {
        let task = {
            let mut queue = self.queue.lock();
            if self.torn_down.load(Ordering::Acquire) {
                log::debug!("dropping {} task scheduled after teardown", priority);
                return TaskHandle::inert();
            }
            let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
            let expiration = self.clock.now() + timeout;
            let task = Arc::new(Task::from_callback(id, priority, expiration, callback));
            queue.push(QueuedTask(Arc::clone(&task)));
            task
        };
        log::trace!("scheduled task {} ({})", task.id(), priority);
        self.schedule_work_loop();
        TaskHandle::new(task)
    }

    fn schedule_work_loop(self: &Arc<Self>) {
        if self.work_loop_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let weak = Arc::downgrade(self);
        self.executor.post(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.run_work_loop();
            }
        }));
    }

    fn run_work_loop(self: &Arc<Self>) {
        loop {
            self.drain_queue();
            self.work_loop_scheduled.store(false, Ordering::Release);
            // A task pushed after the last pop but before the store above
            // found the flag set and did not post; pick it up here.
            if self.sync_requests.load(Ordering::Acquire) > 0
                || self.torn_down.load(Ordering::Acquire)
                || !self.has_pending_tasks()
                || self.work_loop_scheduled.swap(true, Ordering::AcqRel)
            {
                return;
            }
        }
    }

    fn drain_queue(self: &Arc<Self>) {
        while self.sync_requests.load(Ordering::Acquire) == 0 {
            let Some(task) = self.pop_next_task() else {
                break;
            };
            let mut runtime = self.runtime.lock();
            let Some(runtime_ref) = runtime.as_mut() else {
                task.cancel();
                break;
            };
            self.execute_task(&task, runtime_ref);
            if self.torn_down.load(Ordering::Acquire) {
                runtime.take();
                break;
            }
            drop(runtime);
            self.run_rendering_updates();
        }
    }

    fn pop_next_task(&self) -> Option<Arc<Task<R>>> {
        let mut queue = self.queue.lock();
        while let Some(QueuedTask(task)) = queue.pop() {
            if task.status() != TaskStatus::Cancelled {
                return Some(task);
            }
        }
        None
    }

    fn execute_task(&self, task: &Arc<Task<R>>, runtime: &mut R) {
        let now = self.clock.now();
        let did_timeout = task.is_expired(now);
        // Immediate tasks expire on creation; they are never late.
        if did_timeout && task.priority() != SchedulerPriority::Immediate {
            self.stats.missed_deadlines.fetch_add(1, Ordering::Relaxed);
            if self.config.report_missed_deadlines {
                log::warn!(
                    "task {} ({}) started {:?} after its deadline",
                    task.id(),
                    task.priority(),
                    now.saturating_duration_since(task.expiration())
                );
            }
        }

        self.current_priority
            .store(task.priority().as_u8(), Ordering::Release);
        let result = {
            let _scope = ActiveScope::enter(self.id());
            task.execute(runtime, did_timeout)
        };
        self.current_priority
            .store(SchedulerPriority::Normal.as_u8(), Ordering::Release);

        match result {
            ExecutionResult::Completed => {
                self.stats.executed.fetch_add(1, Ordering::Relaxed);
                log::trace!("task {} completed", task.id());
            }
            ExecutionResult::Continued => {
                self.stats.continuations.fetch_add(1, Ordering::Relaxed);
                log::trace!("task {} continues", task.id());
                let mut queue = self.queue.lock();
                if !self.torn_down.load(Ordering::Acquire) {
                    queue.push(QueuedTask(Arc::clone(task)));
                } else if task.cancel() {
                    self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                }
            }
            ExecutionResult::Empty => {}
        }
    }

    fn run_rendering_updates(&self) {
        loop {
            let next = self.rendering_updates.lock().pop_front();
            match next {
                Some(update) => update(),
                None => break,
            }
        }
    }

    fn has_pending_tasks(&self) -> bool {
        self.queue
            .lock()
            .iter()
            .any(|queued| queued.0.status() == TaskStatus::Queued)
    }
}

/// Shared handle to the scheduler of one runtime. Cloning is cheap.
pub struct RuntimeScheduler<R: Send + 'static> {
    inner: Arc<SchedulerInner<R>>,
}

impl<R: Send + 'static> RuntimeScheduler<R> {
    pub fn new(runtime: R, executor: Arc<dyn RuntimeExecutor>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(runtime, executor, clock, RuntimeSchedulerConfig::default())
    }

    pub fn with_config(
        runtime: R,
        executor: Arc<dyn RuntimeExecutor>,
        clock: Arc<dyn Clock>,
        config: RuntimeSchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                runtime: Mutex::new(Some(runtime)),
                queue: Mutex::new(BinaryHeap::new()),
                next_task_id: AtomicU64::new(1),
                executor,
                clock,
                config,
                work_loop_scheduled: AtomicBool::new(false),
                sync_requests: AtomicUsize::new(0),
                current_priority: AtomicU8::new(SchedulerPriority::Normal.as_u8()),
                rendering_updates: Mutex::new(VecDeque::new()),
                torn_down: AtomicBool::new(false),
                stats: StatCounters::default(),
            }),
        }
    }

    /// Queues `callback` with the default timeout of `priority`.
    pub fn schedule_task(
        &self,
        priority: SchedulerPriority,
        callback: impl FnOnce(&mut R, &TaskContext) + Send + 'static,
    ) -> TaskHandle<R> {
        self.schedule_task_with_timeout(priority, priority.timeout(), callback)
    }

    pub fn schedule_task_with_timeout(
        &self,
        priority: SchedulerPriority,
        timeout: Duration,
        callback: impl FnOnce(&mut R, &TaskContext) + Send + 'static,
    ) -> TaskHandle<R> {
        self.inner.schedule(
            priority,
            timeout,
            Box::new(move |runtime: &mut R, context: &TaskContext| {
                callback(runtime, context);
                TaskOutcome::Complete
            }),
        )
    }

    /// Queues a callback that may hand back a continuation. The continuation
    /// keeps the task's place in the queue.
    pub fn schedule_task_with_continuation(
        &self,
        priority: SchedulerPriority,
        callback: impl FnOnce(&mut R, &TaskContext) -> TaskOutcome<R> + Send + 'static,
    ) -> TaskHandle<R> {
        self.inner
            .schedule(priority, priority.timeout(), Box::new(callback))
    }

    /// Clears the task's callback. The task stays in the queue and is skipped
    /// when it comes up. Returns false for inert handles, tasks that already
    /// ran or were cancelled, and after teardown.
    pub fn cancel_task(&self, handle: &TaskHandle<R>) -> bool {
        if self.inner.torn_down.load(Ordering::Acquire) {
            return false;
        }
        let cancelled = handle.task().is_some_and(|task| task.cancel());
        if cancelled {
            self.inner.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        }
        cancelled
    }

    /// Runs `callback` on the calling thread with exclusive access to the
    /// runtime, bypassing the queue. Blocks until the task currently running,
    /// if any, returns; the work loop then pauses until this call is done.
    ///
    /// Fails with [`SchedulerError::ReentrantAccess`] when the calling thread
    /// is already inside the runtime (from a task or another synchronous call)
    /// instead of deadlocking.
    pub fn execute_now_on_the_same_thread<T>(
        &self,
        callback: impl FnOnce(&mut R) -> T,
    ) -> Result<T, SchedulerError> {
        let inner = &self.inner;
        if inner.torn_down.load(Ordering::Acquire) {
            return Err(SchedulerError::RuntimeTornDown);
        }
        if ActiveScope::is_active(inner.id()) {
            return Err(SchedulerError::ReentrantAccess);
        }

        let value = {
            let _request = SyncRequest::new(&inner.sync_requests);
            let mut guard = inner.runtime.lock();
            let runtime = guard.as_mut().ok_or(SchedulerError::RuntimeTornDown)?;
            let previous = inner
                .current_priority
                .swap(SchedulerPriority::Immediate.as_u8(), Ordering::AcqRel);
            let value = {
                let _scope = ActiveScope::enter(inner.id());
                callback(runtime)
            };
            inner.current_priority.store(previous, Ordering::Release);
            if inner.torn_down.load(Ordering::Acquire) {
                guard.take();
            }
            value
        };

        inner.run_rendering_updates();
        if !inner.torn_down.load(Ordering::Acquire) && inner.has_pending_tasks() {
            inner.schedule_work_loop();
        }
        Ok(value)
    }

    /// True when the running task should return early: a synchronous call is
    /// waiting for the runtime or a more urgent task is queued.
    pub fn should_yield(&self) -> bool {
        if self.inner.sync_requests.load(Ordering::Acquire) > 0 {
            return true;
        }
        let current = self.current_priority_level();
        let mut queue = self.inner.queue.lock();
        // Cancelled tasks stay queued until popped.
        while queue
            .peek()
            .is_some_and(|top| top.0.status() == TaskStatus::Cancelled)
        {
            queue.pop();
        }
        queue
            .peek()
            .is_some_and(|top| top.0.priority().is_more_urgent_than(current))
    }

    /// Priority of the task currently running, `Normal` when idle.
    pub fn current_priority_level(&self) -> SchedulerPriority {
        SchedulerPriority::from_u8(self.inner.current_priority.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Runs `update` once the task running on this thread returns, or right
    /// away when the calling thread is not inside the runtime.
    pub fn schedule_rendering_update(&self, update: impl FnOnce() + Send + 'static) {
        if ActiveScope::is_active(self.inner.id()) {
            self.inner.rendering_updates.lock().push_back(Box::new(update));
        } else {
            update();
        }
    }

    /// Drops the runtime and cancels every queued task. Later calls fail or
    /// return inert handles.
    pub fn tear_down(&self) {
        let inner = &self.inner;
        let drained: Vec<QueuedTask<R>> = {
            let mut queue = inner.queue.lock();
            if inner.torn_down.swap(true, Ordering::AcqRel) {
                return;
            }
            queue.drain().collect()
        };
        let cancelled = drained
            .iter()
            .filter(|queued| queued.0.cancel())
            .count() as u64;
        inner.stats.cancelled.fetch_add(cancelled, Ordering::Relaxed);
        inner.rendering_updates.lock().clear();

        // From inside a task the runtime is borrowed; whoever holds it drops
        // it once the task returns.
        if !ActiveScope::is_active(inner.id()) {
            let runtime = inner.runtime.lock().take();
            drop(runtime);
        }
        log::debug!("runtime scheduler torn down, {} queued tasks cancelled", cancelled);
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_pending_tasks()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.inner.stats.snapshot()
    }
}

impl<R: Send + 'static> Clone for RuntimeScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Send + 'static> fmt::Debug for RuntimeScheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeScheduler")
            .field("queued", &self.inner.queue.lock().len())
            .field("torn_down", &self.is_torn_down())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
