use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::priority::SchedulerPriority;

pub(crate) type TaskCallback<R> =
    Box<dyn FnOnce(&mut R, &TaskContext) -> TaskOutcome<R> + Send + 'static>;

/// What a running task knows about its own invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskContext {
    /// The task started after its expiration time.
    pub did_timeout: bool,
    pub priority: SchedulerPriority,
}

/// The rest of a task's work, to run when the scheduler gets back to it.
pub struct Continuation<R>(pub(crate) TaskCallback<R>);

impl<R> Continuation<R> {
    pub fn new(
        callback: impl FnOnce(&mut R, &TaskContext) -> TaskOutcome<R> + Send + 'static,
    ) -> Self {
        Continuation(Box::new(callback))
    }
}

pub enum TaskOutcome<R> {
    Complete,
    /// Keep the task queued at its current position with a new callback.
    Continue(Continuation<R>),
}

impl<R> TaskOutcome<R> {
    pub fn continue_with(
        callback: impl FnOnce(&mut R, &TaskContext) -> TaskOutcome<R> + Send + 'static,
    ) -> Self {
        TaskOutcome::Continue(Continuation::new(callback))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Executing,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The callback was already consumed or cleared; nothing ran.
    Empty,
    Completed,
    /// The callback ran and left a continuation behind.
    Continued,
}

struct TaskSlot<R> {
    status: TaskStatus,
    callback: Option<TaskCallback<R>>,
}

/// A single-invocation unit of work for the runtime.
///
/// The callback sits in a slot that is emptied under the lock before it runs,
/// so no matter how many times [`Task::execute`] is called or how it races
/// with [`Task::cancel`], each callback runs at most once.
pub struct Task<R> {
    id: u64,
    priority: SchedulerPriority,
    expiration: Instant,
    slot: Mutex<TaskSlot<R>>,
}

impl<R> Task<R> {
    pub fn new(
        id: u64,
        priority: SchedulerPriority,
        expiration: Instant,
        callback: impl FnOnce(&mut R, &TaskContext) -> TaskOutcome<R> + Send + 'static,
    ) -> Self {
        Self::from_callback(id, priority, expiration, Box::new(callback))
    }

    pub(crate) fn from_callback(
        id: u64,
        priority: SchedulerPriority,
        expiration: Instant,
        callback: TaskCallback<R>,
    ) -> Self {
        Self {
            id,
            priority,
            expiration,
            slot: Mutex::new(TaskSlot {
                status: TaskStatus::Queued,
                callback: Some(callback),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn priority(&self) -> SchedulerPriority {
        self.priority
    }

    pub fn expiration(&self) -> Instant {
        self.expiration
    }

    pub fn status(&self) -> TaskStatus {
        self.slot.lock().status
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expiration
    }

    /// Runs the callback if it is still there.
    pub fn execute(&self, runtime: &mut R, did_timeout: bool) -> ExecutionResult {
        let callback = {
            let mut slot = self.slot.lock();
            match slot.callback.take() {
                Some(callback) => {
                    slot.status = TaskStatus::Executing;
                    callback
                }
                None => return ExecutionResult::Empty,
            }
        };

        let context = TaskContext {
            did_timeout,
            priority: self.priority,
        };
        let outcome = callback(runtime, &context);

        let mut slot = self.slot.lock();
        match outcome {
            TaskOutcome::Continue(continuation) if slot.status == TaskStatus::Executing => {
                slot.callback = Some(continuation.0);
                slot.status = TaskStatus::Queued;
                ExecutionResult::Continued
            }
            _ => {
                if slot.status == TaskStatus::Executing {
                    slot.status = TaskStatus::Completed;
                }
                ExecutionResult::Completed
            }
        }
    }

    /// Clears the callback. Returns false when the task already completed or
    /// was cancelled before.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        match slot.status {
            TaskStatus::Queued | TaskStatus::Executing => {
                slot.callback = None;
                slot.status = TaskStatus::Cancelled;
                true
            }
            TaskStatus::Completed | TaskStatus::Cancelled => false,
        }
    }
}

impl<R> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("status", &self.status())
            .finish()
    }
}

/// Caller-side reference to a scheduled task.
///
/// A handle returned after the scheduler was torn down is inert: it refers to
/// no task, reports [`TaskStatus::Cancelled`] and cannot be cancelled.
pub struct TaskHandle<R> {
    task: Option<Arc<Task<R>>>,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(task: Arc<Task<R>>) -> Self {
        Self { task: Some(task) }
    }

    pub(crate) fn inert() -> Self {
        Self { task: None }
    }

    pub(crate) fn task(&self) -> Option<&Arc<Task<R>>> {
        self.task.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.task.is_none()
    }

    pub fn id(&self) -> Option<u64> {
        self.task.as_ref().map(|task| task.id())
    }

    pub fn priority(&self) -> Option<SchedulerPriority> {
        self.task.as_ref().map(|task| task.priority())
    }

    pub fn status(&self) -> TaskStatus {
        self.task
            .as_ref()
            .map_or(TaskStatus::Cancelled, |task| task.status())
    }
}

impl<R> Clone for TaskHandle<R> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
        }
    }
}

impl<R> fmt::Debug for TaskHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.task {
            Some(task) => task.fmt(f),
            None => f.write_str("TaskHandle(inert)"),
        }
    }
}
