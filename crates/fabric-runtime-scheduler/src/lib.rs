#![doc = r"Cooperative priority scheduler for the single JavaScript runtime of Fabric-RS."]

pub mod error;
pub mod manual;
pub mod platform;
pub mod priority;
pub mod scheduler;
pub mod task;

pub use error::SchedulerError;
pub use manual::{ManualClock, ManualRuntimeExecutor};
pub use platform::{Clock, RuntimeExecutor};
pub use priority::SchedulerPriority;
pub use scheduler::{RuntimeScheduler, RuntimeSchedulerConfig, SchedulerStats};
pub use task::{Continuation, ExecutionResult, Task, TaskContext, TaskHandle, TaskOutcome, TaskStatus};
