//! Testing utilities for Fabric-RS

pub mod builder;
pub mod components;
pub mod random;
pub mod replay;

pub use builder::{NodeSpec, TreeBuilder};
pub use components::{ComponentKind, TestComponents};
pub use fabric_runtime_scheduler::{ManualClock, ManualRuntimeExecutor};
pub use random::RandomTreeGenerator;
pub use replay::{assert_mutations_replay, assert_removals_precede_insertions, count_kind};

pub mod prelude {
    pub use crate::builder::*;
    pub use crate::components::*;
    pub use crate::random::*;
    pub use crate::replay::*;
}
