pub mod coordinator;
pub mod stub_view_tree;
pub mod telemetry;

pub use coordinator::{MountingCoordinator, MountingTransaction};
pub use stub_view_tree::{StubView, StubViewTree};
pub use telemetry::TransactionTelemetry;
