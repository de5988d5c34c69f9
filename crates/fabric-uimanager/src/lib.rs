#![doc = r"JS-facing UIManager, surface registry and mounting bridge of the Fabric-RS renderer."]

pub mod component_registry;
pub mod delegate;
pub mod error;
pub mod mounting_manager;
pub mod scheduler;
pub mod tree_registry;
pub mod ui_manager;

pub use component_registry::{ComponentDescriptorRegistry, ROOT_COMPONENT_NAME};
pub use delegate::{UIManagerCommitHook, UIManagerDelegate};
pub use error::UIManagerError;
pub use mounting_manager::{HeadlessMountingManager, MountingStats};
pub use scheduler::{Scheduler, SchedulerDelegate};
pub use tree_registry::ShadowTreeRegistry;
pub use ui_manager::UIManager;
