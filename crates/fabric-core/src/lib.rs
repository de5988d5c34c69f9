#![doc = r"Shadow tree model, commit protocol and differentiator of the Fabric-RS renderer."]

pub mod collections;
pub mod component;
pub mod config;
pub mod differentiator;
pub mod error;
pub mod family;
pub mod hash;
pub mod layout;
pub mod leak_checker;
pub mod mounting;
pub mod mutation;
pub mod props;
pub mod sealable;
pub mod shadow_node;
pub mod shadow_tree;
pub mod shadow_view;
pub mod state;

pub use component::{ComponentDescriptor, ComponentHandle, ShadowNodeTraits};
pub use config::RendererConfig;
pub use differentiator::{calculate_shadow_view_mutations, flattened_children, DifferentiatorMode};
pub use error::{CommitError, StubViewTreeError};
pub use family::{ShadowNodeFamily, ShadowNodeFamilyFragment, SharedFamily, SurfaceId, Tag};
pub use layout::{DisplayType, LayoutMetrics, Point, Rect, Size};
pub use leak_checker::{LeakChecker, LeakReport, WeakFamilyRegistry};
pub use mounting::{
    MountingCoordinator, MountingTransaction, StubView, StubViewTree, TransactionTelemetry,
};
pub use mutation::{MutationKind, ShadowViewMutation, ShadowViewMutationList};
pub use props::{PropValue, Props, RawProps, SharedProps};
pub use sealable::Sealable;
pub use shadow_node::{ShadowNode, ShadowNodeFragment, SharedChildren, SharedShadowNode};
pub use shadow_tree::{
    CommitOptions, ShadowTree, ShadowTreeDelegate, ShadowTreeRevision, ShadowTreeStatus,
};
pub use shadow_view::{ShadowView, ShadowViewNodePair};
pub use state::{SharedState, State, StateData};
