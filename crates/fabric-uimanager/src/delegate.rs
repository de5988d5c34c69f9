use std::sync::Arc;

use fabric_core::{MountingCoordinator, ShadowNode, SharedShadowNode, SurfaceId};

/// Receives the UIManager's output.
pub trait UIManagerDelegate: Send + Sync {
    /// A commit pushed a new revision to `coordinator`.
    fn ui_manager_did_finish_transaction(
        &self,
        coordinator: Arc<MountingCoordinator>,
        mount_synchronously: bool,
    );

    fn ui_manager_did_create_shadow_node(&self, node: &ShadowNode) {
        let _ = node;
    }
}

/// Gets to rewrite (or veto) every commit of every surface before it is sealed.
///
/// Hooks run under the committing tree's lock, in registration order, each
/// one receiving the previous hook's root.
pub trait UIManagerCommitHook: Send + Sync {
    fn commit_hook_was_registered(&self) {}

    fn shadow_tree_will_commit(
        &self,
        surface_id: SurfaceId,
        old_root: &SharedShadowNode,
        new_root: SharedShadowNode,
    ) -> Option<SharedShadowNode>;

    fn commit_hook_was_unregistered(&self) {}
}
