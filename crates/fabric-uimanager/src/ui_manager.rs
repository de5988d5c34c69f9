//! JS-facing entry point of the renderer.
//!
//! The UIManager creates and clones shadow nodes on behalf of the JavaScript
//! side, owns the running surfaces and routes every commit through the
//! registered commit hooks before handing the result to its delegate.

use std::fmt;
use std::sync::{Arc, Weak};

use fabric_core::{
    CommitOptions, LayoutMetrics, LeakChecker, LeakReport, MountingCoordinator, Props, RawProps,
    RendererConfig, ShadowNode, ShadowNodeFamily, ShadowNodeFamilyFragment, ShadowNodeFragment,
    ShadowTree, ShadowTreeDelegate, ShadowTreeRevision, SharedShadowNode, SharedState, State,
    StateData, SurfaceId, Tag,
};
use parking_lot::RwLock;

use crate::component_registry::{ComponentDescriptorRegistry, ROOT_COMPONENT_NAME};
use crate::delegate::{UIManagerCommitHook, UIManagerDelegate};
use crate::error::UIManagerError;
use crate::tree_registry::ShadowTreeRegistry;

pub struct UIManager {
    config: RendererConfig,
    components: ComponentDescriptorRegistry,
    trees: ShadowTreeRegistry,
    commit_hooks: RwLock<Vec<Arc<dyn UIManagerCommitHook>>>,
    delegate: RwLock<Option<Weak<dyn UIManagerDelegate>>>,
    leak_checker: LeakChecker,
    weak_self: Weak<UIManager>,
}

impl UIManager {
    pub fn new(components: ComponentDescriptorRegistry, config: RendererConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            leak_checker: LeakChecker::new(config.enable_leak_checker),
            config,
            components,
            trees: ShadowTreeRegistry::new(),
            commit_hooks: RwLock::new(Vec::new()),
            delegate: RwLock::new(None),
            weak_self: Weak::clone(weak_self),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn component_registry(&self) -> &ComponentDescriptorRegistry {
        &self.components
    }

    pub fn shadow_tree_registry(&self) -> &ShadowTreeRegistry {
        &self.trees
    }

    /// The delegate is held weakly; it usually owns the UIManager.
    pub fn set_delegate(&self, delegate: Option<Weak<dyn UIManagerDelegate>>) {
        *self.delegate.write() = delegate;
    }

    fn delegate(&self) -> Option<Arc<dyn UIManagerDelegate>> {
        self.delegate.read().as_ref().and_then(|delegate| delegate.upgrade())
    }

    /// Creates an unsealed node of a new family. `state_data`, when given,
    /// becomes the family's initial state.
    pub fn create_node(
        &self,
        tag: Tag,
        component_name: &str,
        surface_id: SurfaceId,
        raw_props: &RawProps,
        state_data: Option<StateData>,
    ) -> Result<ShadowNode, UIManagerError> {
        let component = self
            .components
            .get(component_name)
            .ok_or_else(|| UIManagerError::UnknownComponent(component_name.to_owned()))?;
        let family = Arc::new(ShadowNodeFamily::new(
            ShadowNodeFamilyFragment { tag, surface_id },
            component,
        ));
        self.leak_checker.track(&family);

        let mut fragment = ShadowNodeFragment::new().props(Arc::new(Props::from_raw(raw_props)));
        if let Some(data) = state_data {
            fragment = fragment.state(Arc::new(State::initial(&family, data)));
        }
        let node = ShadowNode::new(family, fragment);
        log::trace!("created node {} ({}) on surface {}", tag, component_name, surface_id);

        if let Some(delegate) = self.delegate() {
            delegate.ui_manager_did_create_shadow_node(&node);
        }
        Ok(node)
    }

    /// Unsealed copy of `node`, with its children replaced and `raw_props`
    /// merged over its props when given.
    pub fn clone_node(
        &self,
        node: &ShadowNode,
        children: Option<Vec<SharedShadowNode>>,
        raw_props: Option<&RawProps>,
    ) -> ShadowNode {
        let mut fragment = ShadowNodeFragment::new();
        if let Some(raw_props) = raw_props {
            fragment = fragment.props(Arc::new(node.props().merged(raw_props)));
        }
        if let Some(children) = children {
            fragment = fragment.children(children);
        }
        node.clone_with(fragment)
    }

    /// Commits `children` as the new content of the surface root.
    pub fn complete_surface(
        &self,
        surface_id: SurfaceId,
        children: Vec<SharedShadowNode>,
        options: CommitOptions,
    ) -> Result<ShadowTreeRevision, UIManagerError> {
        let tree = self
            .trees
            .get(surface_id)
            .ok_or(UIManagerError::SurfaceNotRunning(surface_id))?;
        let revision = tree.commit(
            |root| Some(root.clone_with(ShadowNodeFragment::new().children(children.clone()))),
            options,
        )?;
        Ok(revision)
    }

    /// Commits a new revision of `state` carrying `data` into the tree that
    /// holds its node. The new state follows the newest committed one, so
    /// updates racing with each other are never lost.
    pub fn update_state(
        &self,
        state: &SharedState,
        data: StateData,
    ) -> Result<ShadowTreeRevision, UIManagerError> {
        let family = state.family().ok_or(UIManagerError::StateFamilyGone)?;
        let tree = self
            .trees
            .get(family.surface_id())
            .ok_or(UIManagerError::SurfaceNotRunning(family.surface_id()))?;

        let revision = tree.commit(
            |root| {
                root.clone_tree(&family, |node| {
                    let base = family
                        .most_recent_state()
                        .or_else(|| node.state().cloned())
                        .unwrap_or_else(|| Arc::clone(state));
                    let next = Arc::new(base.next(Arc::clone(&data)));
                    node.clone_with(ShadowNodeFragment::new().state(next))
                })
            },
            CommitOptions::default(),
        )?;
        Ok(revision)
    }

    /// Creates the surface's tree with its empty root revision.
    pub fn start_surface(
        &self,
        surface_id: SurfaceId,
        layout_metrics: LayoutMetrics,
    ) -> Result<Arc<ShadowTree>, UIManagerError> {
        if self.trees.get(surface_id).is_some() {
            return Err(UIManagerError::SurfaceAlreadyRunning(surface_id));
        }
        let root_component = self
            .components
            .get(ROOT_COMPONENT_NAME)
            .ok_or_else(|| UIManagerError::UnknownComponent(ROOT_COMPONENT_NAME.to_owned()))?;
        let delegate: Weak<dyn ShadowTreeDelegate> = self.weak_self.clone();
        let tree = Arc::new(ShadowTree::new(
            surface_id,
            root_component,
            layout_metrics,
            self.config.clone(),
            Some(delegate),
        ));
        if !self.trees.add(Arc::clone(&tree)) {
            return Err(UIManagerError::SurfaceAlreadyRunning(surface_id));
        }
        self.leak_checker.track(tree.current_revision().root.family());
        log::debug!("surface {} started", surface_id);
        Ok(tree)
    }

    /// Unmounts every view of the surface, stops its tree and forgets it.
    pub fn stop_surface(&self, surface_id: SurfaceId) -> Result<Arc<ShadowTree>, UIManagerError> {
        let tree = self
            .trees
            .get(surface_id)
            .ok_or(UIManagerError::SurfaceNotRunning(surface_id))?;
        // The host has to see the views go before the surface is detached.
        let options = CommitOptions {
            mount_synchronously: true,
        };
        if let Err(err) = tree.commit_empty_tree(options) {
            log::warn!("surface {}: final empty commit failed: {}", surface_id, err);
        }
        tree.stop();
        self.trees.remove(surface_id);
        log::debug!("surface {} stopped", surface_id);
        Ok(tree)
    }

    pub fn find_node_by_tag(&self, tag: Tag, surface_id: SurfaceId) -> Option<SharedShadowNode> {
        self.trees.visit(surface_id, |tree| tree.find_node(tag)).flatten()
    }

    pub fn register_commit_hook(&self, hook: Arc<dyn UIManagerCommitHook>) {
        self.commit_hooks.write().push(Arc::clone(&hook));
        hook.commit_hook_was_registered();
    }

    pub fn unregister_commit_hook(&self, hook: &Arc<dyn UIManagerCommitHook>) {
        let removed = {
            let mut hooks = self.commit_hooks.write();
            let before = hooks.len();
            hooks.retain(|registered| !same_hook(registered, hook));
            before != hooks.len()
        };
        if removed {
            hook.commit_hook_was_unregistered();
        }
    }

    /// Reports the nodes of a stopped surface that are still alive. Call once
    /// the mounting layer has released the surface's last revision.
    pub fn check_for_leaks(&self, surface_id: SurfaceId) -> LeakReport {
        self.leak_checker.check(surface_id)
    }
}

fn same_hook(a: &Arc<dyn UIManagerCommitHook>, b: &Arc<dyn UIManagerCommitHook>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl ShadowTreeDelegate for UIManager {
    fn shadow_tree_will_commit(
        &self,
        surface_id: SurfaceId,
        old_root: &SharedShadowNode,
        new_root: SharedShadowNode,
    ) -> Option<SharedShadowNode> {
        let hooks = self.commit_hooks.read().clone();
        hooks.iter().try_fold(new_root, |root, hook| {
            hook.shadow_tree_will_commit(surface_id, old_root, root)
        })
    }

    fn shadow_tree_did_finish_transaction(
        &self,
        coordinator: Arc<MountingCoordinator>,
        mount_synchronously: bool,
    ) {
        match self.delegate() {
            Some(delegate) => {
                delegate.ui_manager_did_finish_transaction(coordinator, mount_synchronously)
            }
            None => log::trace!(
                "surface {}: no delegate for finished transaction",
                coordinator.surface_id()
            ),
        }
    }
}

impl fmt::Debug for UIManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UIManager")
            .field("surfaces", &self.trees.surface_ids())
            .field("components", &self.components.len())
            .field("commit_hooks", &self.commit_hooks.read().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/ui_manager_tests.rs"]
mod tests;
