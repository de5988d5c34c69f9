//! One surface's sequence of committed root revisions.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::component::ComponentDescriptor;
use crate::config::RendererConfig;
use crate::error::CommitError;
use crate::family::{ShadowNodeFamily, ShadowNodeFamilyFragment, SurfaceId, Tag};
use crate::layout::LayoutMetrics;
use crate::mounting::{MountingCoordinator, TransactionTelemetry};
use crate::shadow_node::{ShadowNode, ShadowNodeFragment, SharedShadowNode};

/// A committed, sealed root together with its position in the commit sequence.
#[derive(Clone, Debug)]
pub struct ShadowTreeRevision {
    pub root: SharedShadowNode,
    /// 0 for the empty root installed when the surface starts.
    pub number: u64,
    pub telemetry: TransactionTelemetry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowTreeStatus {
    /// Only the initial empty root has been installed.
    Empty,
    HasRoot,
    /// Terminal; every later commit fails with [`CommitError::Stopped`].
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Ask the delegate to mount the resulting transaction before the commit
    /// call returns instead of on the next rendering update.
    pub mount_synchronously: bool,
}

/// Observer of a [`ShadowTree`]'s commits.
pub trait ShadowTreeDelegate: Send + Sync {
    /// Last chance to replace the root of a commit before it is sealed.
    /// Returning `None` cancels the commit.
    ///
    /// Runs under the tree's commit lock: it must not commit to or read the
    /// same tree.
    fn shadow_tree_will_commit(
        &self,
        surface_id: SurfaceId,
        old_root: &SharedShadowNode,
        new_root: SharedShadowNode,
    ) -> Option<SharedShadowNode> {
        let _ = (surface_id, old_root);
        Some(new_root)
    }

    /// A new revision was pushed to `coordinator`. Called after the commit lock
    /// is released.
    fn shadow_tree_did_finish_transaction(
        &self,
        coordinator: Arc<MountingCoordinator>,
        mount_synchronously: bool,
    );
}

struct TreeState {
    revision: ShadowTreeRevision,
    status: ShadowTreeStatus,
}

pub struct ShadowTree {
    surface_id: SurfaceId,
    config: RendererConfig,
    state: Mutex<TreeState>,
    mounting_coordinator: Arc<MountingCoordinator>,
    delegate: Option<Weak<dyn ShadowTreeDelegate>>,
}

impl ShadowTree {
    /// Creates the tree with revision 0: a sealed, childless root whose tag is
    /// the surface id.
    pub fn new(
        surface_id: SurfaceId,
        root_component: Arc<ComponentDescriptor>,
        layout_metrics: LayoutMetrics,
        config: RendererConfig,
        delegate: Option<Weak<dyn ShadowTreeDelegate>>,
    ) -> Self {
        let family = Arc::new(ShadowNodeFamily::new(
            ShadowNodeFamilyFragment {
                tag: surface_id,
                surface_id,
            },
            root_component,
        ));
        let root = Arc::new(ShadowNode::new(
            family,
            ShadowNodeFragment::new().layout_metrics(layout_metrics),
        ));
        root.seal();

        let revision = ShadowTreeRevision {
            root,
            number: 0,
            telemetry: TransactionTelemetry::default(),
        };
        let mounting_coordinator = Arc::new(MountingCoordinator::new(
            revision.clone(),
            config.differentiator_mode,
        ));
        Self {
            surface_id,
            config,
            state: Mutex::new(TreeState {
                revision,
                status: ShadowTreeStatus::Empty,
            }),
            mounting_coordinator,
            delegate,
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn mounting_coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.mounting_coordinator
    }

    pub fn current_revision(&self) -> ShadowTreeRevision {
        self.state.lock().revision.clone()
    }

    pub fn status(&self) -> ShadowTreeStatus {
        self.state.lock().status
    }

    /// Installs the root produced by `transaction` if `base` is still the
    /// current revision number.
    ///
    /// The transaction runs under the commit lock and receives the current
    /// root; returning `None` cancels the commit. It must not call back into
    /// this tree.
    pub fn try_commit<F>(
        &self,
        base: u64,
        transaction: F,
        options: CommitOptions,
    ) -> Result<ShadowTreeRevision, CommitError>
    where
        F: FnOnce(&SharedShadowNode) -> Option<ShadowNode>,
    {
        let mut telemetry = TransactionTelemetry::default();
        telemetry.will_commit();

        let revision = {
            let mut state = self.state.lock();
            if state.status == ShadowTreeStatus::Stopped {
                return Err(CommitError::Stopped(self.surface_id));
            }
            if state.revision.number != base {
                return Err(CommitError::StaleRevision {
                    surface_id: self.surface_id,
                    base,
                    current: state.revision.number,
                });
            }

            let old_root = Arc::clone(&state.revision.root);
            let new_root = transaction(&old_root).ok_or(CommitError::Cancelled(self.surface_id))?;
            self.assert_root_family(&old_root, &new_root);

            let mut new_root = Arc::new(new_root);
            if self.config.enable_state_reconciliation {
                if let Some(progressed) = new_root.progress_state_if_necessary() {
                    new_root = Arc::new(progressed);
                }
            }
            if let Some(delegate) = self.delegate() {
                new_root = delegate
                    .shadow_tree_will_commit(self.surface_id, &old_root, new_root)
                    .ok_or(CommitError::Cancelled(self.surface_id))?;
                self.assert_root_family(&old_root, &new_root);
            }

            new_root.seal_for_commit();
            telemetry.did_commit();

            let revision = ShadowTreeRevision {
                root: new_root,
                number: base + 1,
                telemetry,
            };
            state.revision = revision.clone();
            state.status = ShadowTreeStatus::HasRoot;
            self.mounting_coordinator.push(revision.clone());
            revision
        };

        log::debug!(
            "surface {}: committed revision {} in {:?}",
            self.surface_id,
            revision.number,
            revision.telemetry.commit_duration().unwrap_or_default()
        );
        if let Some(delegate) = self.delegate() {
            delegate.shadow_tree_did_finish_transaction(
                Arc::clone(&self.mounting_coordinator),
                options.mount_synchronously,
            );
        }
        Ok(revision)
    }

    /// Commits against whatever revision is current, recomputing the
    /// transaction each time a concurrent commit wins the race.
    pub fn commit<F>(
        &self,
        transaction: F,
        options: CommitOptions,
    ) -> Result<ShadowTreeRevision, CommitError>
    where
        F: Fn(&SharedShadowNode) -> Option<ShadowNode>,
    {
        let limit = self.config.commit_retry_limit.max(1);
        for attempt in 1..=limit {
            let base = self.state.lock().revision.number;
            match self.try_commit(base, &transaction, options) {
                Err(CommitError::StaleRevision { current, .. }) => {
                    log::warn!(
                        "surface {}: commit on revision {} lost to revision {}, retrying (attempt {})",
                        self.surface_id,
                        base,
                        current,
                        attempt
                    );
                }
                result => return result,
            }
        }
        Err(CommitError::RetryLimitExceeded {
            surface_id: self.surface_id,
            attempts: limit,
        })
    }

    /// Commits a root without children, which unmounts every view of the surface.
    pub fn commit_empty_tree(
        &self,
        options: CommitOptions,
    ) -> Result<ShadowTreeRevision, CommitError> {
        self.commit(
            |root| Some(root.clone_with(ShadowNodeFragment::new().children(Vec::new()))),
            options,
        )
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.status != ShadowTreeStatus::Stopped {
            log::debug!(
                "surface {}: stopped at revision {}",
                self.surface_id,
                state.revision.number
            );
            state.status = ShadowTreeStatus::Stopped;
        }
    }

    /// The node with `tag` in the current revision.
    pub fn find_node(&self, tag: Tag) -> Option<SharedShadowNode> {
        fn search(node: &SharedShadowNode, tag: Tag) -> Option<SharedShadowNode> {
            if node.tag() == tag {
                return Some(Arc::clone(node));
            }
            node.children().iter().find_map(|child| search(child, tag))
        }

        let root = Arc::clone(&self.state.lock().revision.root);
        search(&root, tag)
    }

    fn delegate(&self) -> Option<Arc<dyn ShadowTreeDelegate>> {
        self.delegate.as_ref().and_then(|delegate| delegate.upgrade())
    }

    fn assert_root_family(&self, old_root: &ShadowNode, new_root: &ShadowNode) {
        assert!(
            ShadowNode::same_family(old_root, new_root),
            "surface {}: commit replaced the root {} with node {} of another family",
            self.surface_id,
            old_root.tag(),
            new_root.tag()
        );
    }
}

impl std::fmt::Debug for ShadowTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ShadowTree")
            .field("surface_id", &self.surface_id)
            .field("revision", &state.revision.number)
            .field("status", &state.status)
            .finish()
    }
}
