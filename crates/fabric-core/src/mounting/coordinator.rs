use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::differentiator::{calculate_shadow_view_mutations, DifferentiatorMode};
use crate::family::SurfaceId;
use crate::mounting::telemetry::TransactionTelemetry;
use crate::mutation::ShadowViewMutationList;
use crate::shadow_tree::ShadowTreeRevision;

/// Mutations that bring the host views of a surface from the previously
/// mounted revision to a newer one.
#[derive(Clone, Debug)]
pub struct MountingTransaction {
    surface_id: SurfaceId,
    number: u64,
    mutations: ShadowViewMutationList,
    telemetry: TransactionTelemetry,
}

impl MountingTransaction {
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Sequence number of this transaction on its surface, starting at 1.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn mutations(&self) -> &ShadowViewMutationList {
        &self.mutations
    }

    pub fn into_mutations(self) -> ShadowViewMutationList {
        self.mutations
    }

    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }
}

struct CoordinatorState {
    base_revision: ShadowTreeRevision,
    last_revision: Option<ShadowTreeRevision>,
    transaction_number: u64,
}

/// Hand-off point between the commit side and the mounting side of a surface.
///
/// Commits push revisions in commit order. The mounting layer pulls whenever it
/// is ready; all revisions pushed since the last pull collapse into one diff
/// against the last mounted revision.
pub struct MountingCoordinator {
    surface_id: SurfaceId,
    mode: DifferentiatorMode,
    state: Mutex<CoordinatorState>,
    signal: Condvar,
}

impl MountingCoordinator {
    pub fn new(base_revision: ShadowTreeRevision, mode: DifferentiatorMode) -> Self {
        Self {
            surface_id: base_revision.root.surface_id(),
            mode,
            state: Mutex::new(CoordinatorState {
                base_revision,
                last_revision: None,
                transaction_number: 0,
            }),
            signal: Condvar::new(),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn push(&self, revision: ShadowTreeRevision) {
        let mut state = self.state.lock();
        let newest = state
            .last_revision
            .as_ref()
            .map_or(state.base_revision.number, |last| last.number);
        assert!(
            revision.number > newest,
            "surface {}: revision {} pushed after {}",
            self.surface_id,
            revision.number,
            newest
        );
        state.last_revision = Some(revision);
        self.signal.notify_all();
    }

    /// Drops the pending revision, if any. The next pull diffs against the
    /// last mounted revision again.
    pub fn revoke(&self) {
        self.state.lock().last_revision = None;
    }

    pub fn has_pending_transactions(&self) -> bool {
        self.state.lock().last_revision.is_some()
    }

    pub fn base_revision(&self) -> ShadowTreeRevision {
        self.state.lock().base_revision.clone()
    }

    pub fn pull_transaction(&self) -> Option<MountingTransaction> {
        let mut state = self.state.lock();
        let revision = state.last_revision.take()?;

        let mut telemetry = revision.telemetry;
        telemetry.will_diff();
        let mutations = calculate_shadow_view_mutations(
            self.mode,
            &state.base_revision.root,
            &revision.root,
        );
        telemetry.did_diff();

        state.transaction_number += 1;
        let number = state.transaction_number;
        log::debug!(
            "surface {}: transaction {} mounts revision {} -> {} ({} mutations)",
            self.surface_id,
            number,
            state.base_revision.number,
            revision.number,
            mutations.len()
        );
        state.base_revision = revision;

        Some(MountingTransaction {
            surface_id: self.surface_id,
            number,
            mutations,
            telemetry,
        })
    }

    /// Blocks until a revision is pending or `timeout` elapses.
    pub fn wait_for_transaction(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.last_revision.is_none() {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                return state.last_revision.is_some();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDescriptor, ShadowNodeTraits};
    use crate::config::RendererConfig;
    use crate::family::{ShadowNodeFamily, ShadowNodeFamilyFragment};
    use crate::layout::LayoutMetrics;
    use crate::mutation::MutationKind;
    use crate::shadow_node::{ShadowNode, ShadowNodeFragment};
    use crate::shadow_tree::{CommitOptions, ShadowTree};
    use std::sync::Arc;
    use std::thread;

    fn tree() -> ShadowTree {
        let root = Arc::new(ComponentDescriptor::new(
            "Root",
            ShadowNodeTraits::ROOT_NODE_KIND | ShadowNodeTraits::FORMS_VIEW,
        ));
        ShadowTree::new(3, root, LayoutMetrics::EMPTY, RendererConfig::default(), None)
    }

    fn append_view(tree: &ShadowTree, tag: i32) {
        let family = Arc::new(ShadowNodeFamily::new(
            ShadowNodeFamilyFragment { tag, surface_id: 3 },
            Arc::new(ComponentDescriptor::new("View", ShadowNodeTraits::FORMS_VIEW)),
        ));
        let child = Arc::new(ShadowNode::new(family, ShadowNodeFragment::new()));
        tree.commit(
            |root| {
                let mut root = root.clone_with(ShadowNodeFragment::new());
                root.append_child(Arc::clone(&child));
                Some(root)
            },
            CommitOptions::default(),
        )
        .expect("commit");
    }

    #[test]
    fn nothing_to_pull_before_a_commit() {
        let tree = tree();
        assert!(tree.mounting_coordinator().pull_transaction().is_none());
        assert!(!tree
            .mounting_coordinator()
            .wait_for_transaction(Duration::from_millis(1)));
    }

    #[test]
    fn pending_revisions_coalesce_into_one_transaction() {
        let tree = tree();
        append_view(&tree, 10);
        append_view(&tree, 11);

        let coordinator = tree.mounting_coordinator();
        let transaction = coordinator.pull_transaction().expect("transaction");
        assert_eq!(transaction.number(), 1);
        let created: Vec<_> = transaction
            .mutations()
            .iter()
            .filter(|mutation| mutation.kind() == MutationKind::Create)
            .map(|mutation| mutation.tag())
            .collect();
        assert_eq!(created, vec![10, 11]);
        assert_eq!(coordinator.base_revision().number, 2);
        assert!(transaction.telemetry().diff_duration().is_some());
        assert!(coordinator.pull_transaction().is_none());
    }

    #[test]
    fn revoke_drops_pending_revision() {
        let tree = tree();
        append_view(&tree, 10);
        let coordinator = tree.mounting_coordinator();
        coordinator.revoke();
        assert!(!coordinator.has_pending_transactions());
        assert_eq!(coordinator.base_revision().number, 0);
    }

    #[test]
    fn waiting_wakes_up_on_commit() {
        let tree = Arc::new(tree());
        let coordinator = Arc::clone(tree.mounting_coordinator());
        let committer = {
            let tree = Arc::clone(&tree);
            thread::spawn(move || append_view(&tree, 10))
        };
        assert!(coordinator.wait_for_transaction(Duration::from_secs(5)));
        committer.join().expect("committer");
        assert_eq!(coordinator.pull_transaction().map(|t| t.mutations().len()), Some(2));
    }

    #[test]
    #[should_panic(expected = "pushed after")]
    fn pushing_an_older_revision_panics() {
        let tree = tree();
        append_view(&tree, 10);
        let coordinator = tree.mounting_coordinator();
        coordinator.push(coordinator.base_revision());
    }
}
