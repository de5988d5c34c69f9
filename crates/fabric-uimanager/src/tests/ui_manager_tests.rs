use std::sync::{Arc, Weak};

use fabric_core::{CommitError, PropValue};
use parking_lot::Mutex;

use super::*;

#[derive(Default)]
struct Recorder {
    transactions: Mutex<Vec<(SurfaceId, bool)>>,
    created: Mutex<Vec<Tag>>,
}

impl UIManagerDelegate for Recorder {
    fn ui_manager_did_finish_transaction(
        &self,
        coordinator: Arc<MountingCoordinator>,
        mount_synchronously: bool,
    ) {
        self.transactions
            .lock()
            .push((coordinator.surface_id(), mount_synchronously));
    }

    fn ui_manager_did_create_shadow_node(&self, node: &ShadowNode) {
        self.created.lock().push(node.tag());
    }
}

fn setup() -> (Arc<UIManager>, Arc<Recorder>) {
    let manager = UIManager::new(
        ComponentDescriptorRegistry::with_standard_components(),
        RendererConfig::default().with_leak_checker(true),
    );
    let recorder = Arc::new(Recorder::default());
    let weak = Arc::downgrade(&recorder);
    let delegate: Weak<dyn UIManagerDelegate> = weak;
    manager.set_delegate(Some(delegate));
    (manager, recorder)
}

fn view(manager: &UIManager, tag: Tag, surface_id: SurfaceId) -> SharedShadowNode {
    let props = RawProps::new().with("backgroundColor", "red");
    Arc::new(
        manager
            .create_node(tag, "View", surface_id, &props, None)
            .expect("create view"),
    )
}

#[test]
fn unknown_component_is_rejected() {
    let (manager, _) = setup();
    let error = manager
        .create_node(5, "Slider", 1, &RawProps::new(), None)
        .unwrap_err();
    assert_eq!(error, UIManagerError::UnknownComponent("Slider".to_owned()));
}

#[test]
fn created_node_carries_props_and_initial_state() {
    let (manager, recorder) = setup();
    let node = manager
        .create_node(
            7,
            "View",
            1,
            &RawProps::new().with("opacity", 0.5),
            Some(Arc::new(3u32)),
        )
        .expect("create");
    assert!(!node.is_sealed());
    assert_eq!(node.props().get("opacity").and_then(PropValue::as_f64), Some(0.5));
    let state = node.state().expect("state");
    assert_eq!(state.revision(), 1);
    assert_eq!(state.data_as::<u32>(), Some(&3));
    assert_eq!(*recorder.created.lock(), vec![7]);
}

#[test]
fn clone_node_merges_props() {
    let (manager, _) = setup();
    let node = manager
        .create_node(7, "View", 1, &RawProps::new().with("opacity", 0.5), None)
        .expect("create");
    let clone = manager.clone_node(
        &node,
        None,
        Some(&RawProps::new().with("testID", "banner")),
    );
    assert_eq!(clone.tag(), 7);
    assert_eq!(clone.revision(), node.revision() + 1);
    assert_eq!(clone.props().len(), 2);
    assert!(Arc::ptr_eq(clone.shared_children(), node.shared_children()));
}

#[test]
fn surfaces_start_once() {
    let (manager, _) = setup();
    let tree = manager
        .start_surface(1, LayoutMetrics::default())
        .expect("start");
    assert_eq!(tree.surface_id(), 1);
    assert_eq!(
        manager.start_surface(1, LayoutMetrics::default()).unwrap_err(),
        UIManagerError::SurfaceAlreadyRunning(1)
    );
    assert_eq!(manager.shadow_tree_registry().surface_ids(), vec![1]);
}

#[test]
fn completing_an_unknown_surface_fails() {
    let (manager, _) = setup();
    let error = manager
        .complete_surface(9, Vec::new(), CommitOptions::default())
        .unwrap_err();
    assert_eq!(error, UIManagerError::SurfaceNotRunning(9));
}

#[test]
fn complete_surface_commits_and_notifies() {
    let (manager, recorder) = setup();
    manager
        .start_surface(1, LayoutMetrics::default())
        .expect("start");
    let revision = manager
        .complete_surface(1, vec![view(&manager, 10, 1)], CommitOptions::default())
        .expect("commit");

    assert_eq!(revision.number, 1);
    assert!(revision.root.is_sealed());
    let node = manager.find_node_by_tag(10, 1).expect("committed node");
    assert!(node.is_sealed());
    assert!(manager.find_node_by_tag(10, 2).is_none());
    assert_eq!(*recorder.transactions.lock(), vec![(1, false)]);
}

#[test]
fn state_updates_build_on_the_newest_state() {
    let (manager, _) = setup();
    manager
        .start_surface(1, LayoutMetrics::default())
        .expect("start");
    let node = manager
        .create_node(10, "View", 1, &RawProps::new(), Some(Arc::new(1u32)))
        .expect("create");
    let initial = Arc::clone(node.state().expect("state"));
    manager
        .complete_surface(1, vec![Arc::new(node)], CommitOptions::default())
        .expect("commit");

    let revision = manager
        .update_state(&initial, Arc::new(2u32))
        .expect("first update");
    assert_eq!(revision.number, 2);

    // A stale handle still lands on top of the newest committed state.
    manager
        .update_state(&initial, Arc::new(3u32))
        .expect("second update");
    let node = manager.find_node_by_tag(10, 1).expect("node");
    let state = node.state().expect("state");
    assert_eq!(state.revision(), 3);
    assert_eq!(state.data_as::<u32>(), Some(&3));
    assert!(initial.is_obsolete());
}

#[test]
fn state_of_a_dropped_node_cannot_be_updated() {
    let (manager, _) = setup();
    let node = manager
        .create_node(10, "View", 1, &RawProps::new(), Some(Arc::new(1u32)))
        .expect("create");
    let state = Arc::clone(node.state().expect("state"));
    drop(node);
    assert_eq!(
        manager.update_state(&state, Arc::new(2u32)).unwrap_err(),
        UIManagerError::StateFamilyGone
    );
}

#[derive(Default)]
struct Veto {
    registered: Mutex<u32>,
    unregistered: Mutex<u32>,
}

impl UIManagerCommitHook for Veto {
    fn commit_hook_was_registered(&self) {
        *self.registered.lock() += 1;
    }

    fn shadow_tree_will_commit(
        &self,
        surface_id: SurfaceId,
        _old_root: &SharedShadowNode,
        new_root: SharedShadowNode,
    ) -> Option<SharedShadowNode> {
        (surface_id != 2).then_some(new_root)
    }

    fn commit_hook_was_unregistered(&self) {
        *self.unregistered.lock() += 1;
    }
}

#[test]
fn commit_hooks_can_veto_commits() {
    let (manager, recorder) = setup();
    manager
        .start_surface(1, LayoutMetrics::default())
        .expect("start");
    manager
        .start_surface(2, LayoutMetrics::default())
        .expect("start");
    let veto = Arc::new(Veto::default());
    let hook: Arc<dyn UIManagerCommitHook> = veto.clone();
    manager.register_commit_hook(Arc::clone(&hook));
    assert_eq!(*veto.registered.lock(), 1);

    manager
        .complete_surface(1, vec![view(&manager, 10, 1)], CommitOptions::default())
        .expect("surface 1 commits");
    assert_eq!(
        manager
            .complete_surface(2, vec![view(&manager, 20, 2)], CommitOptions::default())
            .unwrap_err(),
        UIManagerError::Commit(CommitError::Cancelled(2))
    );
    assert!(manager.find_node_by_tag(20, 2).is_none());

    manager.unregister_commit_hook(&hook);
    manager.unregister_commit_hook(&hook);
    assert_eq!(*veto.unregistered.lock(), 1);
    manager
        .complete_surface(2, vec![view(&manager, 20, 2)], CommitOptions::default())
        .expect("surface 2 commits");
    assert_eq!(*recorder.transactions.lock(), vec![(1, false), (2, false)]);
}

#[test]
fn stopping_unmounts_synchronously() {
    let (manager, recorder) = setup();
    drop(manager.start_surface(1, LayoutMetrics::default()).expect("start"));
    manager
        .complete_surface(1, vec![view(&manager, 10, 1)], CommitOptions::default())
        .expect("commit");

    let stopped = manager.stop_surface(1).expect("stop");
    assert!(stopped.current_revision().root.children().is_empty());
    assert_eq!(*recorder.transactions.lock(), vec![(1, false), (1, true)]);
    assert_eq!(
        manager
            .complete_surface(1, Vec::new(), CommitOptions::default())
            .unwrap_err(),
        UIManagerError::SurfaceNotRunning(1)
    );
    assert_eq!(manager.stop_surface(1).unwrap_err(), UIManagerError::SurfaceNotRunning(1));

    drop(stopped);
    assert!(manager.check_for_leaks(1).is_clean());
}

#[test]
fn retained_nodes_are_reported_as_leaks() {
    let (manager, _) = setup();
    drop(manager.start_surface(1, LayoutMetrics::default()).expect("start"));
    manager
        .complete_surface(1, vec![view(&manager, 10, 1)], CommitOptions::default())
        .expect("commit");
    let retained = manager.find_node_by_tag(10, 1).expect("node");

    drop(manager.stop_surface(1).expect("stop"));
    let report = manager.check_for_leaks(1);
    assert_eq!(report.leaked.len(), 1);
    assert_eq!(report.leaked[0].0, 10);
    assert_eq!(&*report.leaked[0].1, "View");
    drop(retained);
}
