use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fabric_core::{
    calculate_shadow_view_mutations, CommitOptions, DifferentiatorMode, LayoutMetrics,
    MutationKind, PropValue, RawProps, RendererConfig, ShadowNode, ShadowNodeFragment,
    ShadowTree, ShadowViewMutation, SharedShadowNode, State, StubViewTree,
};
use fabric_testing::prelude::*;

const SURFACE: i32 = 1;

fn tree(builder: &TreeBuilder, mode: DifferentiatorMode) -> ShadowTree {
    ShadowTree::new(
        SURFACE,
        Arc::clone(builder.components().root()),
        LayoutMetrics::default(),
        RendererConfig::default().with_differentiator_mode(mode),
        None,
    )
}

fn commit_children(tree: &ShadowTree, children: &[SharedShadowNode]) -> u64 {
    tree.commit(
        |root| Some(root.clone_with(ShadowNodeFragment::new().children(children.to_vec()))),
        CommitOptions::default(),
    )
    .expect("commit")
    .number
}

#[test]
fn changing_one_prop_updates_only_that_view() {
    let mut builder = TreeBuilder::new(SURFACE);
    let tree = tree(&builder, DifferentiatorMode::Classic);
    let coordinator = Arc::clone(tree.mounting_coordinator());

    let first = builder.children(&[
        NodeSpec::view(10).prop("color", "red"),
        NodeSpec::view(11),
    ]);
    commit_children(&tree, &first);
    let mounted = coordinator.pull_transaction().expect("first transaction");
    assert_eq!(count_kind(mounted.mutations(), MutationKind::Create), 2);
    assert_eq!(count_kind(mounted.mutations(), MutationKind::Insert), 2);

    let recolored = builder.node(&NodeSpec::view(10).prop("color", "blue"));
    commit_children(&tree, &[recolored, Arc::clone(&first[1])]);
    let transaction = coordinator.pull_transaction().expect("second transaction");

    assert_eq!(transaction.number(), 2);
    match transaction.mutations().as_slice() {
        [ShadowViewMutation::Update { new, .. }] => {
            assert_eq!(new.tag, 10);
            assert_eq!(new.props.get("color").and_then(PropValue::as_str), Some("blue"));
        }
        other => panic!("expected a single update, got {other:?}"),
    }
}

#[test]
fn swapping_siblings_moves_them() {
    let mut builder = TreeBuilder::new(SURFACE);
    let tree = tree(&builder, DifferentiatorMode::Classic);
    let nodes = builder.children(&[NodeSpec::view(10), NodeSpec::view(11), NodeSpec::view(12)]);
    commit_children(&tree, &nodes);
    let before = tree.current_revision();

    let swapped = vec![
        Arc::clone(&nodes[1]),
        Arc::clone(&nodes[0]),
        Arc::clone(&nodes[2]),
    ];
    commit_children(&tree, &swapped);
    let after = tree.current_revision();

    let classic = assert_mutations_replay(DifferentiatorMode::Classic, &before.root, &after.root);
    assert!(count_kind(&classic, MutationKind::Remove) >= 1);
    assert!(count_kind(&classic, MutationKind::Insert) >= 1);
    assert_eq!(count_kind(&classic, MutationKind::Create), 0);
    assert_eq!(count_kind(&classic, MutationKind::Delete), 0);

    let optimized =
        assert_mutations_replay(DifferentiatorMode::OptimizedMoves, &before.root, &after.root);
    assert!(optimized.len() <= classic.len());

    for mode in [DifferentiatorMode::Classic, DifferentiatorMode::OptimizedMoves] {
        assert!(calculate_shadow_view_mutations(mode, &after.root, &after.root).is_empty());
    }
}

#[test]
fn pending_commits_coalesce_into_one_transaction() {
    let mut builder = TreeBuilder::new(SURFACE);
    let tree = tree(&builder, DifferentiatorMode::OptimizedMoves);
    let coordinator = Arc::clone(tree.mounting_coordinator());
    let mounted = coordinator.base_revision();

    let first = builder.children(&[NodeSpec::view(10), NodeSpec::view(11)]);
    commit_children(&tree, &first);
    let second = builder.children(&[
        NodeSpec::view(11).frame(0.0, 10.0, 100.0, 20.0),
        NodeSpec::container(12).child(NodeSpec::text(13)),
    ]);
    commit_children(&tree, &second);
    let newest = tree.current_revision();

    let transaction = coordinator.pull_transaction().expect("transaction");
    assert_eq!(transaction.number(), 1);
    assert!(coordinator.pull_transaction().is_none());

    let direct = calculate_shadow_view_mutations(
        DifferentiatorMode::OptimizedMoves,
        &mounted.root,
        &newest.root,
    );
    assert_eq!(transaction.mutations(), &direct);

    let mut views = StubViewTree::from_shadow_tree(&mounted.root);
    views.apply(transaction.mutations()).expect("apply");
    assert_eq!(views, StubViewTree::from_shadow_tree(&newest.root));
    assert_eq!(views.children_of(SURFACE), &[11, 13]);
}

#[test]
fn outdated_state_is_replaced_on_commit() {
    let mut builder = TreeBuilder::new(SURFACE);
    let tree = tree(&builder, DifferentiatorMode::Classic);
    let family = builder.family(10, ComponentKind::Image);
    let initial = Arc::new(State::initial(&family, Arc::new(1u32)));
    let image = Arc::new(ShadowNode::new(
        Arc::clone(&family),
        ShadowNodeFragment::new().state(Arc::clone(&initial)),
    ));
    commit_children(&tree, &[Arc::clone(&image)]);

    let newer = Arc::new(initial.next(Arc::new(2u32)));
    let updated = Arc::new(image.clone_with(ShadowNodeFragment::new().state(newer)));
    commit_children(&tree, &[updated]);

    // A clone of the node that still carries the first state.
    let stale = Arc::new(image.clone_with(ShadowNodeFragment::new().props(
        Arc::new(image.props().merged(&RawProps::new().with("testID", "hero"))),
    )));
    commit_children(&tree, &[stale]);

    let committed = tree.find_node(10).expect("image");
    let state = committed.state().expect("state");
    assert_eq!(state.revision(), 2);
    assert_eq!(state.data_as::<u32>(), Some(&2));
    assert_eq!(committed.props().get("testID").and_then(PropValue::as_str), Some("hero"));
}

#[test]
fn mounting_thread_wakes_up_for_commits() {
    let mut builder = TreeBuilder::new(SURFACE);
    let tree = Arc::new(tree(&builder, DifferentiatorMode::Classic));
    let coordinator = Arc::clone(tree.mounting_coordinator());
    let children = builder.children(&[NodeSpec::view(10)]);

    let committer = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || commit_children(&tree, &children))
    };
    assert!(coordinator.wait_for_transaction(Duration::from_secs(5)));
    assert_eq!(committer.join().expect("commit thread"), 1);

    let transaction = coordinator.pull_transaction().expect("transaction");
    assert_eq!(count_kind(transaction.mutations(), MutationKind::Insert), 1);
}
