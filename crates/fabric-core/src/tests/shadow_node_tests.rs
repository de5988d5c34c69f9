use super::*;
use crate::component::ComponentDescriptor;
use crate::family::ShadowNodeFamilyFragment;
use crate::layout::Rect;
use crate::props::{PropValue, RawProps};
use crate::state::State;

const SURFACE: SurfaceId = 1;

fn family(tag: Tag, name: &str, traits: ShadowNodeTraits) -> SharedFamily {
    Arc::new(ShadowNodeFamily::new(
        ShadowNodeFamilyFragment {
            tag,
            surface_id: SURFACE,
        },
        Arc::new(ComponentDescriptor::new(name, traits)),
    ))
}

fn view(tag: Tag) -> ShadowNode {
    ShadowNode::new(
        family(tag, "View", ShadowNodeTraits::FORMS_VIEW),
        ShadowNodeFragment::new(),
    )
}

fn with_props(node: &ShadowNode, raw: RawProps) -> ShadowNode {
    node.clone_with(ShadowNodeFragment::new().props(Arc::new(node.props().merged(&raw))))
}

#[test]
fn clone_shares_untouched_fields() {
    let child = Arc::new(view(2));
    let parent = view(1).clone_with(ShadowNodeFragment::new().children(vec![Arc::clone(&child)]));
    parent.seal_recursive();

    let clone = with_props(&parent, RawProps::new().with("opacity", 0.5));
    assert!(Arc::ptr_eq(clone.shared_children(), parent.shared_children()));
    assert!(Arc::ptr_eq(&clone.children()[0], &child));
    assert!(ShadowNode::same_family(&clone, &parent));
    assert_eq!(clone.revision(), parent.revision() + 1);
    assert_eq!(clone.props().get("opacity").and_then(PropValue::as_f64), Some(0.5));
    assert!(parent.props().is_empty());
}

#[test]
fn clone_of_sealed_node_is_unsealed() {
    let node = view(1);
    node.seal();
    assert!(node.is_sealed());
    let clone = node.clone_with(ShadowNodeFragment::new());
    assert!(!clone.is_sealed());
}

#[test]
#[should_panic(expected = "sealed")]
fn append_child_on_sealed_node_panics() {
    let mut node = view(1);
    node.seal();
    node.append_child(Arc::new(view(2)));
}

#[test]
#[should_panic(expected = "sealed")]
fn set_layout_metrics_on_sealed_node_panics() {
    let mut node = view(1);
    node.seal();
    node.set_layout_metrics(LayoutMetrics::with_frame(Rect::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
#[should_panic(expected = "leaf component")]
fn leaf_rejects_children() {
    let mut text = ShadowNode::new(
        family(3, "Text", ShadowNodeTraits::FORMS_VIEW | ShadowNodeTraits::LEAF),
        ShadowNodeFragment::new(),
    );
    text.append_child(Arc::new(view(4)));
}

#[test]
#[should_panic(expected = "cannot be attached")]
fn foreign_state_is_rejected() {
    let owner = view(1);
    let other = view(2);
    let state = Arc::new(State::initial(other.family(), Arc::new(())));
    let _ = owner.clone_with(ShadowNodeFragment::new().state(state));
}

#[test]
fn seal_recursive_stops_at_sealed_subtrees() {
    let sealed_child = Arc::new(view(3));
    sealed_child.seal();
    let open_child = Arc::new(view(2));
    let parent = view(1).clone_with(
        ShadowNodeFragment::new().children(vec![Arc::clone(&open_child), Arc::clone(&sealed_child)]),
    );
    parent.seal_recursive();
    assert!(parent.is_sealed());
    assert!(open_child.is_sealed());
    assert!(sealed_child.is_sealed());
}

#[test]
fn replace_child_uses_suggested_index_or_searches() {
    let a = Arc::new(view(2));
    let b = Arc::new(view(3));
    let mut parent = view(1).clone_with(
        ShadowNodeFragment::new().children(vec![Arc::clone(&a), Arc::clone(&b)]),
    );

    let b2 = Arc::new(with_props(&b, RawProps::new().with("testID", "b")));
    parent.replace_child(&b, Arc::clone(&b2), Some(0));
    assert!(Arc::ptr_eq(&parent.children()[1], &b2));

    let a2 = Arc::new(with_props(&a, RawProps::new().with("testID", "a")));
    parent.replace_child(&a, Arc::clone(&a2), Some(0));
    assert!(Arc::ptr_eq(&parent.children()[0], &a2));
}

#[test]
fn clone_tree_copies_only_the_path() {
    let leaf = Arc::new(view(4));
    let sibling = Arc::new(view(5));
    let middle = Arc::new(view(3).clone_with(ShadowNodeFragment::new().children(vec![Arc::clone(&leaf)])));
    let root = view(1).clone_with(
        ShadowNodeFragment::new().children(vec![Arc::clone(&middle), Arc::clone(&sibling)]),
    );
    root.seal_recursive();

    let new_root = root
        .clone_tree(leaf.family(), |node| with_props(node, RawProps::new().with("color", "blue")))
        .expect("family is in the tree");

    assert!(Arc::ptr_eq(&new_root.children()[1], &sibling));
    assert!(!Arc::ptr_eq(&new_root.children()[0], &middle));
    let new_leaf = &new_root.children()[0].children()[0];
    assert_eq!(new_leaf.props().get("color").and_then(|v| v.as_str()), Some("blue"));
    assert!(leaf.props().is_empty());

    let stranger = view(9);
    assert!(root.clone_tree(stranger.family(), |node| node.clone_with(ShadowNodeFragment::new())).is_none());
}

#[test]
fn ancestors_lists_parent_and_index_pairs() {
    let leaf = Arc::new(view(4));
    let middle = Arc::new(
        view(3).clone_with(ShadowNodeFragment::new().children(vec![Arc::new(view(6)), Arc::clone(&leaf)])),
    );
    let root = view(1).clone_with(ShadowNodeFragment::new().children(vec![Arc::new(view(5)), Arc::clone(&middle)]));

    let path = root.ancestors(leaf.family()).expect("path");
    let summary: Vec<(Tag, usize)> = path.iter().map(|(node, index)| (node.tag(), *index)).collect();
    assert_eq!(summary, vec![(1, 1), (3, 1)]);
    assert_eq!(root.ancestors(root.family()).map(|path| path.len()), Some(0));
}

#[test]
fn progress_state_replaces_outdated_state() {
    let node = view(2);
    let first = Arc::new(State::initial(node.family(), Arc::new(1u32)));
    let second = Arc::new(first.next(Arc::new(2u32)));
    node.family().set_most_recent_state(&second);

    let stale = Arc::new(node.clone_with(ShadowNodeFragment::new().state(Arc::clone(&first))));
    let root = view(1).clone_with(ShadowNodeFragment::new().children(vec![stale]));

    let progressed = root.progress_state_if_necessary().expect("state progressed");
    let child_state = progressed.children()[0].state().expect("state");
    assert!(Arc::ptr_eq(child_state, &second));
    assert_eq!(child_state.data_as::<u32>(), Some(&2));
    assert!(first.is_obsolete());
}

#[test]
fn progress_state_leaves_sealed_and_current_nodes_alone() {
    let node = view(2);
    let state = Arc::new(State::initial(node.family(), Arc::new(())));
    node.family().set_most_recent_state(&state);
    let current = node.clone_with(ShadowNodeFragment::new().state(state));
    assert!(current.progress_state_if_necessary().is_none());

    current.seal();
    assert!(current.progress_state_if_necessary().is_none());
}

#[test]
fn seal_for_commit_records_most_recent_state() {
    let node = view(2);
    let state = Arc::new(State::initial(node.family(), Arc::new(())));
    let with_state = node.clone_with(ShadowNodeFragment::new().state(Arc::clone(&state)));
    with_state.seal_for_commit();
    assert!(with_state.is_sealed());
    let recent = node.family().most_recent_state().expect("recorded");
    assert!(Arc::ptr_eq(&recent, &state));
}

#[test]
fn forms_view_follows_traits_and_props() {
    let container = ShadowNode::new(family(7, "Container", ShadowNodeTraits::empty()), ShadowNodeFragment::new());
    assert!(container.is_layout_only());

    let styled = with_props(&container, RawProps::new().with("backgroundColor", "red"));
    assert!(styled.forms_view());

    let pinned = with_props(&container, RawProps::new().with("collapsable", false));
    assert!(pinned.forms_view());
}

#[test]
fn dump_tree_indents_children() {
    let root = view(1).clone_with(ShadowNodeFragment::new().children(vec![Arc::new(view(2))]));
    let dump = root.dump_tree();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[1] View"));
    assert!(lines[1].starts_with("  [2] View"));
}
