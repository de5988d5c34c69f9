//! Persistent, copy-on-write shadow nodes.
//!
//! A [`ShadowNode`] is one immutable revision of a component instance. Nodes
//! are built unsealed, edited in place while they are still private to the
//! render pass, and sealed when a [`ShadowTree`](crate::ShadowTree) commit
//! installs them. After that, every change goes through
//! [`ShadowNode::clone_with`], which shares all untouched fields (props,
//! child list, state) with the source.

use std::fmt;
use std::sync::Arc;

use crate::component::{ComponentHandle, ShadowNodeTraits};
use crate::family::{ShadowNodeFamily, SharedFamily, SurfaceId, Tag};
use crate::layout::LayoutMetrics;
use crate::props::{Props, SharedProps};
use crate::sealable::Sealable;
use crate::state::SharedState;

pub type SharedShadowNode = Arc<ShadowNode>;
pub type SharedChildren = Arc<Vec<SharedShadowNode>>;

/// Fields to set on a new node or to override on a clone.
///
/// `None` means "keep what the source node has" when cloning, and "use the
/// default" when constructing.
#[derive(Clone, Default)]
pub struct ShadowNodeFragment {
    pub props: Option<SharedProps>,
    pub children: Option<SharedChildren>,
    pub state: Option<SharedState>,
    pub layout_metrics: Option<LayoutMetrics>,
}

impl ShadowNodeFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn props(mut self, props: SharedProps) -> Self {
        self.props = Some(props);
        self
    }

    pub fn children(mut self, children: Vec<SharedShadowNode>) -> Self {
        self.children = Some(Arc::new(children));
        self
    }

    pub fn shared_children(mut self, children: SharedChildren) -> Self {
        self.children = Some(children);
        self
    }

    pub fn state(mut self, state: SharedState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn layout_metrics(mut self, layout_metrics: LayoutMetrics) -> Self {
        self.layout_metrics = Some(layout_metrics);
        self
    }
}

pub struct ShadowNode {
    sealable: Sealable,
    family: SharedFamily,
    props: SharedProps,
    children: SharedChildren,
    state: Option<SharedState>,
    layout_metrics: LayoutMetrics,
    revision: u64,
}

impl ShadowNode {
    pub fn new(family: SharedFamily, fragment: ShadowNodeFragment) -> Self {
        let node = Self {
            sealable: Sealable::new(),
            family,
            props: fragment.props.unwrap_or_else(Props::empty),
            children: fragment.children.unwrap_or_default(),
            state: fragment.state,
            layout_metrics: fragment.layout_metrics.unwrap_or_default(),
            revision: 1,
        };
        node.assert_state_family(node.state.as_ref());
        node.assert_children_allowed();
        node
    }

    /// Returns an unsealed copy of `self` with the fragment's fields applied.
    ///
    /// Panics when the fragment carries a state that belongs to another family.
    pub fn clone_with(&self, fragment: ShadowNodeFragment) -> ShadowNode {
        self.assert_state_family(fragment.state.as_ref());
        let node = Self {
            sealable: Sealable::new(),
            family: Arc::clone(&self.family),
            props: fragment.props.unwrap_or_else(|| Arc::clone(&self.props)),
            children: fragment
                .children
                .unwrap_or_else(|| Arc::clone(&self.children)),
            state: fragment.state.or_else(|| self.state.clone()),
            layout_metrics: fragment.layout_metrics.unwrap_or(self.layout_metrics),
            revision: self.revision + 1,
        };
        node.assert_children_allowed();
        node
    }

    pub fn family(&self) -> &SharedFamily {
        &self.family
    }

    pub fn tag(&self) -> Tag {
        self.family.tag()
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.family.surface_id()
    }

    pub fn component_name(&self) -> &str {
        self.family.component_name()
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.family.component_handle()
    }

    pub fn traits(&self) -> ShadowNodeTraits {
        self.family.traits()
    }

    pub fn props(&self) -> &SharedProps {
        &self.props
    }

    pub fn children(&self) -> &[SharedShadowNode] {
        &self.children
    }

    pub fn shared_children(&self) -> &SharedChildren {
        &self.children
    }

    pub fn state(&self) -> Option<&SharedState> {
        self.state.as_ref()
    }

    pub fn layout_metrics(&self) -> LayoutMetrics {
        self.layout_metrics
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_sealed(&self) -> bool {
        self.sealable.is_sealed()
    }

    pub fn seal(&self) {
        self.sealable.seal();
    }

    /// Seals `self` and every unsealed descendant. Sealed subtrees are skipped:
    /// a node is only ever sealed together with its whole subtree.
    pub fn seal_recursive(&self) {
        if self.is_sealed() {
            return;
        }
        self.seal();
        for child in self.children.iter() {
            child.seal_recursive();
        }
    }

    pub fn same_family(a: &ShadowNode, b: &ShadowNode) -> bool {
        ShadowNodeFamily::same(&a.family, &b.family)
    }

    /// Whether this node needs a host view. Nodes that do not are flattened
    /// away by the differentiator.
    pub fn forms_view(&self) -> bool {
        self.traits()
            .intersects(ShadowNodeTraits::FORMS_VIEW | ShadowNodeTraits::ROOT_NODE_KIND)
            || self.props.forms_view()
    }

    pub fn is_layout_only(&self) -> bool {
        !self.forms_view()
    }

    pub fn append_child(&mut self, child: SharedShadowNode) {
        self.sealable.ensure_unsealed("append a child");
        assert!(
            !self.traits().contains(ShadowNodeTraits::LEAF),
            "{} ({}) is a leaf component and cannot have children",
            self.component_name(),
            self.tag()
        );
        Arc::make_mut(&mut self.children).push(child);
    }

    /// Swaps `old_child` for `new_child`. Both must belong to the same family.
    pub fn replace_child(
        &mut self,
        old_child: &ShadowNode,
        new_child: SharedShadowNode,
        suggested_index: Option<usize>,
    ) {
        self.sealable.ensure_unsealed("replace a child");
        assert!(
            ShadowNode::same_family(old_child, &new_child),
            "replace_child: family mismatch ({} vs {})",
            old_child.tag(),
            new_child.tag()
        );
        let children = Arc::make_mut(&mut self.children);
        if let Some(index) = suggested_index {
            if children
                .get(index)
                .is_some_and(|child| std::ptr::eq(child.as_ref(), old_child))
            {
                children[index] = new_child;
                return;
            }
        }
        match children
            .iter()
            .position(|child| std::ptr::eq(child.as_ref(), old_child))
        {
            Some(index) => children[index] = new_child,
            None => panic!(
                "replace_child: node {} is not a child of {}",
                old_child.tag(),
                self.tag()
            ),
        }
    }

    pub fn set_layout_metrics(&mut self, layout_metrics: LayoutMetrics) {
        self.sealable.ensure_unsealed("set layout metrics");
        self.layout_metrics = layout_metrics;
    }

    /// Path from `self` down to the node of `family`, as `(parent, child index)`
    /// pairs. Empty when `self` is that node, `None` when the family is absent.
    pub fn ancestors(&self, family: &ShadowNodeFamily) -> Option<Vec<(&ShadowNode, usize)>> {
        fn search<'a>(
            node: &'a ShadowNode,
            family: &ShadowNodeFamily,
            path: &mut Vec<(&'a ShadowNode, usize)>,
        ) -> bool {
            for (index, child) in node.children.iter().enumerate() {
                path.push((node, index));
                if ShadowNodeFamily::same(&child.family, family) || search(child, family, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        if ShadowNodeFamily::same(&self.family, family) {
            return Some(Vec::new());
        }
        let mut path = Vec::new();
        search(self, family, &mut path).then_some(path)
    }

    /// Clones every node on the path from `self` to the node of `family`,
    /// replacing that node with `callback`'s result. Subtrees off the path are
    /// shared with `self`.
    pub fn clone_tree(
        &self,
        family: &ShadowNodeFamily,
        callback: impl FnOnce(&ShadowNode) -> ShadowNode,
    ) -> Option<ShadowNode> {
        let ancestors = self.ancestors(family)?;
        let target = match ancestors.last() {
            Some((parent, index)) => parent.children[*index].as_ref(),
            None => self,
        };
        let mut current = callback(target);
        assert!(
            ShadowNode::same_family(target, &current),
            "clone_tree: callback returned a node of another family"
        );
        for (parent, index) in ancestors.into_iter().rev() {
            let mut children = parent.children.to_vec();
            children[index] = Arc::new(current);
            current = parent.clone_with(ShadowNodeFragment::new().children(children));
        }
        Some(current)
    }

    /// Replaces outdated states in the uncommitted part of the tree with the
    /// newest state recorded on each family. Returns `None` when nothing changed.
    pub fn progress_state_if_necessary(&self) -> Option<ShadowNode> {
        if self.is_sealed() {
            return None;
        }
        let newer_state = self.state.as_ref().and_then(|state| {
            let recent = self.family.most_recent_state()?;
            (recent.revision() > state.revision()).then_some(recent)
        });

        let mut new_children: Option<Vec<SharedShadowNode>> = None;
        for (index, child) in self.children.iter().enumerate() {
            if let Some(progressed) = child.progress_state_if_necessary() {
                let children = new_children.get_or_insert_with(|| self.children.to_vec());
                children[index] = Arc::new(progressed);
            }
        }

        if newer_state.is_none() && new_children.is_none() {
            return None;
        }
        let mut fragment = ShadowNodeFragment::new();
        if let Some(state) = newer_state {
            fragment = fragment.state(state);
        }
        if let Some(children) = new_children {
            fragment = fragment.children(children);
        }
        Some(self.clone_with(fragment))
    }

    /// Records the states of the uncommitted part of the tree as their
    /// families' most recent ones and seals it.
    pub(crate) fn seal_for_commit(&self) {
        if self.is_sealed() {
            return;
        }
        if let Some(state) = &self.state {
            self.family.set_most_recent_state(state);
        }
        self.seal();
        for child in self.children.iter() {
            child.seal_for_commit();
        }
    }

    pub fn dump_tree(&self) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, 0);
        output
    }

    fn dump_node(&self, output: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let layout_only = if self.is_layout_only() { " (layout-only)" } else { "" };
        output.push_str(&format!(
            "{}[{}] {} {}{}\n",
            indent,
            self.tag(),
            self.component_name(),
            self.props,
            layout_only
        ));
        for child in self.children.iter() {
            child.dump_node(output, depth + 1);
        }
    }

    fn assert_state_family(&self, state: Option<&SharedState>) {
        if let Some(family) = state.and_then(|state| state.family()) {
            assert!(
                ShadowNodeFamily::same(&family, &self.family),
                "state of node {} cannot be attached to node {}",
                family.tag(),
                self.tag()
            );
        }
    }

    fn assert_children_allowed(&self) {
        assert!(
            self.children.is_empty() || !self.traits().contains(ShadowNodeTraits::LEAF),
            "{} ({}) is a leaf component and cannot have children",
            self.component_name(),
            self.tag()
        );
    }
}

impl fmt::Debug for ShadowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNode")
            .field("tag", &self.tag())
            .field("component", &self.component_name())
            .field("revision", &self.revision)
            .field("sealed", &self.is_sealed())
            .field("props", &format_args!("{}", self.props))
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/shadow_node_tests.rs"]
mod tests;
