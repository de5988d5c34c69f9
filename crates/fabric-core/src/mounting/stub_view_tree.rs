//! In-memory stand-in for the host view hierarchy.
//!
//! Applying a mutation list to a [`StubViewTree`] checks every instruction the
//! way a strict host would, which makes it both a headless mounting target and
//! the oracle for differentiator tests: a tree built from an old revision plus
//! the diff must equal the tree built directly from the new revision.

use std::fmt;
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::differentiator::flattened_children;
use crate::error::StubViewTreeError;
use crate::family::Tag;
use crate::layout::LayoutMetrics;
use crate::mutation::ShadowViewMutation;
use crate::props::SharedProps;
use crate::shadow_node::ShadowNode;
use crate::shadow_view::ShadowView;

#[derive(Clone, Debug, PartialEq)]
pub struct StubView {
    pub tag: Tag,
    pub component_name: Arc<str>,
    pub props: SharedProps,
    pub layout_metrics: LayoutMetrics,
    pub state_revision: Option<u64>,
    pub parent: Option<Tag>,
    pub children: Vec<Tag>,
}

impl StubView {
    fn from_view(view: &ShadowView) -> Self {
        Self {
            tag: view.tag,
            component_name: Arc::clone(&view.component_name),
            props: Arc::clone(&view.props),
            layout_metrics: view.layout_metrics,
            state_revision: view.state.as_ref().map(|state| state.revision()),
            parent: None,
            children: Vec::new(),
        }
    }

    fn update(&mut self, view: &ShadowView) {
        self.props = Arc::clone(&view.props);
        self.layout_metrics = view.layout_metrics;
        self.state_revision = view.state.as_ref().map(|state| state.revision());
    }
}

#[derive(Clone, PartialEq)]
pub struct StubViewTree {
    root_tag: Tag,
    views: HashMap<Tag, StubView>,
}

impl StubViewTree {
    /// A hierarchy holding only the root view.
    pub fn new(root: &ShadowView) -> Self {
        let mut views = HashMap::new();
        views.insert(root.tag, StubView::from_view(root));
        Self {
            root_tag: root.tag,
            views,
        }
    }

    /// Builds the hierarchy for `root` directly, without the differentiator.
    pub fn from_shadow_tree(root: &ShadowNode) -> Self {
        fn attach(tree: &mut StubViewTree, node: &ShadowNode, parent_tag: Tag) {
            for pair in flattened_children(node) {
                let mut view = StubView::from_view(&pair.view);
                view.parent = Some(parent_tag);
                tree.views.insert(view.tag, view);
                if let Some(parent) = tree.views.get_mut(&parent_tag) {
                    parent.children.push(pair.view.tag);
                }
                attach(tree, pair.node, pair.view.tag);
            }
        }

        let mut tree = Self::new(&ShadowView::new(root));
        attach(&mut tree, root, root.tag());
        tree
    }

    pub fn root_tag(&self) -> Tag {
        self.root_tag
    }

    pub fn get(&self, tag: Tag) -> Option<&StubView> {
        self.views.get(&tag)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn children_of(&self, tag: Tag) -> &[Tag] {
        self.views
            .get(&tag)
            .map(|view| view.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn apply(&mut self, mutations: &[ShadowViewMutation]) -> Result<(), StubViewTreeError> {
        mutations
            .iter()
            .try_for_each(|mutation| self.apply_one(mutation))
    }

    pub fn apply_one(&mut self, mutation: &ShadowViewMutation) -> Result<(), StubViewTreeError> {
        match mutation {
            ShadowViewMutation::Create { new } => {
                if self.views.contains_key(&new.tag) {
                    return Err(StubViewTreeError::AlreadyExists(new.tag));
                }
                self.views.insert(new.tag, StubView::from_view(new));
            }
            ShadowViewMutation::Delete { old } => {
                let view = self
                    .views
                    .get(&old.tag)
                    .ok_or(StubViewTreeError::Missing(old.tag))?;
                if let Some(parent) = view.parent {
                    return Err(StubViewTreeError::DeleteAttached(old.tag, parent));
                }
                self.views.remove(&old.tag);
            }
            ShadowViewMutation::Insert {
                parent,
                child,
                index,
            } => {
                let child_view = self
                    .views
                    .get(&child.tag)
                    .ok_or(StubViewTreeError::Missing(child.tag))?;
                if let Some(current) = child_view.parent {
                    return Err(StubViewTreeError::AlreadyAttached {
                        child: child.tag,
                        parent: current,
                    });
                }
                let parent_view = self
                    .views
                    .get_mut(&parent.tag)
                    .ok_or(StubViewTreeError::Missing(parent.tag))?;
                if *index > parent_view.children.len() {
                    return Err(StubViewTreeError::InsertOutOfBounds {
                        parent: parent.tag,
                        index: *index,
                        len: parent_view.children.len(),
                    });
                }
                parent_view.children.insert(*index, child.tag);
                if let Some(child_view) = self.views.get_mut(&child.tag) {
                    child_view.update(child);
                    child_view.parent = Some(parent.tag);
                }
            }
            ShadowViewMutation::Remove {
                parent,
                child,
                index,
            } => {
                let parent_view = self
                    .views
                    .get_mut(&parent.tag)
                    .ok_or(StubViewTreeError::Missing(parent.tag))?;
                let found = parent_view.children.get(*index).copied();
                if found != Some(child.tag) {
                    return Err(StubViewTreeError::RemoveMismatch {
                        parent: parent.tag,
                        child: child.tag,
                        index: *index,
                        found,
                    });
                }
                parent_view.children.remove(*index);
                if let Some(child_view) = self.views.get_mut(&child.tag) {
                    child_view.parent = None;
                }
            }
            ShadowViewMutation::Update { new, .. } => {
                self.views
                    .get_mut(&new.tag)
                    .ok_or(StubViewTreeError::Missing(new.tag))?
                    .update(new);
            }
        }
        Ok(())
    }

    fn dump_view(&self, f: &mut fmt::Formatter<'_>, tag: Tag, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.views.get(&tag) {
            Some(view) => {
                writeln!(f, "{}[{}] {} {}", indent, tag, view.component_name, view.props)?;
                for child in &view.children {
                    self.dump_view(f, *child, depth + 1)?;
                }
                Ok(())
            }
            None => writeln!(f, "{}[{}] (missing)", indent, tag),
        }
    }
}

impl fmt::Debug for StubViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump_view(f, self.root_tag, 0)?;
        let detached = self
            .views
            .values()
            .filter(|view| view.parent.is_none() && view.tag != self.root_tag)
            .count();
        if detached > 0 {
            writeln!(f, "({detached} detached views)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentDescriptor, ShadowNodeTraits};
    use crate::family::{ShadowNodeFamily, ShadowNodeFamilyFragment};
    use crate::props::{Props, RawProps};
    use crate::shadow_node::ShadowNodeFragment;

    fn node(tag: Tag, color: &str, traits: ShadowNodeTraits) -> ShadowNode {
        let family = ShadowNodeFamily::new(
            ShadowNodeFamilyFragment { tag, surface_id: 1 },
            Arc::new(ComponentDescriptor::new("View", traits)),
        );
        let props = Props::from_raw(&RawProps::new().with("backgroundColor", color));
        ShadowNode::new(Arc::new(family), ShadowNodeFragment::new().props(Arc::new(props)))
    }

    fn color(tree: &StubViewTree, tag: Tag) -> Option<&str> {
        tree.get(tag)?.props.get("backgroundColor")?.as_str()
    }

    #[test]
    fn rejected_insert_leaves_the_child_untouched() {
        let root = ShadowView::new(&node(1, "white", ShadowNodeTraits::ROOT_NODE_KIND));
        let mut tree = StubViewTree::new(&root);
        let child = ShadowView::new(&node(2, "red", ShadowNodeTraits::FORMS_VIEW));
        tree.apply_one(&ShadowViewMutation::Create { new: child })
            .expect("create");

        let recolored = ShadowView::new(&node(2, "blue", ShadowNodeTraits::FORMS_VIEW));
        let missing_parent = ShadowView::new(&node(9, "white", ShadowNodeTraits::FORMS_VIEW));
        let err = tree
            .apply_one(&ShadowViewMutation::Insert {
                parent: missing_parent,
                child: recolored.clone(),
                index: 0,
            })
            .expect_err("unknown parent");
        assert!(matches!(err, StubViewTreeError::Missing(9)));

        let err = tree
            .apply_one(&ShadowViewMutation::Insert {
                parent: root.clone(),
                child: recolored.clone(),
                index: 3,
            })
            .expect_err("index past the end");
        assert!(matches!(err, StubViewTreeError::InsertOutOfBounds { index: 3, len: 0, .. }));
        assert_eq!(color(&tree, 2), Some("red"));
        assert_eq!(tree.get(2).and_then(|view| view.parent), None);

        tree.apply_one(&ShadowViewMutation::Insert {
            parent: root,
            child: recolored,
            index: 0,
        })
        .expect("insert");
        assert_eq!(color(&tree, 2), Some("blue"));
        assert_eq!(tree.children_of(1), &[2]);
    }
}
