use std::fmt;

use crate::family::Tag;
use crate::shadow_view::ShadowView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Delete,
    Insert,
    Remove,
    Update,
}

/// One instruction for the host mounting layer.
///
/// Lists produced by the differentiator are ordered so they can be applied
/// front to back: removes (per parent in descending index order), deletes,
/// creates, updates, then inserts (per parent in ascending index order).
#[derive(Clone, Debug, PartialEq)]
pub enum ShadowViewMutation {
    Create {
        new: ShadowView,
    },
    Delete {
        old: ShadowView,
    },
    Insert {
        parent: ShadowView,
        child: ShadowView,
        index: usize,
    },
    Remove {
        parent: ShadowView,
        child: ShadowView,
        index: usize,
    },
    Update {
        old: ShadowView,
        new: ShadowView,
    },
}

pub type ShadowViewMutationList = Vec<ShadowViewMutation>;

impl ShadowViewMutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            ShadowViewMutation::Create { .. } => MutationKind::Create,
            ShadowViewMutation::Delete { .. } => MutationKind::Delete,
            ShadowViewMutation::Insert { .. } => MutationKind::Insert,
            ShadowViewMutation::Remove { .. } => MutationKind::Remove,
            ShadowViewMutation::Update { .. } => MutationKind::Update,
        }
    }

    /// Tag of the view the instruction is about (the child for insert/remove).
    pub fn tag(&self) -> Tag {
        match self {
            ShadowViewMutation::Create { new } => new.tag,
            ShadowViewMutation::Delete { old } => old.tag,
            ShadowViewMutation::Insert { child, .. } | ShadowViewMutation::Remove { child, .. } => {
                child.tag
            }
            ShadowViewMutation::Update { new, .. } => new.tag,
        }
    }

    pub fn parent_tag(&self) -> Option<Tag> {
        match self {
            ShadowViewMutation::Insert { parent, .. } | ShadowViewMutation::Remove { parent, .. } => {
                Some(parent.tag)
            }
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ShadowViewMutation::Insert { index, .. } | ShadowViewMutation::Remove { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ShadowViewMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowViewMutation::Create { new } => {
                write!(f, "Create [{}] {} {}", new.tag, new.component_name, new.props)
            }
            ShadowViewMutation::Delete { old } => write!(f, "Delete [{}]", old.tag),
            ShadowViewMutation::Insert {
                parent,
                child,
                index,
            } => write!(f, "Insert [{}] into [{}] at {}", child.tag, parent.tag, index),
            ShadowViewMutation::Remove {
                parent,
                child,
                index,
            } => write!(f, "Remove [{}] from [{}] at {}", child.tag, parent.tag, index),
            ShadowViewMutation::Update { new, .. } => {
                write!(f, "Update [{}] {}", new.tag, new.props)
            }
        }
    }
}
