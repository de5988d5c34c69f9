//! Computes the host-view mutations that turn one shadow tree into another.
//!
//! Both trees are sealed, so the walk needs no locking. Children are matched
//! by tag (one tag per family), never by position, and layout-only nodes are
//! flattened: their view-forming descendants are hoisted into the nearest
//! view-forming ancestor with frames offset accordingly.

use crate::collections::map::{HashMap, HashSet};
use crate::family::Tag;
use crate::layout::Point;
use crate::mutation::{ShadowViewMutation, ShadowViewMutationList};
use crate::shadow_node::ShadowNode;
use crate::shadow_view::{ShadowView, ShadowViewNodePair};

/// Reordering strategy. Both modes produce lists that lead to the same host
/// hierarchy; they only differ in how many instructions they spend on moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DifferentiatorMode {
    /// Every child between the first and last mismatch is removed and reinserted.
    #[default]
    Classic,
    /// Keeps the longest run of children whose relative order survived and
    /// only moves the rest.
    OptimizedMoves,
}

/// Diffs two revisions of the same surface.
///
/// Panics when the roots belong to different surfaces or families.
pub fn calculate_shadow_view_mutations(
    mode: DifferentiatorMode,
    old_root: &ShadowNode,
    new_root: &ShadowNode,
) -> ShadowViewMutationList {
    if std::ptr::eq(old_root, new_root) {
        return Vec::new();
    }
    assert_eq!(
        old_root.surface_id(),
        new_root.surface_id(),
        "cannot diff trees of different surfaces"
    );
    assert!(
        ShadowNode::same_family(old_root, new_root),
        "cannot diff trees with different roots ({} vs {})",
        old_root.tag(),
        new_root.tag()
    );

    let mut differ = Differ {
        mode,
        buckets: MutationBuckets::default(),
    };
    let old_view = ShadowView::new(old_root);
    let new_view = ShadowView::new(new_root);
    if old_view != new_view {
        differ.buckets.updates.push(ShadowViewMutation::Update {
            old: old_view.clone(),
            new: new_view.clone(),
        });
    }
    differ.diff_children(
        &old_view,
        &new_view,
        flattened_children(old_root),
        flattened_children(new_root),
    );
    differ.buckets.into_list()
}

/// View-forming children of `node`, in order, with layout-only children
/// replaced by their own flattened children.
pub fn flattened_children(node: &ShadowNode) -> Vec<ShadowViewNodePair<'_>> {
    fn collect<'a>(node: &'a ShadowNode, offset: Point, out: &mut Vec<ShadowViewNodePair<'a>>) {
        for child in node.children() {
            if child.is_layout_only() {
                collect(child, offset + child.layout_metrics().frame.origin, out);
                continue;
            }
            let mut view = ShadowView::new(child);
            view.layout_metrics.frame = view.layout_metrics.frame.offset_by(offset);
            out.push(ShadowViewNodePair { view, node: child });
        }
    }

    let mut out = Vec::with_capacity(node.children().len());
    collect(node, Point::ZERO, &mut out);
    debug_assert!(
        {
            let mut seen = HashSet::new();
            out.iter().all(|pair| seen.insert(pair.view.tag))
        },
        "duplicate tags among the children of {}",
        node.tag()
    );
    out
}

#[derive(Default)]
struct MutationBuckets {
    removes: Vec<ShadowViewMutation>,
    deletes: Vec<ShadowViewMutation>,
    creates: Vec<ShadowViewMutation>,
    updates: Vec<ShadowViewMutation>,
    inserts: Vec<ShadowViewMutation>,
}

impl MutationBuckets {
    fn into_list(self) -> ShadowViewMutationList {
        let mut list = Vec::with_capacity(
            self.removes.len()
                + self.deletes.len()
                + self.creates.len()
                + self.updates.len()
                + self.inserts.len(),
        );
        list.extend(self.removes);
        list.extend(self.deletes);
        list.extend(self.creates);
        list.extend(self.updates);
        list.extend(self.inserts);
        list
    }
}

struct Differ {
    mode: DifferentiatorMode,
    buckets: MutationBuckets,
}

impl Differ {
    fn diff_children(
        &mut self,
        old_parent: &ShadowView,
        new_parent: &ShadowView,
        old: Vec<ShadowViewNodePair<'_>>,
        new: Vec<ShadowViewNodePair<'_>>,
    ) {
        let mut start = 0;
        while start < old.len() && start < new.len() && old[start].view.tag == new[start].view.tag
        {
            self.diff_matched(&old[start], &new[start]);
            start += 1;
        }

        let mut old_end = old.len();
        let mut new_end = new.len();
        while old_end > start
            && new_end > start
            && old[old_end - 1].view.tag == new[new_end - 1].view.tag
        {
            self.diff_matched(&old[old_end - 1], &new[new_end - 1]);
            old_end -= 1;
            new_end -= 1;
        }

        let old_middle = &old[start..old_end];
        let new_middle = &new[start..new_end];
        if old_middle.is_empty() && new_middle.is_empty() {
            return;
        }

        let old_positions: HashMap<Tag, usize> = old_middle
            .iter()
            .enumerate()
            .map(|(index, pair)| (pair.view.tag, index))
            .collect();
        let new_positions: HashMap<Tag, usize> = new_middle
            .iter()
            .enumerate()
            .map(|(index, pair)| (pair.view.tag, index))
            .collect();

        let stable = match self.mode {
            DifferentiatorMode::Classic => HashSet::new(),
            DifferentiatorMode::OptimizedMoves => stable_tags(new_middle, &old_positions),
        };

        for (offset, pair) in old_middle.iter().enumerate().rev() {
            let index = start + offset;
            let tag = pair.view.tag;
            if new_positions.contains_key(&tag) {
                if !stable.contains(&tag) {
                    self.buckets.removes.push(ShadowViewMutation::Remove {
                        parent: old_parent.clone(),
                        child: pair.view.clone(),
                        index,
                    });
                }
                continue;
            }
            self.buckets.removes.push(ShadowViewMutation::Remove {
                parent: old_parent.clone(),
                child: pair.view.clone(),
                index,
            });
            self.buckets.deletes.push(ShadowViewMutation::Delete {
                old: pair.view.clone(),
            });
            self.delete_subtree(pair);
        }

        for (offset, pair) in new_middle.iter().enumerate() {
            let index = start + offset;
            let tag = pair.view.tag;
            match old_positions.get(&tag) {
                Some(&old_index) => {
                    self.diff_matched(&old_middle[old_index], pair);
                    if stable.contains(&tag) {
                        continue;
                    }
                }
                None => {
                    self.buckets.creates.push(ShadowViewMutation::Create {
                        new: pair.view.clone(),
                    });
                    self.create_subtree(pair);
                }
            }
            self.buckets.inserts.push(ShadowViewMutation::Insert {
                parent: new_parent.clone(),
                child: pair.view.clone(),
                index,
            });
        }
    }

    /// Same family on both sides: update the view if its projection changed
    /// and descend unless the node itself is shared between the revisions.
    fn diff_matched(&mut self, old: &ShadowViewNodePair<'_>, new: &ShadowViewNodePair<'_>) {
        if old.view != new.view {
            self.buckets.updates.push(ShadowViewMutation::Update {
                old: old.view.clone(),
                new: new.view.clone(),
            });
        }
        if std::ptr::eq(old.node, new.node) {
            return;
        }
        self.diff_children(
            &old.view,
            &new.view,
            flattened_children(old.node),
            flattened_children(new.node),
        );
    }

    fn delete_subtree(&mut self, parent: &ShadowViewNodePair<'_>) {
        for (index, child) in flattened_children(parent.node).iter().enumerate().rev() {
            self.buckets.removes.push(ShadowViewMutation::Remove {
                parent: parent.view.clone(),
                child: child.view.clone(),
                index,
            });
            self.buckets.deletes.push(ShadowViewMutation::Delete {
                old: child.view.clone(),
            });
            self.delete_subtree(child);
        }
    }

    fn create_subtree(&mut self, parent: &ShadowViewNodePair<'_>) {
        for (index, child) in flattened_children(parent.node).iter().enumerate() {
            self.buckets.creates.push(ShadowViewMutation::Create {
                new: child.view.clone(),
            });
            self.create_subtree(child);
            self.buckets.inserts.push(ShadowViewMutation::Insert {
                parent: parent.view.clone(),
                child: child.view.clone(),
                index,
            });
        }
    }
}

/// Tags that can stay where they are: the longest subsequence of `new_middle`
/// whose old positions are already increasing.
fn stable_tags(
    new_middle: &[ShadowViewNodePair<'_>],
    old_positions: &HashMap<Tag, usize>,
) -> HashSet<Tag> {
    let candidates: Vec<(Tag, usize)> = new_middle
        .iter()
        .filter_map(|pair| {
            old_positions
                .get(&pair.view.tag)
                .map(|&old_index| (pair.view.tag, old_index))
        })
        .collect();

    // Patience sorting: `tails[k]` is the candidate index ending the best
    // increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; candidates.len()];
    for (index, &(_, old_index)) in candidates.iter().enumerate() {
        let length = tails.partition_point(|&tail| candidates[tail].1 < old_index);
        predecessors[index] = length.checked_sub(1).map(|previous| tails[previous]);
        if length == tails.len() {
            tails.push(index);
        } else {
            tails[length] = index;
        }
    }

    let mut stable = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        stable.insert(candidates[index].0);
        cursor = predecessors[index];
    }
    stable
}

#[cfg(test)]
#[path = "tests/differentiator_tests.rs"]
mod tests;
