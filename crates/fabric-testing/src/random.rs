//! Seeded random trees and edits for differentiator properties.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use fabric_core::{PropValue, Rect, Tag};

use crate::builder::NodeSpec;
use crate::components::ComponentKind;

const COLORS: &[&str] = &["red", "green", "blue", "black", "white"];
const MAX_DEPTH: usize = 5;

/// Generates child lists for a surface root and edits them.
///
/// Every node created by one generator gets a fresh tag, so tags stay unique
/// across a tree and its edited versions.
pub struct RandomTreeGenerator {
    rng: StdRng,
    next_tag: Tag,
}

impl RandomTreeGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_tag: 100,
        }
    }

    /// A forest of at most `max_nodes` nodes.
    pub fn generate(&mut self, max_nodes: usize) -> Vec<NodeSpec> {
        let mut budget = max_nodes;
        let mut forest = Vec::new();
        while budget > 0 {
            forest.push(self.subtree(&mut budget, 0));
            if self.rng.gen_bool(0.3) {
                break;
            }
        }
        forest
    }

    /// A copy of `forest` with `edits` random edits applied.
    pub fn mutate(&mut self, forest: &[NodeSpec], edits: usize) -> Vec<NodeSpec> {
        let mut forest = forest.to_vec();
        for _ in 0..edits {
            self.edit(&mut forest);
        }
        forest
    }

    fn fresh_tag(&mut self) -> Tag {
        let tag = self.next_tag;
        self.next_tag += 1;
        tag
    }

    fn subtree(&mut self, budget: &mut usize, depth: usize) -> NodeSpec {
        *budget = budget.saturating_sub(1);
        let kind = if depth >= MAX_DEPTH || *budget == 0 {
            *[ComponentKind::Text, ComponentKind::Image, ComponentKind::View]
                .choose(&mut self.rng)
                .unwrap_or(&ComponentKind::View)
        } else {
            match self.rng.gen_range(0..10) {
                0..=3 => ComponentKind::View,
                4..=6 => ComponentKind::Container,
                7..=8 => ComponentKind::Text,
                _ => ComponentKind::Image,
            }
        };

        let mut spec = NodeSpec::new(self.fresh_tag(), kind);
        spec.frame = self.random_frame();
        if kind != ComponentKind::Container || self.rng.gen_bool(0.2) {
            spec.props.set("color", self.random_color());
        }
        if !kind.is_leaf() {
            let wanted = self.rng.gen_range(0..4);
            for _ in 0..wanted {
                if *budget == 0 {
                    break;
                }
                spec.children.push(self.subtree(budget, depth + 1));
            }
        }
        spec
    }

    fn edit(&mut self, forest: &mut Vec<NodeSpec>) {
        let total = count(forest);
        match self.rng.gen_range(0..7) {
            0 if total > 0 => {
                let color = self.random_color();
                if let Some(node) = nth_mut(forest, self.rng.gen_range(0..total)) {
                    node.props.set("color", color);
                }
            }
            1 if total > 0 => {
                let frame = self.random_frame();
                if let Some(node) = nth_mut(forest, self.rng.gen_range(0..total)) {
                    node.frame = frame;
                }
            }
            2 if total > 0 => {
                if let Some(node) = nth_mut(forest, self.rng.gen_range(0..total)) {
                    if node.kind == ComponentKind::Container {
                        let pinned = node.props.iter().any(|(name, value)| {
                            name == "collapsable" && *value == PropValue::Bool(false)
                        });
                        let value = if pinned {
                            PropValue::Null
                        } else {
                            PropValue::Bool(false)
                        };
                        node.props.set("collapsable", value);
                    }
                }
            }
            3 if total > 0 => {
                remove_nth(forest, self.rng.gen_range(0..total));
            }
            4 => {
                let children = self.random_child_list(forest, total);
                children.shuffle(&mut self.rng);
            }
            5 if total > 0 => {
                if let Some(moved) = remove_nth(forest, self.rng.gen_range(0..total)) {
                    let remaining = count(forest);
                    self.insert_somewhere(forest, remaining, moved);
                }
            }
            _ => {
                let mut budget = self.rng.gen_range(1..5);
                let spec = self.subtree(&mut budget, MAX_DEPTH - 2);
                self.insert_somewhere(forest, total, spec);
            }
        }
    }

    fn insert_somewhere(&mut self, forest: &mut Vec<NodeSpec>, total: usize, spec: NodeSpec) {
        let children = self.random_child_list(forest, total);
        let index = self.rng.gen_range(0..=children.len());
        children.insert(index, spec);
    }

    /// Child list of a random non-leaf node, or the forest itself.
    fn random_child_list<'a>(
        &mut self,
        forest: &'a mut Vec<NodeSpec>,
        total: usize,
    ) -> &'a mut Vec<NodeSpec> {
        if total == 0 || self.rng.gen_bool(0.25) {
            return forest;
        }
        let index = self.rng.gen_range(0..total);
        let is_leaf = nth(forest, index).map_or(true, |node| node.kind.is_leaf());
        if is_leaf {
            return forest;
        }
        match nth_mut(forest, index) {
            Some(node) => &mut node.children,
            None => unreachable!("index {index} was counted"),
        }
    }

    fn random_color(&mut self) -> &'static str {
        COLORS.choose(&mut self.rng).copied().unwrap_or("red")
    }

    fn random_frame(&mut self) -> Rect {
        Rect::new(
            self.rng.gen_range(0..50) as f32,
            self.rng.gen_range(0..50) as f32,
            self.rng.gen_range(1..200) as f32,
            self.rng.gen_range(1..200) as f32,
        )
    }
}

/// Number of nodes in `forest`.
pub fn count(forest: &[NodeSpec]) -> usize {
    forest.iter().map(NodeSpec::node_count).sum()
}

/// Pre-order lookup.
pub fn nth(forest: &[NodeSpec], index: usize) -> Option<&NodeSpec> {
    fn walk<'a>(nodes: &'a [NodeSpec], remaining: &mut usize) -> Option<&'a NodeSpec> {
        for node in nodes {
            if *remaining == 0 {
                return Some(node);
            }
            *remaining -= 1;
            if let Some(found) = walk(&node.children, remaining) {
                return Some(found);
            }
        }
        None
    }
    walk(forest, &mut { index })
}

pub fn nth_mut(forest: &mut [NodeSpec], index: usize) -> Option<&mut NodeSpec> {
    fn walk<'a>(nodes: &'a mut [NodeSpec], remaining: &mut usize) -> Option<&'a mut NodeSpec> {
        for node in nodes {
            if *remaining == 0 {
                return Some(node);
            }
            *remaining -= 1;
            if let Some(found) = walk(&mut node.children, remaining) {
                return Some(found);
            }
        }
        None
    }
    walk(forest, &mut { index })
}

/// Detaches the node at pre-order `index` together with its subtree.
pub fn remove_nth(forest: &mut Vec<NodeSpec>, index: usize) -> Option<NodeSpec> {
    fn walk(nodes: &mut Vec<NodeSpec>, remaining: &mut usize) -> Option<NodeSpec> {
        for position in 0..nodes.len() {
            if *remaining == 0 {
                return Some(nodes.remove(position));
            }
            *remaining -= 1;
            if let Some(found) = walk(&mut nodes[position].children, remaining) {
                return Some(found);
            }
        }
        None
    }
    walk(forest, &mut { index })
}
