use std::fmt;
use std::sync::Arc;

use fabric_core::collections::map::HashMap;
use fabric_core::{ShadowTree, SurfaceId};
use parking_lot::RwLock;

/// Running surfaces by id.
#[derive(Default)]
pub struct ShadowTreeRegistry {
    trees: RwLock<HashMap<SurfaceId, Arc<ShadowTree>>>,
}

impl ShadowTreeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tree` unless a tree for its surface is already registered.
    pub fn add(&self, tree: Arc<ShadowTree>) -> bool {
        let mut trees = self.trees.write();
        if trees.contains_key(&tree.surface_id()) {
            return false;
        }
        trees.insert(tree.surface_id(), tree);
        true
    }

    pub fn remove(&self, surface_id: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.write().remove(&surface_id)
    }

    pub fn get(&self, surface_id: SurfaceId) -> Option<Arc<ShadowTree>> {
        self.trees.read().get(&surface_id).cloned()
    }

    /// Runs `callback` on the tree of `surface_id` outside the registry lock.
    pub fn visit<T>(&self, surface_id: SurfaceId, callback: impl FnOnce(&ShadowTree) -> T) -> Option<T> {
        let tree = self.get(surface_id)?;
        Some(callback(&tree))
    }

    /// Runs `callback` on every tree until it returns `true`.
    pub fn enumerate(&self, mut callback: impl FnMut(&ShadowTree) -> bool) {
        let trees: Vec<Arc<ShadowTree>> = self.trees.read().values().cloned().collect();
        for tree in &trees {
            if callback(tree) {
                break;
            }
        }
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<SurfaceId> = self.trees.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.trees.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.read().is_empty()
    }
}

impl fmt::Debug for ShadowTreeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowTreeRegistry")
            .field("surfaces", &self.surface_ids())
            .finish()
    }
}
