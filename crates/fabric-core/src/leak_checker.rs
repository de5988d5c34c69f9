//! Detects shadow node families that outlive their surface.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::collections::map::HashMap;
use crate::family::{ShadowNodeFamily, SharedFamily, SurfaceId, Tag};

type FamilyList = Arc<Mutex<WeakFamilies>>;

const MIN_PRUNE_LEN: usize = 64;

/// Families of one surface. Dead entries are swept only once the list has
/// doubled since the last sweep, keeping registration amortized O(1).
struct WeakFamilies {
    entries: Vec<Weak<ShadowNodeFamily>>,
    prune_at: usize,
}

impl Default for WeakFamilies {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            prune_at: MIN_PRUNE_LEN,
        }
    }
}

impl WeakFamilies {
    fn push(&mut self, family: &SharedFamily) {
        if self.entries.len() >= self.prune_at {
            self.prune();
            self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_LEN);
        }
        self.entries.push(Arc::downgrade(family));
    }

    fn prune(&mut self) {
        self.entries.retain(|weak| weak.strong_count() > 0);
    }
}

/// Weak references to every family created for a surface.
///
/// The outer lock only guards the surface map; each surface's list has its
/// own lock so registering on one surface never waits on another.
#[derive(Default)]
pub struct WeakFamilyRegistry {
    surfaces: Mutex<HashMap<SurfaceId, FamilyList>>,
}

impl WeakFamilyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, family: &SharedFamily) {
        let list = Arc::clone(
            self.surfaces
                .lock()
                .entry(family.surface_id())
                .or_default(),
        );
        list.lock().push(family);
    }

    /// Weak references to the families of `surface_id` that are still alive.
    pub fn weak_families(&self, surface_id: SurfaceId) -> Vec<Weak<ShadowNodeFamily>> {
        let list = self.surfaces.lock().get(&surface_id).cloned();
        list.map(|list| {
            let mut list = list.lock();
            list.prune();
            list.entries.clone()
        })
        .unwrap_or_default()
    }

    pub fn remove_surface(&self, surface_id: SurfaceId) -> Vec<Weak<ShadowNodeFamily>> {
        let list = self.surfaces.lock().remove(&surface_id);
        list.map(|list| {
            let mut list = list.lock();
            list.prune();
            std::mem::take(&mut list.entries)
        })
        .unwrap_or_default()
    }

    #[cfg(test)]
    fn entry_count(&self, surface_id: SurfaceId) -> usize {
        let list = self.surfaces.lock().get(&surface_id).cloned();
        list.map_or(0, |list| list.lock().entries.len())
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.lock().len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeakReport {
    pub surface_id: SurfaceId,
    /// Tag and component name of every family still alive.
    pub leaked: Vec<(Tag, Arc<str>)>,
}

impl LeakReport {
    pub fn is_clean(&self) -> bool {
        self.leaked.is_empty()
    }
}

pub struct LeakChecker {
    enabled: bool,
    registry: WeakFamilyRegistry,
}

impl LeakChecker {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            registry: WeakFamilyRegistry::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn track(&self, family: &SharedFamily) {
        if self.enabled {
            self.registry.register(family);
        }
    }

    /// Forgets `surface_id` and reports the families of it that are still
    /// referenced. Call once every revision of the surface has been dropped.
    pub fn check(&self, surface_id: SurfaceId) -> LeakReport {
        let leaked: Vec<(Tag, Arc<str>)> = self
            .registry
            .remove_surface(surface_id)
            .iter()
            .filter_map(Weak::upgrade)
            .map(|family| (family.tag(), family.component().shared_name()))
            .collect();

        for (tag, name) in &leaked {
            log::error!("surface {}: leaked shadow node {} ({})", surface_id, tag, name);
        }
        LeakReport { surface_id, leaked }
    }
}
