use std::fmt;
use std::sync::Arc;

use fabric_core::collections::map::HashMap;
use fabric_core::{MountingCoordinator, ShadowTree, StubViewTree, SurfaceId};
use parking_lot::Mutex;

use crate::scheduler::SchedulerDelegate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountingStats {
    pub transactions: u64,
    pub mutations: u64,
    pub failures: u64,
}

/// Mounting layer without a platform: applies every transaction to a
/// [`StubViewTree`] per surface.
#[derive(Default)]
pub struct HeadlessMountingManager {
    surfaces: Mutex<HashMap<SurfaceId, StubViewTree>>,
    stats: Mutex<MountingStats>,
}

impl HeadlessMountingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the host hierarchy of a surface from the revision its
    /// coordinator has mounted so far.
    pub fn attach(&self, tree: &ShadowTree) {
        let base = tree.mounting_coordinator().base_revision();
        self.surfaces
            .lock()
            .insert(tree.surface_id(), StubViewTree::from_shadow_tree(&base.root));
    }

    pub fn detach(&self, surface_id: SurfaceId) -> Option<StubViewTree> {
        self.surfaces.lock().remove(&surface_id)
    }

    /// Pulls and applies the pending transaction of `coordinator`, if any.
    ///
    /// The host lock is held across the pull so that concurrent callers
    /// apply transactions in the order the coordinator hands them out.
    pub fn mount(&self, coordinator: &MountingCoordinator) -> bool {
        let mut surfaces = self.surfaces.lock();
        let Some(transaction) = coordinator.pull_transaction() else {
            return false;
        };
        let surface_id = transaction.surface_id();
        let Some(views) = surfaces.get_mut(&surface_id) else {
            log::error!(
                "surface {}: transaction {} for a surface that is not attached",
                surface_id,
                transaction.number()
            );
            self.stats.lock().failures += 1;
            return false;
        };

        let result = views.apply(transaction.mutations());
        let mut stats = self.stats.lock();
        match result {
            Ok(()) => {
                stats.transactions += 1;
                stats.mutations += transaction.mutations().len() as u64;
                log::debug!(
                    "surface {}: mounted transaction {} ({} mutations)",
                    surface_id,
                    transaction.number(),
                    transaction.mutations().len()
                );
                true
            }
            Err(err) => {
                stats.failures += 1;
                log::error!(
                    "surface {}: transaction {} failed to mount: {}",
                    surface_id,
                    transaction.number(),
                    err
                );
                false
            }
        }
    }

    /// Snapshot of the host hierarchy of a surface.
    pub fn view_tree(&self, surface_id: SurfaceId) -> Option<StubViewTree> {
        self.surfaces.lock().get(&surface_id).cloned()
    }

    pub fn stats(&self) -> MountingStats {
        *self.stats.lock()
    }
}

impl SchedulerDelegate for HeadlessMountingManager {
    fn scheduler_did_finish_transaction(&self, coordinator: Arc<MountingCoordinator>) {
        self.mount(&coordinator);
    }

    fn scheduler_did_start_surface(&self, tree: &ShadowTree) {
        self.attach(tree);
    }

    fn scheduler_did_stop_surface(&self, surface_id: SurfaceId) {
        self.detach(surface_id);
    }
}

impl fmt::Debug for HeadlessMountingManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessMountingManager")
            .field("surfaces", &self.surfaces.lock().len())
            .field("stats", &self.stats())
            .finish()
    }
}
