use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::component::{ComponentDescriptor, ComponentHandle, ShadowNodeTraits};
use crate::state::{SharedState, State};

pub type Tag = i32;
pub type SurfaceId = i32;
pub type SharedFamily = Arc<ShadowNodeFamily>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowNodeFamilyFragment {
    pub tag: Tag,
    pub surface_id: SurfaceId,
}

/// Identity shared by every revision of one component instance.
///
/// A family outlives any single node: all clones of a node point at the same
/// family, so "is this the same component" is a pointer comparison. The only
/// mutable piece is the most recent committed [`State`], which is held weakly
/// to avoid a cycle through `State::family`.
pub struct ShadowNodeFamily {
    tag: Tag,
    surface_id: SurfaceId,
    component: Arc<ComponentDescriptor>,
    most_recent_state: RwLock<Weak<State>>,
}

impl ShadowNodeFamily {
    pub fn new(fragment: ShadowNodeFamilyFragment, component: Arc<ComponentDescriptor>) -> Self {
        Self {
            tag: fragment.tag,
            surface_id: fragment.surface_id,
            component,
            most_recent_state: RwLock::new(Weak::new()),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn component(&self) -> &Arc<ComponentDescriptor> {
        &self.component
    }

    pub fn component_name(&self) -> &str {
        self.component.name()
    }

    pub fn component_handle(&self) -> ComponentHandle {
        self.component.handle()
    }

    pub fn traits(&self) -> ShadowNodeTraits {
        self.component.traits()
    }

    /// Newest committed state, if any revision holding it is still alive.
    pub fn most_recent_state(&self) -> Option<SharedState> {
        self.most_recent_state.read().upgrade()
    }

    /// Records `state` as the newest one unless a newer revision is already recorded.
    pub fn set_most_recent_state(&self, state: &SharedState) {
        let mut slot = self.most_recent_state.write();
        if let Some(current) = slot.upgrade() {
            if current.revision() >= state.revision() {
                return;
            }
        }
        *slot = Arc::downgrade(state);
    }

    pub fn same(a: &ShadowNodeFamily, b: &ShadowNodeFamily) -> bool {
        std::ptr::eq(a, b)
    }
}

impl fmt::Debug for ShadowNodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowNodeFamily")
            .field("tag", &self.tag)
            .field("surface_id", &self.surface_id)
            .field("component", &self.component.name())
            .finish()
    }
}
