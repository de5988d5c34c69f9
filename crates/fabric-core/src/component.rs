use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::hash::hash_one;

bitflags! {
    /// Static capabilities of a component type.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShadowNodeTraits: u32 {
        /// Always backed by a host view, never flattened.
        const FORMS_VIEW = 1 << 0;
        const FORMS_STACKING_CONTEXT = 1 << 1;
        /// Root of a surface.
        const ROOT_NODE_KIND = 1 << 2;
        /// Cannot have children.
        const LEAF = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentHandle(pub u64);

impl ComponentHandle {
    pub fn for_name(name: &str) -> Self {
        ComponentHandle(hash_one(&name))
    }
}

/// Describes one component type known to the renderer.
pub struct ComponentDescriptor {
    handle: ComponentHandle,
    name: Arc<str>,
    traits: ShadowNodeTraits,
}

impl ComponentDescriptor {
    pub fn new(name: &str, traits: ShadowNodeTraits) -> Self {
        Self {
            handle: ComponentHandle::for_name(name),
            name: Arc::from(name),
            traits,
        }
    }

    pub fn handle(&self) -> ComponentHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn traits(&self) -> ShadowNodeTraits {
        self.traits
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("traits", &self.traits)
            .finish()
    }
}
