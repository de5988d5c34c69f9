use std::fmt;
use std::sync::Arc;

use fabric_core::collections::map::HashMap;
use fabric_core::{ComponentDescriptor, ShadowNodeTraits};
use parking_lot::RwLock;

/// Component every surface root is created with.
pub const ROOT_COMPONENT_NAME: &str = "RootView";

/// Component types the UIManager can instantiate, by name.
#[derive(Default)]
pub struct ComponentDescriptorRegistry {
    descriptors: RwLock<HashMap<Arc<str>, Arc<ComponentDescriptor>>>,
}

impl ComponentDescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the root component and the basic host components.
    pub fn with_standard_components() -> Self {
        let registry = Self::new();
        registry.add(
            ROOT_COMPONENT_NAME,
            ShadowNodeTraits::ROOT_NODE_KIND
                | ShadowNodeTraits::FORMS_VIEW
                | ShadowNodeTraits::FORMS_STACKING_CONTEXT,
        );
        registry.add("View", ShadowNodeTraits::empty());
        registry.add("ScrollView", ShadowNodeTraits::FORMS_VIEW);
        registry.add("Paragraph", ShadowNodeTraits::FORMS_VIEW);
        registry.add("RawText", ShadowNodeTraits::LEAF);
        registry.add("Image", ShadowNodeTraits::FORMS_VIEW | ShadowNodeTraits::LEAF);
        registry
    }

    pub fn add(&self, name: &str, traits: ShadowNodeTraits) -> Arc<ComponentDescriptor> {
        self.register(Arc::new(ComponentDescriptor::new(name, traits)))
    }

    /// Registers `descriptor`, replacing any descriptor of the same name.
    pub fn register(&self, descriptor: Arc<ComponentDescriptor>) -> Arc<ComponentDescriptor> {
        let previous = self
            .descriptors
            .write()
            .insert(descriptor.shared_name(), Arc::clone(&descriptor));
        if previous.is_some() {
            log::debug!("component {:?} re-registered", descriptor.name());
        }
        descriptor
    }

    pub fn get(&self, name: &str) -> Option<Arc<ComponentDescriptor>> {
        self.descriptors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.descriptors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ComponentDescriptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
