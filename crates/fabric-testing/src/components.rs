use std::sync::Arc;

use fabric_core::{ComponentDescriptor, ShadowNodeTraits};

/// Component types available to test trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Always mounted.
    View,
    /// Flattened away unless its props form a view.
    Container,
    Text,
    Image,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::View,
        ComponentKind::Container,
        ComponentKind::Text,
        ComponentKind::Image,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::View => "View",
            ComponentKind::Container => "Container",
            ComponentKind::Text => "Text",
            ComponentKind::Image => "Image",
        }
    }

    pub fn traits(self) -> ShadowNodeTraits {
        match self {
            ComponentKind::View => ShadowNodeTraits::FORMS_VIEW,
            ComponentKind::Container => ShadowNodeTraits::empty(),
            ComponentKind::Text | ComponentKind::Image => {
                ShadowNodeTraits::FORMS_VIEW | ShadowNodeTraits::LEAF
            }
        }
    }

    pub fn is_leaf(self) -> bool {
        self.traits().contains(ShadowNodeTraits::LEAF)
    }
}

pub const ROOT_COMPONENT_NAME: &str = "Root";

/// One shared descriptor per component type, so every node of a kind reports
/// the same component handle.
#[derive(Clone)]
pub struct TestComponents {
    root: Arc<ComponentDescriptor>,
    kinds: Vec<(ComponentKind, Arc<ComponentDescriptor>)>,
}

impl TestComponents {
    pub fn new() -> Self {
        Self {
            root: Arc::new(ComponentDescriptor::new(
                ROOT_COMPONENT_NAME,
                ShadowNodeTraits::ROOT_NODE_KIND
                    | ShadowNodeTraits::FORMS_VIEW
                    | ShadowNodeTraits::FORMS_STACKING_CONTEXT,
            )),
            kinds: ComponentKind::ALL
                .iter()
                .map(|kind| {
                    (
                        *kind,
                        Arc::new(ComponentDescriptor::new(kind.name(), kind.traits())),
                    )
                })
                .collect(),
        }
    }

    pub fn root(&self) -> &Arc<ComponentDescriptor> {
        &self.root
    }

    pub fn get(&self, kind: ComponentKind) -> &Arc<ComponentDescriptor> {
        self.kinds
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, descriptor)| descriptor)
            .unwrap_or(&self.root)
    }

    /// Every descriptor, root included, for registering with a component
    /// registry.
    pub fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        std::iter::once(Arc::clone(&self.root))
            .chain(self.kinds.iter().map(|(_, descriptor)| Arc::clone(descriptor)))
            .collect()
    }
}

impl Default for TestComponents {
    fn default() -> Self {
        Self::new()
    }
}
