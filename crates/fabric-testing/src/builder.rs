use std::sync::Arc;

use fabric_core::collections::map::HashMap;
use fabric_core::{
    LayoutMetrics, PropValue, Props, RawProps, Rect, ShadowNode, ShadowNodeFamily,
    ShadowNodeFamilyFragment, ShadowNodeFragment, SharedFamily, SharedShadowNode, SurfaceId, Tag,
};

use crate::components::{ComponentKind, TestComponents};

/// Declarative description of a subtree.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    pub tag: Tag,
    pub kind: ComponentKind,
    pub props: RawProps,
    pub frame: Rect,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: Tag, kind: ComponentKind) -> Self {
        Self {
            tag,
            kind,
            props: RawProps::new(),
            frame: Rect::default(),
            children: Vec::new(),
        }
    }

    pub fn view(tag: Tag) -> Self {
        Self::new(tag, ComponentKind::View)
    }

    pub fn container(tag: Tag) -> Self {
        Self::new(tag, ComponentKind::Container)
    }

    pub fn text(tag: Tag) -> Self {
        Self::new(tag, ComponentKind::Text)
    }

    pub fn image(tag: Tag) -> Self {
        Self::new(tag, ComponentKind::Image)
    }

    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn frame(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.frame = Rect::new(x, y, width, height);
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSpec::node_count).sum::<usize>()
    }
}

/// Turns [`NodeSpec`]s into shadow nodes of one surface.
///
/// Families are remembered per tag, so building the same tag twice yields two
/// revisions of one component instance, which is what the differentiator
/// matches on.
pub struct TreeBuilder {
    surface_id: SurfaceId,
    components: TestComponents,
    families: HashMap<Tag, SharedFamily>,
}

impl TreeBuilder {
    pub fn new(surface_id: SurfaceId) -> Self {
        Self::with_components(surface_id, TestComponents::new())
    }

    pub fn with_components(surface_id: SurfaceId, components: TestComponents) -> Self {
        Self {
            surface_id,
            components,
            families: HashMap::new(),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn components(&self) -> &TestComponents {
        &self.components
    }

    pub fn family(&mut self, tag: Tag, kind: ComponentKind) -> SharedFamily {
        let descriptor = if tag == self.surface_id {
            Arc::clone(self.components.root())
        } else {
            Arc::clone(self.components.get(kind))
        };
        let surface_id = self.surface_id;
        Arc::clone(self.families.entry(tag).or_insert_with(|| {
            Arc::new(ShadowNodeFamily::new(
                ShadowNodeFamilyFragment { tag, surface_id },
                descriptor,
            ))
        }))
    }

    /// Builds an unsealed subtree.
    pub fn node(&mut self, spec: &NodeSpec) -> SharedShadowNode {
        let children = self.children(&spec.children);
        let family = self.family(spec.tag, spec.kind);
        Arc::new(ShadowNode::new(
            family,
            ShadowNodeFragment::new()
                .props(Arc::new(Props::from_raw(&spec.props)))
                .layout_metrics(LayoutMetrics::with_frame(spec.frame))
                .children(children),
        ))
    }

    pub fn children(&mut self, specs: &[NodeSpec]) -> Vec<SharedShadowNode> {
        specs.iter().map(|spec| self.node(spec)).collect()
    }

    /// Builds a sealed root (tag = surface id) over `children`.
    pub fn root(&mut self, children: &[NodeSpec]) -> SharedShadowNode {
        let children = self.children(children);
        let family = self.family(self.surface_id, ComponentKind::View);
        let root = ShadowNode::new(family, ShadowNodeFragment::new().children(children));
        root.seal_recursive();
        Arc::new(root)
    }
}
