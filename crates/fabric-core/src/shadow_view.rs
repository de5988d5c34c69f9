use std::fmt;
use std::sync::Arc;

use crate::component::ComponentHandle;
use crate::family::{SurfaceId, Tag};
use crate::layout::LayoutMetrics;
use crate::props::{Props, SharedProps};
use crate::shadow_node::ShadowNode;
use crate::state::SharedState;

/// Flat, renderable projection of a [`ShadowNode`]: everything the mounting
/// layer needs for one host view, without the tree.
#[derive(Clone)]
pub struct ShadowView {
    pub component_name: Arc<str>,
    pub component_handle: ComponentHandle,
    pub surface_id: SurfaceId,
    pub tag: Tag,
    pub props: SharedProps,
    pub state: Option<SharedState>,
    pub layout_metrics: LayoutMetrics,
}

impl ShadowView {
    pub fn new(node: &ShadowNode) -> Self {
        Self {
            component_name: node.family().component().shared_name(),
            component_handle: node.component_handle(),
            surface_id: node.surface_id(),
            tag: node.tag(),
            props: Arc::clone(node.props()),
            state: node.state().cloned(),
            layout_metrics: node.layout_metrics(),
        }
    }
}

impl PartialEq for ShadowView {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.surface_id == other.surface_id
            && self.component_handle == other.component_handle
            && Props::same(&self.props, &other.props)
            && match (&self.state, &other.state) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
            && self.layout_metrics == other.layout_metrics
    }
}

impl fmt::Debug for ShadowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowView")
            .field("tag", &self.tag)
            .field("component", &self.component_name)
            .field("props", &format_args!("{}", self.props))
            .field("frame", &self.layout_metrics.frame)
            .finish()
    }
}

/// A node paired with its view, as produced when flattening a child list.
#[derive(Clone, Debug)]
pub struct ShadowViewNodePair<'a> {
    pub view: ShadowView,
    pub node: &'a ShadowNode,
}
