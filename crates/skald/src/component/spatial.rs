use crate::math::{BoundingBox, Transform};
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

use super::{Capabilities, Component, ComponentBase};

/// A component with a place in the world.
///
/// Holds the local [`Transform`], a bounding box and its hierarchy links.
/// Links are UIDs of other spatial components (of any type), maintained in
/// both directions by
/// [`ComponentRegistry::add_child`](super::ComponentRegistry::add_child) and
/// [`remove_child`](super::ComponentRegistry::remove_child). A parent does not
/// own its children; each child is owned by its own actor and system.
///
/// Other spatial component types embed one of these and return it from
/// [`Component::spatial`].
#[derive(Debug, Clone, Default)]
pub struct SpatialComponent {
    pub base: ComponentBase,
    pub transform: Transform,
    /// Local-space bounds.
    pub bounds: BoundingBox,
    pub(crate) parent: Option<Uid>,
    pub(crate) children: Vec<Uid>,
}

impl SpatialComponent {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }

    pub fn parent(&self) -> Option<Uid> {
        self.parent
    }

    pub fn children(&self) -> &[Uid] {
        &self.children
    }

    /// Bounds in world space as of the last propagation.
    pub fn world_bounds(&self) -> BoundingBox {
        self.bounds.transformed(self.transform.cached_world_matrix())
    }
}

impl Reflect for SpatialComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Spatial");
        props.add("Position", &mut self.transform.position);
        props.add("Rotation", &mut self.transform.rotation);
        props.add("Scale", &mut self.transform.scale);
        props
    }
}

impl Component for SpatialComponent {
    const TYPE_NAME: &'static str = "SpatialComponent";

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SPATIAL
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(self)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(self)
    }
}
