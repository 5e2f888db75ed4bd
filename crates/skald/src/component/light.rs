use crate::backend::{LightDraw, Renderer};
use crate::math::Vec4;
use crate::reflect::{Properties, Reflect};

use super::{Capabilities, Component, ComponentBase, SpatialComponent};

/// An omnidirectional light with linear falloff to `range`.
pub struct PointLightComponent {
    pub spatial: SpatialComponent,
    pub color: Vec4,
    pub intensity: f32,
    pub range: f32,
}

impl Default for PointLightComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            color: Vec4::ONE,
            intensity: 1.0,
            range: 10.0,
        }
    }
}

impl Reflect for PointLightComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Point Light");
        props.add("Color", &mut self.color);
        props.add("Intensity", &mut self.intensity);
        props.add("Range", &mut self.range);
        props
    }
}

impl Component for PointLightComponent {
    const TYPE_NAME: &'static str = "PointLightComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            renderable: true,
            ..Capabilities::SPATIAL
        }
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if self.intensity <= 0.0 {
            return;
        }
        renderer.draw_light(LightDraw {
            uid: self.spatial.base.uid,
            position: self.spatial.transform.cached_world_matrix().w_axis.truncate(),
            color: self.color,
            intensity: self.intensity,
            range: self.range,
        });
    }
}
