use crate::backend::BodyKind;
use crate::math::{BoundingBox, Vec3};
use crate::reflect::{Properties, Reflect};

use super::{Capabilities, Component, ComponentBase, SpatialComponent};

/// A capsule moved directly by gameplay code rather than by simulation.
///
/// [`move_by`](Self::move_by) changes the local position immediately; the
/// physics backend receives the new pose as a kinematic target during the
/// next physics sync.
pub struct CharacterControllerComponent {
    pub spatial: SpatialComponent,
    pub radius: f32,
    pub height: f32,
    /// Movement speed in units per second, used by actors that drive this
    /// controller from input.
    pub speed: f32,
    moved: Vec3,
}

impl Default for CharacterControllerComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            radius: 0.5,
            height: 1.8,
            speed: 5.0,
            moved: Vec3::ZERO,
        }
    }
}

impl CharacterControllerComponent {
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            ..Self::default()
        }
    }

    /// Displace the controller in its parent's space.
    pub fn move_by(&mut self, displacement: Vec3) {
        self.spatial.transform.position += displacement;
        self.moved += displacement;
    }

    /// Total displacement since the last call.
    pub fn take_moved(&mut self) -> Vec3 {
        std::mem::take(&mut self.moved)
    }

    fn capsule_bounds(&self) -> BoundingBox {
        let half_height = self.height * 0.5;
        BoundingBox::new(
            Vec3::new(0.0, half_height, 0.0),
            Vec3::new(self.radius, half_height, self.radius),
        )
    }
}

impl Reflect for CharacterControllerComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Character Controller");
        props.add("Radius", &mut self.radius).notify();
        props.add("Height", &mut self.height).notify();
        props.add("Speed", &mut self.speed);
        props
    }

    fn property_changed(&mut self, _name: &str) {
        self.spatial.bounds = self.capsule_bounds();
    }
}

impl Component for CharacterControllerComponent {
    const TYPE_NAME: &'static str = "CharacterControllerComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            physical: true,
            ..Capabilities::SPATIAL
        }
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn create(&mut self, _assets: &mut crate::asset::Assets) {
        self.spatial.bounds = self.capsule_bounds();
    }

    fn body_kind(&self) -> Option<BodyKind> {
        Some(BodyKind::Kinematic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::PropertyValue;

    #[test]
    fn move_by_accumulates() {
        let mut controller = CharacterControllerComponent::default();
        controller.move_by(Vec3::X);
        controller.move_by(Vec3::Z);
        assert_eq!(controller.spatial.transform.position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(controller.take_moved(), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(controller.take_moved(), Vec3::ZERO);
    }

    #[test]
    fn resizing_updates_bounds() {
        let mut controller = CharacterControllerComponent::default();
        controller
            .set_property("Height", PropertyValue::Float(4.0))
            .unwrap();
        assert_eq!(controller.spatial.bounds.extents.y, 2.0);
        assert_eq!(controller.spatial.bounds.center.y, 2.0);
    }
}
