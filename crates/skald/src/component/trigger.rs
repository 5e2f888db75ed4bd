use std::collections::HashSet;

use crate::math::{BoundingBox, Vec3, Vec4};
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

use super::{Capabilities, Component, ComponentBase, SpatialComponent};

/// A change in what a trigger contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Entered(Uid),
    Exited(Uid),
}

/// An invisible box that reports things entering and leaving it.
///
/// The trigger does not go looking for candidates. Its owner hands it
/// `(uid, world position)` pairs each frame through [`poll`](Self::poll) and
/// gets back enter/exit events relative to the previous poll.
pub struct BoxTriggerComponent {
    pub spatial: SpatialComponent,
    /// Half-size of the box in local space.
    pub extents: Vec3,
    /// Editor wireframe colour.
    pub color: Vec4,
    inside: HashSet<Uid>,
}

impl Default for BoxTriggerComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            extents: Vec3::ONE,
            color: Vec4::new(0.1, 0.75, 0.1, 1.0),
            inside: HashSet::new(),
        }
    }
}

impl BoxTriggerComponent {
    pub fn new(extents: Vec3) -> Self {
        Self {
            extents,
            ..Self::default()
        }
    }

    /// The trigger volume in world space, as of the last propagation.
    pub fn world_box(&self) -> BoundingBox {
        BoundingBox::new(Vec3::ZERO, self.extents)
            .transformed(self.spatial.transform.cached_world_matrix())
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.world_box().contains_point(point)
    }

    /// Whether `uid` was inside at the last poll.
    pub fn contains(&self, uid: Uid) -> bool {
        self.inside.contains(&uid)
    }

    /// Test every candidate and report who entered or left since last time.
    /// Candidates missing from the list count as having left.
    pub fn poll(&mut self, candidates: &[(Uid, Vec3)]) -> Vec<TriggerEvent> {
        let bounds = self.world_box();
        let now: HashSet<Uid> = candidates
            .iter()
            .filter(|(_, p)| bounds.contains_point(*p))
            .map(|(uid, _)| *uid)
            .collect();

        let mut events: Vec<TriggerEvent> = candidates
            .iter()
            .filter(|(uid, _)| now.contains(uid) && !self.inside.contains(uid))
            .map(|(uid, _)| TriggerEvent::Entered(*uid))
            .collect();
        let mut exited: Vec<Uid> = self.inside.difference(&now).copied().collect();
        exited.sort();
        events.extend(exited.into_iter().map(TriggerEvent::Exited));

        self.inside = now;
        events
    }
}

impl Reflect for BoxTriggerComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Box Trigger");
        props.add("Extents", &mut self.extents);
        props.add("Color", &mut self.color);
        props
    }
}

impl Component for BoxTriggerComponent {
    const TYPE_NAME: &'static str = "BoxTriggerComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SPATIAL
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn create(&mut self, _assets: &mut crate::asset::Assets) {
        self.spatial.bounds = BoundingBox::new(Vec3::ZERO, self.extents);
    }

    fn destroy(&mut self) {
        self.inside.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Quat};

    fn trigger_at(x: f32) -> BoxTriggerComponent {
        let mut trigger = BoxTriggerComponent::new(Vec3::splat(2.0));
        trigger
            .spatial
            .transform
            .set_cached_world_matrix(Mat4::from_translation(Vec3::new(x, 0.0, 0.0)));
        trigger
    }

    #[test]
    fn contains_point_in_world_space() {
        let trigger = trigger_at(10.0);
        assert!(trigger.contains_point(Vec3::new(11.0, 1.0, -1.0)));
        assert!(!trigger.contains_point(Vec3::ZERO));
    }

    #[test]
    fn poll_reports_enter_then_exit() {
        let mut trigger = trigger_at(0.0);
        let player = Uid::new();

        let events = trigger.poll(&[(player, Vec3::new(5.0, 0.0, 0.0))]);
        assert!(events.is_empty());

        let events = trigger.poll(&[(player, Vec3::new(1.0, 0.0, 0.0))]);
        assert_eq!(events, [TriggerEvent::Entered(player)]);
        assert!(trigger.contains(player));

        let events = trigger.poll(&[(player, Vec3::new(0.5, 0.0, 0.0))]);
        assert!(events.is_empty());

        let events = trigger.poll(&[]);
        assert_eq!(events, [TriggerEvent::Exited(player)]);
    }

    #[test]
    fn rotated_trigger_uses_its_orientation() {
        let mut trigger = BoxTriggerComponent::new(Vec3::new(4.0, 1.0, 1.0));
        trigger
            .spatial
            .transform
            .set_cached_world_matrix(Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)));
        assert!(trigger.contains_point(Vec3::new(0.0, 0.0, 3.0)));
        assert!(!trigger.contains_point(Vec3::new(3.0, 0.0, 0.0)));
    }
}
