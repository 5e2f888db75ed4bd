use crate::component::SpriteComponent;
use crate::error::Result;
use crate::math::{Quat, Vec3};
use crate::reflect::{Properties, Reflect};

use super::{Actor, ActorBase, ActorBuilder, ActorContext};

/// An animated sprite that turns about the Y axis to face the camera.
#[derive(Default)]
pub struct Billboard {
    base: ActorBase,
}

impl Billboard {
    pub const SPRITE: &'static str = "Sprite";
}

/// Rotation about +Y that points a quad's +Z face from `from` toward `to`.
fn yaw_towards(from: Vec3, to: Vec3) -> Option<Quat> {
    let dir = (to - from) * Vec3::new(1.0, 0.0, 1.0);
    if dir.length_squared() < 1e-8 {
        return None;
    }
    Some(Quat::from_rotation_y(dir.x.atan2(dir.z)))
}

impl Reflect for Billboard {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Billboard");
        props
    }
}

impl Actor for Billboard {
    const TYPE_NAME: &'static str = "Billboard";

    fn base(&self) -> &ActorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActorBase {
        &mut self.base
    }

    fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
        builder.add(Self::SPRITE, SpriteComponent::default())?;
        Ok(())
    }

    fn tick(&mut self, ctx: &mut ActorContext<'_>) {
        let Some(camera) = ctx.camera else { return };
        let root = self.base.root();
        let Some(position) = ctx.world_position(root) else {
            return;
        };
        if let Some(rotation) = yaw_towards(position, camera) {
            if let Err(e) = ctx.components.set_world_rotation(root, rotation) {
                log::warn!("Billboard {} could not face camera: {e}", self.base.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_faces_target_on_the_ground_plane() {
        let q = yaw_towards(Vec3::ZERO, Vec3::new(5.0, 3.0, 0.0)).unwrap();
        let facing = q * Vec3::Z;
        assert!((facing - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn target_straight_above_gives_no_rotation() {
        assert!(yaw_towards(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0)).is_none());
    }
}
