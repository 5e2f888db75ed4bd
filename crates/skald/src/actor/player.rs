use crate::component::{CameraComponent, CharacterControllerComponent, MeshComponent};
use crate::error::Result;
use crate::math::{Transform, Vec3};
use crate::reflect::{Properties, Reflect};

use super::{Actor, ActorBase, ActorBuilder, ActorContext};

/// Camera offset behind and above the controller.
const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 5.0);
const IDLE_CLIP: &str = "idle";
const WALK_CLIP: &str = "walk";

/// The player character: a capsule controller driven by WASD, a mesh and a
/// follow camera, both children of the controller.
///
/// ```text
/// Controller (root, kinematic)
///   ├── Mesh
///   └── Camera  (+2 up, +5 back, mouse look)
/// ```
pub struct Player {
    base: ActorBase,
    pub health: i32,
    walking: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            base: ActorBase::default(),
            health: 10,
            walking: false,
        }
    }
}

impl Player {
    pub const CONTROLLER: &'static str = "Controller";
    pub const MESH: &'static str = "Mesh";
    pub const CAMERA: &'static str = "Camera";

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    /// Cross-fade between idle and walk when the movement state flips.
    /// Meshes without those clips keep whatever they were playing.
    fn update_animation(&mut self, ctx: &mut ActorContext<'_>, walking: bool) {
        if walking == self.walking {
            return;
        }
        self.walking = walking;
        let Some(mesh) = self.base.component(Self::MESH) else {
            return;
        };
        let clip = if walking { WALK_CLIP } else { IDLE_CLIP };
        if let Some(mesh) = ctx.component_mut::<MeshComponent>(mesh) {
            if mesh.skeleton().animation(clip).is_ok() {
                mesh.blend_to(clip, 0.5);
            }
        }
    }
}

impl Reflect for Player {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.base.props();
        props.set_title("Player");
        props.add("Health", &mut self.health);
        props
    }
}

impl Actor for Player {
    const TYPE_NAME: &'static str = "Player";

    fn base(&self) -> &ActorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActorBase {
        &mut self.base
    }

    fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
        builder.add(Self::CONTROLLER, CharacterControllerComponent::default())?;
        builder.add(Self::MESH, MeshComponent::default())?;
        let mut camera = CameraComponent::new(Transform::from_position(CAMERA_OFFSET));
        camera.mouse_look = true;
        builder.add(Self::CAMERA, camera)?;
        Ok(())
    }

    fn tick(&mut self, ctx: &mut ActorContext<'_>) {
        let Some(controller) = self.base.component(Self::CONTROLLER) else {
            return;
        };
        let axis = ctx.input.movement_axis();
        let dt = ctx.dt;
        let moved = match ctx.component_mut::<CharacterControllerComponent>(controller) {
            Some(c) => {
                let step = Vec3::new(axis.x, 0.0, -axis.y) * c.speed * dt;
                if step != Vec3::ZERO {
                    c.move_by(step);
                }
                c.take_moved()
            }
            None => return,
        };
        self.update_animation(ctx, moved.length_squared() > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputState, KeyCode};
    use crate::world::World;

    #[test]
    fn camera_follows_controller() {
        let mut world = World::new();
        let uid = world
            .spawn_actor::<Player>(Some("Hero"), Transform::from_xyz(10.0, 0.0, 0.0))
            .unwrap();
        let camera = world.actors().base(uid).unwrap().component(Player::CAMERA).unwrap();
        let position = world.components().world_position(camera).unwrap();
        assert!((position - Vec3::new(10.0, 2.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn w_moves_forward() {
        let mut world = World::new();
        let uid = world.spawn_actor::<Player>(None, Transform::IDENTITY).unwrap();
        let mut input = InputState::new();
        input.keys.press(KeyCode::W);
        world.tick(0.5, 0.5, &input, None);

        let player = world.actors().get::<Player>(uid).unwrap();
        assert!(player.is_walking());
        let root = player.base().root();
        let z = world.components().world_position(root).unwrap().z;
        assert!((z + 2.5).abs() < 1e-4);
    }
}
