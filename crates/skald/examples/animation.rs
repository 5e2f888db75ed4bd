//! Skeletal animation — a three-joint arm with two clips.
//!
//! Registers a small importer that builds the rig in code, plays "wave",
//! cross-fades to "rest" and prints the hand's skinning matrix translation
//! as it goes.
//!
//! Run with: `cargo run -p skald --example animation`

use std::path::Path;

use skald::prelude::*;

/// Builds the arm for any `.rig` file name.
struct RigImporter;

impl MeshImporter for RigImporter {
    fn extensions(&self) -> &[&str] {
        &["rig"]
    }

    fn import(&self, _path: &Path) -> skald::error::Result<MeshData> {
        let mut skeleton = Skeleton::new();
        let shoulder = skeleton.add_joint(Joint::new("shoulder", None))?;
        let elbow = skeleton.add_joint(Joint::new("elbow", Some(shoulder)).with_bind_pose(
            LocalPose {
                position: Vec3::X,
                ..LocalPose::IDENTITY
            },
            Mat4::from_translation(-Vec3::X),
        ))?;
        skeleton.add_joint(Joint::new("hand", Some(elbow)).with_bind_pose(
            LocalPose {
                position: Vec3::X,
                ..LocalPose::IDENTITY
            },
            Mat4::from_translation(-2.0 * Vec3::X),
        ))?;

        let wave = skeleton.create_animation("wave");
        wave.add_frame(shoulder, AnimFrame::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE));
        wave.add_frame(
            shoulder,
            AnimFrame::new(0.5, Vec3::ZERO, Quat::from_rotation_z(0.8), Vec3::ONE),
        );
        wave.add_frame(shoulder, AnimFrame::new(1.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE));

        let rest = skeleton.create_animation("rest");
        rest.add_frame(shoulder, AnimFrame::translation(0.0, Vec3::ZERO));
        rest.add_frame(shoulder, AnimFrame::translation(1.0, Vec3::new(0.0, -0.2, 0.0)));

        let mut mesh = skald::asset::cube();
        mesh.skeleton = skeleton;
        Ok(mesh)
    }
}

fn main() -> skald::error::Result<()> {
    env_logger::init();

    let mut world = World::new();
    world.assets_mut().add_importer(RigImporter);

    let arm = world.spawn_actor::<MeshActor>(Some("Arm"), Transform::IDENTITY)?;
    let mesh = world.actors().base(arm).map(|b| b.root()).unwrap_or_default();
    world.set_component_property(mesh, "Mesh", PropertyValue::Mesh(MeshRef::new("arm.rig")))?;
    world.set_component_property(mesh, "Animation", PropertyValue::String("wave".into()))?;

    let input = InputState::new();
    let dt = 1.0 / 10.0;
    for frame in 0..25 {
        if frame == 12 {
            if let Some(mesh) = world.component_mut::<MeshComponent>(mesh) {
                mesh.blend_to("rest", 0.5);
            }
        }
        world.tick(dt, frame as f32 * dt, &input, None);
        world.animate(dt);

        if let Some(mesh) = world.component::<MeshComponent>(mesh) {
            let hand = mesh.skinning().joints[2].w_axis.truncate();
            println!(
                "frame {frame:2}  clip {:<5}  hand offset ({:5.2} {:5.2})",
                mesh.player().current_clip().unwrap_or("-"),
                hand.x,
                hand.y
            );
        }
    }
    Ok(())
}
