//! Spatial hierarchy — a tiny solar system.
//!
//! The sun is a mesh actor. Each planet hangs off a pivot component under
//! the sun's root, and the moon hangs off the planet. Turning a pivot
//! carries everything below it, and world positions always equal the
//! product of the local transforms up the chain.
//!
//! Run with: `cargo run -p skald --example hierarchy`

use skald::prelude::*;

fn main() -> skald::error::Result<()> {
    env_logger::init();

    let mut world = World::new();
    let sun = world.spawn_actor::<MeshActor>(Some("Sun"), Transform::IDENTITY)?;
    let sun_root = world.actors().base(sun).map(|b| b.root()).unwrap_or_default();

    // Pivot at the sun's centre, planet 5 units out along X.
    let pivot = world.add_component(sun, "Earth Pivot", SpatialComponent::default())?;
    let earth = world.add_component(
        sun,
        "Earth",
        MeshComponent::new("cube", "").at(Transform::from_xyz(5.0, 0.0, 0.0).with_scale(0.5)),
    )?;
    world.add_child(pivot, earth)?;

    // The moon orbits the earth at 2 units (in earth's scaled space).
    let moon = world.add_component(
        sun,
        "Moon",
        MeshComponent::new("cube", "").at(Transform::from_xyz(2.0, 0.0, 0.0).with_scale(0.5)),
    )?;
    world.add_child(earth, moon)?;
    world.propagate_transforms();

    let input = InputState::new();
    let dt = 0.25;
    for frame in 0..8 {
        let angle = frame as f32 * dt;
        world.set_world_rotation(pivot, Quat::from_rotation_y(angle))?;
        world.tick(dt, angle, &input, None);
        world.propagate_transforms();

        let earth_pos = world.world_matrix(earth)?.w_axis.truncate();
        let moon_pos = world.world_matrix(moon)?.w_axis.truncate();
        println!(
            "t={angle:.2}  earth ({:6.2} {:6.2})  moon ({:6.2} {:6.2})",
            earth_pos.x, earth_pos.z, moon_pos.x, moon_pos.z
        );
    }

    // Move the whole system; children follow.
    world.set_world_position(sun_root, Vec3::new(0.0, 10.0, 0.0))?;
    let moon_pos = world.world_matrix(moon)?.w_axis.truncate();
    println!("after lifting the sun, moon y = {:.2}", moon_pos.y);

    // Detaching keeps the local transform, which is now relative to the world.
    world.remove_child(earth, moon)?;
    println!("detached moon at {:?}", world.world_matrix(moon)?.w_axis.truncate());
    Ok(())
}
