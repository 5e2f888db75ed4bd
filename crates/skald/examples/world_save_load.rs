//! World save / load — text saves and JSON templates.
//!
//! Builds a small level, edits it through the property interface the way
//! an editor would, saves it to a temp directory, loads it into a fresh
//! world, and spawns a second enemy from a template.
//!
//! Run with: `cargo run -p skald --example world_save_load`

use skald::prelude::*;

fn main() -> skald::error::Result<()> {
    env_logger::init();

    let mut world = World::new();
    let floor = world.spawn_actor::<MeshActor>(Some("Floor"), Transform::IDENTITY.with_scale(20.0))?;
    let floor_mesh = world.actors().base(floor).map(|b| b.root()).unwrap_or_default();
    world.set_component_property(floor_mesh, "Mesh", PropertyValue::Mesh(MeshRef::new("plane")))?;

    let grunt = world.spawn_actor::<Enemy>(Some("Grunt"), Transform::from_xyz(3.0, 0.0, -4.0))?;
    world.set_actor_property(grunt, "Health", PropertyValue::Int(5))?;
    world.spawn_actor::<Player>(Some("Hero"), Transform::IDENTITY)?;

    let dir = std::env::temp_dir().join("skald-example");
    std::fs::create_dir_all(&dir)?;
    let level = dir.join("level.txt");
    world.save_file(&level)?;
    println!("saved {} actors to {}", world.actors().len(), level.display());

    let mut loaded = World::new();
    loaded.load_file(&level)?;
    for uid in loaded.actors().uids() {
        let Some(base) = loaded.actors().base(uid) else {
            continue;
        };
        let kind = loaded.actors().type_name(uid).unwrap_or("?");
        let position = loaded.components().world_position(base.root())?;
        println!("  {kind:<10} {:<6} uid {uid:<4} at {position}", base.name);
    }

    let template = loaded.capture_template(grunt)?;
    let template_path = dir.join("grunt.json");
    template.save(&template_path)?;
    let template = ActorTemplate::load(&template_path)?;
    let copy = loaded.spawn_from_template(&template, Some("Grunt Copy"))?;
    println!(
        "spawned {:?} from template, health {:?}",
        loaded.actors().base(copy).map(|b| b.name.clone()),
        loaded.actor_property(copy, "Health")?
    );

    #[cfg(feature = "diagnostics")]
    println!("{}", loaded.snapshot().to_json()?);
    Ok(())
}
