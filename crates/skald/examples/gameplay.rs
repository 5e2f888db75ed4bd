//! Gameplay loop — a headless play session.
//!
//! The player walks forward into an enemy's aggro box, clicks it to death,
//! and the enemy removes itself between frames. Physics, audio and
//! rendering use the built-in stand-in backends. The session state is
//! printed at the end.
//!
//! Run with: `cargo run -p skald --example gameplay`

use skald::prelude::*;

fn main() -> skald::error::Result<()> {
    env_logger::init();

    let mut engine = EngineContext::new(EngineConfig::default());
    engine.set_physics(SimplePhysics::new());
    engine.set_audio(SilentAudio::default());
    engine.set_renderer(HeadlessRenderer::default());

    let hero = engine
        .world
        .spawn_actor::<Player>(Some("Hero"), Transform::from_xyz(0.0, 0.0, 12.0))?;
    let grunt = engine
        .world
        .spawn_actor::<Enemy>(Some("Grunt"), Transform::IDENTITY)?;
    engine
        .world
        .spawn_actor::<Billboard>(Some("Torch"), Transform::from_xyz(2.0, 1.0, 0.0))?;

    let mut music = AudioComponent::new("theme.ogg");
    music.play_on_start = true;
    music.looping = true;
    let music = engine.world.add_component(hero, "Music", music)?;

    engine.start_game();
    engine.input.keys.press(KeyCode::W);

    let dt = 1.0 / 30.0;
    for frame in 0..240 {
        let in_combat = engine.world.actor::<Enemy>(grunt).is_some_and(|e| e.in_combat);
        if in_combat {
            engine.input.keys.release(KeyCode::W);
            if frame % 10 == 0 {
                engine.input.mouse.press(MouseButton::Left);
            } else {
                engine.input.mouse.release(MouseButton::Left);
            }
        }
        engine.frame(dt);

        for note in engine.take_notifications() {
            println!("[frame {frame:3}] {note}");
        }
        if !engine.world.actors().contains(grunt) {
            engine.game.collect("grunt defeated");
            println!("[frame {frame:3}] Grunt is gone");
            break;
        }
    }

    if let Some(music) = engine.world.component_mut::<AudioComponent>(music) {
        music.fade_out(1.0);
    }
    for _ in 0..40 {
        engine.frame(dt);
    }
    let playing = engine.audio().is_some_and(|a| a.is_playing(music));
    println!("music still playing after fade: {playing}");

    engine.end_game();
    engine.game.travel("arena.txt", "courtyard.txt");
    print!("{}", engine.game.save_text());
    Ok(())
}
