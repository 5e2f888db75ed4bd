//! # Engine Context
//!
//! [`EngineContext`] owns everything one running game needs: the world,
//! input, timing, config, session state, the active camera, the gameplay
//! flag and the optional backends. It is passed around explicitly; nothing
//! in the engine is a process-wide singleton except the UID counter.
//!
//! ## Frame order
//!
//! ```text
//! frame(dt)
//!   ├── time.advance                (clamped, scaled)
//!   ├── physics.step + sync         gameplay only
//!   ├── world.tick                  gameplay only: actors, then components
//!   ├── world.apply_commands        gameplay only
//!   ├── world.animate               gameplay only
//!   ├── world.propagate_transforms
//!   ├── world.flush_removals  ──►   removed UIDs forwarded to every backend
//!   ├── audio sync
//!   ├── render
//!   └── input.begin_frame           edge state cleared for the next frame
//! ```
//!
//! With gameplay off (editing), the world is still propagated, flushed and
//! drawn, but nothing ticks.

use crate::backend::{AudioBackend, CameraView, PhysicsBackend, Renderer};
use crate::component::CameraComponent;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::game_instance::GameInstance;
use crate::input::InputState;
use crate::math::Vec3;
use crate::time::Time;
use crate::uid::Uid;
use crate::world::World;

/// The running engine.
pub struct EngineContext {
    pub world: World,
    pub input: InputState,
    pub time: Time,
    pub config: EngineConfig,
    /// Viewport width over height, used for the camera projection.
    pub aspect: f32,
    /// Session state kept across map loads.
    pub game: GameInstance,
    active_camera: Option<Uid>,
    gameplay: bool,
    notifications: Vec<String>,
    physics: Option<Box<dyn PhysicsBackend>>,
    renderer: Option<Box<dyn Renderer>>,
    audio: Option<Box<dyn AudioBackend>>,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        log::info!("Engine context created (asset root {})", config.asset_root.display());
        Self {
            world: World::with_config(&config),
            input: InputState::new(),
            time: Time::new(),
            config,
            aspect: 16.0 / 9.0,
            game: GameInstance::default(),
            active_camera: None,
            gameplay: false,
            notifications: Vec::new(),
            physics: None,
            renderer: None,
            audio: None,
        }
    }

    // ── Backends ─────────────────────────────────────────────────────

    pub fn set_physics(&mut self, physics: impl PhysicsBackend + 'static) {
        self.physics = Some(Box::new(physics));
    }

    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    pub fn set_audio(&mut self, audio: impl AudioBackend + 'static) {
        self.audio = Some(Box::new(audio));
    }

    pub fn physics(&self) -> Option<&dyn PhysicsBackend> {
        self.physics.as_deref()
    }

    pub fn audio(&self) -> Option<&dyn AudioBackend> {
        self.audio.as_deref()
    }

    // ── Camera ───────────────────────────────────────────────────────

    /// Draw from `camera`, which must be a live [`CameraComponent`].
    pub fn set_active_camera(&mut self, camera: Uid) -> Result<()> {
        if self.world.component::<CameraComponent>(camera).is_none() {
            return Err(EngineError::ComponentNotFound(camera.to_string()));
        }
        self.active_camera = Some(camera);
        Ok(())
    }

    /// The camera frames are drawn from: the one set explicitly if it is
    /// still alive, otherwise the first camera in the world.
    pub fn active_camera(&self) -> Option<Uid> {
        self.active_camera
            .filter(|&uid| self.world.component::<CameraComponent>(uid).is_some())
            .or_else(|| {
                self.world
                    .components()
                    .system::<CameraComponent>()?
                    .iter()
                    .next()
                    .map(|c| c.spatial.base.uid)
            })
    }

    fn camera_position(&self) -> Option<Vec3> {
        let camera = self.active_camera()?;
        self.world.components().world_position(camera).ok()
    }

    pub fn camera_view(&self) -> Option<CameraView> {
        let camera = self.active_camera()?;
        self.world
            .component::<CameraComponent>(camera)
            .map(|c| c.view(self.aspect))
    }

    // ── Gameplay ─────────────────────────────────────────────────────

    pub fn is_playing(&self) -> bool {
        self.gameplay
    }

    /// Turn gameplay on and call `start` on every actor and component.
    pub fn start_game(&mut self) {
        if self.gameplay {
            return;
        }
        self.gameplay = true;
        self.time.reset();
        self.world.propagate_transforms();
        self.world.start(&self.input);
        log::info!("Gameplay started");
    }

    pub fn end_game(&mut self) {
        if !self.gameplay {
            return;
        }
        self.gameplay = false;
        log::info!("Gameplay ended after {} frames", self.time.frame_count());
    }

    /// Notifications raised since the last call: command notices and asset
    /// fallbacks.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Run one frame with a raw delta of `raw_dt` seconds.
    pub fn frame(&mut self, raw_dt: f32) {
        self.time.advance(raw_dt, &self.config);
        let dt = self.time.delta_secs();
        let elapsed = self.time.elapsed_secs();

        if self.gameplay {
            if let Some(physics) = self.physics.as_deref_mut() {
                physics.step(dt);
                self.world.components_mut().sync_physics(physics);
            }
            let camera = self.camera_position();
            self.world.tick(dt, elapsed, &self.input, camera);
            let notes = self.world.apply_commands();
            self.notifications.extend(notes);
            self.world.animate(dt);
        }

        self.world.propagate_transforms();
        self.world.flush_removals();
        self.forget_removed();
        let fallbacks = self.world.assets_mut().take_notifications();
        self.notifications.extend(fallbacks);

        if let Some(audio) = self.audio.as_deref_mut() {
            self.world.components_mut().sync_audio(audio);
        }
        let view = self.camera_view();
        if let Some(renderer) = self.renderer.as_deref_mut() {
            render_world(&self.world, view, renderer);
        }
        self.input.begin_frame();
    }

    /// Draw the world into `renderer` from the active camera.
    pub fn render(&self, renderer: &mut dyn Renderer) {
        render_world(&self.world, self.camera_view(), renderer);
    }

    fn forget_removed(&mut self) {
        for uid in self.world.take_removed() {
            if let Some(physics) = self.physics.as_deref_mut() {
                physics.remove_body(uid);
            }
            if let Some(audio) = self.audio.as_deref_mut() {
                audio.remove(uid);
            }
            if let Some(renderer) = self.renderer.as_deref_mut() {
                renderer.forget(uid);
            }
            if self.active_camera == Some(uid) {
                self.active_camera = None;
            }
        }
    }
}

fn render_world(world: &World, view: Option<CameraView>, renderer: &mut dyn Renderer) {
    renderer.begin_frame(view);
    world.components().render(renderer);
    renderer.end_frame();
}
