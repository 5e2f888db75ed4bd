//! # Backend Interfaces
//!
//! The engine core never talks to a GPU, physics SDK or audio device
//! directly. It hands per-frame data to three traits, and every cache a
//! backend keeps is keyed by component [`Uid`], never by a pointer or a
//! storage index:
//!
//! ```text
//!  World (after tick + propagate)
//!    │
//!    ├──► Renderer        draw_mesh / draw_sprite / draw_light / draw_widget
//!    ├──► PhysicsBackend  add_body, step, body_pose ──► transform write-back
//!    └──► AudioBackend    play / stop / set_volume
//!
//!  World::take_removed() ──► forget(uid) / remove_body(uid) / remove(uid)
//! ```
//!
//! Components move around inside their system's storage when others are
//! removed; a UID survives that, so backend caches stay valid.

use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::SkinningBuffer;
use crate::asset::MeshData;
use crate::math::{BoundingBox, Mat4, Quat, Vec2, Vec3, Vec4};
use crate::reflect::TextureRef;
use crate::uid::Uid;

// ── Rendering ────────────────────────────────────────────────────────

/// The camera a frame is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

/// One mesh draw, borrowed from its component for the duration of the call.
pub struct MeshDraw<'a> {
    pub uid: Uid,
    pub world: Mat4,
    pub mesh: &'a Arc<MeshData>,
    pub texture: &'a TextureRef,
    pub casts_shadow: bool,
    /// `None` for static meshes.
    pub skinning: Option<&'a SkinningBuffer>,
}

/// One textured quad cut from a sprite sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub uid: Uid,
    pub world: Mat4,
    pub texture: TextureRef,
    /// Sub-rectangle of the sheet in UV space: `(u, v, width, height)`.
    pub uv_rect: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDraw {
    pub uid: Uid,
    pub position: Vec3,
    pub color: Vec4,
    pub intensity: f32,
    pub range: f32,
}

/// Screen-space text, e.g. a health bar label.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDraw {
    pub uid: Uid,
    pub text: String,
    pub position: Vec2,
    pub size: Vec2,
}

/// Consumes the frame's draw list.
pub trait Renderer {
    fn begin_frame(&mut self, camera: Option<CameraView>);
    fn draw_mesh(&mut self, draw: MeshDraw<'_>);
    fn draw_sprite(&mut self, draw: SpriteDraw);
    fn draw_light(&mut self, light: LightDraw);
    fn draw_widget(&mut self, widget: WidgetDraw);
    fn end_frame(&mut self);
    /// Drop anything cached for a removed component.
    fn forget(&mut self, _uid: Uid) {}
}

/// A renderer that only counts what it was asked to draw. Used by headless
/// runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub meshes: usize,
    pub skinned_meshes: usize,
    pub sprites: usize,
    pub lights: usize,
    pub widgets: Vec<String>,
    pub camera: Option<CameraView>,
}

impl Renderer for HeadlessRenderer {
    fn begin_frame(&mut self, camera: Option<CameraView>) {
        self.camera = camera;
        self.meshes = 0;
        self.skinned_meshes = 0;
        self.sprites = 0;
        self.lights = 0;
        self.widgets.clear();
    }

    fn draw_mesh(&mut self, draw: MeshDraw<'_>) {
        self.meshes += 1;
        if draw.skinning.is_some() {
            self.skinned_meshes += 1;
        }
    }

    fn draw_sprite(&mut self, _draw: SpriteDraw) {
        self.sprites += 1;
    }

    fn draw_light(&mut self, _light: LightDraw) {
        self.lights += 1;
    }

    fn draw_widget(&mut self, widget: WidgetDraw) {
        self.widgets.push(widget.text);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        log::debug!(
            "frame {}: {} meshes ({} skinned), {} sprites, {} lights",
            self.frames,
            self.meshes,
            self.skinned_meshes,
            self.sprites,
            self.lights
        );
    }
}

// ── Physics ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves; the engine never reads its pose back.
    Static,
    /// Simulated; the engine copies its pose into the transform every frame.
    Dynamic,
    /// Moved by gameplay code (character controllers).
    Kinematic,
}

/// A rigid-body simulation keyed by component UID.
pub trait PhysicsBackend {
    fn add_body(&mut self, uid: Uid, world: Mat4, bounds: BoundingBox, kind: BodyKind);
    fn has_body(&self, uid: Uid) -> bool;
    fn step(&mut self, dt: f32);
    /// World-space position and rotation after the last step.
    fn body_pose(&self, uid: Uid) -> Option<(Vec3, Quat)>;
    /// Push a kinematic target, e.g. after a character controller moved.
    fn set_body_pose(&mut self, uid: Uid, position: Vec3, rotation: Quat);
    fn remove_body(&mut self, uid: Uid);
}

/// Integrates dynamic bodies under constant gravity, nothing else. Enough to
/// drive the write-back path without a physics engine.
#[derive(Debug)]
pub struct SimplePhysics {
    pub gravity: Vec3,
    bodies: HashMap<Uid, SimpleBody>,
}

#[derive(Debug, Clone, Copy)]
struct SimpleBody {
    kind: BodyKind,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
}

impl Default for SimplePhysics {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            bodies: HashMap::new(),
        }
    }
}

impl SimplePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsBackend for SimplePhysics {
    fn add_body(&mut self, uid: Uid, world: Mat4, _bounds: BoundingBox, kind: BodyKind) {
        let (_, rotation, position) = world.to_scale_rotation_translation();
        self.bodies.insert(
            uid,
            SimpleBody {
                kind,
                position,
                rotation,
                velocity: Vec3::ZERO,
            },
        );
    }

    fn has_body(&self, uid: Uid) -> bool {
        self.bodies.contains_key(&uid)
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.kind == BodyKind::Dynamic {
                body.velocity += self.gravity * dt;
                body.position += body.velocity * dt;
            }
        }
    }

    fn body_pose(&self, uid: Uid) -> Option<(Vec3, Quat)> {
        self.bodies.get(&uid).map(|b| (b.position, b.rotation))
    }

    fn set_body_pose(&mut self, uid: Uid, position: Vec3, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&uid) {
            body.position = position;
            body.rotation = rotation;
        }
    }

    fn remove_body(&mut self, uid: Uid) {
        self.bodies.remove(&uid);
    }
}

// ── Audio ────────────────────────────────────────────────────────────

/// Sound playback keyed by component UID.
pub trait AudioBackend {
    fn play(&mut self, uid: Uid, file: &str, volume: f32, looping: bool);
    fn stop(&mut self, uid: Uid);
    fn set_volume(&mut self, uid: Uid, volume: f32);
    fn is_playing(&self, uid: Uid) -> bool;
    /// Release the channel of a removed component.
    fn remove(&mut self, uid: Uid) {
        self.stop(uid);
    }
}

/// Tracks which channels would be playing. No sound is produced.
#[derive(Debug, Default)]
pub struct SilentAudio {
    channels: HashMap<Uid, (String, f32)>,
}

impl SilentAudio {
    pub fn volume(&self, uid: Uid) -> Option<f32> {
        self.channels.get(&uid).map(|(_, v)| *v)
    }
}

impl AudioBackend for SilentAudio {
    fn play(&mut self, uid: Uid, file: &str, volume: f32, _looping: bool) {
        log::debug!("audio {uid}: play \"{file}\" at {volume}");
        self.channels.insert(uid, (file.to_owned(), volume));
    }

    fn stop(&mut self, uid: Uid) {
        self.channels.remove(&uid);
    }

    fn set_volume(&mut self, uid: Uid, volume: f32) {
        if let Some((_, v)) = self.channels.get_mut(&uid) {
            *v = volume;
        }
    }

    fn is_playing(&self, uid: Uid) -> bool {
        self.channels.contains_key(&uid)
    }
}
