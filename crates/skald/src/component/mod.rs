//! # Components
//!
//! A component is a typed unit of data and behaviour owned by exactly one
//! actor. Every concrete type `T` lives in its own [`ComponentSystem<T>`],
//! which is the only owner of `T` values. The world keeps all systems behind
//! the object-safe [`ComponentStore`] trait inside a [`ComponentRegistry`], so
//! generic code (ticking, saving, editing) never names a concrete type.
//!
//! ```text
//! ComponentRegistry
//!   ├── ComponentSystem<SpatialComponent>   Vec<SpatialComponent>
//!   ├── ComponentSystem<MeshComponent>      Vec<MeshComponent>
//!   ├── ComponentSystem<CameraComponent>    ...
//!   └── locations: Uid ──► system index     (then Uid ──► slot inside it)
//! ```
//!
//! Components refer to each other (hierarchy parent/children, owner actor)
//! by [`Uid`] only. A removal compacts the system's `Vec`, so slots move,
//! but UIDs never do.
//!
//! ## Capabilities
//!
//! Instead of downcasting to find out what a component can do, each type
//! reports [`Capabilities`]. The frame loop uses them to decide which
//! components go to the physics backend, the renderer, the audio backend and
//! the animation update.
//!
//! ## Comparison
//!
//! - **Unity**: `MonoBehaviour` with `Start`/`Update`; components are
//!   objects on a GameObject, no per-type storage.
//! - **Unreal**: `UActorComponent` / `USceneComponent`; same split between
//!   plain and spatial components as here.

mod audio;
mod camera;
mod character;
mod light;
mod mesh;
mod registry;
mod spatial;
mod sprite;
mod system;
mod trigger;
mod widget;

pub use audio::AudioComponent;
pub use camera::CameraComponent;
pub use character::CharacterControllerComponent;
pub use light::PointLightComponent;
pub use mesh::MeshComponent;
pub use registry::ComponentRegistry;
pub use spatial::SpatialComponent;
pub use sprite::SpriteComponent;
pub use system::{ComponentStore, ComponentSystem};
pub(crate) use system::pair_mut;
pub use trigger::{BoxTriggerComponent, TriggerEvent};
pub use widget::WidgetComponent;

use crate::asset::Assets;
use crate::backend::{AudioBackend, BodyKind, Renderer};
use crate::command::CommandQueue;
use crate::input::InputState;
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

/// Data every component carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBase {
    pub uid: Uid,
    /// Unique among the owning actor's components.
    pub name: String,
    /// The owning actor.
    pub owner: Uid,
    /// Inactive components are skipped by tick, render and audio.
    pub active: bool,
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self {
            uid: Uid::NONE,
            name: String::new(),
            owner: Uid::NONE,
            active: true,
        }
    }
}

impl Reflect for ComponentBase {
    fn props(&mut self) -> Properties<'_> {
        let mut props = Properties::new("Component");
        props.add("Active", &mut self.active);
        props
    }
}

/// What a component type can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Has a [`SpatialComponent`] and takes part in the transform hierarchy.
    pub spatial: bool,
    /// Submits draws to the [`Renderer`].
    pub renderable: bool,
    /// Owns a physics body.
    pub physical: bool,
    /// Drives an [`AudioBackend`] channel.
    pub audio: bool,
    /// Needs the per-frame animation update.
    pub animatable: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        spatial: false,
        renderable: false,
        physical: false,
        audio: false,
        animatable: false,
    };

    pub const SPATIAL: Self = Self {
        spatial: true,
        ..Self::NONE
    };
}

/// What a component sees during [`Component::tick`].
pub struct TickContext<'a> {
    pub dt: f32,
    pub elapsed: f32,
    pub input: &'a InputState,
    pub commands: &'a mut CommandQueue,
}

/// A component type.
///
/// Only [`base`](Self::base), [`base_mut`](Self::base_mut) and
/// [`Reflect::props`] are required; everything else has a no-op default.
///
/// Lifecycle, in order:
///
/// | hook      | when                                                   |
/// |-----------|--------------------------------------------------------|
/// | `init`    | right after the system stored the value                |
/// | `create`  | after the owning actor is built, and after a `notify`  |
/// |           | property changed; loads assets                         |
/// | `start`   | when gameplay starts                                   |
/// | `tick`    | every frame while active                               |
/// | `destroy` | just before the system drops the value                 |
///
/// `animate`, `render`, `sync_audio` and `body_kind` only run for instances
/// whose [`capabilities`](Self::capabilities) set the matching flag.
pub trait Component: Reflect + Default + 'static {
    /// Name of the component system, used in save files.
    const TYPE_NAME: &'static str;

    fn base(&self) -> &ComponentBase;
    fn base_mut(&mut self) -> &mut ComponentBase;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        None
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        None
    }

    fn init(&mut self) {}

    fn create(&mut self, _assets: &mut Assets) {}

    fn start(&mut self) {}

    fn tick(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Advance animation state after the tick and command flush.
    fn animate(&mut self, _dt: f32) {}

    /// Submit draws. World matrices are fresh when this runs.
    fn render(&self, _renderer: &mut dyn Renderer) {}

    fn sync_audio(&mut self, _audio: &mut dyn AudioBackend) {}

    /// The kind of physics body to create for this component, if any.
    fn body_kind(&self) -> Option<BodyKind> {
        None
    }

    fn destroy(&mut self) {}
}
