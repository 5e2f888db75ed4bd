//! Convenience re-exports — `use skald::prelude::*` for the common items.

pub use crate::actor::{
    Actor, ActorBase, ActorBuilder, ActorContext, Billboard, Enemy, LightActor, MeshActor, Player,
};
pub use crate::animation::{AnimFrame, Animation, AnimationPlayer, Joint, LocalPose, Skeleton};
pub use crate::asset::{Assets, MeshData, MeshImporter};
pub use crate::backend::{
    AudioBackend, BodyKind, CameraView, HeadlessRenderer, PhysicsBackend, Renderer, SilentAudio,
    SimplePhysics,
};
pub use crate::command::{Command, CommandQueue};
pub use crate::component::{
    AudioComponent, BoxTriggerComponent, CameraComponent, Capabilities,
    CharacterControllerComponent, Component, ComponentBase, MeshComponent, PointLightComponent,
    SpatialComponent, SpriteComponent, TickContext, TriggerEvent, WidgetComponent,
};
pub use crate::config::EngineConfig;
pub use crate::context::EngineContext;
pub use crate::error::EngineError;
pub use crate::game_instance::GameInstance;
pub use crate::input::{InputState, KeyCode, MouseButton};
pub use crate::math::{BoundingBox, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::reflect::{MeshRef, Properties, PropertyValue, Reflect, TextureRef, VEnum};
pub use crate::template::ActorTemplate;
pub use crate::time::Time;
pub use crate::uid::Uid;
pub use crate::world::World;
#[cfg(feature = "diagnostics")]
pub use crate::diag::WorldSnapshot;
