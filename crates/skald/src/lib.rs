//! # Skald — Actor/Component Engine Core
//!
//! The entity framework of a 3D game engine: actors made of typed
//! components, a parent/child transform hierarchy, reflective properties
//! for editing and saving, and skinned skeletal animation. Rendering,
//! physics and audio sit behind traits in [`backend`].
//!
//! Start with `use skald::prelude::*`, create an
//! [`EngineContext`](context::EngineContext) and spawn actors into its
//! [`World`](world::World).

pub mod actor;
pub mod animation;
pub mod asset;
pub mod backend;
pub mod command;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod game_instance;
pub mod input;
pub mod math;
pub mod prelude;
pub mod reflect;
pub mod serialize;
pub mod template;
pub mod time;
pub mod uid;
pub mod world;

#[cfg(feature = "gltf")]
pub mod gltf_import;

#[cfg(feature = "diagnostics")]
pub mod diag;
