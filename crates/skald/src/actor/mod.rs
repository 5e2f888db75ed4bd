//! # Actors
//!
//! An actor is a named, UID-identified game object. It owns a set of
//! components, addressed by name, and one of them is its root: the spatial
//! component that places the actor in the world.
//!
//! ```text
//! Enemy "Enemy2" (uid 41)
//!   ├── root: MeshComponent "Mesh"              (uid 42)
//!   │     └── BoxTriggerComponent "Aggro"       (uid 43, spatial child)
//!   └── WidgetComponent "Health"                (uid 44, not spatial)
//! ```
//!
//! Each concrete actor type lives in its own [`ActorSystem<T>`]; the world
//! reaches all of them through the object-safe [`ActorStore`] trait. Actor
//! structs keep the UIDs of their components, never references, and look
//! them up through the [`ActorContext`] when they tick.
//!
//! Actors have their own parent/child grouping, separate from the spatial
//! hierarchy. Destroying an actor destroys its child actors too.
//!
//! ## Comparison
//!
//! - **Unreal**: `AActor` with a `RootComponent` and `UActorComponent`s;
//!   the same shape, with garbage-collected pointers instead of UIDs.
//! - **Godot**: a single node tree does both grouping and transforms.

mod billboard;
mod enemy;
mod light_actor;
mod mesh_actor;
mod player;
mod registry;
mod system;

pub use billboard::Billboard;
pub use enemy::Enemy;
pub use light_actor::LightActor;
pub use mesh_actor::MeshActor;
pub use player::Player;
pub use registry::ActorRegistry;
pub use system::{ActorStore, ActorSystem};

use crate::command::CommandQueue;
use crate::component::{Component, ComponentRegistry, SpatialComponent};
use crate::error::{EngineError, Result};
use crate::input::InputState;
use crate::math::{Transform, Vec3};
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

/// Data every actor carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorBase {
    pub uid: Uid,
    /// Unique across the world.
    pub name: String,
    pub active: bool,
    root: Uid,
    /// Owned components by name, in creation order.
    components: Vec<(String, Uid)>,
    /// Names created by [`Actor::build`]. These, and only these, are saved.
    built: Vec<String>,
    parent: Option<Uid>,
    children: Vec<Uid>,
}

impl Default for ActorBase {
    fn default() -> Self {
        Self {
            uid: Uid::NONE,
            name: String::new(),
            active: true,
            root: Uid::NONE,
            components: Vec::new(),
            built: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

impl ActorBase {
    /// The root spatial component.
    pub fn root(&self) -> Uid {
        self.root
    }

    pub fn component(&self, name: &str) -> Option<Uid> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, uid)| *uid)
    }

    /// `(name, uid)` pairs in creation order.
    pub fn components(&self) -> &[(String, Uid)] {
        &self.components
    }

    pub fn component_uids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.components.iter().map(|(_, uid)| *uid)
    }

    pub fn parent(&self) -> Option<Uid> {
        self.parent
    }

    pub(crate) fn built(&self) -> &[String] {
        &self.built
    }

    pub fn children(&self) -> &[Uid] {
        &self.children
    }

    /// Record a new component. Fails without touching the map if the name
    /// is taken.
    pub(crate) fn insert_component(&mut self, name: &str, uid: Uid) -> Result<()> {
        if self.component(name).is_some() {
            return Err(EngineError::DuplicateName(format!("{}.{name}", self.name)));
        }
        self.components.push((name.to_owned(), uid));
        Ok(())
    }

    pub(crate) fn forget_component(&mut self, uid: Uid) -> bool {
        let before = self.components.len();
        self.components.retain(|(_, c)| *c != uid);
        self.components.len() != before
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Uid>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: Uid) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: Uid) {
        self.children.retain(|&c| c != child);
    }
}

impl Reflect for ActorBase {
    fn props(&mut self) -> Properties<'_> {
        let mut props = Properties::new("Actor");
        props.add("Name", &mut self.name);
        props.add("UID", &mut self.uid).read_only();
        props.add("Active", &mut self.active);
        props
    }
}

/// An actor type.
///
/// [`build`](Self::build) runs once per spawn and creates the actor's
/// components; it is the only place components can be created with a name
/// that gets saved. The spawn transform is applied to the root afterwards.
pub trait Actor: Reflect + Default + 'static {
    /// Name of the actor system, used in save files and templates.
    const TYPE_NAME: &'static str;

    fn base(&self) -> &ActorBase;
    fn base_mut(&mut self) -> &mut ActorBase;

    /// Create components. The default gives the actor a bare spatial root.
    fn build(&mut self, _builder: &mut ActorBuilder<'_>) -> Result<()> {
        Ok(())
    }

    fn start(&mut self, _ctx: &mut ActorContext<'_>) {}

    fn tick(&mut self, _ctx: &mut ActorContext<'_>) {}
}

/// Creates an actor's components during [`Actor::build`].
///
/// The first spatial component added becomes the root; later spatial
/// components are attached under the root unless attached elsewhere with
/// [`attach`](Self::attach). An actor that adds no spatial component gets a
/// plain [`SpatialComponent`] named `"Root"`.
pub struct ActorBuilder<'w> {
    owner: Uid,
    components: &'w mut ComponentRegistry,
    entries: Vec<(String, Uid)>,
    root: Option<Uid>,
}

impl<'w> ActorBuilder<'w> {
    pub(crate) fn new(owner: Uid, components: &'w mut ComponentRegistry) -> Self {
        Self {
            owner,
            components,
            entries: Vec::new(),
            root: None,
        }
    }

    pub fn owner(&self) -> Uid {
        self.owner
    }

    /// Add a component under a name unique within this actor.
    pub fn add<T: Component>(&mut self, name: &str, value: T) -> Result<Uid> {
        if self.entries.iter().any(|(n, _)| n == name) {
            return Err(EngineError::DuplicateName(name.to_owned()));
        }
        let spatial = value.spatial().is_some();
        let uid = self.components.add(name, self.owner, value, true);
        self.entries.push((name.to_owned(), uid));
        if spatial {
            match self.root {
                None => self.root = Some(uid),
                Some(root) => self.components.add_child(root, uid)?,
            }
        }
        Ok(uid)
    }

    /// Re-parent one of this actor's spatial components under another.
    pub fn attach(&mut self, parent: Uid, child: Uid) -> Result<()> {
        self.components.add_child(parent, child)
    }

    /// Undo every component added so far.
    pub(crate) fn rollback(&mut self) {
        for (_, uid) in self.entries.drain(..).rev() {
            self.components.remove(uid);
        }
        self.root = None;
    }

    /// Add the default root if needed, place it, and hand back the root and
    /// component list. On failure everything built so far is removed.
    pub(crate) fn finish(mut self, transform: Transform) -> Result<(Uid, Vec<(String, Uid)>)> {
        match self.place_root(transform) {
            Ok(root) => Ok((root, self.entries)),
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn place_root(&mut self, transform: Transform) -> Result<Uid> {
        let root = match self.root {
            Some(root) => root,
            None => self.add("Root", SpatialComponent::default())?,
        };
        self.components.set_scale(root, transform.scale)?;
        self.components.set_rotation(root, transform.rotation)?;
        self.components.set_position(root, transform.position)?;
        Ok(root)
    }
}

/// What an actor sees while it ticks: frame timing, input, the deferred
/// command queue and every component (its own and others').
pub struct ActorContext<'a> {
    pub dt: f32,
    pub elapsed: f32,
    pub input: &'a InputState,
    pub commands: &'a mut CommandQueue,
    pub components: &'a mut ComponentRegistry,
    /// World position of the active camera, if there is one.
    pub camera: Option<Vec3>,
}

impl ActorContext<'_> {
    pub fn component<T: Component>(&self, uid: Uid) -> Option<&T> {
        self.components.get(uid)
    }

    pub fn component_mut<T: Component>(&mut self, uid: Uid) -> Option<&mut T> {
        self.components.get_mut(uid)
    }

    pub fn world_position(&self, uid: Uid) -> Option<Vec3> {
        self.components.world_position(uid).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::WidgetComponent;
    use crate::world::World;

    /// Builds only a non-spatial component named like the default root.
    #[derive(Default)]
    struct Signpost {
        base: ActorBase,
    }

    impl Reflect for Signpost {
        fn props(&mut self) -> Properties<'_> {
            self.base.props()
        }
    }

    impl Actor for Signpost {
        const TYPE_NAME: &'static str = "Signpost";

        fn base(&self) -> &ActorBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ActorBase {
            &mut self.base
        }

        fn build(&mut self, builder: &mut ActorBuilder<'_>) -> Result<()> {
            builder.add("Root", WidgetComponent::default())?;
            Ok(())
        }
    }

    #[test]
    fn failed_root_placement_rolls_back_components() {
        let mut world = World::new();
        let err = world.spawn_actor::<Signpost>(Some("Sign"), Transform::IDENTITY);
        assert!(matches!(err, Err(EngineError::DuplicateName(_))));
        assert!(world.components().is_empty());
        assert!(world.actors().is_empty());
        assert!(world.find_actor("Sign").is_none());
    }
}
