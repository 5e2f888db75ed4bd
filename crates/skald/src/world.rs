//! # World
//!
//! The [`World`] aggregates every actor system and component system and is
//! the only place actors are spawned and destroyed.
//!
//! ```text
//! World
//!   ├── ActorRegistry      MeshActor, Player, Enemy, Billboard, ...
//!   ├── ComponentRegistry  SpatialComponent, MeshComponent, ...
//!   ├── Assets             mesh cache, texture fallback
//!   └── CommandQueue       filled during tick, applied after it
//! ```
//!
//! ## Tick order
//!
//! Actor systems tick first, then component systems, each in registration
//! order with instances in storage order. Nothing is erased while a system
//! is being iterated: [`destroy_actor`](World::destroy_actor) and
//! [`remove_component`](World::remove_component) only queue the removal,
//! and [`flush_removals`](World::flush_removals) applies the queue between
//! frames. The UIDs that went away are collected for
//! [`take_removed`](World::take_removed) so UID-keyed backend caches can
//! drop them.
//!
//! ## Save format
//!
//! ```text
//! Enemy            <- actor system
//! 2                <- live actors in it
//! Name             <- actor block
//! Grunt
//! UID
//! 17
//! ...
//! next
//! Active           <- one block per component built by the actor
//! true
//! ...
//! next
//! ```
//!
//! Only the components an actor creates in [`Actor::build`] are written. A
//! built component removed since spawning is written as an empty block and
//! removed again on load.

use std::path::Path;

use crate::actor::{
    Actor, ActorBase, ActorBuilder, ActorContext, ActorRegistry, Billboard, Enemy, LightActor,
    MeshActor, Player,
};
use crate::asset::Assets;
use crate::command::{Command, CommandQueue};
use crate::component::{
    AudioComponent, BoxTriggerComponent, CameraComponent, CharacterControllerComponent,
    Component, ComponentRegistry, MeshComponent, PointLightComponent, SpatialComponent,
    SpriteComponent, TickContext, WidgetComponent,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::input::InputState;
use crate::math::{Mat4, Quat, Transform, Vec3};
use crate::reflect::{MeshRef, PropertyKind, PropertySnapshot, PropertyValue, Reflect};
use crate::serialize::text::{self, RawField, TextReader, NEXT};
use crate::template::{ActorTemplate, ComponentTemplate};
use crate::uid::Uid;

const NAME: &str = "Name";
const UID: &str = "UID";

const DEFAULT_FLOOR: &str = "Floor";
const DEFAULT_FLOOR_SCALE: f32 = 20.0;
const DEFAULT_LIGHT: &str = "Light";
const DEFAULT_PLAYER: &str = "Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Actor(Uid),
    Component(Uid),
}

/// Every actor and component in play.
pub struct World {
    actors: ActorRegistry,
    components: ComponentRegistry,
    assets: Assets,
    commands: CommandQueue,
    pending: Vec<Removal>,
    removed: Vec<Uid>,
    /// Per-system tick time in milliseconds for the last tick.
    timings: Vec<(&'static str, f32)>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// A world with the built-in systems registered and default config.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let mut world = Self {
            actors: ActorRegistry::new(),
            components: ComponentRegistry::new(),
            assets: Assets::new(config),
            commands: CommandQueue::new(),
            pending: Vec::new(),
            removed: Vec::new(),
            timings: Vec::new(),
        };
        world.register_builtins();
        world
    }

    fn register_builtins(&mut self) {
        self.register_component::<SpatialComponent>();
        self.register_component::<MeshComponent>();
        self.register_component::<CameraComponent>();
        self.register_component::<PointLightComponent>();
        self.register_component::<BoxTriggerComponent>();
        self.register_component::<AudioComponent>();
        self.register_component::<CharacterControllerComponent>();
        self.register_component::<SpriteComponent>();
        self.register_component::<WidgetComponent>();

        self.register_actor::<MeshActor>();
        self.register_actor::<Player>();
        self.register_actor::<Enemy>();
        self.register_actor::<Billboard>();
        self.register_actor::<LightActor>();
    }

    // ── Registration and access ──────────────────────────────────────

    pub fn register_component<T: Component>(&mut self) {
        self.components.register::<T>();
    }

    pub fn register_actor<T: Actor>(&mut self) {
        self.actors.register::<T>();
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }

    /// Commands queued during the last tick and not yet applied.
    pub fn commands_mut(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    pub fn actor<T: Actor>(&self, uid: Uid) -> Option<&T> {
        self.actors.get(uid)
    }

    pub fn actor_mut<T: Actor>(&mut self, uid: Uid) -> Option<&mut T> {
        self.actors.get_mut(uid)
    }

    pub fn component<T: Component>(&self, uid: Uid) -> Option<&T> {
        self.components.get(uid)
    }

    pub fn component_mut<T: Component>(&mut self, uid: Uid) -> Option<&mut T> {
        self.components.get_mut(uid)
    }

    pub fn find_actor(&self, name: &str) -> Option<Uid> {
        self.actors.find_by_name(name)
    }

    fn require_actor(&self, uid: Uid) -> Result<&ActorBase> {
        self.actors
            .base(uid)
            .ok_or_else(|| EngineError::ActorNotFound(uid.to_string()))
    }

    // ── Spawning ─────────────────────────────────────────────────────

    /// Spawn a `T` with its root at `transform`.
    ///
    /// `None` picks a free name of the form `"{TYPE_NAME}{n}"`. A name that
    /// is already taken fails with [`EngineError::DuplicateName`] and leaves
    /// the world unchanged.
    pub fn spawn_actor<T: Actor>(&mut self, name: Option<&str>, transform: Transform) -> Result<Uid> {
        self.register_actor::<T>();
        let index = self.actors.system_index_by_name(T::TYPE_NAME)?;
        self.spawn_at(index, name, Uid::new(), transform)
    }

    /// Spawn through the actor system registered as `system`.
    pub fn spawn_actor_by_name(
        &mut self,
        system: &str,
        name: Option<&str>,
        transform: Transform,
    ) -> Result<Uid> {
        let index = self.actors.system_index_by_name(system)?;
        self.spawn_at(index, name, Uid::new(), transform)
    }

    fn spawn_at(
        &mut self,
        index: usize,
        name: Option<&str>,
        uid: Uid,
        transform: Transform,
    ) -> Result<Uid> {
        let system = self.actors.system_at_mut(index);
        let type_name = system.name();
        let count = system.count();
        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) if self.actors.is_name_taken(name) => {
                log::warn!("Cannot spawn {type_name}: name \"{name}\" is taken");
                return Err(EngineError::DuplicateName(name.to_owned()));
            }
            Some(name) => name.to_owned(),
            None => self.free_name(type_name, count + 1),
        };

        let builder = ActorBuilder::new(uid, &mut self.components);
        self.actors
            .system_at_mut(index)
            .spawn(&name, uid, transform, builder)?;
        self.actors.track(uid, &name, index);
        self.create_components(uid);
        log::info!("Spawned {type_name} \"{name}\" ({uid})");
        Ok(uid)
    }

    fn free_name(&self, type_name: &str, mut n: usize) -> String {
        loop {
            let name = format!("{type_name}{n}");
            if !self.actors.is_name_taken(&name) {
                return name;
            }
            n += 1;
        }
    }

    fn create_components(&mut self, actor: Uid) {
        let uids: Vec<Uid> = self
            .actors
            .base(actor)
            .map(|b| b.component_uids().collect())
            .unwrap_or_default();
        for uid in uids {
            self.components.create(uid, &mut self.assets);
        }
    }

    /// Add a component to an existing actor. Spatial components are attached
    /// under the actor's root.
    ///
    /// Components added this way are not part of the actor's saved shape.
    pub fn add_component<T: Component>(&mut self, actor: Uid, name: &str, value: T) -> Result<Uid> {
        let base = self.require_actor(actor)?;
        if base.component(name).is_some() {
            return Err(EngineError::DuplicateName(format!("{}.{name}", base.name)));
        }
        let uid = self.components.add(name, actor, value, true);
        self.adopt_component(actor, name, uid)
    }

    /// Add a default instance of the component system registered as `system`.
    pub fn add_component_by_name(&mut self, actor: Uid, system: &str, name: &str) -> Result<Uid> {
        let base = self.require_actor(actor)?;
        if base.component(name).is_some() {
            return Err(EngineError::DuplicateName(format!("{}.{name}", base.name)));
        }
        let uid = self.components.add_by_name(system, name, actor, Uid::new())?;
        self.adopt_component(actor, name, uid)
    }

    fn adopt_component(&mut self, actor: Uid, name: &str, uid: Uid) -> Result<Uid> {
        let root = self.require_actor(actor)?.root();
        if self.components.spatial(uid).is_some() {
            if let Err(e) = self.components.add_child(root, uid) {
                self.components.remove(uid);
                return Err(e);
            }
        }
        if let Some(base) = self.actors.base_mut(actor) {
            base.insert_component(name, uid)?;
        }
        self.components.create(uid, &mut self.assets);
        Ok(uid)
    }

    /// Spawn the actors a new map starts with: a floor, a light overhead
    /// and the player. Names already in use are skipped, so calling this on
    /// a populated world only fills in what is missing. Returns the spawned
    /// actors.
    pub fn populate_default(&mut self) -> Result<Vec<Uid>> {
        let mut spawned = Vec::new();
        if !self.actors.is_name_taken(DEFAULT_FLOOR) {
            let floor = self.spawn_actor::<MeshActor>(
                Some(DEFAULT_FLOOR),
                Transform::IDENTITY.with_scale(DEFAULT_FLOOR_SCALE),
            )?;
            let mesh = self.require_actor(floor)?.root();
            self.set_component_property(mesh, "Mesh", PropertyValue::Mesh(MeshRef::new("plane")))?;
            spawned.push(floor);
        }
        if !self.actors.is_name_taken(DEFAULT_LIGHT) {
            spawned.push(self.spawn_actor::<LightActor>(
                Some(DEFAULT_LIGHT),
                Transform::from_xyz(0.0, 10.0, 0.0),
            )?);
        }
        if !self.actors.is_name_taken(DEFAULT_PLAYER) {
            spawned.push(self.spawn_actor::<Player>(Some(DEFAULT_PLAYER), Transform::IDENTITY)?);
        }
        log::info!("Default population added {} actors", spawned.len());
        Ok(spawned)
    }

    // ── Removal ──────────────────────────────────────────────────────

    /// Queue `actor`, its components and its child actors for removal.
    pub fn destroy_actor(&mut self, actor: Uid) -> Result<()> {
        self.require_actor(actor)?;
        self.queue_removal(Removal::Actor(actor));
        Ok(())
    }

    /// Queue one component for removal. An actor's root can only go with the
    /// actor ([`EngineError::RootRemoval`]).
    pub fn remove_component(&mut self, component: Uid) -> Result<()> {
        let owner = self
            .components
            .base(component)
            .map(|b| b.owner)
            .ok_or_else(|| EngineError::ComponentNotFound(component.to_string()))?;
        if self.actors.base(owner).is_some_and(|b| b.root() == component) {
            return Err(EngineError::RootRemoval(component));
        }
        self.queue_removal(Removal::Component(component));
        Ok(())
    }

    fn queue_removal(&mut self, removal: Removal) {
        if !self.pending.contains(&removal) {
            self.pending.push(removal);
        }
    }

    pub fn is_pending_removal(&self, uid: Uid) -> bool {
        self.pending
            .iter()
            .any(|r| matches!(r, Removal::Actor(u) | Removal::Component(u) if *u == uid))
    }

    /// Apply every queued removal.
    pub fn flush_removals(&mut self) {
        for removal in std::mem::take(&mut self.pending) {
            match removal {
                Removal::Actor(uid) => self.remove_actor_now(uid),
                Removal::Component(uid) => self.remove_component_now(uid),
            }
        }
    }

    /// UIDs removed since the last call, actors and components alike.
    pub fn take_removed(&mut self) -> Vec<Uid> {
        std::mem::take(&mut self.removed)
    }

    fn remove_actor_now(&mut self, uid: Uid) {
        let Some(base) = self.actors.base(uid) else {
            return;
        };
        let children = base.children().to_vec();
        let parent = base.parent();
        for child in children {
            self.remove_actor_now(child);
        }
        if let Some(parent) = parent.and_then(|p| self.actors.base_mut(p)) {
            parent.remove_child(uid);
        }
        let Some(base) = self.actors.remove(uid) else {
            return;
        };
        for (_, component) in base.components().iter().rev() {
            if self.components.remove(*component) {
                self.removed.push(*component);
            }
        }
        self.removed.push(uid);
        log::info!("Destroyed actor \"{}\" ({uid})", base.name);
    }

    fn remove_component_now(&mut self, uid: Uid) {
        let Some(owner) = self.components.base(uid).map(|b| b.owner) else {
            return;
        };
        if self.components.remove(uid) {
            self.removed.push(uid);
            if let Some(base) = self.actors.base_mut(owner) {
                base.forget_component(uid);
            }
        }
    }

    /// Remove everything. Registered systems stay.
    pub fn clear(&mut self) {
        let actors = self.actors.clear();
        self.removed.extend(actors.iter().map(|b| b.uid));
        self.removed.extend(self.components.clear());
        self.pending.clear();
        self.commands.drain();
        log::info!("World cleared");
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Call `start` on every actor, then every component.
    pub fn start(&mut self, input: &InputState) {
        let mut ctx = ActorContext {
            dt: 0.0,
            elapsed: 0.0,
            input,
            commands: &mut self.commands,
            components: &mut self.components,
            camera: None,
        };
        self.actors.start(&mut ctx);
        self.components.start();
        log::info!(
            "World started with {} actors and {} components",
            self.actors.len(),
            self.components.len()
        );
    }

    /// Tick actor systems, then component systems. `camera` is the active
    /// camera's world position, if any.
    pub fn tick(&mut self, dt: f32, elapsed: f32, input: &InputState, camera: Option<Vec3>) {
        self.timings.clear();
        let mut ctx = ActorContext {
            dt,
            elapsed,
            input,
            commands: &mut self.commands,
            components: &mut self.components,
            camera,
        };
        self.actors.tick(&mut ctx, &mut self.timings);

        let mut ctx = TickContext {
            dt,
            elapsed,
            input,
            commands: &mut self.commands,
        };
        #[cfg(feature = "diagnostics")]
        self.components.tick_timed(&mut ctx, &mut self.timings);
        #[cfg(not(feature = "diagnostics"))]
        self.components.tick(&mut ctx);
    }

    /// Apply the commands queued during tick. Returns the notifications.
    pub fn apply_commands(&mut self) -> Vec<String> {
        let commands: Vec<Command> = self.commands.drain().collect();
        let mut notifications = Vec::new();
        for command in commands {
            let result = match command {
                Command::SpawnActor {
                    system,
                    name,
                    transform,
                } => self
                    .spawn_actor_by_name(&system, name.as_deref(), transform)
                    .map(drop),
                Command::DestroyActor(actor) => self.destroy_actor(actor),
                Command::RemoveComponent(component) => match self.remove_component(component) {
                    // A root asking to go takes its actor with it.
                    Err(EngineError::RootRemoval(_)) => {
                        match self.components.base(component).map(|b| b.owner) {
                            Some(owner) => self.destroy_actor(owner),
                            None => Ok(()),
                        }
                    }
                    other => other,
                },
                Command::SetWorldPosition {
                    component,
                    position,
                } => self.components.set_world_position(component, position),
                Command::Notify(message) => {
                    notifications.push(message);
                    Ok(())
                }
            };
            if let Err(e) = result {
                log::warn!("Dropped command: {e}");
            }
        }
        notifications
    }

    pub fn animate(&mut self, dt: f32) {
        self.components.animate(dt);
    }

    /// Per-system tick times in milliseconds from the last tick.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[(&'static str, f32)] {
        &self.timings
    }

    // ── Transforms ───────────────────────────────────────────────────

    pub fn propagate_transforms(&mut self) {
        self.components.propagate_transforms();
    }

    pub fn world_matrix(&self, component: Uid) -> Result<Mat4> {
        self.components.world_matrix(component)
    }

    pub fn set_world_position(&mut self, component: Uid, position: Vec3) -> Result<()> {
        self.components.set_world_position(component, position)
    }

    pub fn set_world_rotation(&mut self, component: Uid, rotation: Quat) -> Result<()> {
        self.components.set_world_rotation(component, rotation)
    }

    pub fn set_world_scale(&mut self, component: Uid, scale: Vec3) -> Result<()> {
        self.components.set_world_scale(component, scale)
    }

    pub fn add_child(&mut self, parent: Uid, child: Uid) -> Result<()> {
        self.components.add_child(parent, child)
    }

    pub fn remove_child(&mut self, parent: Uid, child: Uid) -> Result<bool> {
        self.components.remove_child(parent, child)
    }

    // ── Actor grouping ───────────────────────────────────────────────

    /// Group `child` under `parent`. Destroying the parent destroys the
    /// child. Transforms are not affected.
    pub fn attach_actor(&mut self, parent: Uid, child: Uid) -> Result<()> {
        self.require_actor(child)?;
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                return Err(EngineError::HierarchyCycle { parent, child });
            }
            cursor = self.require_actor(c)?.parent();
        }
        if let Some(old) = self.require_actor(child)?.parent() {
            if old == parent {
                return Ok(());
            }
            if let Some(old) = self.actors.base_mut(old) {
                old.remove_child(child);
            }
        }
        if let Some(p) = self.actors.base_mut(parent) {
            p.add_child(child);
        }
        if let Some(c) = self.actors.base_mut(child) {
            c.set_parent(Some(parent));
        }
        Ok(())
    }

    /// Ungroup `child`. Returns `false` if it had no parent.
    pub fn detach_actor(&mut self, child: Uid) -> Result<bool> {
        let Some(parent) = self.require_actor(child)?.parent() else {
            return Ok(false);
        };
        if let Some(p) = self.actors.base_mut(parent) {
            p.remove_child(child);
        }
        if let Some(c) = self.actors.base_mut(child) {
            c.set_parent(None);
        }
        Ok(true)
    }

    // ── Properties ───────────────────────────────────────────────────

    pub fn component_property(&mut self, component: Uid, name: &str) -> Result<PropertyValue> {
        self.components
            .reflect_mut(component)
            .ok_or_else(|| EngineError::ComponentNotFound(component.to_string()))?
            .props()
            .value(name)
    }

    /// Write one component property the way an editor does: run the change
    /// hook for `notify` properties, then re-create the component so it
    /// picks up new asset references.
    pub fn set_component_property(
        &mut self,
        component: Uid,
        name: &str,
        value: PropertyValue,
    ) -> Result<()> {
        let notify = self
            .components
            .reflect_mut(component)
            .ok_or_else(|| EngineError::ComponentNotFound(component.to_string()))?
            .set_property(name, value)?;
        if notify {
            self.components.create(component, &mut self.assets);
        }
        if self.components.spatial(component).is_some() {
            self.components.refresh_subtree(component)?;
        }
        Ok(())
    }

    pub fn actor_property(&mut self, actor: Uid, name: &str) -> Result<PropertyValue> {
        self.actors
            .reflect_mut(actor)
            .ok_or_else(|| EngineError::ActorNotFound(actor.to_string()))?
            .props()
            .value(name)
    }

    /// Write one actor property. Renaming keeps names unique; the UID is
    /// read-only.
    pub fn set_actor_property(&mut self, actor: Uid, name: &str, value: PropertyValue) -> Result<()> {
        let old_name = self.require_actor(actor)?.name.clone();
        let new_name = match (name, &value) {
            (NAME, PropertyValue::String(new)) => Some(new.clone()),
            (NAME, other) => {
                return Err(EngineError::TypeMismatch {
                    name: NAME.to_owned(),
                    expected: PropertyKind::String,
                    actual: other.kind(),
                });
            }
            _ => None,
        };
        if let Some(new) = &new_name {
            if *new == old_name {
                return Ok(());
            }
            if self.actors.is_name_taken(new) {
                return Err(EngineError::DuplicateName(new.clone()));
            }
        }
        if let Some(reflect) = self.actors.reflect_mut(actor) {
            reflect.set_property(name, value)?;
        }
        if let Some(new) = new_name {
            self.actors.rename(&old_name, &new);
            log::info!("Renamed actor \"{old_name}\" to \"{new}\"");
        }
        Ok(())
    }

    // ── Duplication and templates ────────────────────────────────────

    /// Snapshot `actor` and its components.
    pub fn capture_template(&mut self, actor: Uid) -> Result<ActorTemplate> {
        let base = self.require_actor(actor)?.clone();
        let system = self.actors.type_name(actor).unwrap_or_default().to_owned();
        let properties = self
            .actors
            .reflect_mut(actor)
            .map(|r| r.props().snapshot())
            .unwrap_or_default();

        let mut components = Vec::new();
        for (name, uid) in base.components() {
            let Some(system) = self.components.type_name(*uid) else {
                continue;
            };
            if let Some(reflect) = self.components.reflect_mut(*uid) {
                components.push(ComponentTemplate {
                    name: name.clone(),
                    system: system.to_owned(),
                    properties: reflect.props().snapshot(),
                });
            }
        }
        Ok(ActorTemplate {
            system,
            actor: without_identity(&properties),
            components,
        })
    }

    /// Spawn a new actor from `template`. Components the actor type does not
    /// build are added by system name.
    pub fn spawn_from_template(&mut self, template: &ActorTemplate, name: Option<&str>) -> Result<Uid> {
        let index = self.actors.system_index_by_name(&template.system)?;
        let uid = self.spawn_at(index, name, Uid::new(), Transform::IDENTITY)?;
        if let Err(e) = self.apply_template(uid, template) {
            self.remove_actor_now(uid);
            return Err(e);
        }
        Ok(uid)
    }

    fn apply_template(&mut self, actor: Uid, template: &ActorTemplate) -> Result<()> {
        if let Some(reflect) = self.actors.reflect_mut(actor) {
            reflect.props().apply_snapshot(&without_identity(&template.actor))?;
        }
        for component in &template.components {
            let existing = self.require_actor(actor)?.component(&component.name);
            let uid = match existing {
                Some(uid) => uid,
                None => self.add_component_by_name(actor, &component.system, &component.name)?,
            };
            if let Some(reflect) = self.components.reflect_mut(uid) {
                reflect.props().apply_snapshot(&component.properties)?;
            }
        }
        self.recreate(actor)
    }

    /// Re-run `create` on every component and refresh cached world matrices
    /// after properties were written in bulk.
    fn recreate(&mut self, actor: Uid) -> Result<()> {
        self.create_components(actor);
        let root = self.require_actor(actor)?.root();
        self.components.refresh_subtree(root)
    }

    /// Spawn a copy of `actor` with a fresh name and UID. Every other
    /// property value of the actor and its components is copied.
    pub fn duplicate_actor(&mut self, actor: Uid) -> Result<Uid> {
        let source = self.require_actor(actor)?.components().to_vec();
        let type_name = self.actors.type_name(actor).unwrap_or_default();
        let system = self.actors.system_index_by_name(type_name)?;
        let copy = self.spawn_at(system, None, Uid::new(), Transform::IDENTITY)?;
        if let Err(e) = self.copy_actor(actor, copy, &source) {
            self.remove_actor_now(copy);
            return Err(e);
        }
        log::info!("Duplicated actor {actor} as {copy}");
        Ok(copy)
    }

    fn copy_actor(&mut self, src: Uid, dst: Uid, components: &[(String, Uid)]) -> Result<()> {
        let name = self.require_actor(dst)?.name.clone();
        self.actors.copy_properties(src, dst)?;
        if let Some(base) = self.actors.base_mut(dst) {
            base.name = name;
            base.uid = dst;
        }
        for (name, from) in components {
            let Some(system) = self.components.type_name(*from) else {
                continue;
            };
            let to = match self.require_actor(dst)?.component(name) {
                Some(uid) => uid,
                None => self.add_component_by_name(dst, system, name)?,
            };
            self.components.copy_properties(*from, to)?;
        }
        self.recreate(dst)
    }

    // ── Save / load ──────────────────────────────────────────────────

    /// Serialise every actor to the text save format.
    pub fn save_text(&mut self) -> String {
        let systems: Vec<(&'static str, Vec<Uid>)> = self
            .actors
            .systems()
            .filter(|s| s.count() > 0)
            .map(|s| (s.name(), s.uids()))
            .collect();

        let mut out = String::new();
        for (system, uids) in systems {
            out.push_str(system);
            out.push('\n');
            out.push_str(&uids.len().to_string());
            out.push('\n');
            for uid in uids {
                self.write_actor(uid, &mut out);
            }
        }
        out
    }

    fn write_actor(&mut self, actor: Uid, out: &mut String) {
        let Some(base) = self.actors.base(actor).cloned() else {
            return;
        };
        if let Some(reflect) = self.actors.reflect_mut(actor) {
            text::write_block(&reflect.props(), out);
        }
        for name in base.built() {
            match base.component(name).and_then(|c| self.components.reflect_mut(c)) {
                Some(reflect) => text::write_block(&reflect.props(), out),
                None => {
                    out.push_str(NEXT);
                    out.push('\n');
                }
            }
        }
    }

    /// Replace the world's contents with a text save. Names and UIDs are
    /// kept from the file.
    pub fn load_text(&mut self, input: &str) -> Result<()> {
        self.clear();
        let mut reader = TextReader::new(input);
        while let Some(line) = reader.next_line() {
            let system = line.trim();
            if system.is_empty() {
                continue;
            }
            let index = self.actors.system_index_by_name(system)?;
            let count: usize = text::parse_number(reader.expect_line()?, reader.line())?;
            for _ in 0..count {
                self.read_actor(index, &mut reader)?;
            }
        }
        self.components.propagate_transforms();
        log::info!("Loaded world with {} actors", self.actors.len());
        Ok(())
    }

    fn read_actor(&mut self, index: usize, reader: &mut TextReader<'_>) -> Result<Uid> {
        let fields = reader.read_raw_block()?;
        let saved = match text::raw_field(&fields, UID) {
            Some(field) => field.parse_uid()?,
            None => Uid::NONE,
        };
        let uid = if saved.is_none() || self.actors.contains(saved) || self.components.contains(saved) {
            if !saved.is_none() {
                log::warn!("Saved actor UID {saved} is already in use, assigning a new one");
            }
            Uid::new()
        } else {
            saved
        };
        let name = text::raw_field(&fields, NAME).map(|f| text::unescape(&f.value));
        let uid = self.spawn_at(index, name.as_deref(), uid, Transform::IDENTITY)?;

        let rest: Vec<RawField> = fields
            .into_iter()
            .filter(|f| f.name != NAME && f.name != UID)
            .collect();
        if let Some(reflect) = self.actors.reflect_mut(uid) {
            text::apply_raw(&mut reflect.props(), &rest)?;
        }

        let base = self.require_actor(uid)?.clone();
        for name in base.built() {
            let fields = reader.read_raw_block()?;
            let Some(component) = base.component(name) else {
                continue;
            };
            if fields.is_empty() && component != base.root() {
                self.remove_component_now(component);
                continue;
            }
            if let Some(reflect) = self.components.reflect_mut(component) {
                text::apply_raw(&mut reflect.props(), &fields)?;
            }
        }
        self.create_components(uid);
        Ok(uid)
    }

    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.save_text())?;
        log::info!("Saved world to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let input = std::fs::read_to_string(path.as_ref())?;
        self.load_text(&input)?;
        log::info!("Loaded world from {}", path.as_ref().display());
        Ok(())
    }
}

/// Drop the per-instance identity fields from an actor snapshot.
fn without_identity(snapshot: &[(String, PropertyValue)]) -> PropertySnapshot {
    snapshot
        .iter()
        .filter(|(name, _)| name != NAME && name != UID)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy_at(world: &mut World, name: &str, x: f32) -> Uid {
        world
            .spawn_actor::<Enemy>(Some(name), Transform::from_xyz(x, 0.0, 0.0))
            .unwrap()
    }

    fn root_position(world: &World, actor: Uid) -> Vec3 {
        let root = world.actors().base(actor).unwrap().root();
        world.components().world_position(root).unwrap()
    }

    #[test]
    fn duplicate_name_is_rejected_without_side_effects() {
        let mut world = World::new();
        enemy_at(&mut world, "Grunt", 0.0);
        let components = world.components().len();
        let err = world.spawn_actor::<MeshActor>(Some("Grunt"), Transform::IDENTITY);
        assert!(matches!(err, Err(EngineError::DuplicateName(_))));
        assert_eq!(world.components().len(), components);
        assert_eq!(world.actors().len(), 1);
    }

    #[test]
    fn unnamed_actors_get_numbered_names() {
        let mut world = World::new();
        let a = world.spawn_actor::<MeshActor>(None, Transform::IDENTITY).unwrap();
        let b = world.spawn_actor::<MeshActor>(None, Transform::IDENTITY).unwrap();
        assert_eq!(world.actors().base(a).unwrap().name, "MeshActor1");
        assert_eq!(world.actors().base(b).unwrap().name, "MeshActor2");
    }

    #[test]
    fn default_population_fills_in_missing_actors() {
        let mut world = World::new();
        let spawned = world.populate_default().unwrap();
        assert_eq!(spawned.len(), 3);

        let floor = world.find_actor("Floor").unwrap();
        let mesh = world.actors().base(floor).unwrap().root();
        assert_eq!(world.component::<MeshComponent>(mesh).unwrap().data().unwrap().indices.len(), 6);
        let light = world.find_actor("Light").unwrap();
        assert_eq!(root_position(&world, light), Vec3::new(0.0, 10.0, 0.0));
        assert!(world.actor::<Player>(world.find_actor("Player").unwrap()).is_some());

        world.destroy_actor(light).unwrap();
        world.flush_removals();
        let spawned = world.populate_default().unwrap();
        assert_eq!(spawned.len(), 1);
        assert_eq!(world.actors().len(), 3);
    }

    #[test]
    fn spawn_by_unknown_system_fails() {
        let mut world = World::new();
        let err = world.spawn_actor_by_name("Dragon", None, Transform::IDENTITY);
        assert!(matches!(err, Err(EngineError::UnknownSystem(_))));
    }

    #[test]
    fn destroy_is_deferred_until_flush() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 0.0);
        let components: Vec<Uid> = world.actors().base(enemy).unwrap().component_uids().collect();

        world.destroy_actor(enemy).unwrap();
        assert!(world.actors().contains(enemy));
        assert!(world.is_pending_removal(enemy));

        world.flush_removals();
        assert!(!world.actors().contains(enemy));
        assert!(world.find_actor("Grunt").is_none());
        assert!(world.components().is_empty());
        let removed = world.take_removed();
        assert!(removed.contains(&enemy));
        assert!(components.iter().all(|c| removed.contains(c)));
        assert!(world.take_removed().is_empty());
    }

    #[test]
    fn destroying_a_parent_destroys_child_actors() {
        let mut world = World::new();
        let parent = enemy_at(&mut world, "Boss", 0.0);
        let child = enemy_at(&mut world, "Minion", 1.0);
        world.attach_actor(parent, child).unwrap();
        assert!(matches!(
            world.attach_actor(child, parent),
            Err(EngineError::HierarchyCycle { .. })
        ));

        world.destroy_actor(parent).unwrap();
        world.flush_removals();
        assert!(world.actors().is_empty());
    }

    #[test]
    fn root_cannot_be_removed_alone() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 0.0);
        let root = world.actors().base(enemy).unwrap().root();
        assert!(matches!(
            world.remove_component(root),
            Err(EngineError::RootRemoval(_))
        ));
    }

    #[test]
    fn removing_a_component_updates_owner_map() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 0.0);
        let widget = world
            .actors()
            .base(enemy)
            .unwrap()
            .component(Enemy::HEALTH_WIDGET)
            .unwrap();
        world.remove_component(widget).unwrap();
        world.flush_removals();
        assert!(!world.components().contains(widget));
        assert!(world.actors().base(enemy).unwrap().component(Enemy::HEALTH_WIDGET).is_none());
        assert!(matches!(
            world.remove_component(widget),
            Err(EngineError::ComponentNotFound(_))
        ));
    }

    #[test]
    fn queued_component_removal_reaches_backends_on_flush() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 0.0);
        let widget = world
            .actors()
            .base(enemy)
            .unwrap()
            .component(Enemy::HEALTH_WIDGET)
            .unwrap();

        world.commands_mut().remove_component(widget);
        world.apply_commands();
        assert!(world.components().contains(widget));
        assert_eq!(world.actors().base(enemy).unwrap().component(Enemy::HEALTH_WIDGET), Some(widget));
        assert!(world.take_removed().is_empty());

        world.flush_removals();
        assert!(!world.components().contains(widget));
        assert!(world.actors().base(enemy).unwrap().component(Enemy::HEALTH_WIDGET).is_none());
        assert_eq!(world.take_removed(), [widget]);
    }

    #[test]
    fn finished_one_shot_sprite_destroys_billboard() {
        let mut world = World::new();
        let billboard = world.spawn_actor::<Billboard>(Some("Puff"), Transform::IDENTITY).unwrap();
        let sprite = world.actors().base(billboard).unwrap().root();
        {
            let sprite = world.component_mut::<SpriteComponent>(sprite).unwrap();
            sprite.looping = false;
            sprite.speed = 10.0;
        }
        let input = InputState::new();
        world.tick(0.2, 0.2, &input, None);
        world.apply_commands();
        world.flush_removals();
        assert!(!world.actors().contains(billboard));
    }

    #[test]
    fn commands_apply_after_tick() {
        let mut world = World::new();
        world.commands_mut().spawn_actor("MeshActor", Some("Spawned"), Transform::from_xyz(0.0, 1.0, 0.0));
        world.commands_mut().notify("hello");
        world.commands_mut().spawn_actor("Nope", None, Transform::IDENTITY);
        let notes = world.apply_commands();
        assert_eq!(notes, ["hello"]);
        let spawned = world.find_actor("Spawned").unwrap();
        assert_eq!(root_position(&world, spawned), Vec3::Y);
    }

    #[test]
    fn rename_through_property() {
        let mut world = World::new();
        let a = enemy_at(&mut world, "A", 0.0);
        enemy_at(&mut world, "B", 0.0);

        world
            .set_actor_property(a, "Name", PropertyValue::String("C".into()))
            .unwrap();
        assert_eq!(world.find_actor("C"), Some(a));
        assert!(world.find_actor("A").is_none());

        let err = world.set_actor_property(a, "Name", PropertyValue::String("B".into()));
        assert!(matches!(err, Err(EngineError::DuplicateName(_))));
        assert_eq!(world.actors().base(a).unwrap().name, "C");

        let err = world.set_actor_property(a, "UID", PropertyValue::Uid(Uid::new()));
        assert!(matches!(err, Err(EngineError::ReadOnlyProperty(_))));
    }

    #[test]
    fn mesh_change_reloads_mesh() {
        let mut world = World::new();
        let actor = world.spawn_actor::<MeshActor>(None, Transform::IDENTITY).unwrap();
        let mesh = world.actors().base(actor).unwrap().root();
        assert_eq!(world.component::<MeshComponent>(mesh).unwrap().data().unwrap().indices.len(), 36);

        world
            .set_component_property(mesh, "Mesh", PropertyValue::Mesh(MeshRef::new("plane")))
            .unwrap();
        assert_eq!(world.component::<MeshComponent>(mesh).unwrap().data().unwrap().indices.len(), 6);
    }

    #[test]
    fn position_property_refreshes_children() {
        let mut world = World::new();
        let player = world.spawn_actor::<Player>(None, Transform::IDENTITY).unwrap();
        let base = world.actors().base(player).unwrap().clone();
        world
            .set_component_property(base.root(), "Position", PropertyValue::Vec3(Vec3::X))
            .unwrap();
        let camera = base.component(Player::CAMERA).unwrap();
        let cached = world
            .component::<CameraComponent>(camera)
            .unwrap()
            .spatial
            .transform
            .cached_world_matrix();
        assert!(cached.abs_diff_eq(world.world_matrix(camera).unwrap(), 1e-4));
    }

    #[test]
    fn duplicate_copies_everything_but_identity() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 4.0);
        world.actor_mut::<Enemy>(enemy).unwrap().health = 9;

        let copy = world.duplicate_actor(enemy).unwrap();
        assert_ne!(copy, enemy);
        let base = world.actors().base(copy).unwrap();
        assert_ne!(base.name, "Grunt");
        assert_eq!(base.uid, copy);
        assert_eq!(world.actor::<Enemy>(copy).unwrap().health, 9);
        assert_eq!(root_position(&world, copy), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn duplicate_copies_added_components() {
        let mut world = World::new();
        let actor = world.spawn_actor::<MeshActor>(Some("Lamp Post"), Transform::IDENTITY).unwrap();
        let lamp = world
            .add_component(actor, "Lamp", PointLightComponent::default())
            .unwrap();
        world
            .set_component_property(lamp, "Intensity", PropertyValue::Float(3.5))
            .unwrap();
        world
            .set_component_property(lamp, "Active", PropertyValue::Bool(false))
            .unwrap();

        let copy = world.duplicate_actor(actor).unwrap();
        let copied = world.actors().base(copy).unwrap().component("Lamp").unwrap();
        assert_ne!(copied, lamp);
        assert_eq!(world.components().type_name(copied), Some("PointLightComponent"));
        assert!(!world.components().base(copied).unwrap().active);
        let light = world.component::<PointLightComponent>(copied).unwrap();
        assert_eq!(light.intensity, 3.5);
        assert_eq!(world.find_actor("Lamp Post"), Some(actor));
    }

    #[test]
    fn template_adds_extra_components() {
        let mut world = World::new();
        let actor = world.spawn_actor::<MeshActor>(None, Transform::IDENTITY).unwrap();
        world
            .add_component(actor, "Lamp", PointLightComponent::default())
            .unwrap();
        let template = world.capture_template(actor).unwrap();
        let json = template.to_json().unwrap();

        let template = ActorTemplate::from_json(&json).unwrap();
        let copy = world.spawn_from_template(&template, Some("Copy")).unwrap();
        let lamp = world.actors().base(copy).unwrap().component("Lamp").unwrap();
        assert_eq!(world.components().type_name(lamp), Some("PointLightComponent"));
    }

    #[test]
    fn add_component_rejects_duplicate_name() {
        let mut world = World::new();
        let actor = world.spawn_actor::<MeshActor>(None, Transform::IDENTITY).unwrap();
        let before = world.actors().base(actor).unwrap().components().to_vec();
        let err = world.add_component(actor, MeshActor::MESH, PointLightComponent::default());
        assert!(matches!(err, Err(EngineError::DuplicateName(_))));
        assert_eq!(world.actors().base(actor).unwrap().components(), before.as_slice());
    }

    #[test]
    fn save_load_round_trip() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, "Grunt", 2.0);
        world.actor_mut::<Enemy>(enemy).unwrap().health = 1;
        let widget = world
            .actors()
            .base(enemy)
            .unwrap()
            .component(Enemy::HEALTH_WIDGET)
            .unwrap();
        world.remove_component(widget).unwrap();
        world.flush_removals();

        let prop = world.spawn_actor::<MeshActor>(Some("Floor"), Transform::IDENTITY).unwrap();
        let mesh = world.actors().base(prop).unwrap().root();
        world
            .set_component_property(mesh, "Mesh", PropertyValue::Mesh(MeshRef::new("plane")))
            .unwrap();
        world.add_component(prop, "Lamp", PointLightComponent::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.txt");
        world.save_file(&path).unwrap();

        let mut loaded = World::new();
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded.actors().len(), 2);

        assert_eq!(loaded.find_actor("Grunt"), Some(enemy));
        assert_eq!(loaded.actor::<Enemy>(enemy).unwrap().health, 1);
        assert_eq!(root_position(&loaded, enemy), Vec3::new(2.0, 0.0, 0.0));
        let base = loaded.actors().base(enemy).unwrap();
        assert!(base.component(Enemy::HEALTH_WIDGET).is_none());
        assert!(base.component(Enemy::AGGRO_TRIGGER).is_some());

        let base = loaded.actors().base(prop).unwrap().clone();
        assert!(base.component("Lamp").is_none());
        let mesh = loaded.component::<MeshComponent>(base.root()).unwrap();
        assert_eq!(mesh.mesh.filename(), "plane");
        assert_eq!(mesh.data().unwrap().indices.len(), 6);
    }

    #[test]
    fn load_replaces_contents() {
        let mut world = World::new();
        enemy_at(&mut world, "Grunt", 0.0);
        let saved = world.save_text();
        world.load_text(&saved).unwrap();
        world.load_text(&saved).unwrap();
        assert_eq!(world.actors().len(), 1);
    }

    #[test]
    fn load_rejects_unknown_system_and_bad_count() {
        let mut world = World::new();
        assert!(matches!(
            world.load_text("Dragon\n1\n"),
            Err(EngineError::UnknownSystem(_))
        ));
        assert!(matches!(
            world.load_text("Enemy\nmany\n"),
            Err(EngineError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            world.load_text("Enemy\n1\nName\nGrunt\n"),
            Err(EngineError::Parse { .. })
        ));
    }
}
