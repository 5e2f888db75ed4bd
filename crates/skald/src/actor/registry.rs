use std::any::TypeId;
use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::reflect::Reflect;
use crate::uid::Uid;

use super::{Actor, ActorBase, ActorContext, ActorStore, ActorSystem};

/// Every actor system, in registration order, plus the world-wide name and
/// UID lookup tables.
#[derive(Default)]
pub struct ActorRegistry {
    systems: Vec<Box<dyn ActorStore>>,
    by_type: HashMap<TypeId, usize>,
    by_name: HashMap<&'static str, usize>,
    locations: HashMap<Uid, usize>,
    names: HashMap<String, Uid>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Systems ──────────────────────────────────────────────────────

    /// Register the system for `T`. Registering twice is a no-op.
    pub fn register<T: Actor>(&mut self) {
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return;
        }
        let index = self.systems.len();
        self.systems.push(Box::new(ActorSystem::<T>::new()));
        self.by_type.insert(TypeId::of::<T>(), index);
        self.by_name.insert(T::TYPE_NAME, index);
        log::info!("Registered actor system {}", T::TYPE_NAME);
    }

    pub fn system<T: Actor>(&self) -> Option<&ActorSystem<T>> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        self.systems[index].as_any().downcast_ref()
    }

    pub fn system_mut<T: Actor>(&mut self) -> Option<&mut ActorSystem<T>> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        self.systems[index].as_any_mut().downcast_mut()
    }

    pub fn systems(&self) -> impl Iterator<Item = &dyn ActorStore> {
        self.systems.iter().map(|s| s.as_ref())
    }

    pub(crate) fn system_index_by_name(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownSystem(name.to_owned()))
    }

    pub(crate) fn system_at_mut(&mut self, index: usize) -> &mut dyn ActorStore {
        self.systems[index].as_mut()
    }

    // ── Instances ────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.locations.contains_key(&uid)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Uid> {
        self.names.get(name).copied()
    }

    pub fn is_name_taken(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Record a spawned actor in the lookup tables.
    pub(crate) fn track(&mut self, uid: Uid, name: &str, system: usize) {
        self.locations.insert(uid, system);
        self.names.insert(name.to_owned(), uid);
    }

    pub(crate) fn rename(&mut self, old: &str, new: &str) {
        if let Some(uid) = self.names.remove(old) {
            self.names.insert(new.to_owned(), uid);
        }
    }

    pub fn get<T: Actor>(&self, uid: Uid) -> Option<&T> {
        self.system::<T>()?.get(uid)
    }

    pub fn get_mut<T: Actor>(&mut self, uid: Uid) -> Option<&mut T> {
        self.system_mut::<T>()?.get_mut(uid)
    }

    /// Name of the system `uid` lives in.
    pub fn type_name(&self, uid: Uid) -> Option<&'static str> {
        let index = *self.locations.get(&uid)?;
        Some(self.systems[index].name())
    }

    pub fn base(&self, uid: Uid) -> Option<&ActorBase> {
        let index = *self.locations.get(&uid)?;
        self.systems[index].base(uid)
    }

    pub fn base_mut(&mut self, uid: Uid) -> Option<&mut ActorBase> {
        let index = *self.locations.get(&uid)?;
        self.systems[index].base_mut(uid)
    }

    pub fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect> {
        let index = *self.locations.get(&uid)?;
        self.systems[index].reflect_mut(uid)
    }

    /// Copy `src`'s property values onto `dst`. Both must live in one system.
    pub(crate) fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()> {
        let from = *self
            .locations
            .get(&src)
            .ok_or_else(|| EngineError::ActorNotFound(src.to_string()))?;
        let to = *self
            .locations
            .get(&dst)
            .ok_or_else(|| EngineError::ActorNotFound(dst.to_string()))?;
        if from != to {
            return Err(EngineError::SystemMismatch { src, dst });
        }
        self.systems[from].copy_properties(src, dst)
    }

    /// Every live actor UID, system by system in registration order.
    pub fn uids(&self) -> Vec<Uid> {
        self.systems.iter().flat_map(|s| s.uids()).collect()
    }

    /// Drop one actor and its table entries. Components and child actors are
    /// the world's job.
    pub(crate) fn remove(&mut self, uid: Uid) -> Option<ActorBase> {
        let index = self.locations.remove(&uid)?;
        let base = self.systems[index].remove(uid)?;
        self.names.remove(&base.name);
        Some(base)
    }

    pub(crate) fn clear(&mut self) -> Vec<ActorBase> {
        self.locations.clear();
        self.names.clear();
        self.systems.iter_mut().flat_map(|s| s.clear()).collect()
    }

    // ── Frame ────────────────────────────────────────────────────────

    pub(crate) fn start(&mut self, ctx: &mut ActorContext<'_>) {
        for system in &mut self.systems {
            system.start(ctx);
        }
    }

    /// Tick every system in registration order. With `diagnostics`, each
    /// system's tick time in milliseconds is appended to `timings`.
    #[cfg_attr(not(feature = "diagnostics"), allow(unused_variables))]
    pub(crate) fn tick(&mut self, ctx: &mut ActorContext<'_>, timings: &mut Vec<(&'static str, f32)>) {
        for system in &mut self.systems {
            #[cfg(feature = "diagnostics")]
            let started = std::time::Instant::now();
            system.tick(ctx);
            #[cfg(feature = "diagnostics")]
            timings.push((system.name(), started.elapsed().as_secs_f32() * 1000.0));
        }
    }
}
