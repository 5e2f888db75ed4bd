use std::any::Any;
use std::collections::HashMap;

use crate::asset::Assets;
use crate::backend::{AudioBackend, BodyKind, Renderer};
use crate::error::{EngineError, Result};
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

use super::{Capabilities, Component, ComponentBase, SpatialComponent, TickContext};

/// Owns every live instance of one component type.
///
/// Instances sit in a `Vec` in insertion order; ticking walks it front to
/// back. Removal is order-preserving and rebuilds the `Uid ──► slot` index,
/// so a slot is only meaningful until the next removal. Hold a [`Uid`].
pub struct ComponentSystem<T: Component> {
    items: Vec<T>,
    index: HashMap<Uid, usize>,
}

impl<T: Component> Default for ComponentSystem<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Component> ComponentSystem<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` as a component of `owner` and run its `init` hook.
    ///
    /// Name uniqueness is per actor and is checked by the actor layer before
    /// this is called.
    pub(crate) fn add(&mut self, name: &str, owner: Uid, mut value: T, active: bool) -> Uid {
        let base = value.base_mut();
        base.name = name.to_owned();
        base.owner = owner;
        base.active = active;
        self.insert(value)
    }

    /// Store a value whose base is already filled in. Keeps its UID unless it
    /// is unset or already taken.
    pub(crate) fn insert(&mut self, mut value: T) -> Uid {
        let uid = value.base().uid;
        let uid = if uid.is_none() || self.index.contains_key(&uid) {
            if !uid.is_none() {
                log::warn!("{} uid {uid} already in use, assigning a new one", T::TYPE_NAME);
            }
            let fresh = Uid::new();
            value.base_mut().uid = fresh;
            fresh
        } else {
            uid
        };
        value.init();
        self.index.insert(uid, self.items.len());
        self.items.push(value);
        uid
    }

    /// Run `destroy` and drop the instance. Returns `None` if `uid` is not
    /// a member.
    pub(crate) fn remove(&mut self, uid: Uid) -> Option<T> {
        let slot = self.index.remove(&uid)?;
        let mut value = self.items.remove(slot);
        for i in self.index.values_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        value.destroy();
        Some(value)
    }

    pub fn get(&self, uid: Uid) -> Option<&T> {
        self.index.get(&uid).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, uid: Uid) -> Option<&mut T> {
        self.index.get(&uid).map(|&i| &mut self.items[i])
    }

    /// First instance with this name. Names are only unique per actor, so
    /// pass an owner to disambiguate via [`find`](Self::find).
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|c| c.base().name == name)
    }

    pub fn find(&self, owner: Uid, name: &str) -> Option<&T> {
        self.items
            .iter()
            .find(|c| c.base().owner == owner && c.base().name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Type-erased view of a [`ComponentSystem`].
pub trait ComponentStore: Any {
    fn name(&self) -> &'static str;
    fn count(&self) -> usize;
    fn contains(&self, uid: Uid) -> bool;
    /// UIDs in storage order.
    fn uids(&self) -> Vec<Uid>;

    /// Add a default-constructed instance, e.g. while loading a save file.
    fn spawn_default(&mut self, name: &str, owner: Uid, uid: Uid) -> Uid;
    fn remove(&mut self, uid: Uid) -> bool;
    /// Remove every instance, returning their UIDs.
    fn clear(&mut self) -> Vec<Uid>;

    fn start(&mut self);
    fn tick(&mut self, ctx: &mut TickContext<'_>);
    fn create(&mut self, uid: Uid, assets: &mut Assets);
    fn animate(&mut self, dt: f32);
    fn render(&self, renderer: &mut dyn Renderer);
    fn sync_audio(&mut self, audio: &mut dyn AudioBackend);
    /// Active instances that want a physics body.
    fn bodies(&self) -> Vec<(Uid, BodyKind)>;

    fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect>;
    /// Copy every property value of `src` onto `dst`, both in this system.
    fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()>;
    fn base(&self, uid: Uid) -> Option<&ComponentBase>;
    fn base_mut(&mut self, uid: Uid) -> Option<&mut ComponentBase>;
    fn capabilities(&self, uid: Uid) -> Option<Capabilities>;
    fn spatial(&self, uid: Uid) -> Option<&SpatialComponent>;
    fn spatial_mut(&mut self, uid: Uid) -> Option<&mut SpatialComponent>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Borrow two distinct slots at once. `None` when `a == b`.
pub(crate) fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else if b < a {
        let (left, right) = items.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    } else {
        None
    }
}

impl<T: Component> ComponentStore for ComponentSystem<T> {
    fn name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn contains(&self, uid: Uid) -> bool {
        self.index.contains_key(&uid)
    }

    fn uids(&self) -> Vec<Uid> {
        self.items.iter().map(|c| c.base().uid).collect()
    }

    fn spawn_default(&mut self, name: &str, owner: Uid, uid: Uid) -> Uid {
        let mut value = T::default();
        let base = value.base_mut();
        base.uid = uid;
        base.name = name.to_owned();
        base.owner = owner;
        self.insert(value)
    }

    fn remove(&mut self, uid: Uid) -> bool {
        ComponentSystem::<T>::remove(self, uid).is_some()
    }

    fn clear(&mut self) -> Vec<Uid> {
        self.index.clear();
        self.items
            .drain(..)
            .map(|mut c| {
                c.destroy();
                c.base().uid
            })
            .collect()
    }

    fn start(&mut self) {
        for c in &mut self.items {
            c.start();
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        for c in self.items.iter_mut().filter(|c| c.base().active) {
            c.tick(ctx);
        }
    }

    fn create(&mut self, uid: Uid, assets: &mut Assets) {
        if let Some(c) = self.get_mut(uid) {
            c.create(assets);
        }
    }

    fn animate(&mut self, dt: f32) {
        for c in self
            .items
            .iter_mut()
            .filter(|c| c.base().active && c.capabilities().animatable)
        {
            c.animate(dt);
        }
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        for c in self
            .items
            .iter()
            .filter(|c| c.base().active && c.capabilities().renderable)
        {
            c.render(renderer);
        }
    }

    fn sync_audio(&mut self, audio: &mut dyn AudioBackend) {
        for c in self.items.iter_mut().filter(|c| c.capabilities().audio) {
            c.sync_audio(audio);
        }
    }

    fn bodies(&self) -> Vec<(Uid, BodyKind)> {
        self.items
            .iter()
            .filter(|c| c.base().active && c.capabilities().physical)
            .filter_map(|c| c.body_kind().map(|kind| (c.base().uid, kind)))
            .collect()
    }

    fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect> {
        self.get_mut(uid).map(|c| c as &mut dyn Reflect)
    }

    fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()> {
        let slot = |uid: Uid| {
            self.index
                .get(&uid)
                .copied()
                .ok_or_else(|| EngineError::ComponentNotFound(uid.to_string()))
        };
        let (from, to) = (slot(src)?, slot(dst)?);
        let Some((from, to)) = pair_mut(&mut self.items, from, to) else {
            return Ok(());
        };
        Properties::copy_properties(&from.props(), &mut to.props())
    }

    fn base(&self, uid: Uid) -> Option<&ComponentBase> {
        self.get(uid).map(Component::base)
    }

    fn base_mut(&mut self, uid: Uid) -> Option<&mut ComponentBase> {
        self.get_mut(uid).map(Component::base_mut)
    }

    fn capabilities(&self, uid: Uid) -> Option<Capabilities> {
        self.get(uid).map(Component::capabilities)
    }

    fn spatial(&self, uid: Uid) -> Option<&SpatialComponent> {
        self.get(uid).and_then(Component::spatial)
    }

    fn spatial_mut(&mut self, uid: Uid) -> Option<&mut SpatialComponent> {
        self.get_mut(uid).and_then(Component::spatial_mut)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandQueue;
    use crate::input::InputState;

    #[derive(Default)]
    struct Counter {
        base: ComponentBase,
        ticks: u32,
        inits: u32,
        animated: bool,
        frames: u32,
    }

    impl Reflect for Counter {
        fn props(&mut self) -> Properties<'_> {
            let mut props = self.base.props();
            props.set_title("Counter");
            props
        }
    }

    impl Component for Counter {
        const TYPE_NAME: &'static str = "Counter";

        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn init(&mut self) {
            self.inits += 1;
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                animatable: self.animated,
                ..Capabilities::NONE
            }
        }

        fn tick(&mut self, _ctx: &mut TickContext<'_>) {
            self.ticks += 1;
        }

        fn animate(&mut self, _dt: f32) {
            self.frames += 1;
        }
    }

    fn tick(system: &mut ComponentSystem<Counter>) {
        let input = InputState::new();
        let mut commands = CommandQueue::new();
        let mut ctx = TickContext {
            dt: 0.016,
            elapsed: 0.0,
            input: &input,
            commands: &mut commands,
        };
        ComponentStore::tick(system, &mut ctx);
    }

    #[test]
    fn add_sets_base_and_runs_init() {
        let mut system = ComponentSystem::<Counter>::new();
        let owner = Uid::new();
        let uid = system.add("counter", owner, Counter::default(), true);
        let c = system.get(uid).unwrap();
        assert_eq!(c.base.name, "counter");
        assert_eq!(c.base.owner, owner);
        assert_eq!(c.inits, 1);
        assert!(!uid.is_none());
    }

    #[test]
    fn tick_skips_inactive() {
        let mut system = ComponentSystem::<Counter>::new();
        let on = system.add("on", Uid::new(), Counter::default(), true);
        let off = system.add("off", Uid::new(), Counter::default(), false);
        tick(&mut system);
        assert_eq!(system.get(on).unwrap().ticks, 1);
        assert_eq!(system.get(off).unwrap().ticks, 0);
    }

    #[test]
    fn animate_only_reaches_animatable_components() {
        let mut system = ComponentSystem::<Counter>::new();
        let still = system.add("still", Uid::new(), Counter::default(), true);
        let moving = Counter {
            animated: true,
            ..Counter::default()
        };
        let moving = system.add("moving", Uid::new(), moving, true);

        ComponentStore::animate(&mut system, 0.016);
        assert_eq!(system.get(still).unwrap().frames, 0);
        assert_eq!(system.get(moving).unwrap().frames, 1);

        system.get_mut(still).unwrap().animated = true;
        ComponentStore::animate(&mut system, 0.016);
        assert_eq!(system.get(still).unwrap().frames, 1);
    }

    #[test]
    fn copy_properties_between_instances() {
        let mut system = ComponentSystem::<Counter>::new();
        let owner = Uid::new();
        let src = system.add("src", owner, Counter::default(), false);
        let dst = system.add("dst", owner, Counter::default(), true);

        ComponentStore::copy_properties(&mut system, src, dst).unwrap();
        assert!(!system.get(dst).unwrap().base.active);
        assert_eq!(system.get(dst).unwrap().base.name, "dst");
        assert!(ComponentStore::copy_properties(&mut system, src, Uid::new()).is_err());
    }

    #[test]
    fn pair_mut_borrows_both_orders() {
        let mut items = [1, 2, 3];
        let (a, b) = pair_mut(&mut items, 2, 0).unwrap();
        std::mem::swap(a, b);
        assert_eq!(items, [3, 2, 1]);
        assert!(pair_mut(&mut items, 1, 1).is_none());
    }

    #[test]
    fn tick_on_empty_system_is_noop() {
        let mut system = ComponentSystem::<Counter>::new();
        tick(&mut system);
        assert!(system.is_empty());
    }

    #[test]
    fn remove_keeps_other_uids_valid() {
        let mut system = ComponentSystem::<Counter>::new();
        let owner = Uid::new();
        let a = system.add("a", owner, Counter::default(), true);
        let b = system.add("b", owner, Counter::default(), true);
        let c = system.add("c", owner, Counter::default(), true);

        assert!(system.remove(a).is_some());

        assert_eq!(system.get(b).unwrap().base.name, "b");
        assert_eq!(system.get(c).unwrap().base.name, "c");
        assert_eq!(ComponentStore::uids(&system), vec![b, c]);
    }

    #[test]
    fn remove_non_member_reports_not_found() {
        let mut system = ComponentSystem::<Counter>::new();
        system.add("a", Uid::new(), Counter::default(), true);
        assert!(system.remove(Uid::new()).is_none());
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn find_by_owner_and_name() {
        let mut system = ComponentSystem::<Counter>::new();
        let first = Uid::new();
        let second = Uid::new();
        system.add("mesh", first, Counter::default(), true);
        let uid = system.add("mesh", second, Counter::default(), true);
        assert_eq!(system.find(second, "mesh").unwrap().base.uid, uid);
        assert_eq!(system.find_by_name("mesh").unwrap().base.owner, first);
    }

    #[test]
    fn insert_reassigns_taken_uid() {
        let mut system = ComponentSystem::<Counter>::new();
        let uid = system.add("a", Uid::new(), Counter::default(), true);
        let taken = ComponentStore::spawn_default(&mut system, "b", Uid::new(), uid);
        assert_ne!(taken, uid);
        assert_eq!(system.len(), 2);
    }
}
