use std::any::Any;
use std::collections::HashMap;

use crate::component::pair_mut;
use crate::error::{EngineError, Result};
use crate::math::Transform;
use crate::reflect::{Properties, Reflect};
use crate::uid::Uid;

use super::{Actor, ActorBase, ActorBuilder, ActorContext};

/// Owns every live instance of one actor type. Mirrors
/// [`ComponentSystem`](crate::component::ComponentSystem): insertion-ordered
/// `Vec`, order-preserving removal, `Uid ──► slot` index.
pub struct ActorSystem<T: Actor> {
    items: Vec<T>,
    index: HashMap<Uid, usize>,
}

impl<T: Actor> Default for ActorSystem<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Actor> ActorSystem<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: Uid) -> Option<&T> {
        self.index.get(&uid).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, uid: Uid) -> Option<&mut T> {
        self.index.get(&uid).map(|&i| &mut self.items[i])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|a| a.base().name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn remove(&mut self, uid: Uid) -> Option<T> {
        let slot = self.index.remove(&uid)?;
        let value = self.items.remove(slot);
        for i in self.index.values_mut() {
            if *i > slot {
                *i -= 1;
            }
        }
        Some(value)
    }
}

/// Type-erased view of an [`ActorSystem`].
pub trait ActorStore: Any {
    fn name(&self) -> &'static str;
    fn count(&self) -> usize;
    fn contains(&self, uid: Uid) -> bool;
    /// UIDs in storage order.
    fn uids(&self) -> Vec<Uid>;

    /// Construct a default actor, let it build its components, and store it.
    /// On failure every component it created is removed again.
    fn spawn(
        &mut self,
        name: &str,
        uid: Uid,
        transform: Transform,
        builder: ActorBuilder<'_>,
    ) -> Result<Uid>;
    /// Drop the actor. Its components are the caller's to remove.
    fn remove(&mut self, uid: Uid) -> Option<ActorBase>;
    fn clear(&mut self) -> Vec<ActorBase>;

    fn start(&mut self, ctx: &mut ActorContext<'_>);
    fn tick(&mut self, ctx: &mut ActorContext<'_>);

    fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect>;
    /// Copy every property value of `src` onto `dst`, identity included.
    fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()>;
    fn base(&self, uid: Uid) -> Option<&ActorBase>;
    fn base_mut(&mut self, uid: Uid) -> Option<&mut ActorBase>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Actor> ActorStore for ActorSystem<T> {
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
        self.items.iter().map(|a| a.base().uid).collect()
    }

    fn spawn(
        &mut self,
        name: &str,
        uid: Uid,
        transform: Transform,
        mut builder: ActorBuilder<'_>,
    ) -> Result<Uid> {
        let mut actor = T::default();
        let base = actor.base_mut();
        base.uid = uid;
        base.name = name.to_owned();

        if let Err(e) = actor.build(&mut builder) {
            builder.rollback();
            return Err(e);
        }
        let (root, components) = builder.finish(transform)?;
        let base = actor.base_mut();
        base.root = root;
        base.built = components.iter().map(|(n, _)| n.clone()).collect();
        base.components = components;

        self.index.insert(uid, self.items.len());
        self.items.push(actor);
        Ok(uid)
    }

    fn remove(&mut self, uid: Uid) -> Option<ActorBase> {
        ActorSystem::<T>::remove(self, uid).map(|a| a.base().clone())
    }

    fn clear(&mut self) -> Vec<ActorBase> {
        self.index.clear();
        self.items.drain(..).map(|a| a.base().clone()).collect()
    }

    fn start(&mut self, ctx: &mut ActorContext<'_>) {
        for actor in &mut self.items {
            actor.start(ctx);
        }
    }

    fn tick(&mut self, ctx: &mut ActorContext<'_>) {
        for actor in self.items.iter_mut().filter(|a| a.base().active) {
            actor.tick(ctx);
        }
    }

    fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect> {
        self.get_mut(uid).map(|a| a as &mut dyn Reflect)
    }

    fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()> {
        let slot = |uid: Uid| {
            self.index
                .get(&uid)
                .copied()
                .ok_or_else(|| EngineError::ActorNotFound(uid.to_string()))
        };
        let (from, to) = (slot(src)?, slot(dst)?);
        let Some((from, to)) = pair_mut(&mut self.items, from, to) else {
            return Ok(());
        };
        Properties::copy_properties(&from.props(), &mut to.props())
    }

    fn base(&self, uid: Uid) -> Option<&ActorBase> {
        self.get(uid).map(Actor::base)
    }

    fn base_mut(&mut self, uid: Uid) -> Option<&mut ActorBase> {
        self.get_mut(uid).map(Actor::base_mut)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
