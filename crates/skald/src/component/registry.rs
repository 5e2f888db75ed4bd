use std::any::TypeId;
use std::collections::{HashMap, VecDeque};

use crate::asset::Assets;
use crate::backend::{AudioBackend, BodyKind, PhysicsBackend, Renderer};
use crate::error::{EngineError, Result};
use crate::math::{Mat4, Quat, Vec3};
use crate::reflect::Reflect;
use crate::uid::Uid;

use super::{
    Capabilities, Component, ComponentBase, ComponentStore, ComponentSystem, SpatialComponent,
    TickContext,
};

/// Every component system, in registration order.
///
/// Besides routing by type and by UID, the registry owns the spatial
/// hierarchy operations, because a parent and its child can live in
/// different systems.
#[derive(Default)]
pub struct ComponentRegistry {
    systems: Vec<Box<dyn ComponentStore>>,
    by_type: HashMap<TypeId, usize>,
    by_name: HashMap<&'static str, usize>,
    /// Which system each live component lives in.
    locations: HashMap<Uid, usize>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Systems ──────────────────────────────────────────────────────

    /// Register the system for `T`. Registering twice is a no-op.
    pub fn register<T: Component>(&mut self) {
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return;
        }
        let index = self.systems.len();
        self.systems.push(Box::new(ComponentSystem::<T>::new()));
        self.by_type.insert(TypeId::of::<T>(), index);
        self.by_name.insert(T::TYPE_NAME, index);
        log::info!("Registered component system {}", T::TYPE_NAME);
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// The typed system for `T`, if registered.
    pub fn system<T: Component>(&self) -> Option<&ComponentSystem<T>> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        self.systems[index].as_any().downcast_ref()
    }

    pub(crate) fn system_mut<T: Component>(&mut self) -> Option<&mut ComponentSystem<T>> {
        let index = *self.by_type.get(&TypeId::of::<T>())?;
        self.systems[index].as_any_mut().downcast_mut()
    }

    /// All systems, for generic iteration (editors, diagnostics).
    pub fn systems(&self) -> impl Iterator<Item = &dyn ComponentStore> {
        self.systems.iter().map(|s| s.as_ref())
    }

    pub fn system_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.systems.iter().map(|s| s.name())
    }

    /// Total live components across every system.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    // ── Instances ────────────────────────────────────────────────────

    /// Add a component to `T`'s system, registering the system on first use.
    pub(crate) fn add<T: Component>(&mut self, name: &str, owner: Uid, value: T, active: bool) -> Uid {
        self.register::<T>();
        let index = self.by_type[&TypeId::of::<T>()];
        let uid = match self.systems[index].as_any_mut().downcast_mut::<ComponentSystem<T>>() {
            Some(system) => system.add(name, owner, value, active),
            None => unreachable!("system registered under the wrong type"),
        };
        self.locations.insert(uid, index);
        uid
    }

    /// Add a default instance to the system registered as `system`.
    pub(crate) fn add_by_name(&mut self, system: &str, name: &str, owner: Uid, uid: Uid) -> Result<Uid> {
        let index = *self
            .by_name
            .get(system)
            .ok_or_else(|| EngineError::UnknownSystem(system.to_owned()))?;
        let uid = self.systems[index].spawn_default(name, owner, uid);
        self.locations.insert(uid, index);
        Ok(uid)
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.locations.contains_key(&uid)
    }

    pub fn get<T: Component>(&self, uid: Uid) -> Option<&T> {
        self.system::<T>()?.get(uid)
    }

    pub fn get_mut<T: Component>(&mut self, uid: Uid) -> Option<&mut T> {
        self.system_mut::<T>()?.get_mut(uid)
    }

    fn store(&self, uid: Uid) -> Option<&dyn ComponentStore> {
        let index = *self.locations.get(&uid)?;
        Some(self.systems[index].as_ref())
    }

    fn store_mut(&mut self, uid: Uid) -> Option<&mut dyn ComponentStore> {
        let index = *self.locations.get(&uid)?;
        Some(self.systems[index].as_mut())
    }

    /// Name of the system `uid` lives in.
    pub fn type_name(&self, uid: Uid) -> Option<&'static str> {
        self.store(uid).map(|s| s.name())
    }

    pub fn base(&self, uid: Uid) -> Option<&ComponentBase> {
        self.store(uid)?.base(uid)
    }

    pub fn base_mut(&mut self, uid: Uid) -> Option<&mut ComponentBase> {
        self.store_mut(uid)?.base_mut(uid)
    }

    pub fn capabilities(&self, uid: Uid) -> Option<Capabilities> {
        self.store(uid)?.capabilities(uid)
    }

    pub fn reflect_mut(&mut self, uid: Uid) -> Option<&mut dyn Reflect> {
        self.store_mut(uid)?.reflect_mut(uid)
    }

    /// Copy `src`'s property values onto `dst`. Both must live in one system.
    pub(crate) fn copy_properties(&mut self, src: Uid, dst: Uid) -> Result<()> {
        let from = *self
            .locations
            .get(&src)
            .ok_or_else(|| EngineError::ComponentNotFound(src.to_string()))?;
        let to = *self
            .locations
            .get(&dst)
            .ok_or_else(|| EngineError::ComponentNotFound(dst.to_string()))?;
        if from != to {
            return Err(EngineError::SystemMismatch { src, dst });
        }
        self.systems[from].copy_properties(src, dst)
    }

    pub fn spatial(&self, uid: Uid) -> Option<&SpatialComponent> {
        self.store(uid)?.spatial(uid)
    }

    pub fn spatial_mut(&mut self, uid: Uid) -> Option<&mut SpatialComponent> {
        self.store_mut(uid)?.spatial_mut(uid)
    }

    fn require_spatial(&self, uid: Uid) -> Result<&SpatialComponent> {
        if !self.contains(uid) {
            return Err(EngineError::ComponentNotFound(uid.to_string()));
        }
        self.spatial(uid).ok_or(EngineError::NotSpatial(uid))
    }

    fn require_spatial_mut(&mut self, uid: Uid) -> Result<&mut SpatialComponent> {
        if !self.contains(uid) {
            return Err(EngineError::ComponentNotFound(uid.to_string()));
        }
        self.spatial_mut(uid).ok_or(EngineError::NotSpatial(uid))
    }

    pub fn create(&mut self, uid: Uid, assets: &mut Assets) {
        if let Some(store) = self.store_mut(uid) {
            store.create(uid, assets);
        }
    }

    /// Detach `uid` from the hierarchy and drop it. Its spatial children are
    /// left as roots at their current world transform. Returns `false` if
    /// `uid` is not a live component.
    ///
    /// Crate-private: outside code removes through the world, which defers
    /// the erase, updates the owner and reports the UID to the backends.
    pub(crate) fn remove(&mut self, uid: Uid) -> bool {
        if !self.contains(uid) {
            return false;
        }
        let children: Vec<(Uid, Mat4)> = self
            .spatial(uid)
            .map(|s| s.children.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|c| (c, self.world_matrix(c).unwrap_or(Mat4::IDENTITY)))
            .collect();
        if let Some(parent) = self.spatial(uid).and_then(|s| s.parent) {
            self.unlink(parent, uid);
        }
        for (child, world) in children {
            if let Some(spatial) = self.spatial_mut(child) {
                spatial.parent = None;
                spatial.transform.decompose(world);
                spatial.transform.set_cached_world_matrix(world);
            }
        }
        match self.locations.remove(&uid) {
            Some(index) => self.systems[index].remove(uid),
            None => false,
        }
    }

    /// Remove every component from every system. Returns the removed UIDs.
    pub(crate) fn clear(&mut self) -> Vec<Uid> {
        self.locations.clear();
        self.systems.iter_mut().flat_map(|s| s.clear()).collect()
    }

    // ── Frame ────────────────────────────────────────────────────────

    pub fn start(&mut self) {
        for system in &mut self.systems {
            system.start();
        }
    }

    /// Tick every system in registration order.
    pub fn tick(&mut self, ctx: &mut TickContext<'_>) {
        for system in &mut self.systems {
            system.tick(ctx);
        }
    }

    /// [`tick`](Self::tick), appending each system's tick time in
    /// milliseconds to `timings`.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn tick_timed(&mut self, ctx: &mut TickContext<'_>, timings: &mut Vec<(&'static str, f32)>) {
        for system in &mut self.systems {
            let started = std::time::Instant::now();
            system.tick(ctx);
            timings.push((system.name(), started.elapsed().as_secs_f32() * 1000.0));
        }
    }

    pub fn animate(&mut self, dt: f32) {
        for system in &mut self.systems {
            system.animate(dt);
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        for system in &self.systems {
            system.render(renderer);
        }
    }

    pub fn sync_audio(&mut self, audio: &mut dyn AudioBackend) {
        for system in &mut self.systems {
            system.sync_audio(audio);
        }
    }

    /// Create missing physics bodies, then copy simulated poses back into
    /// the transforms of dynamic bodies. Bodies are matched by UID.
    pub fn sync_physics(&mut self, physics: &mut dyn PhysicsBackend) {
        let bodies: Vec<_> = self.systems.iter().flat_map(|s| s.bodies()).collect();
        for (uid, kind) in bodies {
            if !physics.has_body(uid) {
                let Some(spatial) = self.spatial(uid) else {
                    continue;
                };
                let world = self.world_matrix(uid).unwrap_or(Mat4::IDENTITY);
                physics.add_body(uid, world, spatial.bounds, kind);
                continue;
            }
            match kind {
                BodyKind::Dynamic => {
                    if let Some((position, rotation)) = physics.body_pose(uid) {
                        // Best effort: a body under a non-uniformly scaled
                        // parent cannot be represented exactly.
                        let _ = self.set_world_position(uid, position);
                        let _ = self.set_world_rotation(uid, rotation);
                    }
                }
                BodyKind::Kinematic => {
                    if let Ok(world) = self.world_matrix(uid) {
                        let (_, rotation, position) = world.to_scale_rotation_translation();
                        physics.set_body_pose(uid, position, rotation);
                    }
                }
                BodyKind::Static => {}
            }
        }
    }

    // ── Hierarchy ────────────────────────────────────────────────────

    /// The live world matrix: local matrices multiplied root to leaf.
    pub fn world_matrix(&self, uid: Uid) -> Result<Mat4> {
        let spatial = self.require_spatial(uid)?;
        let mut matrix = spatial.transform.local_matrix();
        let mut parent = spatial.parent;
        while let Some(p) = parent {
            let spatial = self.require_spatial(p)?;
            matrix = spatial.transform.local_matrix() * matrix;
            parent = spatial.parent;
        }
        Ok(matrix)
    }

    fn parent_world_matrix(&self, uid: Uid) -> Result<Mat4> {
        match self.require_spatial(uid)?.parent {
            Some(parent) => self.world_matrix(parent),
            None => Ok(Mat4::IDENTITY),
        }
    }

    pub fn world_position(&self, uid: Uid) -> Result<Vec3> {
        Ok(self.world_matrix(uid)?.w_axis.truncate())
    }

    /// Set the local position so that the world position becomes `position`.
    pub fn set_world_position(&mut self, uid: Uid, position: Vec3) -> Result<()> {
        let parent = self.parent_world_matrix(uid)?;
        let local = parent.inverse().transform_point3(position);
        self.require_spatial_mut(uid)?.transform.position = local;
        self.refresh_subtree(uid)
    }

    pub fn set_world_rotation(&mut self, uid: Uid, rotation: Quat) -> Result<()> {
        let (_, parent_rotation, _) = self.parent_world_matrix(uid)?.to_scale_rotation_translation();
        let local = (parent_rotation.inverse() * rotation).normalize();
        self.require_spatial_mut(uid)?.transform.rotation = local;
        self.refresh_subtree(uid)
    }

    pub fn set_world_scale(&mut self, uid: Uid, scale: Vec3) -> Result<()> {
        let (parent_scale, _, _) = self.parent_world_matrix(uid)?.to_scale_rotation_translation();
        self.require_spatial_mut(uid)?.transform.scale = scale / parent_scale;
        self.refresh_subtree(uid)
    }

    /// Local setters that also refresh cached world matrices below `uid`.
    pub fn set_position(&mut self, uid: Uid, position: Vec3) -> Result<()> {
        self.require_spatial_mut(uid)?.transform.position = position;
        self.refresh_subtree(uid)
    }

    pub fn set_rotation(&mut self, uid: Uid, rotation: Quat) -> Result<()> {
        self.require_spatial_mut(uid)?.transform.rotation = rotation;
        self.refresh_subtree(uid)
    }

    pub fn set_scale(&mut self, uid: Uid, scale: Vec3) -> Result<()> {
        self.require_spatial_mut(uid)?.transform.scale = scale;
        self.refresh_subtree(uid)
    }

    /// Make `child` a child of `parent`, detaching it from any previous
    /// parent. The child's local transform is kept, so it moves with its new
    /// parent.
    ///
    /// Fails with [`EngineError::HierarchyCycle`] if `parent` is `child` or
    /// one of its descendants.
    pub fn add_child(&mut self, parent: Uid, child: Uid) -> Result<()> {
        self.require_spatial(child)?;
        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == child {
                return Err(EngineError::HierarchyCycle { parent, child });
            }
            cursor = self.require_spatial(c)?.parent;
        }

        if let Some(old) = self.require_spatial(child)?.parent {
            if old == parent {
                return Ok(());
            }
            self.unlink(old, child);
        }
        self.require_spatial_mut(parent)?.children.push(child);
        self.require_spatial_mut(child)?.parent = Some(parent);
        self.refresh_subtree(child)
    }

    /// Detach `child` from `parent`. The child becomes a root with its local
    /// transform unchanged. Returns `false` if it was not a child of `parent`.
    pub fn remove_child(&mut self, parent: Uid, child: Uid) -> Result<bool> {
        if self.require_spatial(child)?.parent != Some(parent) {
            return Ok(false);
        }
        self.unlink(parent, child);
        self.refresh_subtree(child)?;
        Ok(true)
    }

    fn unlink(&mut self, parent: Uid, child: Uid) {
        if let Some(p) = self.spatial_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.spatial_mut(child) {
            c.parent = None;
        }
    }

    /// Recompute the cached world matrix of `uid` and everything below it.
    pub(crate) fn refresh_subtree(&mut self, uid: Uid) -> Result<()> {
        let parent = self.parent_world_matrix(uid)?;
        self.propagate_from(uid, parent);
        Ok(())
    }

    /// Refresh every cached world matrix, parents before children.
    pub fn propagate_transforms(&mut self) {
        let roots: Vec<Uid> = self
            .locations
            .keys()
            .copied()
            .filter(|&uid| self.spatial(uid).is_some_and(|s| s.parent.is_none()))
            .collect();
        for root in roots {
            self.propagate_from(root, Mat4::IDENTITY);
        }
    }

    fn propagate_from(&mut self, start: Uid, parent_world: Mat4) {
        let mut queue = VecDeque::from([(start, parent_world)]);
        while let Some((uid, parent_world)) = queue.pop_front() {
            let Some(spatial) = self.spatial_mut(uid) else {
                continue;
            };
            let world = parent_world * spatial.transform.local_matrix();
            spatial.transform.set_cached_world_matrix(world);
            for &child in &spatial.children {
                queue.push_back((child, world));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    fn spatial(registry: &mut ComponentRegistry, x: f32) -> Uid {
        registry.add(
            "node",
            Uid::new(),
            SpatialComponent::new(Transform::from_xyz(x, 0.0, 0.0)),
            true,
        )
    }

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-4), "{a:?} != {b:?}");
    }

    fn assert_world_is_parent_times_local(registry: &ComponentRegistry, uid: Uid) {
        let s = registry.spatial(uid).unwrap();
        let expected = match s.parent() {
            Some(p) => registry.world_matrix(p).unwrap() * s.transform.local_matrix(),
            None => s.transform.local_matrix(),
        };
        assert_mat_eq(registry.world_matrix(uid).unwrap(), expected);
        assert_mat_eq(s.transform.cached_world_matrix(), expected);
    }

    #[test]
    fn deep_hierarchy_world_matrix() {
        let mut registry = ComponentRegistry::new();
        let a = spatial(&mut registry, 1.0);
        let b = spatial(&mut registry, 2.0);
        let c = spatial(&mut registry, 3.0);
        registry.add_child(a, b).unwrap();
        registry.add_child(b, c).unwrap();

        let pos = registry.world_position(c).unwrap();
        assert!((pos.x - 6.0).abs() < 0.001);
    }

    #[test]
    fn world_equals_parent_times_local_after_mutations() {
        let mut registry = ComponentRegistry::new();
        let parent = spatial(&mut registry, 5.0);
        let child = spatial(&mut registry, 1.0);
        registry.add_child(parent, child).unwrap();
        assert_world_is_parent_times_local(&registry, child);

        registry.set_rotation(parent, Quat::from_rotation_y(0.7)).unwrap();
        assert_world_is_parent_times_local(&registry, child);

        registry.set_scale(parent, Vec3::new(2.0, 1.0, 3.0)).unwrap();
        assert_world_is_parent_times_local(&registry, child);

        registry.set_position(child, Vec3::new(0.0, 4.0, -1.0)).unwrap();
        assert_world_is_parent_times_local(&registry, child);
    }

    #[test]
    fn set_world_position_under_rotated_parent() {
        let mut registry = ComponentRegistry::new();
        let parent = spatial(&mut registry, 10.0);
        let child = spatial(&mut registry, 0.0);
        registry.set_rotation(parent, Quat::from_rotation_z(1.2)).unwrap();
        registry.add_child(parent, child).unwrap();

        let target = Vec3::new(-3.0, 2.0, 7.0);
        registry.set_world_position(child, target).unwrap();

        let pos = registry.world_position(child).unwrap();
        assert!((pos - target).length() < 1e-4);
        let cached = registry.spatial(child).unwrap().transform.cached_world_matrix();
        assert!((cached.w_axis.truncate() - target).length() < 1e-4);
    }

    #[test]
    fn set_world_rotation_and_scale() {
        let mut registry = ComponentRegistry::new();
        let parent = spatial(&mut registry, 0.0);
        let child = spatial(&mut registry, 0.0);
        registry.set_rotation(parent, Quat::from_rotation_y(0.5)).unwrap();
        registry.set_scale(parent, Vec3::splat(2.0)).unwrap();
        registry.add_child(parent, child).unwrap();

        let rotation = Quat::from_rotation_x(0.3);
        registry.set_world_rotation(child, rotation).unwrap();
        registry.set_world_scale(child, Vec3::splat(4.0)).unwrap();

        let (scale, rot, _) = registry.world_matrix(child).unwrap().to_scale_rotation_translation();
        assert!(rot.abs_diff_eq(rotation, 1e-4) || rot.abs_diff_eq(-rotation, 1e-4));
        assert!((scale - Vec3::splat(4.0)).length() < 1e-4);
    }

    #[test]
    fn links_are_bidirectional() {
        let mut registry = ComponentRegistry::new();
        let a = spatial(&mut registry, 0.0);
        let b = spatial(&mut registry, 0.0);
        let c = spatial(&mut registry, 0.0);
        registry.add_child(a, c).unwrap();
        registry.add_child(b, c).unwrap();

        assert!(registry.spatial(a).unwrap().children().is_empty());
        assert_eq!(registry.spatial(b).unwrap().children(), [c]);
        assert_eq!(registry.spatial(c).unwrap().parent(), Some(b));

        assert!(registry.remove_child(b, c).unwrap());
        assert!(registry.spatial(b).unwrap().children().is_empty());
        assert_eq!(registry.spatial(c).unwrap().parent(), None);
        assert!(!registry.remove_child(b, c).unwrap());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut registry = ComponentRegistry::new();
        let a = spatial(&mut registry, 0.0);
        let b = spatial(&mut registry, 0.0);
        registry.add_child(a, b).unwrap();
        assert!(matches!(
            registry.add_child(b, a),
            Err(EngineError::HierarchyCycle { .. })
        ));
        assert!(matches!(
            registry.add_child(a, a),
            Err(EngineError::HierarchyCycle { .. })
        ));
        assert_eq!(registry.spatial(a).unwrap().parent(), None);
    }

    #[test]
    fn removing_parent_keeps_child_in_place() {
        let mut registry = ComponentRegistry::new();
        let parent = spatial(&mut registry, 5.0);
        let child = spatial(&mut registry, 1.0);
        registry.add_child(parent, child).unwrap();

        assert!(registry.remove(parent));

        assert_eq!(registry.spatial(child).unwrap().parent(), None);
        assert!((registry.world_position(child).unwrap().x - 6.0).abs() < 1e-4);
        assert!(!registry.remove(parent));
    }

    #[test]
    fn propagate_refreshes_direct_writes() {
        let mut registry = ComponentRegistry::new();
        let parent = spatial(&mut registry, 0.0);
        let child = spatial(&mut registry, 1.0);
        registry.add_child(parent, child).unwrap();

        registry.spatial_mut(parent).unwrap().transform.position = Vec3::new(0.0, 9.0, 0.0);
        registry.propagate_transforms();

        assert_world_is_parent_times_local(&registry, child);
    }

    #[test]
    fn typed_and_untyped_lookup_agree() {
        let mut registry = ComponentRegistry::new();
        let uid = spatial(&mut registry, 2.0);
        assert_eq!(registry.type_name(uid), Some("SpatialComponent"));
        assert!(registry.get::<SpatialComponent>(uid).is_some());
        assert!(registry.capabilities(uid).unwrap().spatial);
        let reflect = registry.reflect_mut(uid).unwrap();
        assert_eq!(reflect.props().len(), 4);
    }

    #[test]
    fn add_by_unknown_name_fails() {
        let mut registry = ComponentRegistry::new();
        assert!(matches!(
            registry.add_by_name("Nope", "x", Uid::new(), Uid::NONE),
            Err(EngineError::UnknownSystem(_))
        ));
    }
}
