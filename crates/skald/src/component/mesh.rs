use std::sync::Arc;

use crate::animation::{AnimationPlayer, Skeleton, SkinningBuffer};
use crate::asset::{Assets, MeshData};
use crate::backend::{BodyKind, MeshDraw, Renderer};
use crate::math::Transform;
use crate::reflect::{MeshRef, Properties, Reflect, TextureRef, VEnum};

use super::{Capabilities, Component, ComponentBase, SpatialComponent};

const BODY_KINDS: [&str; 3] = ["None", "Static", "Dynamic"];

/// A textured, optionally skinned mesh.
///
/// The mesh file is loaded in [`create`](Component::create); a skinned mesh
/// gets its own copy of the skeleton so instances animate independently.
/// Changing the `Mesh` property drops the loaded data, and the world re-runs
/// `create` to load the new file.
pub struct MeshComponent {
    pub spatial: SpatialComponent,
    pub mesh: MeshRef,
    pub texture: TextureRef,
    pub casts_shadow: bool,
    pub is_static: bool,
    /// Physics body: `None`, `Static` or `Dynamic`.
    pub body: VEnum,
    /// Clip started by `create`, if the skeleton has it.
    pub animation: String,

    data: Option<Arc<MeshData>>,
    resolved_texture: TextureRef,
    skeleton: Skeleton,
    player: AnimationPlayer,
    skinning: Box<SkinningBuffer>,
}

impl Default for MeshComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            mesh: MeshRef::new("cube"),
            texture: TextureRef::default(),
            casts_shadow: true,
            is_static: false,
            body: VEnum::new(&BODY_KINDS),
            animation: String::new(),
            data: None,
            resolved_texture: TextureRef::default(),
            skeleton: Skeleton::new(),
            player: AnimationPlayer::new(),
            skinning: Box::default(),
        }
    }
}

impl MeshComponent {
    pub fn new(mesh: &str, texture: &str) -> Self {
        Self {
            mesh: MeshRef::new(mesh),
            texture: TextureRef::new(texture),
            ..Self::default()
        }
    }

    pub fn at(mut self, transform: Transform) -> Self {
        self.spatial.transform = transform;
        self
    }

    pub fn with_animation(mut self, clip: &str) -> Self {
        self.animation = clip.to_owned();
        self
    }

    pub fn with_body(mut self, kind: &str) -> Self {
        if !self.body.set(kind) {
            log::warn!("Unknown body kind \"{kind}\"");
        }
        self
    }

    /// The loaded mesh, once [`create`](Component::create) ran.
    pub fn data(&self) -> Option<&Arc<MeshData>> {
        self.data.as_ref()
    }

    /// The texture actually drawn, after fallback substitution.
    pub fn resolved_texture(&self) -> &TextureRef {
        &self.resolved_texture
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    pub fn skinning(&self) -> &SkinningBuffer {
        &self.skinning
    }

    pub fn is_skinned(&self) -> bool {
        self.skeleton.joint_count() > 0
    }

    /// Start a clip from the beginning.
    pub fn play_animation(&mut self, clip: &str) {
        self.player.play(clip);
    }

    /// Cross-fade toward `clip` until the current one ends.
    pub fn blend_to(&mut self, clip: &str, factor: f32) {
        self.player.blend_to(clip, factor);
    }

    pub fn stop_animation(&mut self) {
        self.player.stop();
    }
}

impl Reflect for MeshComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Mesh");
        props.add("Mesh", &mut self.mesh).notify().autocomplete("meshes");
        props.add("Texture", &mut self.texture).notify().autocomplete("textures");
        props.add("Casts Shadow", &mut self.casts_shadow);
        props.add("Static", &mut self.is_static);
        props.add("Body", &mut self.body);
        props.add("Animation", &mut self.animation).notify();
        props
    }

    fn property_changed(&mut self, name: &str) {
        if name == "Mesh" {
            self.data = None;
            self.skeleton = Skeleton::new();
            self.player.stop();
        }
    }
}

impl Component for MeshComponent {
    const TYPE_NAME: &'static str = "MeshComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            spatial: true,
            renderable: true,
            physical: self.body_kind().is_some(),
            audio: false,
            animatable: true,
        }
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn create(&mut self, assets: &mut Assets) {
        let data = assets.load_mesh(&self.mesh);
        self.spatial.bounds = data.bounds;
        self.skeleton = data.skeleton.clone();
        self.skeleton.reset_to_bind_pose();
        self.skeleton.write_skinning(&mut self.skinning);
        self.data = Some(data);
        self.resolved_texture = assets.resolve_texture(&self.texture);

        self.player.stop();
        if !self.animation.is_empty() {
            if self.skeleton.animation(&self.animation).is_ok() {
                self.player.play(self.animation.as_str());
            } else {
                log::warn!(
                    "\"{}\" has no animation \"{}\"",
                    self.mesh.filename(),
                    self.animation
                );
            }
        }
    }

    fn animate(&mut self, dt: f32) {
        if !self.player.is_playing() {
            return;
        }
        if let Err(e) = self.player.advance(dt, &mut self.skeleton) {
            log::warn!("{}: {e}, animation stopped", self.spatial.base.name);
            self.player.stop();
            return;
        }
        self.skeleton.write_skinning(&mut self.skinning);
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        let Some(mesh) = &self.data else {
            return;
        };
        renderer.draw_mesh(MeshDraw {
            uid: self.spatial.base.uid,
            world: self.spatial.transform.cached_world_matrix(),
            mesh,
            texture: &self.resolved_texture,
            casts_shadow: self.casts_shadow,
            skinning: self.is_skinned().then_some(&*self.skinning),
        });
    }

    fn body_kind(&self) -> Option<BodyKind> {
        match self.body.value() {
            "Static" => Some(BodyKind::Static),
            "Dynamic" if !self.is_static => Some(BodyKind::Dynamic),
            "Dynamic" => Some(BodyKind::Static),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimFrame, Joint};
    use crate::config::EngineConfig;
    use crate::math::Vec3;
    use crate::reflect::PropertyValue;

    fn assets() -> Assets {
        Assets::new(&EngineConfig::default())
    }

    #[test]
    fn create_loads_builtin_cube() {
        let mut assets = assets();
        let mut mesh = MeshComponent::new("cube", "");
        mesh.create(&mut assets);
        let data = mesh.data().unwrap();
        assert_eq!(data.indices.len(), 36);
        assert!(!mesh.is_skinned());
        assert_eq!(mesh.spatial.bounds, data.bounds);
    }

    #[test]
    fn missing_mesh_falls_back_to_default() {
        let mut assets = assets();
        let mut mesh = MeshComponent::new("missing.gltf", "missing.png");
        mesh.create(&mut assets);
        assert_eq!(mesh.data().unwrap().indices.len(), 36);
        assert_eq!(mesh.resolved_texture().filename(), "test.png");
        assert_eq!(mesh.texture.filename(), "missing.png");
        assert_eq!(assets.take_notifications().len(), 2);
    }

    #[test]
    fn changing_mesh_drops_loaded_data() {
        let mut assets = assets();
        let mut mesh = MeshComponent::new("cube", "");
        mesh.create(&mut assets);
        let notified = mesh
            .set_property("Mesh", PropertyValue::Mesh(MeshRef::new("plane")))
            .unwrap();
        assert!(notified);
        assert!(mesh.data().is_none());
        mesh.create(&mut assets);
        assert_eq!(mesh.data().unwrap().indices.len(), 6);
    }

    #[test]
    fn body_kind_follows_enum_and_static_flag() {
        let mut mesh = MeshComponent::default();
        assert_eq!(mesh.body_kind(), None);
        mesh = mesh.with_body("Dynamic");
        assert_eq!(mesh.body_kind(), Some(BodyKind::Dynamic));
        mesh.is_static = true;
        assert_eq!(mesh.body_kind(), Some(BodyKind::Static));
        assert!(mesh.capabilities().physical);
    }

    #[test]
    fn skinned_mesh_animates_and_fills_buffer() {
        let mut data = crate::asset::cube();
        data.skeleton.add_joint(Joint::new("root", None)).unwrap();
        let walk = data.skeleton.create_animation("walk");
        walk.add_frame(0, AnimFrame::translation(0.0, Vec3::ZERO));
        walk.add_frame(0, AnimFrame::translation(1.0, Vec3::new(10.0, 0.0, 0.0)));

        let mut mesh = MeshComponent::default().with_animation("walk");
        mesh.data = Some(Arc::new(data.clone()));
        mesh.skeleton = data.skeleton;
        mesh.play_animation("walk");
        mesh.animate(0.5);

        assert!(mesh.is_skinned());
        assert!((mesh.skinning().joints[0].w_axis.x - 5.0).abs() < 1e-4);
        assert_eq!(mesh.player().current_clip(), Some("walk"));
    }
}
