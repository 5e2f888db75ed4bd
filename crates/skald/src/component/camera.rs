use crate::backend::CameraView;
use crate::math::{Mat4, Quat, Transform, Vec3};
use crate::reflect::{Properties, Reflect};

use super::{Capabilities, Component, ComponentBase, SpatialComponent, TickContext};

/// Pitch limit in degrees, so the view never flips over the pole.
const MAX_PITCH: f32 = 80.0;
/// Mouse sensitivity in degrees per pixel.
const LOOK_SPEED: f32 = 0.25;
/// Largest translation offset at full shake.
const MAX_SHAKE: f32 = 0.1;

/// A perspective camera.
///
/// Orientation is kept as yaw and pitch and written into the transform's
/// rotation, so roll never accumulates from repeated mouse-look.
pub struct CameraComponent {
    pub spatial: SpatialComponent,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near_z: f32,
    pub far_z: f32,
    /// Follow the mouse in `tick`.
    pub mouse_look: bool,
    yaw: f32,
    pitch: f32,
    shake_level: f32,
    shake_offset: Vec3,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            fov: 60.0,
            near_z: 0.01,
            far_z: 1000.0,
            mouse_look: false,
            yaw: 0.0,
            pitch: 0.0,
            shake_level: 0.0,
            shake_offset: Vec3::ZERO,
        }
    }
}

impl CameraComponent {
    pub fn new(transform: Transform) -> Self {
        let mut camera = Self::default();
        camera.spatial.transform = transform;
        camera
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Turn by the given angles in degrees. Pitch stops at ±80°.
    pub fn look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = (self.yaw + yaw) % 360.0;
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.spatial.transform.rotation = Quat::from_rotation_y(self.yaw.to_radians())
            * Quat::from_rotation_x(self.pitch.to_radians());
    }

    /// Start a translation shake that fades out over `level` seconds.
    pub fn shake(&mut self, level: f32) {
        self.shake_level = self.shake_level.max(level);
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_level > 0.0
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near_z, self.far_z)
    }

    /// View matrix for a camera placed at `world`, including shake.
    pub fn view_matrix(&self, world: Mat4) -> Mat4 {
        let (_, rotation, position) = world.to_scale_rotation_translation();
        let forward = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;
        let eye = position + self.shake_offset;
        Mat4::look_to_rh(eye, forward, up)
    }

    /// View, projection and eye position from the cached world matrix.
    pub fn view(&self, aspect: f32) -> CameraView {
        let world = self.spatial.transform.cached_world_matrix();
        CameraView {
            view: self.view_matrix(world),
            projection: self.projection_matrix(aspect),
            position: world.w_axis.truncate(),
        }
    }
}

impl Reflect for CameraComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Camera");
        props.add("FOV", &mut self.fov);
        props.add("Near Z", &mut self.near_z);
        props.add("Far Z", &mut self.far_z);
        props.add("Mouse Look", &mut self.mouse_look);
        props
    }
}

impl Component for CameraComponent {
    const TYPE_NAME: &'static str = "CameraComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SPATIAL
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn init(&mut self) {
        let (y, x, _) = self.spatial.transform.rotation.to_euler(glam::EulerRot::YXZ);
        self.yaw = y.to_degrees();
        self.pitch = x.to_degrees().clamp(-MAX_PITCH, MAX_PITCH);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.mouse_look && ctx.input.mouse_delta != crate::math::Vec2::ZERO {
            let delta = ctx.input.mouse_delta * -LOOK_SPEED;
            self.look(delta.x, delta.y);
        }

        if self.shake_level > 0.0 {
            self.shake_level = (self.shake_level - ctx.dt).max(0.0);
            let wobble = (ctx.elapsed * 50.0).sin();
            self.shake_offset = Vec3::splat(MAX_SHAKE * self.shake_level * wobble);
        } else {
            self.shake_offset = Vec3::ZERO;
        }
    }
}
