//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] holds the local position, rotation and
//! scale of a spatial component plus its cached world matrix; [`BoundingBox`]
//! is the oriented box used for bounds and trigger volumes.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// A local-space transform: position, rotation (quaternion) and scale.
///
/// The local matrix is always derived from the three fields
/// (translate ∘ rotate ∘ scale, no shear), so it can never go stale. The world
/// matrix is cached here and refreshed by
/// [`World::propagate_transforms`](crate::world::World::propagate_transforms);
/// code that needs an exact value mid-frame asks the world for the live
/// product instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    world: Mat4,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        world: Mat4::IDENTITY,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Build from an affine matrix. Shear is discarded.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let mut transform = Self::IDENTITY;
        transform.decompose(matrix);
        transform
    }

    /// Return a copy rotated to look at `target` from the current position.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let look = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = look.inverse().to_scale_rotation_translation();
        self.rotation = rotation;
        self
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// The parent-relative matrix.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// The world matrix as of the last propagation.
    pub fn cached_world_matrix(&self) -> Mat4 {
        self.world
    }

    pub(crate) fn set_cached_world_matrix(&mut self, world: Mat4) {
        self.world = world;
    }

    /// Overwrite position, rotation and scale from an affine matrix.
    pub fn decompose(&mut self, matrix: Mat4) {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An oriented bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub center: Vec3,
    /// Half-size along each local axis.
    pub extents: Vec3,
    pub orientation: Quat,
}

impl BoundingBox {
    /// A unit cube centred on the origin.
    pub const UNIT: Self = Self {
        center: Vec3::ZERO,
        extents: Vec3::splat(0.5),
        orientation: Quat::IDENTITY,
    };

    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents,
            orientation: Quat::IDENTITY,
        }
    }

    /// The axis-aligned box enclosing `points`. Empty input gives a zero box.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        if !any {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        }
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Move the box into the space described by `matrix`.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let (scale, rotation, _) = matrix.to_scale_rotation_translation();
        Self {
            center: matrix.transform_point3(self.center),
            extents: self.extents * scale.abs(),
            orientation: rotation * self.orientation,
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let local = self.orientation.inverse() * (point - self.center);
        local.abs().cmple(self.extents).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UNIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_matrix_is_translate_rotate_scale() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
            ..Transform::IDENTITY
        };
        let p = t.local_matrix().transform_point3(Vec3::X);
        // Scale to (2,0,0), rotate +90° about Y to (0,0,-2), translate.
        assert!((p - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-4);
    }

    #[test]
    fn decompose_round_trips() {
        let original = Transform::from_xyz(4.0, -1.0, 0.5)
            .with_rotation(Quat::from_rotation_x(0.3))
            .with_scale(1.5);
        let rebuilt = Transform::from_matrix(original.local_matrix());
        assert!((rebuilt.position - original.position).length() < 1e-4);
        assert!(rebuilt.rotation.angle_between(original.rotation) < 1e-4);
        assert!((rebuilt.scale - original.scale).length() < 1e-4);
    }

    #[test]
    fn direction_vectors_follow_rotation() {
        let t = Transform::IDENTITY;
        assert_eq!(t.forward(), Vec3::NEG_Z);
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.up(), Vec3::Y);

        let turned = t.with_rotation(Quat::from_rotation_y(std::f32::consts::PI));
        assert!((turned.forward() - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn bounding_box_from_points() {
        let b = BoundingBox::from_points([Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 2.0, 4.0)]);
        assert_eq!(b.center, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(b.extents, Vec3::new(2.0, 1.0, 2.0));
        assert!(b.contains_point(Vec3::new(0.0, 1.0, 1.0)));
        assert!(!b.contains_point(Vec3::new(0.0, 5.0, 1.0)));
    }

    #[test]
    fn transformed_box_moves_and_rotates() {
        let b = BoundingBox::UNIT.transformed(
            Transform::from_xyz(10.0, 0.0, 0.0)
                .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4))
                .local_matrix(),
        );
        assert!(b.contains_point(Vec3::new(10.0, 0.0, 0.0)));
        // Corner of the unrotated box lies outside once rotated 45°.
        assert!(!b.contains_point(Vec3::new(10.45, 0.45, 0.0)));
        assert!(!BoundingBox::UNIT.contains_point(Vec3::new(10.0, 0.0, 0.0)));
    }
}
