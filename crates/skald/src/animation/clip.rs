use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Quat, Vec3};

/// A joint's parent-relative pose before it is turned into a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalPose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Affine matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Lerp position and scale, slerp rotation.
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A keyframe: one joint's pose at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimFrame {
    /// Seconds from the start of the clip.
    pub time: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl AnimFrame {
    pub fn new(time: f32, position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            time,
            position,
            rotation,
            scale,
        }
    }

    /// A translation-only keyframe.
    pub fn translation(time: f32, position: Vec3) -> Self {
        Self::new(time, position, Quat::IDENTITY, Vec3::ONE)
    }

    pub fn pose(&self) -> LocalPose {
        LocalPose {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// A keyframed clip: per-joint frame lists, each ordered by time.
///
/// Joints without frames are not animated by this clip and hold their bind
/// pose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    frames: BTreeMap<usize, Vec<AnimFrame>>,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe for `joint`, keeping the list sorted by time.
    /// Frames with equal times keep insertion order.
    pub fn add_frame(&mut self, joint: usize, frame: AnimFrame) {
        let frames = self.frames.entry(joint).or_default();
        let at = frames.partition_point(|f| f.time <= frame.time);
        frames.insert(at, frame);
    }

    pub fn frames(&self, joint: usize) -> &[AnimFrame] {
        self.frames.get(&joint).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Joint indices that have at least one frame.
    pub fn animated_joints(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.keys().copied()
    }

    /// The latest keyframe time across all joints, `0` for an empty clip.
    pub fn final_time(&self) -> f32 {
        self.frames
            .values()
            .flatten()
            .map(|f| f.time)
            .fold(0.0, f32::max)
    }

    /// Sample `joint` at time `t`.
    ///
    /// Returns `None` when the joint has fewer than two frames, so the caller
    /// keeps the bind pose. Times before the first or after the last frame
    /// clamp to that frame. A time equal to a frame's time returns that frame
    /// unchanged. A NaN time reads as the first frame.
    pub fn sample(&self, joint: usize, t: f32) -> Option<LocalPose> {
        let frames = self.frames(joint);
        if frames.len() < 2 {
            return None;
        }
        let first = &frames[0];
        let last = &frames[frames.len() - 1];
        if t.is_nan() || t <= first.time {
            return Some(first.pose());
        }
        if t >= last.time {
            return Some(last.pose());
        }

        // First frame strictly after t; its predecessor is at or before t.
        let next = frames.partition_point(|f| f.time <= t);
        let (a, b) = (&frames[next - 1], &frames[next]);
        if t == a.time {
            return Some(a.pose());
        }
        let span = b.time - a.time;
        let fraction = if span > 0.0 { (t - a.time) / span } else { 1.0 };
        Some(a.pose().interpolate(&b.pose(), fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_frame_clip() -> Animation {
        let mut clip = Animation::new();
        clip.add_frame(0, AnimFrame::translation(0.0, Vec3::ZERO));
        clip.add_frame(0, AnimFrame::translation(1.0, Vec3::new(10.0, 0.0, 0.0)));
        clip
    }

    #[test]
    fn midpoint_is_halfway() {
        let pose = two_frame_clip().sample(0, 0.5).unwrap();
        assert!((pose.position.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn exact_frame_time_reproduces_frame() {
        let mut clip = two_frame_clip();
        let key = AnimFrame::new(
            0.4,
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.3),
            Vec3::splat(1.5),
        );
        clip.add_frame(0, key);
        assert_eq!(clip.sample(0, 0.4), Some(key.pose()));
        assert_eq!(clip.sample(0, 1.0).unwrap().position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn clamps_outside_range() {
        let clip = two_frame_clip();
        assert_eq!(clip.sample(0, -1.0).unwrap().position, Vec3::ZERO);
        assert_eq!(clip.sample(0, 5.0).unwrap().position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn nan_time_reads_first_frame() {
        let clip = two_frame_clip();
        assert_eq!(clip.sample(0, f32::NAN).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn fewer_than_two_frames_holds_bind_pose() {
        let mut clip = Animation::new();
        assert!(clip.sample(3, 0.5).is_none());
        clip.add_frame(3, AnimFrame::translation(0.0, Vec3::X));
        assert!(clip.sample(3, 0.5).is_none());
    }

    #[test]
    fn frames_are_kept_sorted() {
        let mut clip = Animation::new();
        clip.add_frame(0, AnimFrame::translation(2.0, Vec3::Y));
        clip.add_frame(0, AnimFrame::translation(0.5, Vec3::X));
        clip.add_frame(0, AnimFrame::translation(1.0, Vec3::Z));
        let times: Vec<_> = clip.frames(0).iter().map(|f| f.time).collect();
        assert_eq!(times, [0.5, 1.0, 2.0]);
    }

    #[test]
    fn final_time_is_max_over_joints() {
        let mut clip = two_frame_clip();
        clip.add_frame(4, AnimFrame::translation(2.5, Vec3::ZERO));
        assert_eq!(clip.final_time(), 2.5);
        assert_eq!(Animation::new().final_time(), 0.0);
    }

    #[test]
    fn rotation_is_slerped() {
        let mut clip = Animation::new();
        clip.add_frame(0, AnimFrame::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE));
        clip.add_frame(
            0,
            AnimFrame::new(1.0, Vec3::ZERO, Quat::from_rotation_y(1.0), Vec3::ONE),
        );
        let pose = clip.sample(0, 0.5).unwrap();
        assert!(pose.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-4);
    }
}
