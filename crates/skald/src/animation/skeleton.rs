use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use crate::config::MAX_SKINNING_JOINTS;
use crate::error::{EngineError, Result};
use crate::math::Mat4;

use super::clip::{Animation, LocalPose};

/// One node of a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Index of the parent joint, `None` for a root. Always lower than this
    /// joint's own index.
    pub parent: Option<usize>,
    /// Rest pose relative to the parent, used when a clip does not animate
    /// this joint.
    pub bind_local: LocalPose,
    /// Inverse of the joint's skeleton-space rest pose.
    pub inverse_bind: Mat4,
    /// Parent-relative pose from the last evaluation.
    pub local_pose: Mat4,
    /// Skeleton-space pose from the last evaluation.
    pub model_pose: Mat4,
    /// Skinning matrix: `model_pose * inverse_bind`.
    pub current_pose: Mat4,
}

impl Joint {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            bind_local: LocalPose::IDENTITY,
            inverse_bind: Mat4::IDENTITY,
            local_pose: Mat4::IDENTITY,
            model_pose: Mat4::IDENTITY,
            current_pose: Mat4::IDENTITY,
        }
    }

    pub fn with_bind_pose(mut self, bind_local: LocalPose, inverse_bind: Mat4) -> Self {
        self.bind_local = bind_local;
        self.inverse_bind = inverse_bind;
        self
    }
}

/// A cross-fade target: the clip to blend toward and its weight.
#[derive(Debug, Clone, Copy)]
pub struct Blend<'a> {
    pub target: &'a str,
    pub factor: f32,
}

/// A joint hierarchy plus the clips that animate it.
///
/// Joints are stored parents-first, so a single forward pass over the list
/// composes every pose from already-updated parents.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
    animations: BTreeMap<String, Animation>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a joint and return its index.
    pub fn add_joint(&mut self, joint: Joint) -> Result<usize> {
        let index = self.joints.len();
        if let Some(parent) = joint.parent {
            if parent >= index {
                return Err(EngineError::InvalidJointParent { index, parent });
            }
        }
        self.joints.push(joint);
        Ok(index)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn find_joint_index(&self, name: &str) -> Result<usize> {
        self.joints
            .iter()
            .position(|j| j.name == name)
            .ok_or_else(|| EngineError::JointNotFound(name.to_owned()))
    }

    /// Create an empty clip, or return the existing one with that name.
    pub fn create_animation(&mut self, name: impl Into<String>) -> &mut Animation {
        self.animations.entry(name.into()).or_default()
    }

    pub fn insert_animation(&mut self, name: impl Into<String>, animation: Animation) {
        self.animations.insert(name.into(), animation);
    }

    pub fn animation(&self, name: &str) -> Result<&Animation> {
        self.animations
            .get(name)
            .ok_or_else(|| EngineError::AnimationNotFound(name.to_owned()))
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    /// Pose every joint from `clip` at time `t`, optionally cross-faded
    /// toward another clip.
    ///
    /// For each joint in index order:
    /// 1. sample the clip (bind pose if it has no frames for the joint)
    /// 2. blend the local pose toward the target clip's pose at `t`
    /// 3. `model = parent.model * local`
    /// 4. `current = model * inverse_bind`
    pub fn evaluate(&mut self, clip: &str, t: f32, blend: Option<Blend<'_>>) -> Result<()> {
        let Self { joints, animations } = self;
        let animation = animations
            .get(clip)
            .ok_or_else(|| EngineError::AnimationNotFound(clip.to_owned()))?;
        let blend = match blend {
            Some(b) => {
                let target = animations
                    .get(b.target)
                    .ok_or_else(|| EngineError::AnimationNotFound(b.target.to_owned()))?;
                Some((target, b.factor))
            }
            None => None,
        };

        for index in 0..joints.len() {
            let mut local = animation
                .sample(index, t)
                .unwrap_or(joints[index].bind_local);
            if let Some((target, factor)) = blend {
                if let Some(to) = target.sample(index, t) {
                    local = local.interpolate(&to, factor);
                }
            }

            let local = local.matrix();
            let model = match joints[index].parent {
                Some(parent) => joints[parent].model_pose * local,
                None => local,
            };
            let joint = &mut joints[index];
            joint.local_pose = local;
            joint.model_pose = model;
            joint.current_pose = model * joint.inverse_bind;
        }
        Ok(())
    }

    /// Put every joint back in its bind pose.
    pub fn reset_to_bind_pose(&mut self) {
        for index in 0..self.joints.len() {
            let local = self.joints[index].bind_local.matrix();
            let model = match self.joints[index].parent {
                Some(parent) => self.joints[parent].model_pose * local,
                None => local,
            };
            let joint = &mut self.joints[index];
            joint.local_pose = local;
            joint.model_pose = model;
            joint.current_pose = model * joint.inverse_bind;
        }
    }

    /// Recompute a joint's skeleton-space pose by walking the parent chain
    /// over the stored local poses, ignoring the cached `model_pose`.
    pub fn model_pose_uncached(&self, index: usize) -> Option<Mat4> {
        let mut pose = self.joints.get(index)?.local_pose;
        let mut parent = self.joints[index].parent;
        while let Some(p) = parent {
            let joint = &self.joints[p];
            pose = joint.local_pose * pose;
            parent = joint.parent;
        }
        Some(pose)
    }

    /// Copy the skinning matrices into an upload buffer.
    ///
    /// Joints past [`MAX_SKINNING_JOINTS`] are dropped with a warning.
    pub fn write_skinning(&self, buffer: &mut SkinningBuffer) {
        if self.joints.len() > MAX_SKINNING_JOINTS {
            log::warn!(
                "Skeleton has {} joints, only the first {MAX_SKINNING_JOINTS} are skinned",
                self.joints.len()
            );
        }
        for (slot, joint) in buffer.joints.iter_mut().zip(&self.joints) {
            *slot = joint.current_pose;
        }
    }
}

/// Per-mesh skinning matrices, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkinningBuffer {
    pub joints: [Mat4; MAX_SKINNING_JOINTS],
}

impl Default for SkinningBuffer {
    fn default() -> Self {
        Self {
            joints: [Mat4::IDENTITY; MAX_SKINNING_JOINTS],
        }
    }
}
