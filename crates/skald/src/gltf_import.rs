//! # glTF Import
//!
//! [glTF 2.0](https://www.khronos.org/gltf/) files (`.gltf` + `.bin`, or a
//! single `.glb`) imported into [`MeshData`].
//!
//! ## What We Extract
//!
//! - **Geometry**: every primitive of every mesh merged into one vertex/index
//!   buffer. `POSITION` is required; `NORMAL`, `TEXCOORD_0`, `JOINTS_0` and
//!   `WEIGHTS_0` default when absent.
//! - **Skeleton**: the first skin. Joints are reordered parents-first and the
//!   vertex joint indices remapped to match. Each joint's node transform
//!   becomes its bind pose; inverse bind matrices come from the skin.
//! - **Animations**: channels targeting skin joints. Translation, rotation
//!   and scale channels are merged per joint into [`AnimFrame`]s at the union
//!   of their key times; a property without a channel holds its bind value.
//!
//! ## What We Skip
//!
//! - Materials and textures (mesh components carry their own texture ref)
//! - Morph targets, additional skins, cubic-spline tangents
//!
//! ## Comparison
//!
//! - **Bevy**: full scene spawning with per-node entities and animation
//!   graphs built from channels.
//! - **Our approach**: flatten into one skinned mesh with its clips, which is
//!   what a mesh component consumes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;

use crate::animation::{AnimFrame, Animation, Joint, LocalPose, Skeleton};
use crate::asset::{MeshData, MeshImporter, Vertex};
use crate::error::{EngineError, Result};
use crate::math::{Mat4, Quat, Vec3};

/// [`MeshImporter`] for `.gltf` and `.glb` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfImporter;

impl MeshImporter for GltfImporter {
    fn extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }

    fn import(&self, path: &Path) -> Result<MeshData> {
        let (document, buffers, _images) = gltf::import(path)
            .map_err(|e| EngineError::Import(format!("{}: {e}", path.display())))?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| {
                        EngineError::Import(format!("{}: primitive without POSITION", path.display()))
                    })?
                    .collect();
                let count = positions.len();

                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|iter| iter.collect())
                    .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; count]);
                let uvs: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|iter| iter.into_f32().collect())
                    .unwrap_or_else(|| vec![[0.0, 0.0]; count]);
                let joints: Vec<[u16; 4]> = reader
                    .read_joints(0)
                    .map(|iter| iter.into_u16().collect())
                    .unwrap_or_else(|| vec![[0; 4]; count]);
                let weights: Vec<[f32; 4]> = reader
                    .read_weights(0)
                    .map(|iter| iter.into_f32().collect())
                    .unwrap_or_else(|| vec![[0.0; 4]; count]);

                let base = vertices.len() as u32;
                match reader.read_indices() {
                    Some(read) => indices.extend(read.into_u32().map(|i| base + i)),
                    None => indices.extend(base..base + count as u32),
                }

                for (i, position) in positions.into_iter().enumerate() {
                    vertices.push(Vertex {
                        position,
                        normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                        uv: uvs.get(i).copied().unwrap_or_default(),
                        joints: joints.get(i).copied().unwrap_or_default().map(u32::from),
                        weights: weights.get(i).copied().unwrap_or_default(),
                    });
                }
            }
        }

        let mut data = MeshData::new(vertices, indices);

        if let Some(skin) = document.skins().next() {
            let remap = read_skeleton(&document, &skin, &buffers, &mut data.skeleton)?;
            for vertex in &mut data.vertices {
                for joint in &mut vertex.joints {
                    *joint = remap.get(*joint as usize).copied().unwrap_or(0) as u32;
                }
            }
        }

        log::info!(
            "Imported {} ({} vertices, {} joints, {} animations)",
            path.display(),
            data.vertices.len(),
            data.skeleton.joint_count(),
            data.skeleton.animation_names().count()
        );
        Ok(data)
    }
}

/// Fill `skeleton` from `skin`. Returns the skin-slot → joint-index remap.
fn read_skeleton(
    document: &gltf::Document,
    skin: &gltf::Skin<'_>,
    buffers: &[gltf::buffer::Data],
    skeleton: &mut Skeleton,
) -> Result<Vec<usize>> {
    let nodes: Vec<gltf::Node<'_>> = skin.joints().collect();

    let mut parent_of = HashMap::new();
    for node in document.nodes() {
        for child in node.children() {
            parent_of.insert(child.index(), node.index());
        }
    }
    let skin_slot: HashMap<usize, usize> = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.index(), slot))
        .collect();

    // Nearest ancestor that is also a joint of this skin.
    let skin_parent = |slot: usize| -> Option<usize> {
        let mut node = nodes[slot].index();
        while let Some(&parent) = parent_of.get(&node) {
            if let Some(&s) = skin_slot.get(&parent) {
                return Some(s);
            }
            node = parent;
        }
        None
    };

    let inverse_binds: Vec<Mat4> = skin
        .reader(|buffer| Some(&buffers[buffer.index()]))
        .read_inverse_bind_matrices()
        .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
        .unwrap_or_else(|| vec![Mat4::IDENTITY; nodes.len()]);

    let mut order = Vec::with_capacity(nodes.len());
    let mut placed = vec![false; nodes.len()];
    while order.len() < nodes.len() {
        let before = order.len();
        for slot in 0..nodes.len() {
            if !placed[slot] && skin_parent(slot).is_none_or(|p| placed[p]) {
                placed[slot] = true;
                order.push(slot);
            }
        }
        if order.len() == before {
            return Err(EngineError::Import("skin joints form a cycle".into()));
        }
    }

    let mut remap = vec![0; nodes.len()];
    for (index, &slot) in order.iter().enumerate() {
        remap[slot] = index;
    }

    for &slot in &order {
        let node = &nodes[slot];
        let (t, r, s) = node.transform().decomposed();
        let bind = LocalPose {
            position: Vec3::from(t),
            rotation: Quat::from_array(r),
            scale: Vec3::from(s),
        };
        let name = node
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("joint{}", node.index()));
        let inverse_bind = inverse_binds.get(slot).copied().unwrap_or(Mat4::IDENTITY);
        let parent = skin_parent(slot).map(|p| remap[p]);
        skeleton.add_joint(Joint::new(name, parent).with_bind_pose(bind, inverse_bind))?;
    }

    read_animations(document, buffers, &skin_slot, &remap, skeleton);
    skeleton.reset_to_bind_pose();
    Ok(remap)
}

#[derive(Default)]
struct JointTracks {
    translations: Vec<(f32, Vec3)>,
    rotations: Vec<(f32, Quat)>,
    scales: Vec<(f32, Vec3)>,
}

impl JointTracks {
    /// Sorted union of every channel's key times.
    fn times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = self
            .translations
            .iter()
            .map(|k| k.0)
            .chain(self.rotations.iter().map(|k| k.0))
            .chain(self.scales.iter().map(|k| k.0))
            .collect();
        times.sort_by(f32::total_cmp);
        times.dedup();
        times
    }
}

fn read_animations(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    skin_slot: &HashMap<usize, usize>,
    remap: &[usize],
    skeleton: &mut Skeleton,
) {
    for (i, animation) in document.animations().enumerate() {
        let name = animation
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("animation{i}"));

        let mut tracks: BTreeMap<usize, JointTracks> = BTreeMap::new();
        for channel in animation.channels() {
            let Some(&slot) = skin_slot.get(&channel.target().node().index()) else {
                continue;
            };
            let cubic = channel.sampler().interpolation() == Interpolation::CubicSpline;
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let track = tracks.entry(remap[slot]).or_default();
            match reader.read_outputs() {
                Some(ReadOutputs::Translations(values)) => {
                    track.translations = keys(&times, values.map(Vec3::from).collect(), cubic);
                }
                Some(ReadOutputs::Rotations(values)) => {
                    let values = values.into_f32().map(Quat::from_array).collect();
                    track.rotations = keys(&times, values, cubic);
                }
                Some(ReadOutputs::Scales(values)) => {
                    track.scales = keys(&times, values.map(Vec3::from).collect(), cubic);
                }
                _ => {}
            }
        }

        let mut clip = Animation::new();
        for (joint, track) in &tracks {
            let bind = skeleton
                .joint(*joint)
                .map(|j| j.bind_local)
                .unwrap_or_default();
            for t in track.times() {
                clip.add_frame(
                    *joint,
                    AnimFrame::new(
                        t,
                        sample(&track.translations, t, Vec3::lerp).unwrap_or(bind.position),
                        sample(&track.rotations, t, Quat::slerp).unwrap_or(bind.rotation),
                        sample(&track.scales, t, Vec3::lerp).unwrap_or(bind.scale),
                    ),
                );
            }
        }
        skeleton.insert_animation(name, clip);
    }
}

/// Pair key times with values. Cubic-spline samplers store
/// `(in tangent, value, out tangent)` per key; only the value is kept.
fn keys<T: Copy>(times: &[f32], values: Vec<T>, cubic: bool) -> Vec<(f32, T)> {
    let values: Vec<T> = if cubic {
        values.into_iter().skip(1).step_by(3).collect()
    } else {
        values
    };
    times.iter().copied().zip(values).collect()
}

/// Linearly sample a sorted key list, clamping outside its range.
fn sample<T: Copy>(keys: &[(f32, T)], t: f32, mix: fn(T, T, f32) -> T) -> Option<T> {
    let (first, last) = (keys.first()?, keys.last()?);
    if t.is_nan() || t <= first.0 {
        return Some(first.1);
    }
    if t >= last.0 {
        return Some(last.1);
    }
    let next = keys.partition_point(|k| k.0 <= t);
    let (a, b) = (keys[next - 1], keys[next]);
    let span = b.0 - a.0;
    if span <= 0.0 {
        return Some(b.1);
    }
    Some(mix(a.1, b.1, (t - a.0) / span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_interpolates_and_clamps() {
        let keys = [(0.0, Vec3::ZERO), (2.0, Vec3::new(4.0, 0.0, 0.0))];
        assert_eq!(sample(&keys, 1.0, Vec3::lerp), Some(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(sample(&keys, -1.0, Vec3::lerp), Some(Vec3::ZERO));
        assert_eq!(sample(&keys, 3.0, Vec3::lerp), Some(Vec3::new(4.0, 0.0, 0.0)));
        assert_eq!(sample::<Vec3>(&[], 1.0, Vec3::lerp), None);
        assert_eq!(sample(&keys, f32::NAN, Vec3::lerp), Some(Vec3::ZERO));
    }

    #[test]
    fn cubic_keys_keep_only_values() {
        let times = [0.0, 1.0];
        let values = vec![9.0_f32, 1.0, 9.0, 9.0, 2.0, 9.0];
        assert_eq!(keys(&times, values, true), vec![(0.0, 1.0), (1.0, 2.0)]);
    }

    #[test]
    fn track_times_are_merged() {
        let tracks = JointTracks {
            translations: vec![(0.0, Vec3::ZERO), (1.0, Vec3::X)],
            rotations: vec![(0.5, Quat::IDENTITY), (1.0, Quat::IDENTITY)],
            scales: Vec::new(),
        };
        assert_eq!(tracks.times(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = GltfImporter
            .import(Path::new("/nowhere/missing.glb"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Import(_)));
    }
}
