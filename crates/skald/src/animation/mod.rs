//! # Skeletal Animation
//!
//! A [`Skeleton`] is a parents-first list of [`Joint`]s plus named
//! [`Animation`] clips. A clip stores, per joint index, keyframes
//! ([`AnimFrame`]) ordered by time. An [`AnimationPlayer`] owns the playback
//! state of one mesh instance and poses its skeleton every frame.
//!
//! ## Pose pipeline
//!
//! ```text
//!  clip.sample(joint, t)        lerp/slerp between the two surrounding keys
//!        │ (bind pose if the joint has fewer than two keys)
//!        ▼
//!  blend toward next clip       local pose, weight = blend factor
//!        ▼
//!  model = parent.model * local (parents are always earlier in the list)
//!        ▼
//!  current = model * inverse_bind  ──► SkinningBuffer ──► renderer
//! ```
//!
//! Cross-fades blend the two clips' *local* poses before composing up the
//! chain, so a child joint is blended once rather than once per ancestor.
//!
//! ## Comparison
//!
//! - **Bevy**: `AnimationGraph` with arbitrary blend trees and per-property
//!   curves.
//! - **ozz-animation**: SoA sampling jobs and a separate local-to-model job;
//!   same two-stage split as here.

mod clip;
mod player;
mod skeleton;

pub use clip::{AnimFrame, Animation, LocalPose};
pub use player::{AnimationPlayer, PlaybackState};
pub use skeleton::{Blend, Joint, Skeleton, SkinningBuffer};
