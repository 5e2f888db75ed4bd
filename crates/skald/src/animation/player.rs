use crate::error::Result;

use super::skeleton::{Blend, Skeleton};

/// Playback state of one animated mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackState {
    #[default]
    NoAnimation,
    Playing {
        clip: String,
        time: f32,
    },
    /// Cross-fading from `clip` toward `next` until `clip` reaches its end.
    Blending {
        clip: String,
        next: String,
        time: f32,
        factor: f32,
    },
}

/// Drives a [`Skeleton`] through its clips over time.
///
/// ```text
/// NoAnimation ──play──► Playing ──blend_to──► Blending
///      ▲                  ▲   │ wraps to 0        │ clip ends
///      └──────stop────────┘   ◄───────────────────┘ Playing(next)
/// ```
///
/// Looping lives here, not in [`Animation`](super::Animation): when the time
/// passes the clip's final keyframe it wraps back to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlayer {
    state: PlaybackState,
    /// Playback rate multiplier.
    pub speed: f32,
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self {
            state: PlaybackState::NoAnimation,
            speed: 1.0,
        }
    }
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Start `clip` from time 0.
    pub fn play(&mut self, clip: impl Into<String>) {
        self.state = PlaybackState::Playing {
            clip: clip.into(),
            time: 0.0,
        };
    }

    /// Cross-fade toward `next` with a fixed weight. Starts `next` directly
    /// if nothing is playing.
    pub fn blend_to(&mut self, next: impl Into<String>, factor: f32) {
        let next = next.into();
        self.state = match std::mem::take(&mut self.state) {
            PlaybackState::NoAnimation => PlaybackState::Playing {
                clip: next,
                time: 0.0,
            },
            PlaybackState::Playing { clip, time } | PlaybackState::Blending { clip, time, .. } => {
                PlaybackState::Blending {
                    clip,
                    next,
                    time,
                    factor,
                }
            }
        };
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::NoAnimation;
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlaybackState::NoAnimation
    }

    /// The clip currently driving the pose.
    pub fn current_clip(&self) -> Option<&str> {
        match &self.state {
            PlaybackState::NoAnimation => None,
            PlaybackState::Playing { clip, .. } | PlaybackState::Blending { clip, .. } => Some(clip),
        }
    }

    pub fn time(&self) -> f32 {
        match &self.state {
            PlaybackState::NoAnimation => 0.0,
            PlaybackState::Playing { time, .. } | PlaybackState::Blending { time, .. } => *time,
        }
    }

    /// Move time forward by `dt` and pose `skeleton`. Does nothing while
    /// stopped, so the last pose holds.
    pub fn advance(&mut self, dt: f32, skeleton: &mut Skeleton) -> Result<()> {
        let step = dt * self.speed;
        match &mut self.state {
            PlaybackState::NoAnimation => Ok(()),
            PlaybackState::Playing { clip, time } => {
                *time += step;
                if *time >= skeleton.animation(clip)?.final_time() {
                    *time = 0.0;
                }
                skeleton.evaluate(clip, *time, None)
            }
            PlaybackState::Blending {
                clip,
                next,
                time,
                factor,
            } => {
                *time += step;
                if *time >= skeleton.animation(clip)?.final_time() {
                    let next = std::mem::take(next);
                    self.state = PlaybackState::Playing {
                        clip: next.clone(),
                        time: 0.0,
                    };
                    return skeleton.evaluate(&next, 0.0, None);
                }
                let blend = Blend {
                    target: next.as_str(),
                    factor: *factor,
                };
                skeleton.evaluate(clip, *time, Some(blend))
            }
        }
    }
}
