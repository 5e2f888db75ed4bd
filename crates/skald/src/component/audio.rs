use crate::backend::AudioBackend;
use crate::reflect::{Properties, Reflect};

use super::{Capabilities, Component, ComponentBase, SpatialComponent, TickContext};

/// What the component wants the backend channel to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Request {
    #[default]
    None,
    Play,
    Stop,
}

/// A positioned sound source.
///
/// Gameplay code calls [`play`](Self::play), [`stop`](Self::stop) and
/// [`fade_out`](Self::fade_out); the requests are handed to the
/// [`AudioBackend`] once per frame, keyed by this component's UID.
pub struct AudioComponent {
    pub spatial: SpatialComponent,
    pub file: String,
    pub volume: f32,
    pub looping: bool,
    pub play_on_start: bool,
    request: Request,
    fade: Option<(f32, f32)>,
    current_volume: f32,
    sent_volume: f32,
}

impl Default for AudioComponent {
    fn default() -> Self {
        Self {
            spatial: SpatialComponent::default(),
            file: String::new(),
            volume: 1.0,
            looping: false,
            play_on_start: false,
            request: Request::None,
            fade: None,
            current_volume: 1.0,
            sent_volume: 1.0,
        }
    }
}

impl AudioComponent {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_owned(),
            ..Self::default()
        }
    }

    pub fn play(&mut self) {
        self.request = Request::Play;
        self.fade = None;
        self.current_volume = self.volume;
    }

    pub fn stop(&mut self) {
        self.request = Request::Stop;
        self.fade = None;
    }

    /// Ramp the volume to zero over `secs`, then stop.
    pub fn fade_out(&mut self, secs: f32) {
        if secs <= 0.0 {
            self.stop();
        } else {
            self.fade = Some((secs, secs));
        }
    }

    pub fn current_volume(&self) -> f32 {
        self.current_volume
    }
}

impl Reflect for AudioComponent {
    fn props(&mut self) -> Properties<'_> {
        let mut props = self.spatial.props();
        props.set_title("Audio");
        props.add("Audio File", &mut self.file).autocomplete("audio");
        props.add("Volume", &mut self.volume);
        props.add("Loop", &mut self.looping);
        props.add("Play On Start", &mut self.play_on_start);
        props
    }
}

impl Component for AudioComponent {
    const TYPE_NAME: &'static str = "AudioComponent";

    fn base(&self) -> &ComponentBase {
        &self.spatial.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.spatial.base
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            audio: true,
            ..Capabilities::SPATIAL
        }
    }

    fn spatial(&self) -> Option<&SpatialComponent> {
        Some(&self.spatial)
    }

    fn spatial_mut(&mut self) -> Option<&mut SpatialComponent> {
        Some(&mut self.spatial)
    }

    fn start(&mut self) {
        if self.play_on_start {
            self.play();
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        if let Some((left, total)) = self.fade {
            let left = left - ctx.dt;
            if left <= 0.0 {
                self.stop();
            } else {
                self.current_volume = self.volume * left / total;
                self.fade = Some((left, total));
            }
        }
    }

    fn sync_audio(&mut self, audio: &mut dyn AudioBackend) {
        let uid = self.spatial.base.uid;
        match std::mem::take(&mut self.request) {
            Request::Play if !self.file.is_empty() => {
                audio.play(uid, &self.file, self.current_volume, self.looping);
                self.sent_volume = self.current_volume;
            }
            Request::Play => log::warn!("{}: no audio file to play", self.spatial.base.name),
            Request::Stop => audio.stop(uid),
            Request::None => {
                if self.current_volume != self.sent_volume && audio.is_playing(uid) {
                    audio.set_volume(uid, self.current_volume);
                    self.sent_volume = self.current_volume;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SilentAudio;
    use crate::command::CommandQueue;
    use crate::input::InputState;
    use crate::uid::Uid;

    fn tick(audio: &mut AudioComponent, dt: f32) {
        let input = InputState::new();
        let mut commands = CommandQueue::new();
        audio.tick(&mut TickContext {
            dt,
            elapsed: 0.0,
            input: &input,
            commands: &mut commands,
        });
    }

    #[test]
    fn play_on_start_reaches_backend() {
        let mut backend = SilentAudio::default();
        let mut source = AudioComponent::new("rain.wav");
        source.spatial.base.uid = Uid::new();
        source.play_on_start = true;
        source.start();
        source.sync_audio(&mut backend);
        assert!(backend.is_playing(source.spatial.base.uid));
    }

    #[test]
    fn fade_out_lowers_volume_then_stops() {
        let mut backend = SilentAudio::default();
        let mut source = AudioComponent::new("rain.wav");
        let uid = Uid::new();
        source.spatial.base.uid = uid;
        source.play();
        source.sync_audio(&mut backend);

        source.fade_out(1.0);
        tick(&mut source, 0.5);
        source.sync_audio(&mut backend);
        assert!((backend.volume(uid).unwrap() - 0.5).abs() < 1e-4);

        tick(&mut source, 0.6);
        source.sync_audio(&mut backend);
        assert!(!backend.is_playing(uid));
    }
}
