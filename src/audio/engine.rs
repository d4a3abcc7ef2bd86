use std::collections::HashMap;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, SampleId, TriggerParams};

pub const MAX_VOICES: usize = 32; // hard cap so the voice list never grows in the callback

// lives inside the output callback; only ever touched from the audio thread
pub struct Engine {
    samples: HashMap<SampleId, SampleBuffer>,
    voices: Vec<Voice>, // oldest first
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            samples: HashMap::new(),
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                self.samples.insert(id, buffer);
            }
            AudioCommand::Trigger(t) => self.trigger_voice(t),
        }
    }

    fn trigger_voice(&mut self, t: TriggerParams) {
        if !self.samples.contains_key(&t.sample_id) {
            return; // never registered, nothing to play
        }
        // a retrigger stacks on top of the old voice; when full, steal the oldest
        if self.voices.len() == MAX_VOICES {
            self.voices.remove(0);
        }
        self.voices.push(Voice::new(t.sample_id, t.gain));
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for voice in &mut self.voices {
            match self.samples.get(&voice.sample_id) {
                Some(buffer) => voice.render_into(buffer, out),
                None => voice.active = false,
            }
        }
        self.voices.retain(|v| v.active);
        for frame in out.iter_mut() {
            *frame = frame.clipped();
        }
    }
}
