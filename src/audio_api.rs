// the seam between the sequencer and whatever makes noise.
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::SampleBuffer;
use crate::pipeline::project::SoundRef;
use crate::sequencer::Trigger;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub u64);

// atomic so ids stay unique whichever thread loads the sample
pub fn next_sample_id() -> SampleId {
    SampleId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug)]
pub struct TriggerParams {
    pub sample_id: SampleId,
    pub gain: f32,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The audio thread must never touch the disk or the network, so a sound
    // is decoded up front and its buffer registered here first...
    RegisterSample { id: SampleId, buffer: SampleBuffer },

    // ...after which triggering is just an id. Every trigger starts a new
    // voice, it never cuts off one that is still ringing.
    Trigger(TriggerParams),
}

pub trait SoundPlayer {
    /// Get a sound ready ahead of its first trigger. Optional.
    fn prepare(&mut self, sound: &SoundRef) -> anyhow::Result<()> {
        let _ = sound;
        Ok(())
    }

    /// Start playing and return without waiting for it to finish.
    fn play(&mut self, sound: &SoundRef) -> anyhow::Result<()>;
}

// issue every trigger of a tick; one bad sound doesn't stop the rest.
// returns how many failed.
pub fn dispatch_triggers(player: &mut dyn SoundPlayer, triggers: &[Trigger]) -> usize {
    let mut failed = 0;
    for trigger in triggers {
        if let Err(e) = player.play(&trigger.sound) {
            log::warn!(
                "pad {} step {}: could not play {}: {e:#}",
                trigger.pad + 1,
                trigger.step + 1,
                trigger.sound
            );
            failed += 1;
        }
    }
    failed
}
