//! The step sequencer engine.
//!
//! Owns the pads, the step grid and the playback cursor, and turns elapsed
//! time into [`Trigger`]s. It knows nothing about terminals or audio devices:
//! the host calls the methods below from its input handlers, feeds
//! [`Sequencer::advance`] from its main loop, and hands the returned triggers
//! to whatever plays sounds.

pub mod clock;

use std::time::Duration;

use crate::pipeline::project::{Pad, SoundRef, StepGrid};
use crate::shared::{NUM_PADS, STEPS_PER_PATTERN};
use clock::{step_period, StepTimer, Tempo};

/// One fire-and-forget playback request produced by a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub pad: usize,
    pub step: usize,
    pub sound: SoundRef,
}

#[derive(Clone, Debug)]
pub struct Sequencer {
    pads: [Pad; NUM_PADS],
    steps: StepGrid,
    active_steps: StepGrid, // cells that fired on the most recent tick
    selected_pad: Option<usize>,
    cursor: usize,
    tempo: Tempo,
    timer: Option<StepTimer>, // Some while running
}

impl Sequencer {
    pub fn new(tempo: Tempo) -> Self {
        Self {
            pads: std::array::from_fn(|_| Pad::default()),
            steps: StepGrid::default(),
            active_steps: StepGrid::default(),
            selected_pad: None,
            cursor: 0,
            tempo,
            timer: None,
        }
    }

    // ── transport ─────────────────────────────────────────────────

    /// Starts the step timer. Does nothing if already running.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        self.timer = Some(StepTimer::new(step_period(self.tempo)));
        log::info!("playback started at {} bpm", self.tempo.bpm());
    }

    /// Cancels the timer, rewinds to step 0 and clears the playing marks.
    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            log::info!("playback stopped");
        }
        self.cursor = 0;
        self.active_steps.clear();
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
        // reschedule, the cursor stays where it is
        if self.timer.is_some() {
            self.timer = Some(StepTimer::new(step_period(tempo)));
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // ── grid / pads ───────────────────────────────────────────────

    pub fn toggle_step(&mut self, pad: usize, step: usize) -> Option<bool> {
        self.steps.toggle(pad, step)
    }

    pub fn is_step_enabled(&self, pad: usize, step: usize) -> bool {
        self.steps.get(pad, step)
    }

    pub fn is_step_playing(&self, pad: usize, step: usize) -> bool {
        self.active_steps.get(pad, step)
    }

    pub fn select_pad(&mut self, pad: usize) {
        if pad < NUM_PADS {
            self.selected_pad = Some(pad);
        }
    }

    pub fn deselect_pad(&mut self) {
        self.selected_pad = None;
    }

    pub fn selected_pad(&self) -> Option<usize> {
        self.selected_pad
    }

    pub fn pads(&self) -> &[Pad; NUM_PADS] {
        &self.pads
    }

    pub fn assign_sound(&mut self, pad: usize, sound: SoundRef) {
        if let Some(slot) = self.pads.get_mut(pad) {
            log::debug!("pad {} <- {}", pad + 1, sound);
            slot.sound = Some(sound);
        }
    }

    /// Assigns to the selected pad and returns its index, or `None` (and no
    /// change) when nothing is selected.
    pub fn assign_to_selected(&mut self, sound: SoundRef) -> Option<usize> {
        let pad = self.selected_pad?;
        self.assign_sound(pad, sound);
        Some(pad)
    }

    // ── playback ──────────────────────────────────────────────────

    /// Evaluates the column under the cursor, then moves the cursor on.
    pub fn tick(&mut self) -> Vec<Trigger> {
        // every pad's marks go, not only the ones that fire now
        self.active_steps.clear();

        let step = self.cursor;
        let mut triggers = Vec::new();
        for (pad, slot) in self.pads.iter().enumerate() {
            if !self.steps.get(pad, step) {
                continue;
            }
            let Some(sound) = &slot.sound else {
                continue;
            };
            triggers.push(Trigger {
                pad,
                step,
                sound: sound.clone(),
            });
            self.active_steps.set(pad, step, true);
        }

        self.cursor = (self.cursor + 1) % STEPS_PER_PATTERN;
        log::trace!("step {step}: {} triggers", triggers.len());
        triggers
    }

    /// Runs one tick per timer firing in `elapsed`. Nothing happens while stopped.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Trigger> {
        let due = match self.timer.as_mut() {
            Some(timer) => timer.advance(elapsed),
            None => return Vec::new(),
        };
        let mut triggers = Vec::new();
        for _ in 0..due {
            triggers.extend(self.tick());
        }
        triggers
    }

    pub fn time_until_tick(&self) -> Option<Duration> {
        self.timer.as_ref().map(StepTimer::remaining)
    }
}
