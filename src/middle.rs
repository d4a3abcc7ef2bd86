// The middle layer: sits between the tui and the sequencer.
//
//   - the tui sends semantic `InputEvent`s, we turn them into sequencer calls
//   - anything that needs the network or the disk comes back out as a
//     `UiAction` for main to perform
//   - every frame the tui asks for a `DisplayState` and just draws it
//
// Front-end-only state (the catalog, which entry the sound selector is on,
// the status line) lives here so the sequencer stays UI agnostic.

use std::time::Duration;

use crate::config::TempoRange;
use crate::pipeline::project::SoundRef;
use crate::sequencer::clock::Tempo;
use crate::sequencer::{Sequencer, Trigger};
use crate::shared::{
    CellState, DisplayState, InputEvent, PadView, UiAction, NUM_PADS, STEPS_PER_PATTERN,
};
use crate::tui::theme;

pub const NO_PAD_SELECTED: &str = "Please select a pad to load the sound.";

pub struct Middle {
    pub sequencer: Sequencer,
    tempo_range: TempoRange,
    catalog: Vec<String>,
    catalog_index: usize,
    theme: String,
    status: String,
}

impl Middle {
    pub fn new(tempo_range: TempoRange, tempo: Tempo, catalog: Vec<String>, theme: &str) -> Self {
        let mut middle = Self {
            sequencer: Sequencer::new(tempo),
            tempo_range,
            catalog: Vec::new(),
            catalog_index: 0,
            theme: theme.to_string(),
            status: String::new(),
        };
        middle.set_catalog(catalog);
        middle
    }

    pub fn set_catalog(&mut self, catalog: Vec<String>) {
        self.status = if catalog.is_empty() {
            String::from("No sounds available (r to retry)")
        } else {
            format!("{} sounds loaded", catalog.len())
        };
        self.catalog_index = self.catalog_index.min(catalog.len().saturating_sub(1));
        self.catalog = catalog;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // what `ApplySound` would assign right now
    pub fn selected_sound(&self) -> Option<SoundRef> {
        self.catalog
            .get(self.catalog_index)
            .map(|file| SoundRef::from_catalog_entry(file))
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<UiAction> {
        match event {
            InputEvent::ToggleStep { pad, step } => {
                self.sequencer.toggle_step(pad, step);
                vec![]
            }
            InputEvent::PadPress(pad) => {
                // pressing the selected pad again deselects it
                if self.sequencer.selected_pad() == Some(pad) {
                    self.sequencer.deselect_pad();
                } else {
                    self.sequencer.select_pad(pad);
                }
                vec![]
            }
            InputEvent::PrevSound => {
                self.catalog_index = self.catalog_index.saturating_sub(1);
                vec![]
            }
            InputEvent::NextSound => {
                if self.catalog_index + 1 < self.catalog.len() {
                    self.catalog_index += 1;
                }
                vec![]
            }
            InputEvent::ApplySound => self.apply_sound(),
            InputEvent::Play => {
                self.sequencer.start();
                vec![]
            }
            InputEvent::Stop => {
                self.sequencer.stop();
                vec![]
            }
            InputEvent::AdjustTempo(delta) => {
                match self.tempo_range.nudge(self.sequencer.tempo(), delta) {
                    Ok(tempo) => self.sequencer.set_tempo(tempo),
                    Err(e) => log::warn!("ignoring tempo change: {e:#}"),
                }
                vec![]
            }
            InputEvent::NextTheme => {
                self.theme = theme::next_theme_name(&self.theme).to_string();
                vec![UiAction::PersistTheme(self.theme.clone())]
            }
            InputEvent::ReloadCatalog => vec![UiAction::ReloadCatalog],
            InputEvent::Quit => vec![], // main handles quitting
        }
    }

    fn apply_sound(&mut self) -> Vec<UiAction> {
        let Some(sound) = self.selected_sound() else {
            self.status = String::from("No sound to load");
            return vec![];
        };
        match self.sequencer.assign_to_selected(sound.clone()) {
            Some(pad) => {
                self.status = format!("Pad {} loaded {}", pad + 1, sound.file_name());
                vec![UiAction::PreloadSound(sound)]
            }
            None => {
                log::warn!("sound apply with no pad selected");
                self.status = String::from(NO_PAD_SELECTED);
                vec![]
            }
        }
    }

    pub fn tick(&mut self, elapsed: Duration) -> Vec<Trigger> {
        self.sequencer.advance(elapsed)
    }

    pub fn display_state(&self) -> DisplayState {
        let seq = &self.sequencer;
        let pads = seq
            .pads()
            .iter()
            .enumerate()
            .map(|(i, pad)| PadView {
                label: pad.label(i),
                loaded: pad.is_loaded(),
                selected: seq.selected_pad() == Some(i),
            })
            .collect();

        let mut cells = [[CellState::Off; STEPS_PER_PATTERN]; NUM_PADS];
        for (pad, row) in cells.iter_mut().enumerate() {
            for (step, cell) in row.iter_mut().enumerate() {
                *cell = if seq.is_step_playing(pad, step) {
                    CellState::Playing
                } else if seq.is_step_enabled(pad, step) {
                    CellState::On
                } else {
                    CellState::Off
                };
            }
        }

        DisplayState {
            pads,
            cells,
            playing: seq.is_running(),
            cursor_step: seq.cursor(),
            bpm: seq.tempo().bpm(),
            selected_sound: self.catalog.get(self.catalog_index).cloned(),
            catalog_len: self.catalog.len(),
            theme: self.theme.clone(),
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn middle(catalog: &[&str]) -> Middle {
        let range = TempoRange::default();
        Middle::new(
            range,
            range.default_tempo().unwrap(),
            catalog.iter().map(|s| s.to_string()).collect(),
            "default",
        )
    }

    #[test]
    fn pad_press_toggles_exclusive_selection() {
        let mut m = middle(&[]);
        m.handle_input(InputEvent::PadPress(0));
        m.handle_input(InputEvent::PadPress(1));
        assert_eq!(m.sequencer.selected_pad(), Some(1));
        m.handle_input(InputEvent::PadPress(1));
        assert_eq!(m.sequencer.selected_pad(), None);

        let ds = m.display_state();
        assert!(ds.pads.iter().all(|p| !p.selected));
    }

    #[test]
    fn apply_without_selection_warns_and_changes_nothing() {
        let mut m = middle(&["kick.wav"]);
        let actions = m.handle_input(InputEvent::ApplySound);
        assert!(actions.is_empty());
        assert_eq!(m.display_state().status, NO_PAD_SELECTED);
        assert!(m.sequencer.pads().iter().all(|p| !p.is_loaded()));
    }

    #[test]
    fn apply_assigns_the_selector_entry_and_preloads_it() {
        let mut m = middle(&["kick.wav", "snare.mp3"]);
        m.handle_input(InputEvent::PadPress(2));
        m.handle_input(InputEvent::NextSound);
        let actions = m.handle_input(InputEvent::ApplySound);

        let snare = SoundRef::from_catalog_entry("snare.mp3");
        assert_eq!(actions, vec![UiAction::PreloadSound(snare.clone())]);
        assert_eq!(m.sequencer.pads()[2].sound, Some(snare));
        assert_eq!(m.display_state().pads[2].label, "Pad 3 (snare.mp3)");
    }

    #[test]
    fn selector_stays_inside_the_catalog() {
        let mut m = middle(&["a.wav", "b.wav"]);
        m.handle_input(InputEvent::PrevSound);
        assert_eq!(m.selected_sound(), Some(SoundRef::from_catalog_entry("a.wav")));
        for _ in 0..5 {
            m.handle_input(InputEvent::NextSound);
        }
        assert_eq!(m.selected_sound(), Some(SoundRef::from_catalog_entry("b.wav")));

        m.set_catalog(vec![]);
        assert_eq!(m.selected_sound(), None);
        m.handle_input(InputEvent::PadPress(0));
        assert!(m.handle_input(InputEvent::ApplySound).is_empty());
    }

    #[test]
    fn tempo_nudges_are_clamped() {
        let mut m = middle(&[]);
        for _ in 0..100 {
            m.handle_input(InputEvent::AdjustTempo(10.0));
        }
        assert_eq!(m.display_state().bpm, 300.0);
        for _ in 0..100 {
            m.handle_input(InputEvent::AdjustTempo(-10.0));
        }
        assert_eq!(m.display_state().bpm, 40.0);
    }

    #[test]
    fn theme_cycles_and_asks_to_be_saved() {
        let mut m = middle(&[]);
        let actions = m.handle_input(InputEvent::NextTheme);
        assert_eq!(actions, vec![UiAction::PersistTheme(String::from("dark"))]);
        assert_eq!(m.display_state().theme, "dark");
    }

    #[test]
    fn playback_shows_up_in_the_display() {
        let mut m = middle(&["kick.wav"]);
        m.handle_input(InputEvent::PadPress(0));
        m.handle_input(InputEvent::ApplySound);
        m.handle_input(InputEvent::ToggleStep { pad: 0, step: 0 });
        m.handle_input(InputEvent::ToggleStep { pad: 0, step: 1 });
        m.handle_input(InputEvent::Play);

        let triggers = m.tick(Duration::from_millis(125));
        assert_eq!(triggers.len(), 1);
        let ds = m.display_state();
        assert!(ds.playing);
        assert_eq!(ds.cursor_step, 1);
        assert_eq!(ds.cells[0][0], CellState::Playing);
        assert_eq!(ds.cells[0][1], CellState::On);

        m.handle_input(InputEvent::Stop);
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.cursor_step, 0);
        assert_eq!(ds.cells[0][0], CellState::On);
    }
}
