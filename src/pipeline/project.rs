// the pad / grid data the sequencer mutates in place.
// everything here is fixed size and created once; nothing is ever resized.

use std::fmt;

use crate::catalog::server::SOUNDS_PATH;
use crate::shared::{NUM_PADS, STEPS_PER_PATTERN};

/// URI of a sound the catalog service can serve, always `/sounds/<file>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundRef(String);

impl SoundRef {
    pub fn from_catalog_entry(file: &str) -> Self {
        Self(format!("{SOUNDS_PATH}{file}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // last path segment, what we show next to the pad
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl fmt::Display for SoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// one of the 16 voices
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pad {
    pub sound: Option<SoundRef>,
}

impl Pad {
    pub fn is_loaded(&self) -> bool {
        self.sound.is_some()
    }

    pub fn label(&self, index: usize) -> String {
        match &self.sound {
            Some(sound) => format!("Pad {} ({})", index + 1, sound.file_name()),
            None => format!("Pad {}", index + 1),
        }
    }
}

/// (pad, step) -> bool. Out-of-range reads are `false`, writes are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepGrid {
    cells: [[bool; STEPS_PER_PATTERN]; NUM_PADS],
}

impl Default for StepGrid {
    fn default() -> Self {
        Self {
            cells: [[false; STEPS_PER_PATTERN]; NUM_PADS],
        }
    }
}

impl StepGrid {
    pub fn get(&self, pad: usize, step: usize) -> bool {
        self.cells
            .get(pad)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, pad: usize, step: usize, value: bool) {
        if let Some(cell) = self.cells.get_mut(pad).and_then(|row| row.get_mut(step)) {
            *cell = value;
        }
    }

    // returns the new value, None when out of range
    pub fn toggle(&mut self, pad: usize, step: usize) -> Option<bool> {
        let cell = self.cells.get_mut(pad)?.get_mut(step)?;
        *cell = !*cell;
        Some(*cell)
    }

    pub fn clear(&mut self) {
        self.cells = [[false; STEPS_PER_PATTERN]; NUM_PADS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_ref_points_at_the_sounds_route() {
        let sound = SoundRef::from_catalog_entry("kick.wav");
        assert_eq!(sound.as_str(), "/sounds/kick.wav");
        assert!(sound.as_str().starts_with(SOUNDS_PATH));
        assert_eq!(sound.file_name(), "kick.wav");
        assert_eq!(sound.extension(), Some("wav"));
    }

    #[test]
    fn pad_label_shows_the_loaded_file() {
        let mut pad = Pad::default();
        assert_eq!(pad.label(0), "Pad 1");
        pad.sound = Some(SoundRef::from_catalog_entry("snare.mp3"));
        assert_eq!(pad.label(3), "Pad 4 (snare.mp3)");
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut grid = StepGrid::default();
        for pad in 0..NUM_PADS {
            for step in 0..STEPS_PER_PATTERN {
                let before = grid.get(pad, step);
                grid.toggle(pad, step);
                grid.toggle(pad, step);
                assert_eq!(grid.get(pad, step), before);
            }
        }
    }

    #[test]
    fn out_of_range_cells_are_ignored() {
        let mut grid = StepGrid::default();
        assert_eq!(grid.toggle(NUM_PADS, 0), None);
        assert_eq!(grid.toggle(0, STEPS_PER_PATTERN), None);
        grid.set(NUM_PADS, 0, true);
        assert!(!grid.get(NUM_PADS, 0));
        assert_eq!(grid, StepGrid::default());
    }
}
