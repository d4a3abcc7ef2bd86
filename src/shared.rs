// Types shared between the tui and the middle layer.
//
// The tui resolves raw keys into semantic `InputEvent`s (it owns the grid
// cursor), the middle layer turns those into sequencer calls and hands back
// `UiAction`s for the things only main can do (network, disk). Every frame
// the tui just draws whatever `DisplayState` it is given.

use crate::pipeline::project::SoundRef;

pub const NUM_PADS: usize = 16;
pub const STEPS_PER_PATTERN: usize = 16;
pub const STEPS_PER_BEAT: u32 = 4; // sixteenth notes

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // grid cell under the cursor
    ToggleStep { pad: usize, step: usize },
    // select / deselect the pad under the cursor
    PadPress(usize),

    // sound selector
    PrevSound,
    NextSound,
    ApplySound,

    // transport
    Play,
    Stop,
    AdjustTempo(f64), // bpm delta

    NextTheme,
    ReloadCatalog,

    Quit,
}

// side effects the middle layer asks main to perform
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    PreloadSound(SoundRef),
    PersistTheme(String),
    ReloadCatalog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Off,
    On,
    Playing, // fired on the last tick
}

#[derive(Clone, Debug)]
pub struct PadView {
    pub label: String,
    pub loaded: bool,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub pads: Vec<PadView>,
    pub cells: [[CellState; STEPS_PER_PATTERN]; NUM_PADS],
    pub playing: bool,
    pub cursor_step: usize, // next step the sequencer will evaluate
    pub bpm: f64,
    pub selected_sound: Option<String>, // file name currently in the selector
    pub catalog_len: usize,
    pub theme: String,
    pub status: String,
}
