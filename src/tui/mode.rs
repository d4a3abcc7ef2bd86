use crate::shared::{NUM_PADS, STEPS_PER_PATTERN};

// state local to the tui: where the grid cursor is.
// the cursor is resolved into (pad, step) before anything reaches the middle layer.
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub cursor_pad: usize,
    pub cursor_step: usize,
}

impl TuiState {
    pub fn move_cursor(&mut self, d_pad: isize, d_step: isize) {
        self.cursor_pad = wrap(self.cursor_pad, d_pad, NUM_PADS);
        self.cursor_step = wrap(self.cursor_step, d_step, STEPS_PER_PATTERN);
    }
}

fn wrap(value: usize, delta: isize, len: usize) -> usize {
    (value as isize + delta).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_both_ways() {
        let mut ts = TuiState::default();
        ts.move_cursor(-1, -1);
        assert_eq!((ts.cursor_pad, ts.cursor_step), (NUM_PADS - 1, STEPS_PER_PATTERN - 1));
        ts.move_cursor(1, 1);
        assert_eq!((ts.cursor_pad, ts.cursor_step), (0, 0));
    }
}
