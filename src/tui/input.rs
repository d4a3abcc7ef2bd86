use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::TuiState;
use crate::shared::InputEvent;

// Keys:
//   arrows          move the grid cursor
//   enter / x       toggle the step under the cursor
//   p               select / deselect the pad under the cursor
//   , / .           previous / next sound in the catalog
//   l               load that sound onto the selected pad
//   space           play
//   backspace / s   stop
//   - / =           tempo -1 / +1,  _ / +  tempo -10 / +10
//   t               next theme
//   r               reload the catalog
//   esc             quit

// poll for one key, resolve it against the cursor into semantic events
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],

        KeyCode::Up => { ts.move_cursor(-1, 0); vec![] }
        KeyCode::Down => { ts.move_cursor(1, 0); vec![] }
        KeyCode::Left => { ts.move_cursor(0, -1); vec![] }
        KeyCode::Right => { ts.move_cursor(0, 1); vec![] }

        KeyCode::Enter | KeyCode::Char('x') => vec![InputEvent::ToggleStep {
            pad: ts.cursor_pad,
            step: ts.cursor_step,
        }],
        KeyCode::Char('p') => vec![InputEvent::PadPress(ts.cursor_pad)],

        KeyCode::Char(',') => vec![InputEvent::PrevSound],
        KeyCode::Char('.') => vec![InputEvent::NextSound],
        KeyCode::Char('l') => vec![InputEvent::ApplySound],

        KeyCode::Char(' ') => vec![InputEvent::Play],
        KeyCode::Backspace | KeyCode::Char('s') => vec![InputEvent::Stop],
        KeyCode::Char('-') => vec![InputEvent::AdjustTempo(-1.0)],
        KeyCode::Char('=') => vec![InputEvent::AdjustTempo(1.0)],
        KeyCode::Char('_') => vec![InputEvent::AdjustTempo(-10.0)],
        KeyCode::Char('+') => vec![InputEvent::AdjustTempo(10.0)],

        KeyCode::Char('t') => vec![InputEvent::NextTheme],
        KeyCode::Char('r') => vec![InputEvent::ReloadCatalog],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_uses_the_cursor() {
        let mut ts = TuiState::default();
        handle_key(KeyCode::Down, &mut ts);
        handle_key(KeyCode::Right, &mut ts);
        handle_key(KeyCode::Right, &mut ts);
        assert_eq!(
            handle_key(KeyCode::Enter, &mut ts),
            vec![InputEvent::ToggleStep { pad: 1, step: 2 }]
        );
        assert_eq!(handle_key(KeyCode::Char('p'), &mut ts), vec![InputEvent::PadPress(1)]);
    }

    #[test]
    fn transport_keys() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), vec![InputEvent::Play]);
        assert_eq!(handle_key(KeyCode::Backspace, &mut ts), vec![InputEvent::Stop]);
        assert_eq!(handle_key(KeyCode::Char('+'), &mut ts), vec![InputEvent::AdjustTempo(10.0)]);
        assert_eq!(handle_key(KeyCode::Esc, &mut ts), vec![InputEvent::Quit]);
        assert!(handle_key(KeyCode::Char('?'), &mut ts).is_empty());
    }
}
