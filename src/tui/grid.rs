use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::mode::TuiState;
use super::theme::Palette;
use crate::shared::{CellState, DisplayState, STEPS_PER_PATTERN};

const LABEL_WIDTH: usize = 24;

// one row per pad: label, then its 16 steps. beats are split every 4 steps.
pub fn draw_step_grid(
    frame: &mut Frame,
    area: Rect,
    state: &DisplayState,
    ts: &TuiState,
    palette: &Palette,
) {
    let mut lines = Vec::with_capacity(state.pads.len() + 1);

    let mut header = vec![Span::raw(" ".repeat(LABEL_WIDTH))];
    for step in 0..STEPS_PER_PATTERN {
        if step > 0 && step % 4 == 0 {
            header.push(Span::raw(" "));
        }
        // while playing, the column the next tick will evaluate
        let style = if state.playing && step == state.cursor_step {
            Style::default().fg(palette.step_playing).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.dim)
        };
        header.push(Span::styled(format!("{:<3}", step + 1), style));
    }
    lines.push(Line::from(header));

    for (pad, view) in state.pads.iter().enumerate() {
        let marker = if view.selected { "> " } else { "  " };
        let label_color = if view.loaded { palette.text } else { palette.dim };
        let mut label_style = Style::default().fg(label_color);
        if view.selected {
            label_style = label_style.fg(palette.accent).add_modifier(Modifier::BOLD);
        }
        let label = truncate(&format!("{marker}{}", view.label), LABEL_WIDTH - 1);
        let mut spans = vec![Span::styled(
            format!("{label:<width$}", width = LABEL_WIDTH),
            label_style,
        )];

        for (step, cell) in state.cells[pad].iter().enumerate() {
            if step > 0 && step % 4 == 0 {
                spans.push(Span::raw(" "));
            }
            let (glyph, mut style) = match cell {
                CellState::Off => ("·", Style::default().fg(palette.dim)),
                CellState::On => ("■", Style::default().fg(palette.step_on)),
                CellState::Playing => (
                    "●",
                    Style::default().fg(palette.step_playing).add_modifier(Modifier::BOLD),
                ),
            };
            if pad == ts.cursor_pad && step == ts.cursor_step {
                style = style.bg(palette.cursor).add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(format!(" {glyph} "), style));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" sequencer ")
        .border_style(Style::default().fg(palette.dim));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_labels_are_cut() {
        assert_eq!(truncate("Pad 1", 10), "Pad 1");
        assert_eq!(truncate("Pad 10 (a_really_long_name.wav)", 10), "Pad 10 (a…");
    }
}
