use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::grid::draw_step_grid;
use super::mode::TuiState;
use super::theme::{palette, Palette};
use crate::middle::NO_PAD_SELECTED;
use crate::shared::{DisplayState, NUM_PADS};

const HELP: &str = concat!(
    "arrows move  enter toggle  p pad  ,/. sound  l load  ",
    "space play  s stop  -/= tempo  t theme  r reload  esc quit",
);

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let palette = palette(&state.theme);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                    // transport
            Constraint::Length(NUM_PADS as u16 + 3),  // step grid
            Constraint::Length(4),                    // status + help
            Constraint::Min(0),
        ])
        .split(area);

    draw_transport(frame, sections[0], state, &palette);
    draw_step_grid(frame, sections[1], state, ts, &palette);
    draw_status(frame, sections[2], state, &palette);
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState, palette: &Palette) {
    let (play_label, play_style) = if state.playing {
        ("▶ PLAYING", Style::default().fg(palette.step_playing).add_modifier(Modifier::BOLD))
    } else {
        ("■ STOPPED", Style::default().fg(palette.dim))
    };
    let sound = state
        .selected_sound
        .clone()
        .unwrap_or_else(|| String::from("(none)"));

    let line = Line::from(vec![
        Span::styled(play_label, play_style),
        Span::raw("   "),
        Span::styled(format!("{:.0} BPM", state.bpm), Style::default().fg(palette.accent)),
        Span::raw("   sound: "),
        Span::styled(sound, Style::default().fg(palette.text)),
        Span::styled(
            format!(" ({} available)", state.catalog_len),
            Style::default().fg(palette.dim),
        ),
        Span::raw("   theme: "),
        Span::styled(state.theme.clone(), Style::default().fg(palette.text)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" steppad ")
        .border_style(Style::default().fg(palette.accent));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState, palette: &Palette) {
    let status_style = if state.status == NO_PAD_SELECTED {
        Style::default().fg(palette.warn).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text)
    };
    let lines = vec![
        Line::from(Span::styled(state.status.clone(), status_style)),
        Line::from(Span::styled(HELP, Style::default().fg(palette.dim))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.dim));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
