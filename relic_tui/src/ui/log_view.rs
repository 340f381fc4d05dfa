//! Log tab view

use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let end = app.log.len().saturating_sub(app.log_scroll);
    let start = end.saturating_sub(visible);

    let lines: Vec<Line> = app.log[start..end]
        .iter()
        .map(|entry| Line::from(Span::styled(entry.clone(), line_style(entry))))
        .collect();

    let title = if app.log_scroll > 0 {
        format!(" Log (scrolled {}) ", app.log_scroll)
    } else {
        " Log ".to_string()
    };
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, area);
}

fn line_style(entry: &str) -> Style {
    if entry.contains("error") || entry.contains("failed") || entry.contains("unknown") {
        Style::default().fg(Color::Red)
    } else if entry.contains("> ") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}
