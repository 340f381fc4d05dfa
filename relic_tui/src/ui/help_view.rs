//! Help tab view

use super::section;
use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, _app: &App, area: Rect) {
    let lines = vec![
        section("Navigation"),
        key_line("1-3", "Jump to tab (Items/Log/Help)"),
        key_line("Tab / Shift+Tab", "Next/previous tab"),
        key_line("↑/k  ↓/j", "Select carrier / scroll log"),
        key_line("q / Ctrl+C", "Quit"),
        Line::from(""),
        section("Actions on the selected carrier"),
        key_line("a m u l i", "Attack, mine, jump, land, interact echoes"),
        key_line("s", "Simulate 10 random gameplay events"),
        key_line("t / T", "Advance 1 / 20 ticks (decay, buffer flush)"),
        key_line("d / f", "Death / repair decay"),
        key_line("r", "Reload rule files"),
        Line::from(""),
        section("Command line (:)"),
        key_line("stat query <slot> <stat>", "Read a stat"),
        key_line("stat add <slot> <stat> <n>", "Add through the full cascade"),
        key_line("stat set <slot> <stat> <n>", "Overwrite through the full cascade"),
        key_line("tick [n] | sim [n]", "Advance the clock / simulate"),
        key_line("trigger <kind> [slot]", "Fire echoes (attack mine jump land interact)"),
        key_line("death | repair | reload", "Decay triggers and rule reload"),
        Line::from(""),
        Line::from(Span::styled(
            "Slots are hand, worn:N or pack:N. Stats without a namespace get relic:",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(paragraph, area);
}

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:28}", key), Style::default().fg(Color::Yellow)),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}
