//! Items tab - carriers on the left, the selected carrier's state on the right

use super::{progress_bar, section, stat_line};
use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use relic_core::sync::{encode_state, CarrierState};
use relic_core::{Carrier, CarrierHost};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    draw_carriers(f, app, chunks[0]);
    draw_details(f, app, chunks[1]);
}

fn draw_carriers(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = vec![];

    if let Some(owner) = &app.inventory.owner {
        lines.push(Line::from(Span::styled(
            format!("  {} ({})", owner.name, owner.id),
            Style::default().fg(Color::Cyan),
        )));
        lines.push(Line::from(""));
    }

    for (i, slot) in app.inventory.occupied_slots().into_iter().enumerate() {
        let Some(carrier) = app.inventory.carrier(slot) else {
            continue;
        };
        let is_selected = i == app.selected;
        let (prefix, style) = if is_selected {
            ("> ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            ("  ", Style::default().fg(Color::White))
        };

        let mut spans = vec![
            Span::styled(prefix, style),
            Span::styled(format!("{:8}", slot.to_string()), Style::default().fg(Color::DarkGray)),
            Span::styled(carrier.display_name().to_string(), name_style(carrier, style)),
        ];
        if carrier.count > 1 {
            spans.push(Span::styled(
                format!(" x{}", carrier.count),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Carriers "));
    f.render_widget(paragraph, area);
}

/// Items with unlocks stand out
fn name_style(carrier: &Carrier, base: Style) -> Style {
    if !carrier.unlocked_synergies().is_empty() {
        base.fg(Color::Magenta)
    } else if !carrier.unlocked_milestones().is_empty() {
        base.fg(Color::Green)
    } else {
        base
    }
}

fn draw_details(f: &mut Frame, app: &App, area: Rect) {
    let Some((slot, carrier)) = app.selected_carrier() else {
        let empty = Paragraph::new("  No carrier selected")
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        f.render_widget(empty, area);
        return;
    };

    let registry = app.engine.registry();
    let rules = app.engine.rules().snapshot();
    let mut lines: Vec<Line> = vec![];

    lines.push(Line::from(vec![
        Span::styled(
            carrier.display_name().to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {} @ {}", carrier.kind, slot), Style::default().fg(Color::DarkGray)),
    ]));
    let identity = carrier
        .identity()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(none yet)".to_string());
    lines.push(Line::from(Span::styled(
        format!("identity {}", identity),
        Style::default().fg(Color::DarkGray),
    )));
    if carrier.history().transformations > 0 {
        lines.push(Line::from(Span::styled(
            format!("lineage {}", carrier.history().lineage.join(" → ")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let wire = match encode_state(&registry, &CarrierState::of(carrier)) {
        Ok(bytes) => format!("wire state {} bytes", bytes.len()),
        Err(e) => format!("wire state unavailable: {}", e),
    };
    lines.push(Line::from(Span::styled(wire, Style::default().fg(Color::DarkGray))));
    if carrier.max_damage > 0 {
        lines.push(Line::from(format!(
            "durability {} {}/{}",
            progress_bar(i64::from(carrier.max_damage - carrier.damage), i64::from(carrier.max_damage), 20),
            carrier.max_damage - carrier.damage,
            carrier.max_damage
        )));
    }
    lines.push(Line::from(""));

    lines.push(section("Stats"));
    if carrier.stats().is_empty() {
        lines.push(Line::from(Span::styled("  (none)", Style::default().fg(Color::DarkGray))));
    }
    for (stat, value) in carrier.stats().sorted() {
        lines.push(stat_line(&registry.display_name(&stat), value));
    }
    lines.push(Line::from(""));

    lines.push(section("Next milestones"));
    let mut shown = 0;
    for stat in rules.milestones.stats() {
        let next = rules
            .milestones
            .for_stat(stat)
            .iter()
            .filter(|m| m.matches(carrier) && !carrier.unlocked_milestones().contains(&m.key()))
            .min_by_key(|m| m.threshold);
        if let Some(milestone) = next {
            let value = carrier.stat(stat);
            lines.push(Line::from(vec![
                Span::styled(format!("  {:16}", milestone.title()), Style::default().fg(Color::Gray)),
                Span::styled(progress_bar(value, milestone.threshold, 16), Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {}/{}", value, milestone.threshold),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            shown += 1;
        }
    }
    if shown == 0 {
        lines.push(Line::from(Span::styled("  (none)", Style::default().fg(Color::DarkGray))));
    }
    lines.push(Line::from(""));

    lines.push(section("Unlocked"));
    for key in carrier.unlocked_milestones().sorted() {
        lines.push(Line::from(Span::styled(format!("  ★ {}", key), Style::default().fg(Color::Green))));
    }
    for id in carrier.unlocked_synergies().sorted() {
        let title = rules.synergies.get(&id).map(|s| s.title()).unwrap_or_else(|| id.clone());
        lines.push(Line::from(Span::styled(
            format!("  ✦ {}", title),
            Style::default().fg(Color::Magenta),
        )));
    }
    lines.push(Line::from(""));

    lines.push(section("Echo cooldowns"));
    let cooling: Vec<_> = carrier
        .echo_cooldowns()
        .iter()
        .filter(|(_, expiry)| *expiry > app.tick)
        .collect();
    if cooling.is_empty() {
        lines.push(Line::from(Span::styled("  (ready)", Style::default().fg(Color::DarkGray))));
    }
    for (rule, expiry) in cooling {
        lines.push(Line::from(format!("  {:16} {} ticks", rule, expiry - app.tick)));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
