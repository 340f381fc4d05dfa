//! relic_tui - Operator console for driving and inspecting item stats

mod app;
mod commands;
mod simulation;
mod ui;

use app::App;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use relic_core::catalog::{DecayTrigger, TriggerKind};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "relic_tui.log";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to a file; the terminal belongs to the UI
    let appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (writer, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let rules_dir = std::env::args().nth(1).map(PathBuf::from);
    let mut app = App::new(rules_dir)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if app.is_typing() {
                    on_input_key(app, key);
                } else if !on_key(app, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Keys while the command line is open
fn on_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Char(c) => app.input_char(c),
        _ => {}
    }
}

/// Returns false when the console should exit
fn on_key(app: &mut App, key: KeyEvent) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => return false,
        (KeyCode::Tab, _) => app.next_tab(),
        (KeyCode::BackTab, _) => app.prev_tab(),
        (KeyCode::Char('1'), _) => app.set_tab(0),
        (KeyCode::Char('2'), _) => app.set_tab(1),
        (KeyCode::Char('3'), _) | (KeyCode::Char('?'), _) => app.set_tab(2),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.on_up(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.on_down(),
        (KeyCode::Char(':'), _) | (KeyCode::Char('/'), _) => app.begin_input(),
        (KeyCode::Char('a'), _) => app.fire(TriggerKind::Attack),
        (KeyCode::Char('m'), _) => app.fire(TriggerKind::Mine),
        (KeyCode::Char('u'), _) => app.fire(TriggerKind::Jump),
        (KeyCode::Char('l'), _) => app.fire(TriggerKind::Land),
        (KeyCode::Char('i'), _) => app.fire(TriggerKind::Interact),
        (KeyCode::Char('t'), _) => app.advance(1),
        (KeyCode::Char('T'), _) => app.advance(20),
        (KeyCode::Char('s'), _) => app.simulate(10),
        (KeyCode::Char('r'), _) => app.reload(),
        (KeyCode::Char('d'), _) => app.decay(DecayTrigger::Death),
        (KeyCode::Char('f'), _) => app.decay(DecayTrigger::Repair),
        _ => {}
    }
    true
}
