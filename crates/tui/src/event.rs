use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseEventKind};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::ui;
use crate::App;

pub fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        if app.should_quit {
            return Ok(());
        }

        app.drain_logs();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll with a 100ms timeout so status/log updates keep flowing
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Confirm dialog swallows keys while open
                if let Some(confirm) = &mut app.confirm {
                    match key.code {
                        KeyCode::Left | KeyCode::Right | KeyCode::Tab => confirm.toggle(),
                        KeyCode::Enter => {
                            let yes = confirm.selected;
                            app.confirm = None;
                            if yes {
                                app.quit();
                            }
                        }
                        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                            app.confirm = None;
                        }
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => app.request_quit(),
                    KeyCode::Char('v') | KeyCode::Char('V') | KeyCode::Char(' ') => {
                        app.toggle_visibility()
                    }
                    KeyCode::Char('m') | KeyCode::Char('M') => app.morph_page(),
                    KeyCode::Char('u') | KeyCode::Char('U') => app.benign_update(),
                    KeyCode::Char('p') | KeyCode::Char('P') => app.restore_page(),
                    KeyCode::Char('n') | KeyCode::Char('N') => app.toggle_noise(),
                    KeyCode::Char('f') | KeyCode::Char('F') => app.toggle_failures(),
                    KeyCode::Char('r') | KeyCode::Char('R') => app.reload_config(),
                    KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_log(),
                    KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => app.scroll_log_up(1),
                    KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => {
                        app.scroll_log_down(1)
                    }
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.scroll_log_up(3),
                MouseEventKind::ScrollDown => app.scroll_log_down(3),
                _ => {}
            },
            _ => {}
        }
    }
}
