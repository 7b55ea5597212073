use crate::events::BrowserUpdates;
use crate::tui::SessionBanner;
use crate::tui::ui;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use log::{debug, info};
use ratatui::DefaultTerminal;
use std::time::Duration;
use thiserror::Error;
use wacore::browser::{BrowserMsg, BrowserViewModel};

const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Takes over the terminal until the user quits. The terminal is restored on
/// every exit path.
pub async fn run(
    model: BrowserViewModel,
    banner: SessionBanner,
    updates: Option<BrowserUpdates>,
) -> Result<(), TuiError> {
    let mut terminal = ratatui::try_init()?;
    let result = event_loop(&mut terminal, model, &banner, updates).await;
    ratatui::restore();
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    mut model: BrowserViewModel,
    banner: &SessionBanner,
    mut updates: Option<BrowserUpdates>,
) -> Result<(), TuiError> {
    let size = terminal.size()?;
    model.update(BrowserMsg::Resize {
        width: size.width,
        height: size.height,
    });

    let mut events = EventStream::new();
    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);

    while !model.should_quit() {
        terminal.draw(|frame| ui::draw(frame, &model, banner))?;

        tokio::select! {
            _ = refresh.tick() => model.update(BrowserMsg::Tick),
            event = events.next() => match event {
                Some(Ok(event)) => {
                    if let Some(msg) = map_event(&event) {
                        model.update(msg);
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    debug!("Terminal event stream ended");
                    break;
                }
            },
            msg = recv_update(&mut updates) => match msg {
                Some(msg) => model.update(msg),
                None => {
                    debug!("Session updates closed");
                    updates = None;
                }
            },
        }
    }

    info!("Browser closed");
    Ok(())
}

/// Pends forever once the update channel is gone, so `select!` stops polling it.
async fn recv_update(
    updates: &mut Option<BrowserUpdates>,
) -> Option<BrowserMsg> {
    match updates {
        Some(updates) => updates.recv().await,
        None => std::future::pending().await,
    }
}

pub fn map_event(event: &Event) -> Option<BrowserMsg> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
        Event::Resize(width, height) => Some(BrowserMsg::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<BrowserMsg> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(BrowserMsg::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(BrowserMsg::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(BrowserMsg::MoveDown),
        KeyCode::PageUp => Some(BrowserMsg::PageUp),
        KeyCode::PageDown => Some(BrowserMsg::PageDown),
        KeyCode::Home | KeyCode::Char('g') => Some(BrowserMsg::Home),
        KeyCode::End | KeyCode::Char('G') => Some(BrowserMsg::End),
        KeyCode::Char('q') | KeyCode::Esc => Some(BrowserMsg::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_navigation_keys() {
        let none = KeyModifiers::NONE;
        let cases = [
            (KeyCode::Up, BrowserMsg::MoveUp),
            (KeyCode::Char('k'), BrowserMsg::MoveUp),
            (KeyCode::Char('j'), BrowserMsg::MoveDown),
            (KeyCode::PageDown, BrowserMsg::PageDown),
            (KeyCode::Home, BrowserMsg::Home),
            (KeyCode::Char('g'), BrowserMsg::Home),
        ];
        for (code, expected) in cases {
            assert_eq!(map_event(&press(code, none)), Some(expected));
        }
        assert_eq!(
            map_event(&press(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(BrowserMsg::End)
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            map_event(&press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(BrowserMsg::Quit)
        );
        assert_eq!(
            map_event(&press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(BrowserMsg::Quit)
        );
        assert_eq!(
            map_event(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(BrowserMsg::Quit)
        );
        assert_eq!(map_event(&press(KeyCode::Char('j'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_release_and_resize() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&release), None);
        assert_eq!(
            map_event(&Event::Resize(120, 40)),
            Some(BrowserMsg::Resize {
                width: 120,
                height: 40
            })
        );
    }
}
