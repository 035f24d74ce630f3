use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Quit,
    SwitchPage,
    MoveUp,
    MoveDown,
    CursorLeft,
    CursorRight,
    InputChar(char),
    Backspace,
    Submit,
    GenerateScript,
    SaveScript,
    ToggleExpand,
}

fn map_key_event(key_event: KeyEvent) -> AppEvent {
    if key_event.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return match key_event.code {
            KeyCode::Char('c') => AppEvent::Quit,
            KeyCode::Char('g') => AppEvent::GenerateScript,
            KeyCode::Char('s') => AppEvent::SaveScript,
            KeyCode::Char('e') => AppEvent::ToggleExpand,
            _ => AppEvent::Tick,
        };
    }

    match key_event.code {
        KeyCode::Tab => AppEvent::SwitchPage,
        KeyCode::BackTab => AppEvent::SwitchPage,
        KeyCode::Up => AppEvent::MoveUp,
        KeyCode::Down => AppEvent::MoveDown,
        KeyCode::Left => AppEvent::CursorLeft,
        KeyCode::Right => AppEvent::CursorRight,
        KeyCode::Backspace => AppEvent::Backspace,
        KeyCode::Enter => AppEvent::Submit,
        KeyCode::Char(c) => AppEvent::InputChar(c),
        _ => AppEvent::Tick,
    }
}

pub fn next_event() -> io::Result<AppEvent> {
    if event::poll(Duration::from_millis(16))?
        && let Event::Key(key_event) = event::read()?
        && key_event.kind == KeyEventKind::Press
    {
        return Ok(map_key_event(key_event));
    }

    Ok(AppEvent::Tick)
}
