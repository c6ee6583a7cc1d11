//! Key bindings: arrows and vim-style keys to game commands.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Game(Command),
    Quit,
    None,
}

/// Map key event to an action. Releases are ignored; OS key repeat acts like a press.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if kind == KeyEventKind::Release {
        return Action::None;
    }
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::Game(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Action::Game(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('j') => Action::Game(Command::SoftDrop),
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char(' ') => Action::Game(Command::Rotate),
        KeyCode::Char('p') | KeyCode::Char('P') => Action::Game(Command::TogglePause),
        KeyCode::Char('r') | KeyCode::Enter => Action::Game(Command::Restart),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrow_and_vim_keys() {
        for (code, cmd) in [
            (KeyCode::Left, Command::MoveLeft),
            (KeyCode::Char('h'), Command::MoveLeft),
            (KeyCode::Right, Command::MoveRight),
            (KeyCode::Char('l'), Command::MoveRight),
            (KeyCode::Down, Command::SoftDrop),
            (KeyCode::Char('j'), Command::SoftDrop),
            (KeyCode::Up, Command::Rotate),
            (KeyCode::Char(' '), Command::Rotate),
            (KeyCode::Char('p'), Command::TogglePause),
            (KeyCode::Enter, Command::Restart),
            (KeyCode::Char('r'), Command::Restart),
        ] {
            assert_eq!(key_to_action(press(code)), Action::Game(cmd), "{code:?}");
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_action(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_release_and_modifiers_ignored() {
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Left,
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(key_to_action(release), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
        assert_eq!(key_to_action(press(KeyCode::Char('x'))), Action::None);
    }

    #[test]
    fn test_shift_p_pauses() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT)),
            Action::Game(Command::TogglePause)
        );
    }
}
