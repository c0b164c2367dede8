use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use spacewars::InputFlags;

/// How long a press counts as held when the terminal never reports
/// releases. Slightly longer than a typical key-repeat gap.
pub const HOLD_WINDOW: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Control {
    RotateLeft,
    RotateRight,
    Thrust,
    Fire,
}

impl Control {
    fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Left | KeyCode::Char('a') => Some(Self::RotateLeft),
            KeyCode::Right | KeyCode::Char('d') => Some(Self::RotateRight),
            KeyCode::Up | KeyCode::Char('w') => Some(Self::Thrust),
            KeyCode::Char(' ') => Some(Self::Fire),
            _ => None,
        }
    }

    fn flag(self) -> InputFlags {
        match self {
            Self::RotateLeft => InputFlags::ROTATE_LEFT,
            Self::RotateRight => InputFlags::ROTATE_RIGHT,
            Self::Thrust => InputFlags::THRUST,
            Self::Fire => InputFlags::FIRE,
        }
    }
}

/// Keyboard state for the local craft.
///
/// Held keys expire after [`HOLD_WINDOW`] unless a repeat refreshes them.
/// Once a release event is seen the terminal is trusted to report them and
/// keys stay held until released. Fire is one shot per press.
#[derive(Debug, Default)]
pub struct Input {
    held: HashMap<Control, Instant>,
    release_events: bool,
    fire_pending: bool,
    quit_requested: bool,
}

impl Input {
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if is_quit(&key) {
            self.quit_requested = true;
            return;
        }
        let Some(control) = Control::from_key(key.code) else {
            return;
        };

        match key.kind {
            KeyEventKind::Press => {
                if control == Control::Fire && !self.held.contains_key(&Control::Fire) {
                    self.fire_pending = true;
                }
                self.held.insert(control, now);
            }
            KeyEventKind::Repeat => {
                self.held.insert(control, now);
            }
            KeyEventKind::Release => {
                self.release_events = true;
                self.held.remove(&control);
            }
        }
    }

    /// Flags for the coming frame. Consumes a pending fire.
    pub fn take_flags(&mut self, now: Instant) -> InputFlags {
        if !self.release_events {
            self.held
                .retain(|_, pressed| now.duration_since(*pressed) < HOLD_WINDOW);
        }

        let mut flags = self
            .held
            .keys()
            .filter(|control| **control != Control::Fire)
            .fold(InputFlags::empty(), |flags, control| flags | control.flag());

        if std::mem::take(&mut self.fire_pending) {
            flags |= InputFlags::FIRE;
        }
        flags
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn press_expires_without_release_events() {
        let mut input = Input::default();
        let start = Instant::now();
        input.handle_key(key(KeyCode::Up, KeyEventKind::Press), start);

        assert_eq!(input.take_flags(start), InputFlags::THRUST);
        assert_eq!(input.take_flags(start + HOLD_WINDOW * 2), InputFlags::empty());
    }

    #[test]
    fn repeat_extends_hold() {
        let mut input = Input::default();
        let start = Instant::now();
        input.handle_key(key(KeyCode::Left, KeyEventKind::Press), start);
        input.handle_key(key(KeyCode::Left, KeyEventKind::Repeat), start + HOLD_WINDOW);

        let later = start + HOLD_WINDOW + HOLD_WINDOW / 2;
        assert_eq!(input.take_flags(later), InputFlags::ROTATE_LEFT);
    }

    #[test]
    fn release_events_switch_to_held_until_released() {
        let mut input = Input::default();
        let start = Instant::now();
        input.handle_key(key(KeyCode::Char('d'), KeyEventKind::Press), start);
        input.handle_key(key(KeyCode::Char('w'), KeyEventKind::Press), start);
        input.handle_key(key(KeyCode::Char('d'), KeyEventKind::Release), start);

        let much_later = start + Duration::from_secs(5);
        assert_eq!(input.take_flags(much_later), InputFlags::THRUST);
    }

    #[test]
    fn fire_is_one_shot_per_press() {
        let mut input = Input::default();
        let start = Instant::now();
        input.handle_key(key(KeyCode::Char(' '), KeyEventKind::Press), start);
        input.handle_key(key(KeyCode::Char(' '), KeyEventKind::Repeat), start);

        assert!(input.take_flags(start).contains(InputFlags::FIRE));
        assert!(!input.take_flags(start).contains(InputFlags::FIRE));
    }

    #[test]
    fn quit_keys() {
        let mut input = Input::default();
        input.handle_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(input.quit_requested());
    }
}
