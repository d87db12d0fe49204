use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Pointer and keyboard synthesis
pub trait PointerControl: Send + Sync {
    fn position(&self) -> AutofillResult<Point>;

    fn move_to(&self, point: Point) -> AutofillResult<()>;

    /// Move to `point` and click `count` times
    fn click(&self, point: Point, button: MouseButton, count: u32) -> AutofillResult<()>;

    /// Type literal text
    fn type_text(&self, text: &str) -> AutofillResult<()>;

    /// Send a key combination such as `"ctrl+v"`, `"alt+s"` or `"enter"`
    fn key_combo(&self, combo: &str) -> AutofillResult<()>;

    fn left_click(&self, point: Point) -> AutofillResult<()> {
        self.click(point, MouseButton::Left, 1)
    }
}

/// Parse `"ctrl+shift+v"` into keys; the last one is the key being tapped
pub fn parse_combo(combo: &str) -> AutofillResult<Vec<Key>> {
    let keys = combo
        .split('+')
        .map(|part| parse_key(part.trim()))
        .collect::<AutofillResult<Vec<_>>>()?;

    if keys.is_empty() {
        return Err(AutofillError::Input(format!("Empty key combination '{}'", combo)));
    }
    Ok(keys)
}

fn parse_key(name: &str) -> AutofillResult<Key> {
    let key = match name.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Key::Control,
        "alt" => Key::Alt,
        "shift" => Key::Shift,
        "cmd" | "meta" | "super" | "win" => Key::Meta,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c.to_ascii_lowercase()),
                _ => {
                    return Err(AutofillError::Input(format!("Unknown key '{}'", name)));
                }
            }
        }
    };
    Ok(key)
}

/// Thread-safe wrapper for enigo's connection to the input system
///
/// SAFETY: access is serialized through the mutex in `EnigoPointer`.
struct SendSyncEnigo(Enigo);

// SAFETY: the handle is only touched while holding the `EnigoPointer` mutex.
unsafe impl Send for SendSyncEnigo {}

/// Pointer control backed by enigo
pub struct EnigoPointer {
    enigo: Mutex<SendSyncEnigo>,
}

impl EnigoPointer {
    pub fn new() -> AutofillResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| AutofillError::Input(format!("Failed to connect input backend: {}", e)))?;

        Ok(Self {
            enigo: Mutex::new(SendSyncEnigo(enigo)),
        })
    }
}

fn input_err(e: enigo::InputError) -> AutofillError {
    AutofillError::Input(e.to_string())
}

impl PointerControl for EnigoPointer {
    fn position(&self) -> AutofillResult<Point> {
        let (x, y) = self.enigo.lock().0.location().map_err(input_err)?;
        Ok(Point::new(x, y))
    }

    fn move_to(&self, point: Point) -> AutofillResult<()> {
        self.enigo
            .lock()
            .0
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(input_err)
    }

    fn click(&self, point: Point, button: MouseButton, count: u32) -> AutofillResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };

        let mut guard = self.enigo.lock();
        let enigo = &mut guard.0;
        enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(input_err)?;
        for _ in 0..count {
            enigo.button(button, Direction::Click).map_err(input_err)?;
        }
        Ok(())
    }

    fn type_text(&self, text: &str) -> AutofillResult<()> {
        self.enigo.lock().0.text(text).map_err(input_err)
    }

    fn key_combo(&self, combo: &str) -> AutofillResult<()> {
        let keys = parse_combo(combo)?;
        let Some((tap, modifiers)) = keys.split_last() else {
            return Ok(());
        };

        let mut guard = self.enigo.lock();
        let enigo = &mut guard.0;

        for key in modifiers {
            enigo.key(*key, Direction::Press).map_err(input_err)?;
        }
        let tapped = enigo.key(*tap, Direction::Click).map_err(input_err);
        // Release modifiers even when the tap failed
        for key in modifiers.iter().rev() {
            enigo.key(*key, Direction::Release).map_err(input_err)?;
        }
        tapped
    }
}
