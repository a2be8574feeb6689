use log::error;
use std::error::Error;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Close,
}

/// Receives keyboard events from the window loop.
pub trait KeyHandler {
    fn on_key(&mut self, key: KeyCode, state: ElementState) -> InputAction;
}

/// Receives errors reported by the windowing and context layers.
pub trait ErrorHandler {
    fn on_error(&mut self, err: &dyn Error);
}

/// Requests close when `key` goes down.
#[derive(Debug, Clone, Copy)]
pub struct CloseOnKey {
    pub key: KeyCode,
}

impl Default for CloseOnKey {
    fn default() -> Self {
        Self { key: KeyCode::Space }
    }
}

impl KeyHandler for CloseOnKey {
    fn on_key(&mut self, key: KeyCode, state: ElementState) -> InputAction {
        if key == self.key && state == ElementState::Pressed {
            InputAction::Close
        } else {
            InputAction::None
        }
    }
}

impl<F> KeyHandler for F
where
    F: FnMut(KeyCode, ElementState) -> InputAction,
{
    fn on_key(&mut self, key: KeyCode, state: ElementState) -> InputAction {
        self(key, state)
    }
}

#[derive(Debug, Default)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn on_error(&mut self, err: &dyn Error) {
        error!("Error {}", err);
    }
}

pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    let key = match name.trim().to_ascii_lowercase().as_str() {
        "space" => KeyCode::Space,
        "escape" | "esc" => KeyCode::Escape,
        "enter" | "return" => KeyCode::Enter,
        "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "q" | "keyq" => KeyCode::KeyQ,
        "x" | "keyx" => KeyCode::KeyX,
        "f10" => KeyCode::F10,
        _ => return None,
    };
    Some(key)
}
