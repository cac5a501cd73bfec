//! Platform-agnostic input handling system
use std::collections::HashSet;

use crate::model::Avatar;

/// Platform-independent input events
#[derive(Debug, Clone)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    FocusLost,
    VisibilityChanged { visible: bool },
}

/// Something the player can hold down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Back,
    Left,
    Right,
    Jump,
}

impl Action {
    pub const ALL: [Action; 5] = [Action::Forward, Action::Left, Action::Back, Action::Right, Action::Jump];

    pub fn label(self) -> &'static str {
        match self {
            Action::Forward => "Forward",
            Action::Back => "Back",
            Action::Left => "Left",
            Action::Right => "Right",
            Action::Jump => "Up",
        }
    }
}

/// A down/up transition of an action, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    Pressed(Action),
    Released(Action),
}

/// Key mapping configuration
#[derive(Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub jump: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            jump: " ".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, key: &str) -> Option<Action> {
        let bound = |binding: &str| key.eq_ignore_ascii_case(binding);
        if bound(&self.forward) || key == "ArrowUp" {
            Some(Action::Forward)
        } else if bound(&self.backward) || key == "ArrowDown" {
            Some(Action::Back)
        } else if bound(&self.left) || key == "ArrowLeft" {
            Some(Action::Left)
        } else if bound(&self.right) || key == "ArrowRight" {
            Some(Action::Right)
        } else if bound(&self.jump) || key == "Space" {
            Some(Action::Jump)
        } else {
            None
        }
    }

    pub fn key_for(&self, action: Action) -> &str {
        match action {
            Action::Forward => &self.forward,
            Action::Back => &self.backward,
            Action::Left => &self.left,
            Action::Right => &self.right,
            Action::Jump => &self.jump,
        }
    }
}

/// Single characters fold to lowercase so a Shift change between down and up
/// still releases the key; named keys ("ArrowUp") are kept as-is.
fn normalize_key(key: &str) -> String {
    if key.chars().count() == 1 {
        key.to_lowercase()
    } else {
        key.to_string()
    }
}

/// Held keys and control-panel buttons, plus the queue of action
/// transitions not yet consumed by the frame loop.
pub struct InputState {
    bindings: KeyBindings,
    pressed_keys: HashSet<String>,
    held_buttons: HashSet<Action>,
    pending: Vec<ActionEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::default())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            pressed_keys: HashSet::new(),
            held_buttons: HashSet::new(),
            pending: Vec::new(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let Some(action) = self.bindings.action_for(key) else { return };
                let was_down = self.is_action_down(action);
                self.pressed_keys.insert(normalize_key(key));
                self.note_transition(action, was_down);
            }
            InputEvent::KeyUp(key) => {
                let Some(action) = self.bindings.action_for(key) else { return };
                let was_down = self.is_action_down(action);
                self.pressed_keys.remove(&normalize_key(key));
                self.note_transition(action, was_down);
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear();
            }
        }
    }

    /// Track a control-panel button; call every UI frame with its held state
    pub fn set_button_held(&mut self, action: Action, held: bool) {
        let was_down = self.is_action_down(action);
        if held {
            self.held_buttons.insert(action);
        } else {
            self.held_buttons.remove(&action);
        }
        self.note_transition(action, was_down);
    }

    pub fn is_action_down(&self, action: Action) -> bool {
        self.held_buttons.contains(&action)
            || self.pressed_keys.iter().any(|k| self.bindings.action_for(k) == Some(action))
    }

    /// Release everything (focus lost, tab hidden)
    pub fn clear(&mut self) {
        let down: Vec<Action> = Action::ALL.into_iter().filter(|a| self.is_action_down(*a)).collect();
        self.pressed_keys.clear();
        self.held_buttons.clear();
        self.pending.extend(down.into_iter().map(ActionEvent::Released));
    }

    pub fn drain_events(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.pending)
    }

    fn note_transition(&mut self, action: Action, was_down: bool) {
        match (was_down, self.is_action_down(action)) {
            (false, true) => self.pending.push(ActionEvent::Pressed(action)),
            (true, false) => self.pending.push(ActionEvent::Released(action)),
            _ => {}
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns action transitions into avatar thrust
#[derive(Clone)]
pub struct InputProcessor {
    pub move_thrust: f32,
    pub jump_thrust: f32,
}

impl InputProcessor {
    pub fn new() -> Self {
        Self { move_thrust: 1.0, jump_thrust: 1.5 }
    }

    /// Apply events in order; for each axis the last event wins.
    pub fn apply(&self, events: &[ActionEvent], avatar: &mut Avatar) {
        for event in events {
            match *event {
                ActionEvent::Pressed(Action::Forward) => avatar.thrust.z = -self.move_thrust,
                ActionEvent::Pressed(Action::Back) => avatar.thrust.z = self.move_thrust,
                ActionEvent::Pressed(Action::Left) => avatar.thrust.x = -self.move_thrust,
                ActionEvent::Pressed(Action::Right) => avatar.thrust.x = self.move_thrust,
                ActionEvent::Pressed(Action::Jump) => {
                    if avatar.grounded {
                        avatar.thrust.y = self.jump_thrust;
                        avatar.grounded = false;
                    }
                }
                ActionEvent::Released(Action::Forward | Action::Back) => avatar.thrust.z = 0.0,
                ActionEvent::Released(Action::Left | Action::Right) => avatar.thrust.x = 0.0,
                ActionEvent::Released(Action::Jump) => avatar.thrust.y = 0.0,
            }
        }
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

pub mod wasm {
    use super::*;
    use web_sys::KeyboardEvent;

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::keyboard::KeyCode;

    /// Key names matching the browser's `KeyboardEvent.key` for bound keys
    pub fn key_name(code: KeyCode) -> Option<&'static str> {
        match code {
            KeyCode::KeyW => Some("w"),
            KeyCode::KeyA => Some("a"),
            KeyCode::KeyS => Some("s"),
            KeyCode::KeyD => Some("d"),
            KeyCode::Space => Some(" "),
            KeyCode::ArrowUp => Some("ArrowUp"),
            KeyCode::ArrowDown => Some("ArrowDown"),
            KeyCode::ArrowLeft => Some("ArrowLeft"),
            KeyCode::ArrowRight => Some("ArrowRight"),
            _ => None,
        }
    }

    pub fn key_to_input(code: KeyCode, is_down: bool) -> Option<InputEvent> {
        let key = key_name(code)?.to_string();
        Some(if is_down { InputEvent::KeyDown(key) } else { InputEvent::KeyUp(key) })
    }
}
