// Input manager - maps keyboard state to game actions

use super::action::{default_bindings, Action, InputSource};
use glam::Vec2;
use std::collections::{HashMap, HashSet};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Tracks which bound keys are held and answers action queries.
///
/// Several keys may map to one action; the action stays pressed while any
/// of them is held. Events are ignored while the manager is unbound.
#[derive(Debug)]
pub struct InputManager {
    bindings: HashMap<InputSource, Action>,

    /// Bound sources currently held down
    held: HashSet<InputSource>,

    /// Whether events are being listened to
    bound: bool,
}

impl InputManager {
    /// Create an unbound manager with the default key bindings
    pub fn new() -> Self {
        Self::from_bindings(default_bindings())
    }

    /// Create an unbound manager from explicit bindings
    pub fn from_bindings(bindings: Vec<(InputSource, Action)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
            held: HashSet::new(),
            bound: false,
        }
    }

    /// Start listening to events
    pub fn bind(&mut self) {
        if !self.bound {
            self.bound = true;
            log::debug!("Input bound");
        }
    }

    /// Stop listening and forget every held key
    pub fn unbind(&mut self) {
        if self.bound {
            self.bound = false;
            self.held.clear();
            log::debug!("Input unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        // Only process physical key presses
        if let PhysicalKey::Code(key_code) = event.physical_key {
            self.handle_key(key_code, event.state, event.repeat);
        }
    }

    /// Record a key transition. Key repeats and unbound keys are ignored.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if !self.bound || repeat {
            return;
        }
        let source = InputSource::key(key);
        if !self.bindings.contains_key(&source) {
            return;
        }

        match state {
            ElementState::Pressed => {
                self.held.insert(source);
            }
            ElementState::Released => {
                self.held.remove(&source);
            }
        }
    }

    /// Map a source to an action, replacing any previous mapping
    pub fn map(&mut self, source: InputSource, action: Action) {
        self.bindings.insert(source, action);
    }

    /// Remove a source's mapping
    pub fn unmap(&mut self, source: InputSource) {
        self.bindings.remove(&source);
        self.held.remove(&source);
    }

    pub fn action_for(&self, source: InputSource) -> Option<Action> {
        self.bindings.get(&source).copied()
    }

    /// Check if an action is currently pressed
    pub fn is_pressed(&self, action: Action) -> bool {
        self.held
            .iter()
            .any(|source| self.bindings.get(source) == Some(&action))
    }

    /// Movement direction with y pointing up, never longer than 1
    pub fn direction(&self) -> Vec2 {
        let axis = |positive: Action, negative: Action| {
            self.is_pressed(positive) as i32 as f32 - self.is_pressed(negative) as i32 as f32
        };
        let direction = Vec2::new(
            axis(Action::MoveRight, Action::MoveLeft),
            axis(Action::MoveUp, Action::MoveDown),
        );
        direction.clamp_length_max(1.0)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
