// Input handling system
//
// Maps keyboard events to game actions.
//
// - `action`: game actions and default key bindings
// - `manager`: held-key tracking, action queries and the movement direction
//
// ```rust
// use engine::input::{Action, InputManager};
//
// let mut input = InputManager::new();
// input.bind();
//
// // In your event loop
// input.process_keyboard_event(&key_event);
//
// let direction = input.direction();
// if input.is_pressed(Action::Quit) {
//     // ...
// }
// ```

pub mod action;
pub mod manager;

// Re-export commonly used types
pub use action::{Action, InputSource};
pub use manager::InputManager;
