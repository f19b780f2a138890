// Game layer
//
// - `player`: input-steered body with a trail following its path
// - `arena`: walled box game mode driving the physics world

pub mod arena;
pub mod player;

// Re-export commonly used types
pub use arena::{Arena, ArenaConfig};
pub use player::Player;
