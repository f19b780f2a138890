// Swept-circle arena: 2D physics core, fixed-step loop and demo game

pub mod core;
pub mod engine;
pub mod game;
