// Engine modules: game loop, input, physics, rendering interfaces

pub mod game_loop;
pub mod input;
pub mod physics;
pub mod renderer;
