// Core math types shared by the engine and the game

pub mod math;
pub mod transform;

pub use transform::{ModelUniform, Transform2D};
