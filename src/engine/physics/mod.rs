// Swept-circle physics: bodies, collision detection and response

pub mod body;
pub mod collision;
pub mod response;
mod world;

pub use body::{
    presets, Body, BodyBuilder, BodyError, BodyId, BodyKind, CollisionHook, RigidBody, StaticBody,
};
pub use collision::{CollisionKind, Contact, Removals, ResolvedCollision};
pub use world::PhysicsWorld;
