use glam::Vec2;
use std::fmt;

use super::collision::{Contact, Removals};
use crate::core::Transform2D;
use crate::engine::renderer::RenderProxy;

/// Below this speed a body is brought to a full stop
pub const REST_SPEED: f32 = 0.001;

/// Default restitution for new rigid bodies
pub const DEFAULT_ELASTICITY: f32 = 0.7;

/// Callback invoked after a collision involving the body has been resolved.
///
/// Bodies handed to [`Removals::remove`] disappear at the end of the step.
pub type CollisionHook = Box<dyn FnMut(&Contact, &mut Removals)>;

/// Stable identity handed out by the physics world.
///
/// Ids are recycled after a body is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which collection a body lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Rigid,
    Static,
}

/// Body configuration errors, raised when a body is built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BodyError {
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f32),

    #[error("mass must be finite and positive, got {0}")]
    InvalidMass(f32),

    #[error("elasticity must be within [0, 1], got {0}")]
    InvalidElasticity(f32),

    #[error("max speed must be non-negative, got {0}")]
    InvalidMaxSpeed(f32),

    #[error("linear damping must be within [0, 1), got {0}")]
    InvalidDamping(f32),

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: Vec2 },
}

fn check_finite(field: &'static str, value: Vec2) -> Result<Vec2, BodyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BodyError::NonFinite { field, value })
    }
}

/// A dynamic circle
pub struct RigidBody {
    transform: Transform2D,
    /// Only the position component is used, as linear velocity
    motion: Transform2D,
    radius: f32,
    mass: f32,
    elasticity: f32,
    max_speed: f32,
    linear_damping: f32,
    acceleration: Vec2,
    no_collide: bool,
    proxy: Option<Box<dyn RenderProxy>>,
    on_collide: Option<CollisionHook>,
}

impl RigidBody {
    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }

    pub fn position(&self) -> Vec2 {
        self.transform.position()
    }

    /// Teleport the body. Non-finite positions are rejected.
    pub fn set_position(&mut self, position: Vec2) -> Result<(), BodyError> {
        self.set_position_unchecked(check_finite("position", position)?);
        Ok(())
    }

    pub fn velocity(&self) -> Vec2 {
        self.motion.position()
    }

    /// Non-finite velocities are rejected
    pub fn set_velocity(&mut self, velocity: Vec2) -> Result<(), BodyError> {
        self.set_velocity_unchecked(check_finite("velocity", velocity)?);
        Ok(())
    }

    /// Move without validation, for values derived from finite state
    pub(crate) fn set_position_unchecked(&mut self, position: Vec2) {
        self.transform.set_position(position);
    }

    pub(crate) fn set_velocity_unchecked(&mut self, velocity: Vec2) {
        self.motion.set_position(velocity);
    }

    pub fn speed(&self) -> f32 {
        self.velocity().length()
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity() * self.mass
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn elasticity(&self) -> f32 {
        self.elasticity
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    /// Set by a controller before each step. Stays in effect until replaced.
    pub fn set_acceleration(&mut self, acceleration: Vec2) -> Result<(), BodyError> {
        self.acceleration = check_finite("acceleration", acceleration)?;
        Ok(())
    }

    pub fn no_collide(&self) -> bool {
        self.no_collide
    }

    pub fn set_no_collide(&mut self, no_collide: bool) {
        self.no_collide = no_collide;
    }

    pub fn set_proxy(&mut self, proxy: Box<dyn RenderProxy>) {
        self.proxy = Some(proxy);
    }

    pub fn set_on_collide(&mut self, hook: CollisionHook) {
        self.on_collide = Some(hook);
    }

    /// Advance velocity and position by one fixed step.
    ///
    /// Order matters: accelerate, cap to max speed, then damp (or stop when
    /// nearly at rest), then move.
    pub fn integrate(&mut self, ds: f32) {
        assert!(
            self.mass > 0.0,
            "rigid body reached the integrator with mass {}",
            self.mass
        );

        let mut velocity = self.velocity() + self.acceleration * ds;
        let mut speed = velocity.length();
        if speed > self.max_speed {
            velocity *= self.max_speed / speed;
            speed = self.max_speed;
        }

        if speed < REST_SPEED {
            velocity = Vec2::ZERO;
        } else {
            velocity *= 1.0 - self.linear_damping;
        }

        self.motion.set_position(velocity);
        self.transform.move_by(velocity * ds);
    }

    pub(crate) fn draw(&mut self) {
        if let Some(proxy) = self.proxy.as_mut() {
            proxy.sync(&self.transform);
            proxy.submit();
        }
    }

    pub(crate) fn take_hook(&mut self) -> Option<CollisionHook> {
        self.on_collide.take()
    }

    pub(crate) fn restore_hook(&mut self, hook: CollisionHook) {
        self.on_collide = Some(hook);
    }
}

impl fmt::Debug for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidBody")
            .field("position", &self.position())
            .field("velocity", &self.velocity())
            .field("radius", &self.radius)
            .field("mass", &self.mass)
            .field("elasticity", &self.elasticity)
            .field("no_collide", &self.no_collide)
            .finish_non_exhaustive()
    }
}

/// An immovable line segment.
///
/// Only the side the segment normal points to is solid; see
/// [`crate::core::math::segment_normal`] for the winding.
pub struct StaticBody {
    start: Vec2,
    end: Vec2,
    proxy: Option<Box<dyn RenderProxy>>,
    on_collide: Option<CollisionHook>,
}

impl StaticBody {
    pub fn new(start: Vec2, end: Vec2) -> Result<Self, BodyError> {
        Ok(Self {
            start: check_finite("start", start)?,
            end: check_finite("end", end)?,
            proxy: None,
            on_collide: None,
        })
    }

    pub fn with_proxy(mut self, proxy: Box<dyn RenderProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_on_collide(mut self, hook: CollisionHook) -> Self {
        self.on_collide = Some(hook);
        self
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn end(&self) -> Vec2 {
        self.end
    }

    pub(crate) fn draw(&mut self) {
        if let Some(proxy) = self.proxy.as_mut() {
            let direction = self.end - self.start;
            let transform = Transform2D::new(
                (self.start + self.end) * 0.5,
                direction.y.atan2(direction.x),
                Vec2::ONE,
            );
            proxy.sync(&transform);
            proxy.submit();
        }
    }

    pub(crate) fn take_hook(&mut self) -> Option<CollisionHook> {
        self.on_collide.take()
    }

    pub(crate) fn restore_hook(&mut self, hook: CollisionHook) {
        self.on_collide = Some(hook);
    }
}

impl fmt::Debug for StaticBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBody")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// Anything the physics world can own
#[derive(Debug)]
pub enum Body {
    Rigid(RigidBody),
    Static(StaticBody),
}

impl Body {
    pub fn kind(&self) -> BodyKind {
        match self {
            Body::Rigid(_) => BodyKind::Rigid,
            Body::Static(_) => BodyKind::Static,
        }
    }
}

impl From<RigidBody> for Body {
    fn from(body: RigidBody) -> Self {
        Body::Rigid(body)
    }
}

impl From<StaticBody> for Body {
    fn from(body: StaticBody) -> Self {
        Body::Static(body)
    }
}

/// Builder for rigid circles
pub struct BodyBuilder {
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    radius: f32,
    mass: f32,
    elasticity: f32,
    max_speed: f32,
    linear_damping: f32,
    no_collide: bool,
    proxy: Option<Box<dyn RenderProxy>>,
    on_collide: Option<CollisionHook>,
}

impl BodyBuilder {
    /// Create a circle of the given radius at the origin, at rest
    pub fn circle(radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            radius,
            mass: 1.0,
            elasticity: DEFAULT_ELASTICITY,
            max_speed: f32::INFINITY,
            linear_damping: 0.0,
            no_collide: false,
            proxy: None,
            on_collide: None,
        }
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the initial rotation (radians)
    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Set the initial linear velocity
    pub fn velocity(mut self, x: f32, y: f32) -> Self {
        self.velocity = Vec2::new(x, y);
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set restitution (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Cap on speed after acceleration is applied
    pub fn max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Fraction of velocity lost per step
    pub fn linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Exclude the body from all collision checks
    pub fn no_collide(mut self, no_collide: bool) -> Self {
        self.no_collide = no_collide;
        self
    }

    pub fn proxy(mut self, proxy: Box<dyn RenderProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn on_collide(mut self, hook: impl FnMut(&Contact, &mut Removals) + 'static) -> Self {
        self.on_collide = Some(Box::new(hook));
        self
    }

    /// Validate the configuration and build the body
    pub fn build(self) -> Result<RigidBody, BodyError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(BodyError::InvalidRadius(self.radius));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(BodyError::InvalidMass(self.mass));
        }
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(BodyError::InvalidElasticity(self.elasticity));
        }
        // NaN fails this comparison too
        if !(self.max_speed >= 0.0) {
            return Err(BodyError::InvalidMaxSpeed(self.max_speed));
        }
        if !(0.0..1.0).contains(&self.linear_damping) {
            return Err(BodyError::InvalidDamping(self.linear_damping));
        }
        let position = check_finite("position", self.position)?;
        let velocity = check_finite("velocity", self.velocity)?;

        Ok(RigidBody {
            transform: Transform2D::new(position, self.rotation, Vec2::ONE),
            motion: Transform2D::from_position(velocity),
            radius: self.radius,
            mass: self.mass,
            elasticity: self.elasticity,
            max_speed: self.max_speed,
            linear_damping: self.linear_damping,
            acceleration: Vec2::ZERO,
            no_collide: self.no_collide,
            proxy: self.proxy,
            on_collide: self.on_collide,
        })
    }
}

/// Common body configurations for the arena
pub mod presets {
    use super::*;

    /// Player-controlled circle: bounded speed, a little drag
    pub fn player(x: f32, y: f32, radius: f32) -> BodyBuilder {
        BodyBuilder::circle(radius)
            .position(x, y)
            .mass(1.0)
            .max_speed(8.0)
            .linear_damping(0.02)
    }

    /// Bouncy ball that keeps most of its energy
    pub fn ball(x: f32, y: f32, radius: f32) -> BodyBuilder {
        BodyBuilder::circle(radius)
            .position(x, y)
            .mass(radius * radius)
            .elasticity(0.9)
            .max_speed(20.0)
            .linear_damping(0.005)
    }

    /// Wall from `start` to `end`, solid on the left of the direction of travel
    pub fn wall(start: Vec2, end: Vec2) -> Result<StaticBody, BodyError> {
        StaticBody::new(start, end)
    }
}
