// Player-controlled body with a trail of segments following its path

use glam::Vec2;
use std::collections::VecDeque;

use crate::core::Transform2D;
use crate::engine::physics::{presets, BodyBuilder, BodyError, BodyId, PhysicsWorld};
use crate::engine::renderer::RenderProxy;

/// Acceleration applied at full stick
pub const PLAYER_ACCELERATION: f32 = 17.0;

/// Positions kept in the path history
const HISTORY_LIMIT: usize = 100;

/// Distance from the head to the first trail segment, in radii
const HEAD_SPACING: f32 = 4.4;

/// Distance between consecutive trail segments, in radii
const SEGMENT_SPACING: f32 = 3.8;

/// Below this fraction of the radius the player is not turned
const TURN_THRESHOLD: f32 = 0.0001;

/// The player: a rigid body steered by input plus its trail.
pub struct Player {
    /// Handle to the player's body in the physics world
    pub body: BodyId,
    /// Radius of the body, used to scale path sampling and spacing
    pub radius: f32,
    /// Acceleration magnitude for a full-length direction
    pub acceleration: f32,

    /// Sampled path, oldest first
    history: VecDeque<Vec2>,

    /// One proxy per trail segment, nearest the head first
    segments: Vec<Box<dyn RenderProxy>>,
}

impl Player {
    /// Create the player's body and add it to the physics world.
    ///
    /// `configure` may add a render proxy or a collision hook to the body.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        position: Vec2,
        radius: f32,
        configure: impl FnOnce(BodyBuilder) -> BodyBuilder,
    ) -> Result<Self, BodyError> {
        let body = configure(presets::player(position.x, position.y, radius)).build()?;
        let body = physics.add_body(body);

        let mut history = VecDeque::with_capacity(HISTORY_LIMIT + 1);
        history.push_back(position);

        log::info!("Player spawned as body {} at {}", body, position);
        Ok(Self {
            body,
            radius,
            acceleration: PLAYER_ACCELERATION,
            history,
            segments: Vec::new(),
        })
    }

    /// Attach render proxies for the trail segments
    pub fn with_segments(mut self, segments: Vec<Box<dyn RenderProxy>>) -> Self {
        self.segments = segments;
        self
    }

    /// Set the body's acceleration from an input direction
    pub fn steer(&self, physics: &mut PhysicsWorld, direction: Vec2) -> Result<(), BodyError> {
        let Some(body) = physics.rigid_body_mut(self.body) else {
            return Ok(());
        };
        body.set_acceleration(direction * self.acceleration)
    }

    /// Record the path and face the direction of travel.
    ///
    /// Call after every physics step.
    pub fn after_step(&mut self, physics: &mut PhysicsWorld) {
        let Some(body) = physics.rigid_body_mut(self.body) else {
            return;
        };

        let position = body.position();
        let last = self.history.back().copied().unwrap_or(position);
        let offset = position - last;
        let distance = offset.length();

        if distance > self.radius {
            self.history.push_back(position);
            while self.history.len() > HISTORY_LIMIT {
                self.history.pop_front();
            }
        }
        if distance > TURN_THRESHOLD * self.radius {
            body.transform_mut().set_rotation(offset.y.atan2(offset.x));
        }
    }

    /// Sampled path, oldest first
    pub fn history(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.history.iter().copied()
    }

    /// Where the trail segments sit, nearest the head first
    pub fn trail(&self, physics: &PhysicsWorld) -> Vec<(Vec2, f32)> {
        let Some(body) = physics.rigid_body(self.body) else {
            return Vec::new();
        };
        place_segments(
            body.position(),
            self.history.iter().rev().copied(),
            HEAD_SPACING * self.radius,
            SEGMENT_SPACING * self.radius,
            self.segments.len(),
        )
    }

    /// Submit the trail segments, tail first so the head ends on top
    pub fn draw(&mut self, physics: &PhysicsWorld) {
        let trail = self.trail(physics);
        for (proxy, (position, rotation)) in self.segments.iter_mut().zip(trail).rev() {
            proxy.sync(&Transform2D::new(position, rotation, Vec2::ONE));
            proxy.submit();
        }
    }
}

/// Place up to `count` points along the polyline from `head` through
/// `path` (newest first), the first at arc length `first` and the rest
/// `spacing` apart. Each point carries the angle of the piece it lies on,
/// pointing toward the head. Stops early when the path runs out.
fn place_segments(
    head: Vec2,
    path: impl Iterator<Item = Vec2>,
    first: f32,
    spacing: f32,
    count: usize,
) -> Vec<(Vec2, f32)> {
    let mut placed = Vec::with_capacity(count);
    let mut target = first;
    let mut walked = 0.0;
    let mut newer = head;

    for older in path {
        if placed.len() == count {
            break;
        }
        let offset = newer - older;
        let length = offset.length();

        // `target` is always past `walked`, so `length` is non-zero here
        while placed.len() < count && target <= walked + length {
            let along = (target - walked) / length;
            placed.push((newer.lerp(older, along), offset.y.atan2(offset.x)));
            target += spacing;
        }

        walked += length;
        newer = older;
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spawn(physics: &mut PhysicsWorld) -> Player {
        Player::spawn(physics, Vec2::ZERO, 0.5, |b| b).unwrap()
    }

    #[test]
    fn test_spawn_adds_body() {
        let mut physics = PhysicsWorld::new();
        let player = spawn(&mut physics);

        assert!(physics.rigid_body(player.body).is_some());
        assert_eq!(player.history().collect::<Vec<_>>(), vec![Vec2::ZERO]);
        assert_eq!(player.acceleration, PLAYER_ACCELERATION);
    }

    #[test]
    fn test_spawn_rejects_bad_radius() {
        let mut physics = PhysicsWorld::new();
        let result = Player::spawn(&mut physics, Vec2::ZERO, -1.0, |b: BodyBuilder| b);
        assert!(matches!(result, Err(BodyError::InvalidRadius(_))));
        assert_eq!(physics.rigid_body_count(), 0);
    }

    #[test]
    fn test_steering_moves_and_turns_player() {
        let mut physics = PhysicsWorld::new();
        let mut player = spawn(&mut physics);

        for _ in 0..60 {
            player.steer(&mut physics, Vec2::new(0.0, 1.0)).unwrap();
            physics.step(1.0 / 60.0);
            player.after_step(&mut physics);
        }

        let body = physics.rigid_body(player.body).unwrap();
        assert!(body.position().y > 1.0);
        assert!(body.speed() <= body.max_speed());
        assert_relative_eq!(
            body.transform().rotation(),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-4
        );

        // Sampled roughly once per radius travelled
        let history: Vec<_> = player.history().collect();
        assert!(history.len() > 2);
        for pair in history.windows(2) {
            assert!(pair[0].distance(pair[1]) > player.radius);
        }
    }

    #[test]
    fn test_standing_still_keeps_rotation() {
        let mut physics = PhysicsWorld::new();
        let mut player = spawn(&mut physics);
        physics
            .rigid_body_mut(player.body)
            .unwrap()
            .transform_mut()
            .set_rotation(1.0);

        physics.step(1.0 / 60.0);
        player.after_step(&mut physics);

        let body = physics.rigid_body(player.body).unwrap();
        assert_eq!(body.transform().rotation(), 1.0);
        assert_eq!(player.history().count(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut physics = PhysicsWorld::new();
        let mut player = spawn(&mut physics);

        for i in 1..=150 {
            physics
                .rigid_body_mut(player.body)
                .unwrap()
                .set_position(Vec2::new(i as f32, 0.0))
                .unwrap();
            player.after_step(&mut physics);
        }

        let history: Vec<_> = player.history().collect();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.last(), Some(&Vec2::new(150.0, 0.0)));
    }

    #[test]
    fn test_segments_follow_path() {
        let path = [Vec2::new(5.0, 0.0), Vec2::new(0.0, 0.0)];
        let placed = place_segments(Vec2::new(10.0, 0.0), path.into_iter(), 4.4, 3.8, 10);

        // The path is 10 long, so only two segments fit
        assert_eq!(placed.len(), 2);
        assert_relative_eq!(placed[0].0.x, 5.6, epsilon = 1e-5);
        assert_relative_eq!(placed[1].0.x, 1.8, epsilon = 1e-5);
        assert_eq!(placed[0].1, 0.0);
    }

    #[test]
    fn test_segments_turn_corners() {
        // Head at (0, 4), path goes down to the origin then left
        let path = [Vec2::ZERO, Vec2::new(-10.0, 0.0)];
        let placed = place_segments(Vec2::new(0.0, 4.0), path.into_iter(), 2.0, 4.0, 3);

        assert_eq!(placed.len(), 3);
        assert_relative_eq!(placed[0].0.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(placed[0].1, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(placed[1].0.x, -2.0, epsilon = 1e-5);
        assert_relative_eq!(placed[1].1, 0.0, epsilon = 1e-5);
        assert_relative_eq!(placed[2].0.x, -6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_repeated_points_are_skipped() {
        let path = [Vec2::ZERO, Vec2::ZERO, Vec2::new(-4.0, 0.0)];
        let placed = place_segments(Vec2::ZERO, path.into_iter(), 1.0, 1.0, 2);
        assert_eq!(placed.len(), 2);
        assert!(placed.iter().all(|(p, a)| p.is_finite() && a.is_finite()));
    }
}
