// Walled arena: the player pushes balls around a closed box

use glam::Vec2;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::player::Player;
use crate::engine::game_loop::GameMode;
use crate::engine::input::{Action, InputManager};
use crate::engine::physics::{presets, BodyError, Contact, PhysicsWorld, Removals};
use crate::engine::renderer::{InstanceLayer, Layer, LayerProxy, RenderProxy};

/// Arena layout
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    /// Half the inner width of the box
    pub half_width: f32,
    /// Half the inner height of the box
    pub half_height: f32,
    pub player_radius: f32,
    pub ball_radius: f32,
    pub ball_rows: u32,
    pub ball_columns: u32,
    /// Distance between neighbouring ball centres
    pub ball_spacing: f32,
    /// Initial speed of every ball
    pub ball_speed: f32,
    /// Number of trail segments behind the player
    pub trail_segments: usize,
    /// Instances per render batch
    pub batch_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            half_width: 16.0,
            half_height: 9.0,
            player_radius: 0.5,
            ball_radius: 0.4,
            ball_rows: 3,
            ball_columns: 5,
            ball_spacing: 2.0,
            ball_speed: 3.0,
            trail_segments: 10,
            batch_capacity: 256,
        }
    }
}

/// Game mode for the arena
pub struct Arena {
    physics: PhysicsWorld,
    player: Player,
    input: InputManager,
    layer: Rc<RefCell<InstanceLayer>>,

    /// Collisions that changed the player's velocity
    hits: Rc<Cell<u32>>,

    elapsed: f32,
    frames_drawn: u64,
}

impl Arena {
    pub fn new(config: &ArenaConfig) -> Result<Self, BodyError> {
        let mut physics = PhysicsWorld::new();
        let layer = Rc::new(RefCell::new(InstanceLayer::with_capacity(
            config.batch_capacity,
        )));
        let proxy = || -> Box<dyn RenderProxy> { Box::new(LayerProxy::new(layer.clone())) };

        // Corners in counter-clockwise order so every wall faces inward
        let (w, h) = (config.half_width, config.half_height);
        let corners = [
            Vec2::new(-w, -h),
            Vec2::new(w, -h),
            Vec2::new(w, h),
            Vec2::new(-w, h),
        ];
        for (i, &start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            physics.add_body(presets::wall(start, end)?.with_proxy(proxy()));
        }

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let player = Player::spawn(
            &mut physics,
            Vec2::new(0.0, -h * 0.5),
            config.player_radius,
            |body| {
                body.proxy(proxy())
                    .on_collide(move |contact: &Contact, _: &mut Removals| {
                        if contact.impulse {
                            counter.set(counter.get() + 1);
                        }
                    })
            },
        )?
        .with_segments((0..config.trail_segments).map(|_| proxy()).collect());

        let rows = config.ball_rows as f32;
        let columns = config.ball_columns as f32;
        for row in 0..config.ball_rows {
            for column in 0..config.ball_columns {
                let x = (column as f32 - (columns - 1.0) * 0.5) * config.ball_spacing;
                let y = h * 0.3 + (row as f32 - (rows - 1.0) * 0.5) * config.ball_spacing;

                // Spread initial headings so the balls fan out
                let heading = (row * config.ball_columns + column) as f32 * 2.4;
                let velocity = Vec2::from_angle(heading) * config.ball_speed;

                let ball = presets::ball(x, y, config.ball_radius)
                    .velocity(velocity.x, velocity.y)
                    .proxy(proxy())
                    .build()?;
                physics.add_body(ball);
            }
        }

        log::info!(
            "Arena ready: {} walls, {} rigid bodies",
            physics.static_body_count(),
            physics.rigid_body_count()
        );

        Ok(Self {
            physics,
            player,
            input: InputManager::new(),
            layer,
            hits,
            elapsed: 0.0,
            frames_drawn: 0,
        })
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    pub fn layer(&self) -> &Rc<RefCell<InstanceLayer>> {
        &self.layer
    }

    /// Collisions that changed the player's velocity so far
    pub fn hits(&self) -> u32 {
        self.hits.get()
    }

    /// Seconds since the first frame
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl GameMode for Arena {
    fn fixed_step(&mut self, ds: f32) {
        if let Err(e) = self.player.steer(&mut self.physics, self.input.direction()) {
            log::warn!("Ignoring player input: {}", e);
        }
        self.physics.step(ds);
        self.player.after_step(&mut self.physics);
    }

    fn step(&mut self, _ds: f32, elapsed: f32) {
        self.elapsed = elapsed;
    }

    fn draw(&mut self) {
        self.player.draw(&self.physics);
        self.physics.draw();

        let count = self.layer.borrow_mut().flush();
        self.frames_drawn += 1;
        log::trace!("Frame {} drew {} instances", self.frames_drawn, count);
    }

    fn should_stop(&self) -> bool {
        self.input.is_pressed(Action::Quit)
    }

    fn bind_input(&mut self) {
        self.input.bind();
    }

    fn unbind_input(&mut self) {
        self.input.unbind();
    }
}
