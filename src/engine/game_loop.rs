/// Game loop timing and control system
///
/// Implements a fixed timestep game loop with variable rendering. Frames
/// arrive whenever the host delivers them; simulation time is consumed in
/// constant-size steps and the remainder carries over to the next frame.
use std::time::{Duration, Instant};

/// Default simulation rate (60 updates per second)
pub const FIXED_TIMESTEP: Duration = Duration::from_nanos(16_666_666);

/// Longest frame the loop will catch up on
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Smallest fixed step accepted by [`LoopConfig::with_fixed_step`]
const MIN_FIXED_STEP: Duration = Duration::from_micros(100);

/// Loop timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    fixed_step: Duration,
    max_frame_delta: Duration,
}

impl LoopConfig {
    pub fn with_fixed_step(mut self, step: Duration) -> Self {
        self.fixed_step = step.max(MIN_FIXED_STEP);
        self
    }

    pub fn with_max_frame_delta(mut self, delta: Duration) -> Self {
        self.max_frame_delta = delta;
        self
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fixed_step: FIXED_TIMESTEP,
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

/// Hooks the loop drives every frame. All of them default to doing nothing.
pub trait GameMode {
    /// One constant-size simulation step
    fn fixed_step(&mut self, _ds: f32) {}

    /// Once per frame with the frame's delta and the total elapsed time
    fn step(&mut self, _ds: f32, _elapsed: f32) {}

    fn draw(&mut self) {}

    /// Checked after every frame; `true` ends the loop for good
    fn should_stop(&self) -> bool {
        false
    }

    fn bind_input(&mut self) {}

    fn unbind_input(&mut self) {}

    /// A mode with nothing to simulate is drawn once and never scheduled
    fn is_animated(&self) -> bool {
        true
    }
}

/// Whether the loop wants more frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Game loop timing state
pub struct GameLoop {
    config: LoopConfig,

    /// Simulated time not yet consumed by fixed steps
    accumulator: Duration,

    /// Time of the first frame
    origin: Option<Instant>,

    /// Wall time since `origin` at the last frame
    elapsed: Duration,

    state: LoopState,

    /// Current frame number
    frame_count: u64,

    /// Total fixed steps executed
    update_count: u64,
}

impl GameLoop {
    /// Create a new game loop
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            accumulator: Duration::ZERO,
            origin: None,
            elapsed: Duration::ZERO,
            state: LoopState::Running,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Bind the mode's input and decide whether frames are needed at all
    pub fn start(&mut self, mode: &mut impl GameMode) -> LoopState {
        mode.bind_input();
        if !mode.is_animated() {
            log::info!("Nothing to animate, drawing once");
            mode.draw();
            self.state = LoopState::Stopped;
        }
        self.state
    }

    /// Run one frame at wall time `now`.
    ///
    /// The first frame sets the time origin. Frame deltas are clamped to
    /// `[0, max_frame_delta]`; every whole fixed step in the accumulator is
    /// simulated, then the variable step runs and the mode is either drawn
    /// or, if it asks to stop, unbound.
    pub fn advance(&mut self, now: Instant, mode: &mut impl GameMode) -> LoopState {
        if self.state == LoopState::Stopped {
            return self.state;
        }

        let origin = *self.origin.get_or_insert(now);
        let since_origin = now.saturating_duration_since(origin);
        let delta = since_origin
            .saturating_sub(self.elapsed)
            .min(self.config.max_frame_delta);
        self.elapsed = self.elapsed.max(since_origin);
        self.frame_count += 1;

        self.accumulator += delta;
        let step = self.config.fixed_step;
        while self.accumulator >= step {
            self.accumulator -= step;
            mode.fixed_step(step.as_secs_f32());
            self.update_count += 1;
        }

        mode.step(delta.as_secs_f32(), self.elapsed.as_secs_f32());

        if mode.should_stop() {
            mode.unbind_input();
            self.state = LoopState::Stopped;
            log::info!(
                "Game loop stopped after {} frames, {} updates",
                self.frame_count,
                self.update_count
            );
        } else {
            mode.draw();
        }
        self.state
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Get the fixed timestep for physics updates (in seconds)
    pub fn fixed_timestep(&self) -> f32 {
        self.config.fixed_step.as_secs_f32()
    }

    /// Fraction of a fixed step waiting in the accumulator, in `[0, 1)`
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.config.fixed_step.as_secs_f32()
    }

    /// Wall time between the first frame and the latest one
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Get total number of frames run
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get total number of fixed steps executed
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[derive(Default)]
    struct Recorder {
        fixed_steps: Vec<f32>,
        steps: Vec<(f32, f32)>,
        draws: u32,
        bound: bool,
        unbinds: u32,
        stop: bool,
        still: bool,
    }

    impl GameMode for Recorder {
        fn fixed_step(&mut self, ds: f32) {
            self.fixed_steps.push(ds);
        }

        fn step(&mut self, ds: f32, elapsed: f32) {
            self.steps.push((ds, elapsed));
        }

        fn draw(&mut self) {
            self.draws += 1;
        }

        fn should_stop(&self) -> bool {
            self.stop
        }

        fn bind_input(&mut self) {
            self.bound = true;
        }

        fn unbind_input(&mut self) {
            self.bound = false;
            self.unbinds += 1;
        }

        fn is_animated(&self) -> bool {
            !self.still
        }
    }

    #[test]
    fn test_game_loop_creation() {
        let game_loop = GameLoop::default();
        assert_eq!(game_loop.frame_count(), 0);
        assert_eq!(game_loop.update_count(), 0);
        assert_eq!(game_loop.state(), LoopState::Running);
        assert_abs_diff_eq!(game_loop.fixed_timestep(), 1.0 / 60.0, epsilon = 1e-6);
    }

    #[test]
    fn test_first_frame_sets_origin() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        assert_eq!(game_loop.start(&mut mode), LoopState::Running);
        assert!(mode.bound);

        game_loop.advance(Instant::now(), &mut mode);
        assert!(mode.fixed_steps.is_empty());
        assert_eq!(mode.steps, vec![(0.0, 0.0)]);
        assert_eq!(mode.draws, 1);
        assert_eq!(game_loop.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_slow_frame_runs_several_fixed_steps() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        let t0 = Instant::now();

        game_loop.advance(t0, &mut mode);
        game_loop.advance(t0 + Duration::from_millis(50), &mut mode);

        assert_eq!(mode.fixed_steps.len(), 3);
        assert!(mode
            .fixed_steps
            .iter()
            .all(|&ds| (ds - 1.0 / 60.0).abs() < 1e-6));
        assert_eq!(game_loop.update_count(), 3);

        let (ds, elapsed) = mode.steps[1];
        assert_abs_diff_eq!(ds, 0.05, epsilon = 1e-6);
        assert_abs_diff_eq!(elapsed, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_fast_frame_accumulates() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        let t0 = Instant::now();

        game_loop.advance(t0, &mut mode);
        game_loop.advance(t0 + Duration::from_millis(5), &mut mode);
        assert!(mode.fixed_steps.is_empty());
        assert!(game_loop.alpha() > 0.0 && game_loop.alpha() < 1.0);

        game_loop.advance(t0 + Duration::from_millis(20), &mut mode);
        assert_eq!(mode.fixed_steps.len(), 1);
        assert_eq!(game_loop.frame_count(), 3);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        let t0 = Instant::now();

        game_loop.advance(t0, &mut mode);
        game_loop.advance(t0 + Duration::from_secs(3), &mut mode);

        // 100 ms worth of steps, not three seconds
        assert_eq!(mode.fixed_steps.len(), 6);
        let (ds, elapsed) = mode.steps[1];
        assert_abs_diff_eq!(ds, 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(elapsed, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_time_going_backwards_counts_as_zero() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        let t0 = Instant::now();

        game_loop.advance(t0 + Duration::from_millis(30), &mut mode);
        game_loop.advance(t0, &mut mode);
        assert_eq!(mode.steps[1].0, 0.0);
        assert!(mode.fixed_steps.is_empty());
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder::default();
        let t0 = Instant::now();
        game_loop.start(&mut mode);
        game_loop.advance(t0, &mut mode);

        mode.stop = true;
        let state = game_loop.advance(t0 + Duration::from_millis(20), &mut mode);
        assert_eq!(state, LoopState::Stopped);
        assert!(!mode.bound);
        // Not drawn on the stopping frame
        assert_eq!(mode.draws, 1);

        let state = game_loop.advance(t0 + Duration::from_millis(40), &mut mode);
        assert_eq!(state, LoopState::Stopped);
        assert_eq!(mode.unbinds, 1);
        assert_eq!(mode.steps.len(), 2);
    }

    #[test]
    fn test_still_mode_is_drawn_once() {
        let mut game_loop = GameLoop::default();
        let mut mode = Recorder {
            still: true,
            ..Default::default()
        };

        assert_eq!(game_loop.start(&mut mode), LoopState::Stopped);
        assert_eq!(mode.draws, 1);
        assert_eq!(
            game_loop.advance(Instant::now(), &mut mode),
            LoopState::Stopped
        );
        assert!(mode.steps.is_empty());
    }

    #[test]
    fn test_config_builders() {
        let config = LoopConfig::default()
            .with_fixed_step(Duration::ZERO)
            .with_max_frame_delta(Duration::from_millis(250));
        assert_eq!(config.fixed_step(), MIN_FIXED_STEP);
        assert_eq!(config.max_frame_delta(), Duration::from_millis(250));
    }
}
