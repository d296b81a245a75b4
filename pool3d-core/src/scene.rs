/// Scene director: owns every entity, the light rig, the camera and the shot animation,
/// and turns one frame's elapsed time into state changes and draw calls.
///
/// The shot is scripted cinematics, not a physics simulation. The cue ball rolls at a
/// constant speed; when it reaches the object ball the object ball receives a single
/// impulse whose velocity then decays by a fixed factor per update. There is no
/// restitution, no spin and no interaction with any other ball.
use nalgebra::Point3;

use crate::animation::{Animation, AnimationState};
use crate::config::SceneConfig;
use crate::device::{GraphicsDevice, ShaderProgram, UniformValue};
use crate::entity::{draw_surface, Ball, Cue, FrameContext, Renderable, Table};
use crate::error::Result;
use crate::light::LightRig;
use crate::projection::{Camera, CameraMode};
use crate::time::FixedStep;

/// Drawable area in pixels, re-read from the host every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Everything that changes while the scene runs.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub table: Table,
    pub cue_ball: Ball,
    pub object_ball: Ball,
    pub extra_balls: Vec<Ball>,
    pub cue: Cue,
    pub lights: LightRig,
    pub camera: Camera,
    pub animation: Animation,
    /// Seconds since the scene was built; drives the pocket glow pulse
    pub clock: f32,
}

pub struct SceneDirector {
    config: SceneConfig,
    state: SceneState,
    timestep: FixedStep,
}

impl SceneDirector {
    /// Builds every entity and uploads its meshes to `device`.
    pub fn new(device: &mut dyn GraphicsDevice, config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let layout = &config.layout;

        let table = Table::new(device, layout)?;
        let cue_ball = Ball::new(device, &layout.cue_ball, layout)?;
        let object_ball = Ball::new(device, &layout.object_ball, layout)?;
        let extra_balls = layout
            .extra_balls
            .iter()
            .map(|ball| Ball::new(device, ball, layout))
            .collect::<Result<Vec<_>>>()?;
        let cue = Cue::new(device, layout)?;

        let state = SceneState {
            table,
            cue_ball,
            object_ball,
            extra_balls,
            cue,
            lights: LightRig::pool_table(layout.table_half_width, layout.table_half_depth),
            camera: Camera::new(&config.camera),
            animation: Animation::new(),
            clock: 0.0,
        };
        log::info!(
            "scene: {} balls on a {}x{} table",
            2 + state.extra_balls.len(),
            2.0 * layout.table_half_width,
            2.0 * layout.table_half_depth
        );

        Ok(Self {
            config,
            state,
            timestep: FixedStep::default(),
        })
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn animation_state(&self) -> AnimationState {
        self.state.animation.state()
    }

    /// Start input. Only honoured in `ready` and `end`; re-racks the table for a fresh shot.
    pub fn start(&mut self) -> bool {
        if !self.state.animation.start() {
            return false;
        }
        let state = &mut self.state;
        state.cue_ball.rerack();
        state.object_ball.rerack();
        for ball in &mut state.extra_balls {
            ball.rerack();
        }
        state.cue.rerack();
        state.camera.mode = CameraMode::Fixed;
        state.lights.set_pocket_color([0.0; 3]);
        true
    }

    /// Advances the shot by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let timing = &self.config.timing;
        let state = &mut self.state;
        state.clock += dt;
        state.animation.tick(dt);

        if state.animation.state() == AnimationState::Aiming
            && state.animation.elapsed() > timing.aim_duration
        {
            state.animation.enter(AnimationState::Hit);
        }
        if state.animation.state() == AnimationState::Hit
            && state.animation.elapsed() > timing.hit_duration
        {
            state.animation.enter(AnimationState::Rolling);
            state.camera.mode = CameraMode::Follow;
        }
        if state.animation.state() == AnimationState::Rolling {
            self.roll(dt);
        }

        let timing = &self.config.timing;
        let state = &mut self.state;

        // Pull-back and release while aiming; purely visual.
        let pull = if state.animation.state() == AnimationState::Aiming {
            (state.animation.elapsed() * timing.cue_pull_frequency).sin() * timing.cue_pull_amplitude
        } else {
            0.0
        };
        state.cue.position.x = state.cue_ball.position.x - self.config.choreography.cue_offset + pull;
        state.cue.position.z = state.cue_ball.position.z;

        if state.animation.state() == AnimationState::Pocket {
            let progress = state.animation.elapsed() * timing.pocket_shrink_rate;
            state.object_ball.scale = (1.0 - progress).max(0.0);
            if progress > timing.pocket_end {
                state.animation.set(AnimationState::End);
            }
        }

        state
            .lights
            .follow(&state.cue_ball.position, self.config.choreography.spotlight_height);
    }

    fn roll(&mut self, dt: f32) {
        let shot = &self.config.choreography;
        let state = &mut self.state;
        let cue_ball = &mut state.cue_ball;
        let object_ball = &mut state.object_ball;

        cue_ball.position.x += dt * shot.cue_ball_speed;

        // One-shot contact; `moving` keeps it from firing again.
        if !object_ball.moving
            && cue_ball.position.x > object_ball.position.x - shot.contact_distance
        {
            object_ball.velocity = shot.impulse_speed;
            object_ball.moving = true;
            log::debug!(
                "shot: contact at x={:.3}, impulse {}",
                cue_ball.position.x,
                shot.impulse_speed
            );
        }

        if object_ball.moving {
            object_ball.position.x += dt * object_ball.velocity;
            object_ball.velocity *= shot.velocity_decay;
            if object_ball.position.x > shot.pocket_x {
                state.animation.enter(AnimationState::Pocket);
                state.camera.mode = CameraMode::Overhead;
                state.lights.set_pocket_color(shot.pocket_light_color);
            }
        }

        if state.animation.state() == AnimationState::Rolling
            && state.cue_ball.position.x > shot.cue_ball_stop_x
        {
            state.animation.set(AnimationState::End);
        }
    }

    /// Issues the frame's draw calls: table, balls, cue, then the pocket glow overdraw.
    pub fn render(&self, device: &mut dyn GraphicsDevice, viewport: Viewport) {
        let state = &self.state;
        let target: Point3<f32> = state.cue_ball.position;
        let frame = FrameContext {
            view_projection: state
                .camera
                .view_projection(&target, viewport.width, viewport.height),
            camera_position: state.camera.eye_position(&target),
            lights: &state.lights.lights,
        };

        device.begin_frame(viewport.width, viewport.height, self.config.clear_color);
        device.use_program(ShaderProgram::Standard);

        state.table.draw(device, &frame);
        state.cue_ball.draw(device, &frame);
        state.object_ball.draw(device, &frame);
        for ball in &state.extra_balls {
            ball.draw(device, &frame);
        }
        state.cue.draw(device, &frame);

        if state.animation.state() == AnimationState::Pocket {
            device.use_program(ShaderProgram::PocketGlow);
            device.set_uniform("u_time", UniformValue::Float(state.clock));
            draw_surface(device, &frame, &state.table.felt_surface());
        }
    }

    /// One host frame: runs as many fixed `update` steps as `dt` covers, then draws.
    ///
    /// Returns the number of steps taken.
    pub fn frame(&mut self, device: &mut dyn GraphicsDevice, dt: f32, viewport: Viewport) -> u32 {
        let steps = self.timestep.advance(dt);
        for _ in 0..steps {
            self.update(self.timestep.step());
        }
        self.render(device, viewport);
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, RecordingDevice};

    const DT: f32 = 1.0 / 60.0;

    fn director(config: SceneConfig) -> (SceneDirector, RecordingDevice) {
        let mut device = RecordingDevice::new();
        let director = SceneDirector::new(&mut device, config).unwrap();
        device.clear();
        (director, device)
    }

    #[test]
    fn start_then_timed_transitions() {
        let (mut scene, _) = director(SceneConfig::default());
        assert_eq!(scene.animation_state(), AnimationState::Ready);
        assert!(scene.start());
        assert_eq!(scene.animation_state(), AnimationState::Aiming);

        scene.update(1.1);
        assert_eq!(scene.animation_state(), AnimationState::Hit);

        scene.update(0.35);
        assert_eq!(scene.animation_state(), AnimationState::Rolling);
        assert_eq!(scene.state().camera.mode, CameraMode::Follow);
    }

    #[test]
    fn start_ignored_mid_shot() {
        let (mut scene, _) = director(SceneConfig::default());
        scene.start();
        scene.update(0.5);
        assert!(!scene.start());
        assert_eq!(scene.animation_state(), AnimationState::Aiming);
        assert!((scene.state().animation.elapsed() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ready_scene_does_not_move() {
        let (mut scene, _) = director(SceneConfig::default());
        let before = scene.state().cue_ball.position;
        for _ in 0..120 {
            scene.update(DT);
        }
        assert_eq!(scene.animation_state(), AnimationState::Ready);
        assert_eq!(scene.state().cue_ball.position, before);
    }

    #[test]
    fn cue_ball_rolls_at_constant_speed() {
        let mut config = SceneConfig::default();
        config.layout.cue_ball.position = [0.0, 0.3, 0.0];
        config.layout.object_ball.position = [10.0, 0.3, 0.0];
        let (mut scene, _) = director(config);
        scene.state.animation.enter(AnimationState::Rolling);

        for _ in 0..60 {
            scene.update(DT);
        }
        assert_eq!(scene.animation_state(), AnimationState::Rolling);
        assert!(!scene.state().object_ball.moving);
        assert!((scene.state().cue_ball.position.x - 3.0).abs() < 1e-3);
    }

    #[test]
    fn struck_ball_velocity_decays_geometrically() {
        let mut config = SceneConfig::default();
        config.layout.cue_ball.position = [0.0, 0.3, 0.0];
        config.layout.object_ball.position = [0.3, 0.3, 0.0];
        config.choreography.pocket_x = 100.0;
        config.choreography.cue_ball_stop_x = 100.0;
        let (mut scene, _) = director(config);
        scene.state.animation.enter(AnimationState::Rolling);

        let frames = 30;
        for _ in 0..frames {
            scene.update(DT);
        }
        let expected = 4.0 * 0.98f32.powi(frames);
        let velocity = scene.state().object_ball.velocity;
        assert!(scene.state().object_ball.moving);
        assert!((velocity - expected).abs() < 1e-4, "{velocity} vs {expected}");
    }

    #[test]
    fn impulse_fires_once() {
        let mut config = SceneConfig::default();
        config.layout.cue_ball.position = [0.0, 0.3, 0.0];
        config.layout.object_ball.position = [0.3, 0.3, 0.0];
        config.choreography.velocity_decay = 0.5;
        config.choreography.pocket_x = 100.0;
        let (mut scene, _) = director(config);
        scene.state.animation.enter(AnimationState::Rolling);

        scene.update(DT);
        let after_first = scene.state().object_ball.velocity;
        scene.update(DT);
        // Cue ball is still past the contact line but no second impulse is given.
        assert!((scene.state().object_ball.velocity - after_first * 0.5).abs() < 1e-6);
    }

    #[test]
    fn default_shot_runs_to_the_pocket() {
        let (mut scene, _) = director(SceneConfig::default());
        scene.start();

        let mut visited = vec![scene.animation_state()];
        for _ in 0..600 {
            scene.update(DT);
            let state = scene.animation_state();
            if visited.last() != Some(&state) {
                visited.push(state);
            }
            if state == AnimationState::Pocket {
                let pockets = &scene.state().lights.pockets;
                let lights = &scene.state().lights.lights;
                assert!(pockets.iter().all(|&i| lights[i].color() == [0.3, 0.8, 1.0]));
                assert_eq!(scene.state().camera.mode, CameraMode::Overhead);
            }
            if state == AnimationState::End {
                break;
            }
        }

        assert_eq!(
            visited,
            vec![
                AnimationState::Aiming,
                AnimationState::Hit,
                AnimationState::Rolling,
                AnimationState::Pocket,
                AnimationState::End,
            ]
        );
        assert_eq!(scene.state().object_ball.scale, 0.0);
    }

    #[test]
    fn shot_ends_when_cue_ball_passes_stop_line() {
        let mut config = SceneConfig::default();
        config.layout.object_ball.position = [20.0, 0.3, 0.0];
        let (mut scene, _) = director(config);
        scene.start();
        for _ in 0..600 {
            scene.update(DT);
            if scene.animation_state() == AnimationState::End {
                break;
            }
        }
        assert_eq!(scene.animation_state(), AnimationState::End);
        assert!(scene.state().cue_ball.position.x > 3.5);
        assert_eq!(scene.state().camera.mode, CameraMode::Follow);
    }

    #[test]
    fn pocket_wins_over_stop_line_in_the_same_update() {
        let mut config = SceneConfig::default();
        config.layout.cue_ball.position = [0.0, 0.3, 0.0];
        config.layout.object_ball.position = [0.52, 0.3, 0.0];
        // Contact, pocket and the stop line all trip on the update that crosses x = 0.12.
        config.choreography.cue_ball_stop_x = 0.12;
        config.choreography.pocket_x = 0.55;
        let (mut scene, _) = director(config);
        scene.state.animation.enter(AnimationState::Rolling);

        let mut updates = 0;
        while scene.animation_state() == AnimationState::Rolling && updates < 120 {
            scene.update(DT);
            updates += 1;
        }

        let state = scene.state();
        assert_eq!(updates, 3);
        assert!(state.cue_ball.position.x > 0.12);
        assert!(state.object_ball.moving);
        assert_eq!(state.animation.state(), AnimationState::Pocket);
        assert_eq!(state.camera.mode, CameraMode::Overhead);
        assert!(state
            .lights
            .pockets
            .iter()
            .all(|&i| state.lights.lights[i].color() == [0.3, 0.8, 1.0]));
    }

    #[test]
    fn frame_runs_fixed_steps_then_draws() {
        let (mut scene, mut device) = director(SceneConfig::default());
        scene.start();

        // Half a step: nothing advances yet, but the frame still draws.
        assert_eq!(scene.frame(&mut device, DT / 2.0, Viewport::new(320, 240)), 0);
        assert_eq!(scene.state().animation.elapsed(), 0.0);
        assert_eq!(device.draws().len(), 10);

        device.clear();
        assert_eq!(scene.frame(&mut device, DT * 2.0, Viewport::new(320, 240)), 2);
        assert!((scene.state().animation.elapsed() - 2.0 * DT).abs() < 1e-6);
        assert_eq!(device.draws().len(), 10);
    }

    #[test]
    fn restart_reracks_the_table() {
        let (mut scene, _) = director(SceneConfig::default());
        scene.start();
        for _ in 0..600 {
            scene.update(DT);
        }
        assert_eq!(scene.animation_state(), AnimationState::End);

        assert!(scene.start());
        let state = scene.state();
        assert_eq!(state.animation.state(), AnimationState::Aiming);
        assert_eq!(state.camera.mode, CameraMode::Fixed);
        assert_eq!(state.object_ball.scale, 1.0);
        assert!(!state.object_ball.moving);
        assert_eq!(
            state.cue_ball.position,
            Point3::from(SceneConfig::default().layout.cue_ball.position)
        );
        assert!(state
            .lights
            .pockets
            .iter()
            .all(|&i| state.lights.lights[i].color() == [0.0; 3]));
    }

    #[test]
    fn cue_pulls_back_while_aiming() {
        let (mut scene, _) = director(SceneConfig::default());
        scene.start();
        scene.update(0.25);
        let expected = -1.5 - 2.5 + (0.25f32 * 3.0).sin() * 0.8;
        assert!((scene.state().cue.position.x - expected).abs() < 1e-5);

        scene.update(1.0); // into hit: no pull
        assert_eq!(scene.animation_state(), AnimationState::Hit);
        assert!((scene.state().cue.position.x - (-4.0)).abs() < 1e-5);
    }

    #[test]
    fn spotlight_follows_cue_ball() {
        let (mut scene, _) = director(SceneConfig::default());
        scene.start();
        scene.update(1.1);
        scene.update(0.35);
        let spot = scene.state().lights.spot;
        let position = scene.state().lights.lights[spot].position().unwrap();
        assert_eq!(position.x, scene.state().cue_ball.position.x);
        assert_eq!(position.y, 3.0);
    }

    #[test]
    fn render_draws_in_fixed_order() {
        let (scene, mut device) = director(SceneConfig::default());
        scene.render(&mut device, Viewport::new(800, 600));

        let sphere = 30 * 30 * 6;
        assert_eq!(
            device.draws(),
            vec![6, 36, 36, 36, 36, sphere, sphere, sphere, sphere, 36]
        );
        assert_eq!(device.calls[0], DeviceCall::BeginFrame { width: 800, height: 600 });
        assert_eq!(device.calls[1], DeviceCall::UseProgram(ShaderProgram::Standard));
    }

    #[test]
    fn pocket_adds_glow_pass() {
        let (mut scene, mut device) = director(SceneConfig::default());
        scene.state.animation.enter(AnimationState::Pocket);
        scene.render(&mut device, Viewport::new(640, 480));

        assert!(device
            .calls
            .contains(&DeviceCall::UseProgram(ShaderProgram::PocketGlow)));
        assert_eq!(device.draws().last(), Some(&6));
        assert_eq!(device.draws().len(), 11);
    }

    #[test]
    fn render_is_repeatable() {
        let (mut scene, mut device) = director(SceneConfig::default());
        scene.start();
        scene.update(0.4);
        scene.render(&mut device, Viewport::new(800, 600));
        let first = device.calls.clone();
        device.clear();
        scene.render(&mut device, Viewport::new(800, 600));
        assert_eq!(first, device.calls);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SceneConfig::default();
        config.layout.latitude_bands = 0;
        let mut device = RecordingDevice::new();
        assert!(SceneDirector::new(&mut device, config).is_err());
        assert!(device.calls.is_empty());
    }
}
