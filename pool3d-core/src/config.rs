/// Scene configuration
///
/// Every threshold and layout value the choreography uses lives here. A JSON document
/// can override any subset of fields; missing fields keep their defaults.
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::geometry::Mesh;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub timing: TimingConfig,
    pub choreography: ChoreographyConfig,
    pub layout: LayoutConfig,
    pub clear_color: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            timing: TimingConfig::default(),
            choreography: ChoreographyConfig::default(),
            layout: LayoutConfig::default(),
            clear_color: [0.05, 0.1, 0.05, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in radians
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Eye of the fixed and overhead views
    pub overhead_eye: [f32; 3],
    /// Distance the follow camera trails behind the cue ball
    pub follow_distance: f32,
    pub follow_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
            overhead_eye: [0.0, 8.0, 0.0],
            follow_distance: 4.0,
            follow_height: 5.0,
        }
    }
}

/// Durations are seconds of time spent in a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub aim_duration: f32,
    pub hit_duration: f32,
    /// Pocket shrink progress per second; the ball is gone at progress 1
    pub pocket_shrink_rate: f32,
    /// Progress at which the pocket phase ends
    pub pocket_end: f32,
    /// Angular frequency of the aiming pull-back (rad/s)
    pub cue_pull_frequency: f32,
    pub cue_pull_amplitude: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            aim_duration: 1.0,
            hit_duration: 0.3,
            pocket_shrink_rate: 4.0,
            pocket_end: 1.2,
            cue_pull_frequency: 3.0,
            cue_pull_amplitude: 0.8,
        }
    }
}

/// The scripted two-ball shot along +X.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreographyConfig {
    /// Constant cue ball speed while rolling (units/s)
    pub cue_ball_speed: f32,
    /// Speed given to the object ball on contact
    pub impulse_speed: f32,
    /// Per-frame multiplicative velocity decay of the struck ball
    pub velocity_decay: f32,
    /// Contact happens when the cue ball is within this distance behind the object ball
    pub contact_distance: f32,
    /// Object ball X past which it drops into the pocket
    pub pocket_x: f32,
    /// Cue ball X past which the shot ends
    pub cue_ball_stop_x: f32,
    /// Cue stick sits this far behind the cue ball
    pub cue_offset: f32,
    /// Colour the corner lights take when a ball is pocketed
    pub pocket_light_color: [f32; 3],
    /// Height of the follow spotlight above the cue ball
    pub spotlight_height: f32,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            cue_ball_speed: 3.0,
            impulse_speed: 4.0,
            velocity_decay: 0.98,
            contact_distance: 0.4,
            pocket_x: 2.8,
            cue_ball_stop_x: 3.5,
            cue_offset: 2.5,
            pocket_light_color: [0.3, 0.8, 1.0],
            spotlight_height: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallConfig {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub ball_radius: f32,
    pub latitude_bands: u32,
    pub longitude_bands: u32,
    pub table_half_width: f32,
    pub table_half_depth: f32,
    pub table_height: f32,
    pub felt_color: [f32; 4],
    pub felt_texture: Option<String>,
    pub rail_color: [f32; 4],
    pub cue_color: [f32; 4],
    /// Cue stick at rest, before it is lined up behind the cue ball
    pub cue_position: [f32; 3],
    pub cue_ball: BallConfig,
    pub object_ball: BallConfig,
    /// Balls that sit out the shot
    pub extra_balls: Vec<BallConfig>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ball_radius: 0.2,
            latitude_bands: 30,
            longitude_bands: 30,
            table_half_width: 3.5,
            table_half_depth: 2.5,
            table_height: 0.1,
            felt_color: [40.0 / 255.0, 120.0 / 255.0, 40.0 / 255.0, 1.0],
            felt_texture: Some("textures/felt.jpg".to_string()),
            rail_color: [0.4, 0.22, 0.1, 1.0],
            cue_color: [0.76, 0.6, 0.42, 1.0],
            cue_position: [-2.0, 0.3, 0.0],
            cue_ball: BallConfig {
                position: [-1.5, 0.3, 0.0],
                color: [1.0, 1.0, 1.0, 1.0],
                texture: Some("textures/whiteball.jpg".to_string()),
            },
            object_ball: BallConfig {
                position: [0.5, 0.3, 0.0],
                color: [0.1, 0.1, 0.1, 1.0],
                texture: Some("textures/blackball.jpg".to_string()),
            },
            extra_balls: vec![
                BallConfig {
                    position: [1.5, 0.3, 1.2],
                    color: [1.0, 0.0, 0.0, 1.0],
                    texture: None,
                },
                BallConfig {
                    position: [1.5, 0.3, -1.2],
                    color: [0.0, 0.0, 1.0, 1.0],
                    texture: None,
                },
            ],
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values that would make matrices or meshes degenerate.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(invalid(format!(
                "camera requires 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(camera.fovy > 0.0 && camera.fovy < std::f32::consts::PI) {
            return Err(invalid(format!("camera fovy {} out of (0, pi)", camera.fovy)));
        }

        let timing = &self.timing;
        if timing.aim_duration < 0.0 || timing.hit_duration < 0.0 {
            return Err(invalid("state durations must not be negative".to_string()));
        }
        if timing.pocket_shrink_rate <= 0.0 {
            return Err(invalid("pocket_shrink_rate must be positive".to_string()));
        }

        let decay = self.choreography.velocity_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(invalid(format!("velocity_decay {decay} out of (0, 1]")));
        }

        let layout = &self.layout;
        Mesh::sphere_vertex_count(layout.latitude_bands, layout.longitude_bands)?;
        if layout.ball_radius <= 0.0 {
            return Err(invalid("ball_radius must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SceneError {
    SceneError::InvalidConfig(message)
}
