/// Scene lights and their shader uniform payloads
use nalgebra::{Point3, Vector3};

use crate::device::UniformValue;

/// Shader-side light type tags (`u_lights[i].type`).
pub const LIGHT_DIRECTIONAL: i32 = 1;
pub const LIGHT_POINT: i32 = 2;
pub const LIGHT_SPOT: i32 = 3;

/// Upper bound on the shader's light array.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Directional {
        direction: Vector3<f32>,
        color: [f32; 3],
    },
    Point {
        position: Point3<f32>,
        color: [f32; 3],
    },
    Spot {
        position: Point3<f32>,
        direction: Vector3<f32>,
        color: [f32; 3],
        /// Cone half-angle in radians
        cutoff: f32,
    },
}

impl Light {
    pub fn color(&self) -> [f32; 3] {
        match self {
            Light::Directional { color, .. }
            | Light::Point { color, .. }
            | Light::Spot { color, .. } => *color,
        }
    }

    pub fn set_color(&mut self, new_color: [f32; 3]) {
        match self {
            Light::Directional { color, .. }
            | Light::Point { color, .. }
            | Light::Spot { color, .. } => *color = new_color,
        }
    }

    /// Moves positional lights; directional lights have no position and are left alone.
    pub fn set_position(&mut self, new_position: Point3<f32>) {
        match self {
            Light::Point { position, .. } | Light::Spot { position, .. } => {
                *position = new_position
            }
            Light::Directional { .. } => {}
        }
    }

    pub fn position(&self) -> Option<Point3<f32>> {
        match self {
            Light::Point { position, .. } | Light::Spot { position, .. } => Some(*position),
            Light::Directional { .. } => None,
        }
    }

    /// Named uniforms for slot `index` of the shader's light array.
    ///
    /// Spot lights send the cosine of their cutoff so the shader can compare it against a dot product.
    pub fn uniforms(&self, index: usize) -> Vec<(String, UniformValue)> {
        let name = |field: &str| format!("u_lights[{index}].{field}");
        match self {
            Light::Directional { direction, color } => vec![
                (name("type"), UniformValue::Int(LIGHT_DIRECTIONAL)),
                (name("direction"), UniformValue::Vec3((*direction).into())),
                (name("color"), UniformValue::Vec3(*color)),
            ],
            Light::Point { position, color } => vec![
                (name("type"), UniformValue::Int(LIGHT_POINT)),
                (name("position"), UniformValue::Vec3(position.coords.into())),
                (name("color"), UniformValue::Vec3(*color)),
            ],
            Light::Spot {
                position,
                direction,
                color,
                cutoff,
            } => vec![
                (name("type"), UniformValue::Int(LIGHT_SPOT)),
                (name("position"), UniformValue::Vec3(position.coords.into())),
                (name("direction"), UniformValue::Vec3((*direction).into())),
                (name("color"), UniformValue::Vec3(*color)),
                (name("cutoff"), UniformValue::Float(cutoff.cos())),
            ],
        }
    }
}

/// Ordered light list with the indices the scene animates.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    pub lights: Vec<Light>,
    pub spot: usize,
    pub pockets: Vec<usize>,
}

impl LightRig {
    /// Overhead lamp, a spotlight that follows the cue ball, and one dark point light at
    /// each table corner that lights up when a ball is pocketed.
    pub fn pool_table(half_width: f32, half_depth: f32) -> Self {
        let mut lights = vec![
            Light::Directional {
                direction: Vector3::new(0.0, -1.0, 0.0),
                color: [0.8, 0.8, 0.9],
            },
            Light::Spot {
                position: Point3::new(0.0, 3.0, 0.0),
                direction: Vector3::new(0.0, -1.0, 0.0),
                color: [1.2, 1.2, 1.0],
                cutoff: 0.6,
            },
        ];
        let mut pockets = Vec::with_capacity(4);
        for (x, z) in [
            (-half_width, half_depth),
            (-half_width, -half_depth),
            (half_width, half_depth),
            (half_width, -half_depth),
        ] {
            pockets.push(lights.len());
            lights.push(Light::Point {
                position: Point3::new(x, 0.5, z),
                color: [0.0; 3],
            });
        }
        Self {
            lights,
            spot: 1,
            pockets,
        }
    }

    pub fn set_pocket_color(&mut self, color: [f32; 3]) {
        for &i in &self.pockets {
            self.lights[i].set_color(color);
        }
    }

    pub fn follow(&mut self, target: &Point3<f32>, height: f32) {
        self.lights[self.spot].set_position(Point3::new(target.x, height, target.z));
    }
}
