/// Renderable scene entities: balls, the table and the cue stick
///
/// Each entity builds and uploads its meshes once at construction, then exposes one or
/// more `Surface`s per frame. Drawing is shared through `Renderable::draw`, which
/// never mutates the entity; only the scene director moves things around.
use nalgebra::{Point3, Vector3};

use crate::config::{BallConfig, LayoutConfig};
use crate::device::{GraphicsDevice, MeshHandle, TextureHandle, UniformValue};
use crate::error::Result;
use crate::geometry::Mesh;
use crate::light::{Light, MAX_LIGHTS};
use crate::transform::{
    mat3_to_array, mat4_to_array, multiply, normal_matrix, rotate_y, scale, translate, Mat4, Vec3,
};

pub type Rgba = [f32; 4];

/// Per-frame inputs shared by every draw call.
pub struct FrameContext<'a> {
    pub view_projection: Mat4,
    pub camera_position: Point3<f32>,
    pub lights: &'a [Light],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Textured(TextureHandle),
    Flat(Rgba),
}

/// One indexed draw: a mesh placed in the world with a material.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub mesh: MeshHandle,
    pub index_count: u32,
    pub model: Mat4,
    pub material: Material,
}

pub trait Renderable {
    fn surfaces(&self) -> Vec<Surface>;

    fn draw(&self, device: &mut dyn GraphicsDevice, frame: &FrameContext<'_>) {
        for surface in self.surfaces() {
            draw_surface(device, frame, &surface);
        }
    }
}

/// Issues the full uniform set and one indexed draw for `surface`.
pub fn draw_surface(device: &mut dyn GraphicsDevice, frame: &FrameContext<'_>, surface: &Surface) {
    let mvp = multiply(&frame.view_projection, &surface.model);
    let normal = normal_matrix(&surface.model);

    device.bind_mesh(surface.mesh);
    device.set_uniform("u_mvpMatrix", UniformValue::Mat4(mat4_to_array(&mvp)));
    device.set_uniform(
        "u_modelMatrix",
        UniformValue::Mat4(mat4_to_array(&surface.model)),
    );
    device.set_uniform("u_normalMatrix", UniformValue::Mat3(mat3_to_array(&normal)));
    device.set_uniform(
        "u_cameraPos",
        UniformValue::Vec3(frame.camera_position.coords.into()),
    );

    let lights = &frame.lights[..frame.lights.len().min(MAX_LIGHTS)];
    device.set_uniform("u_lightCount", UniformValue::Int(lights.len() as i32));
    for (i, light) in lights.iter().enumerate() {
        for (name, value) in light.uniforms(i) {
            device.set_uniform(&name, value);
        }
    }

    match surface.material {
        Material::Textured(texture) => {
            device.bind_texture(texture);
            device.set_uniform("u_texture", UniformValue::Int(0));
            device.set_uniform("u_hasTexture", UniformValue::Float(1.0));
        }
        Material::Flat(color) => {
            device.set_uniform("u_color", UniformValue::Vec4(color));
            device.set_uniform("u_hasTexture", UniformValue::Float(0.0));
        }
    }

    device.draw_indexed(surface.index_count);
}

/// 8-bit placeholder texel for a colour, shown until the real image loads.
pub fn placeholder_texel(color: Rgba) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn material_for(
    device: &mut dyn GraphicsDevice,
    texture: Option<&str>,
    color: Rgba,
) -> Material {
    match texture {
        Some(path) => Material::Textured(device.load_texture(path, placeholder_texel(color))),
        None => Material::Flat(color),
    }
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub position: Point3<f32>,
    pub radius: f32,
    /// Uniform scale; shrinks to zero while the ball drops into a pocket
    pub scale: f32,
    pub color: Rgba,
    pub velocity: f32,
    pub moving: bool,
    rack_position: Point3<f32>,
    mesh: Mesh,
    mesh_handle: MeshHandle,
    material: Material,
}

impl Ball {
    pub fn new(
        device: &mut dyn GraphicsDevice,
        config: &BallConfig,
        layout: &LayoutConfig,
    ) -> Result<Self> {
        let mesh = Mesh::uv_sphere(
            layout.latitude_bands,
            layout.longitude_bands,
            layout.ball_radius,
        )?;
        let mesh_handle = device.upload_mesh(&mesh)?;
        let material = material_for(device, config.texture.as_deref(), config.color);
        let position = Point3::from(config.position);

        Ok(Self {
            position,
            radius: layout.ball_radius,
            scale: 1.0,
            color: config.color,
            velocity: 0.0,
            moving: false,
            rack_position: position,
            mesh,
            mesh_handle,
            material,
        })
    }

    /// Puts the ball back on its starting spot, at rest and full size.
    pub fn rerack(&mut self) {
        self.position = self.rack_position;
        self.scale = 1.0;
        self.velocity = 0.0;
        self.moving = false;
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn model_matrix(&self) -> Mat4 {
        let model = translate(&Mat4::identity(), &self.position.coords);
        scale(&model, &Vec3::repeat(self.scale))
    }
}

impl Renderable for Ball {
    fn surfaces(&self) -> Vec<Surface> {
        vec![Surface {
            mesh: self.mesh_handle,
            index_count: self.mesh.index_count() as u32,
            model: self.model_matrix(),
            material: self.material,
        }]
    }
}

const RAIL_WIDTH: f32 = 0.2;
const RAIL_HEIGHT: f32 = 0.2;

/// Felt playing surface framed by four wooden rails.
#[derive(Debug, Clone)]
pub struct Table {
    pub half_width: f32,
    pub half_depth: f32,
    pub height: f32,
    felt: Mesh,
    felt_handle: MeshHandle,
    felt_material: Material,
    rail: Mesh,
    rail_handle: MeshHandle,
    rail_color: Rgba,
}

impl Table {
    pub fn new(device: &mut dyn GraphicsDevice, layout: &LayoutConfig) -> Result<Self> {
        let felt = Mesh::quad(
            layout.table_half_width,
            layout.table_half_depth,
            layout.table_height,
        );
        let felt_handle = device.upload_mesh(&felt)?;
        let felt_material = material_for(device, layout.felt_texture.as_deref(), layout.felt_color);

        let rail = Mesh::cube(1.0);
        let rail_handle = device.upload_mesh(&rail)?;

        Ok(Self {
            half_width: layout.table_half_width,
            half_depth: layout.table_half_depth,
            height: layout.table_height,
            felt,
            felt_handle,
            felt_material,
            rail,
            rail_handle,
            rail_color: layout.rail_color,
        })
    }

    /// Felt only, for the pocket-glow overdraw.
    pub fn felt_surface(&self) -> Surface {
        Surface {
            mesh: self.felt_handle,
            index_count: self.felt.index_count() as u32,
            model: Mat4::identity(),
            material: self.felt_material,
        }
    }

    fn rail_models(&self) -> [Mat4; 4] {
        let y = self.height + RAIL_HEIGHT / 2.0 - 0.05;
        let long = Vec3::new(2.0 * (self.half_width + RAIL_WIDTH), RAIL_HEIGHT, RAIL_WIDTH);
        let short = Vec3::new(RAIL_WIDTH, RAIL_HEIGHT, 2.0 * self.half_depth);
        let z = self.half_depth + RAIL_WIDTH / 2.0;
        let x = self.half_width + RAIL_WIDTH / 2.0;

        let place = |center: Vec3, size: &Vec3| scale(&translate(&Mat4::identity(), &center), size);
        [
            place(Vec3::new(0.0, y, z), &long),
            place(Vec3::new(0.0, y, -z), &long),
            place(Vec3::new(x, y, 0.0), &short),
            place(Vec3::new(-x, y, 0.0), &short),
        ]
    }
}

impl Renderable for Table {
    fn surfaces(&self) -> Vec<Surface> {
        let mut surfaces = vec![self.felt_surface()];
        for model in self.rail_models() {
            surfaces.push(Surface {
                mesh: self.rail_handle,
                index_count: self.rail.index_count() as u32,
                model,
                material: Material::Flat(self.rail_color),
            });
        }
        surfaces
    }
}

const CUE_LENGTH: f32 = 2.1;
const CUE_WIDTH: f32 = 0.1;
const CUE_THICKNESS: f32 = 0.04;

/// Cue stick: a stretched cube with its butt at `position`, pointing along `heading`.
#[derive(Debug, Clone)]
pub struct Cue {
    pub position: Point3<f32>,
    /// Rotation about +Y; `pi/2` points the tip down +X
    pub heading: f32,
    pub color: Rgba,
    rest_position: Point3<f32>,
    mesh: Mesh,
    mesh_handle: MeshHandle,
}

impl Cue {
    pub fn new(device: &mut dyn GraphicsDevice, layout: &LayoutConfig) -> Result<Self> {
        let mesh = Mesh::cube(1.0);
        let mesh_handle = device.upload_mesh(&mesh)?;
        let position = Point3::from(layout.cue_position);
        Ok(Self {
            position,
            heading: std::f32::consts::FRAC_PI_2,
            color: layout.cue_color,
            rest_position: position,
            mesh,
            mesh_handle,
        })
    }

    pub fn rerack(&mut self) {
        self.position = self.rest_position;
    }

    pub fn model_matrix(&self) -> Mat4 {
        let model = translate(&Mat4::identity(), &self.position.coords);
        let model = rotate_y(&model, self.heading);
        let model = translate(&model, &Vector3::new(0.0, 0.0, CUE_LENGTH / 2.0));
        scale(&model, &Vec3::new(CUE_WIDTH, CUE_THICKNESS, CUE_LENGTH))
    }
}

impl Renderable for Cue {
    fn surfaces(&self) -> Vec<Surface> {
        vec![Surface {
            mesh: self.mesh_handle,
            index_count: self.mesh.index_count() as u32,
            model: self.model_matrix(),
            material: Material::Flat(self.color),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceCall, RecordingDevice};
    use crate::light::LightRig;

    fn frame(lights: &[Light]) -> FrameContext<'_> {
        FrameContext {
            view_projection: Mat4::identity(),
            camera_position: Point3::new(0.0, 8.0, 0.0),
            lights,
        }
    }

    #[test]
    fn ball_uploads_sphere_and_texture() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let ball = Ball::new(&mut device, &layout.cue_ball, &layout).unwrap();
        assert_eq!(ball.mesh().vertices.len(), 31 * 31);
        assert_eq!(
            device.calls[1],
            DeviceCall::LoadTexture {
                path: "textures/whiteball.jpg".to_string(),
                placeholder: [255, 255, 255, 255],
            }
        );
    }

    #[test]
    fn ball_draw_is_idempotent_and_pure() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let ball = Ball::new(&mut device, &layout.object_ball, &layout).unwrap();
        let rig = LightRig::pool_table(3.5, 2.5);
        let before = (ball.position, ball.scale, ball.color);

        device.clear();
        ball.draw(&mut device, &frame(&rig.lights));
        let first = device.calls.clone();
        device.clear();
        ball.draw(&mut device, &frame(&rig.lights));

        assert_eq!(first, device.calls);
        assert_eq!(before, (ball.position, ball.scale, ball.color));
        assert_eq!(device.draws(), vec![30 * 30 * 6]);
    }

    #[test]
    fn draw_sends_lights_and_matrices() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let ball = Ball::new(&mut device, &layout.extra_balls[0], &layout).unwrap();
        let rig = LightRig::pool_table(3.5, 2.5);
        ball.draw(&mut device, &frame(&rig.lights));

        assert_eq!(device.last_uniform("u_lightCount"), Some(UniformValue::Int(6)));
        assert_eq!(
            device.last_uniform("u_lights[5].type"),
            Some(UniformValue::Int(crate::light::LIGHT_POINT))
        );
        assert_eq!(
            device.last_uniform("u_color"),
            Some(UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
        );
        assert_eq!(device.last_uniform("u_hasTexture"), Some(UniformValue::Float(0.0)));

        // Identity view-projection: mvp equals the model matrix.
        assert_eq!(
            device.last_uniform("u_mvpMatrix"),
            Some(UniformValue::Mat4(mat4_to_array(&ball.model_matrix())))
        );
    }

    #[test]
    fn ball_model_translates_then_scales() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let mut ball = Ball::new(&mut device, &layout.cue_ball, &layout).unwrap();
        ball.scale = 0.5;
        let top = ball
            .model_matrix()
            .transform_point(&Point3::new(0.0, ball.radius, 0.0));
        assert!((top.y - (0.3 + 0.1)).abs() < 1e-6);
        assert!((top.x + 1.5).abs() < 1e-6);
    }

    #[test]
    fn ball_rerack_restores_start() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let mut ball = Ball::new(&mut device, &layout.object_ball, &layout).unwrap();
        ball.position.x = 2.9;
        ball.scale = 0.0;
        ball.velocity = 1.0;
        ball.moving = true;
        ball.rerack();
        assert_eq!(ball.position, Point3::from(layout.object_ball.position));
        assert_eq!(ball.scale, 1.0);
        assert!(!ball.moving);
    }

    #[test]
    fn table_draws_felt_and_rails() {
        let mut device = RecordingDevice::new();
        let layout = LayoutConfig::default();
        let table = Table::new(&mut device, &layout).unwrap();
        device.clear();
        table.draw(&mut device, &frame(&[]));
        assert_eq!(device.draws(), vec![6, 36, 36, 36, 36]);
        assert!(device
            .calls
            .iter()
            .any(|c| matches!(c, DeviceCall::BindTexture(_))));
    }

    #[test]
    fn cue_points_down_positive_x() {
        let mut device = RecordingDevice::new();
        let mut cue = Cue::new(&mut device, &LayoutConfig::default()).unwrap();
        cue.position = Point3::new(-3.0, 0.3, 0.0);
        // The unit cube's +Z face is the tip once scaled to a stick.
        let tip = cue
            .model_matrix()
            .transform_point(&Point3::new(0.0, 0.0, 0.5));
        assert!((tip.x - (-3.0 + CUE_LENGTH)).abs() < 1e-5);
        assert!(tip.z.abs() < 1e-5);
        assert!((tip.y - 0.3).abs() < 1e-6);
    }

    #[test]
    fn placeholder_from_color() {
        assert_eq!(placeholder_texel([0.1, 0.1, 0.1, 1.0]), [26, 26, 26, 255]);
        assert_eq!(placeholder_texel([2.0, -1.0, 0.5, 1.0]), [255, 0, 128, 255]);
    }
}
