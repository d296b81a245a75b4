/// ASCII rasterizer implementing the scene's graphics device
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use pool3d_core::device::{GraphicsDevice, MeshHandle, ShaderProgram, TextureHandle, UniformValue};
use pool3d_core::error::Result;
use pool3d_core::light::{LIGHT_DIRECTIONAL, LIGHT_POINT, LIGHT_SPOT};
use pool3d_core::projection::project_to_screen;
use pool3d_core::{Mesh, Triangle};
use std::collections::HashMap;
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: u32 = 2;

const AMBIENT: f32 = 0.15;
const GLOW_COLOR: [f32; 3] = [0.3, 0.8, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    character: char,
    color: [f32; 3],
}

const EMPTY: Cell = Cell {
    character: ' ',
    color: [0.0; 3],
};

/// A shaded triangle in screen space, ready to fill
struct ScreenTriangle {
    coords: [(f32, f32, f32); 3],
    cell: Cell,
}

/// ASCII renderer that rasterizes device draw calls into terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    background: [f32; 3],
    meshes: Vec<Mesh>,
    textures: Vec<[u8; 4]>,
    bound_mesh: Option<MeshHandle>,
    bound_texture: Option<TextureHandle>,
    program: ShaderProgram,
    uniforms: HashMap<String, UniformValue>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
            background: [0.0; 3],
            meshes: Vec::new(),
            textures: Vec::new(),
            bound_mesh: None,
            bound_texture: None,
            program: ShaderProgram::Standard,
            uniforms: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
    }

    fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.depth_buffer = vec![f32::INFINITY; width * height];
            self.cells = vec![EMPTY; width * height];
        }
    }

    /// Character at a cell, for inspection.
    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.cells[y * self.width + x].character
    }

    fn mat4(&self, name: &str) -> Option<Matrix4<f32>> {
        match self.uniforms.get(name) {
            Some(UniformValue::Mat4(m)) => Some(Matrix4::from_column_slice(m)),
            _ => None,
        }
    }

    fn mat3(&self, name: &str) -> Option<Matrix3<f32>> {
        match self.uniforms.get(name) {
            Some(UniformValue::Mat3(m)) => Some(Matrix3::from_column_slice(m)),
            _ => None,
        }
    }

    fn vec3(&self, name: &str) -> Option<Vector3<f32>> {
        match self.uniforms.get(name) {
            Some(UniformValue::Vec3(v)) => Some(Vector3::from(*v)),
            _ => None,
        }
    }

    fn int(&self, name: &str) -> Option<i32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// Surface colour: the bound texture's placeholder texel, or the flat `u_color`.
    fn base_color(&self) -> [f32; 3] {
        if self.float("u_hasTexture").unwrap_or(0.0) > 0.5 {
            if let Some(texel) = self
                .bound_texture
                .and_then(|t| self.textures.get(t.0 as usize))
            {
                return [texel[0], texel[1], texel[2]].map(|c| c as f32 / 255.0);
            }
        }
        match self.uniforms.get("u_color") {
            Some(UniformValue::Vec4(c)) => [c[0], c[1], c[2]],
            _ => [1.0; 3],
        }
    }

    /// Light reaching a surface point, summed over the light uniforms.
    fn irradiance(&self, position: &Point3<f32>, normal: &Vector3<f32>) -> [f32; 3] {
        let mut total = [AMBIENT; 3];
        let count = self.int("u_lightCount").unwrap_or(0).max(0);
        for i in 0..count {
            let field = |name: &str| format!("u_lights[{i}].{name}");
            let Some(color) = self.vec3(&field("color")) else {
                continue;
            };
            let factor = match self.int(&field("type")) {
                Some(LIGHT_DIRECTIONAL) => self
                    .vec3(&field("direction"))
                    .map_or(0.0, |dir| normal.dot(&-dir.normalize()).max(0.0)),
                Some(LIGHT_POINT) => self.vec3(&field("position")).map_or(0.0, |light| {
                    let to_light = light - position.coords;
                    let falloff = 1.0 / (1.0 + 0.1 * to_light.norm_squared());
                    normal.dot(&to_light.normalize()).max(0.0) * falloff
                }),
                Some(LIGHT_SPOT) => {
                    let light = self.vec3(&field("position"));
                    let dir = self.vec3(&field("direction"));
                    let cutoff = self.float(&field("cutoff")).unwrap_or(1.0);
                    match (light, dir) {
                        (Some(light), Some(dir)) => {
                            let to_light = (light - position.coords).normalize();
                            if (-to_light).dot(&dir.normalize()) >= cutoff {
                                normal.dot(&to_light).max(0.0)
                            } else {
                                0.0
                            }
                        }
                        _ => 0.0,
                    }
                }
                _ => 0.0,
            };
            for (channel, c) in total.iter_mut().zip(color.iter()) {
                *channel += c * factor;
            }
        }
        total
    }

    fn shade_triangle(
        &self,
        triangle: &Triangle,
        mvp: &Matrix4<f32>,
        model: &Matrix4<f32>,
        normal_matrix: &Matrix3<f32>,
        base: [f32; 3],
    ) -> Option<ScreenTriangle> {
        // Project vertices to screen space; the scene hands us the projection for
        // CELL_ASPECT-times as many rows as there are, so squash y back down.
        let mut coords = [(0.0, 0.0, 0.0); 3];
        for (out, vertex) in coords.iter_mut().zip(&triangle.vertices) {
            let (x, y, z) = project_to_screen(
                &vertex.position,
                mvp,
                self.width as u32,
                (self.height as u32) * CELL_ASPECT,
            )?; // Triangle is clipped
            *out = (x, y / CELL_ASPECT as f32, z);
        }

        // Average the vertex normals: sphere winding runs the other way from the cube's.
        let local_normal = triangle
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.normal);
        let normal = (normal_matrix * local_normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y);
        let centroid = Point3::from(
            triangle
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.position.coords)
                / 3.0,
        );
        let light = self.irradiance(&model.transform_point(&centroid), &normal);

        let color = [0, 1, 2].map(|i| (base[i] * light[i]).min(1.0));
        let brightness = 0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2];

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);

        Some(ScreenTriangle {
            coords,
            cell: Cell {
                character: LUMINOSITY_RAMP[char_index],
                color,
            },
        })
    }

    fn rasterize_triangle(&mut self, triangle: &ScreenTriangle, glow: Option<f32>) {
        let [v0, v1, v2] = triangle.coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;

                match glow {
                    // Overdraw pass: tint what is already there at the same depth
                    Some(strength) => {
                        if depth <= self.depth_buffer[idx] + 1e-5 {
                            let cell = &mut self.cells[idx];
                            for (c, g) in cell.color.iter_mut().zip(GLOW_COLOR) {
                                *c += (g - *c) * strength;
                            }
                        }
                    }
                    None => {
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.cells[idx] = triangle.cell;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                let rgb = if cell.character == ' ' {
                    self.background
                } else {
                    cell.color
                };
                let color = to_terminal_color(rgb);
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(cell.character))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl GraphicsDevice for AsciiRenderer {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle> {
        self.meshes.push(mesh.clone());
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn load_texture(&mut self, path: &str, placeholder: [u8; 4]) -> TextureHandle {
        log::debug!("terminal: no image loading, {path} stays {placeholder:?}");
        self.textures.push(placeholder);
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn begin_frame(&mut self, width: u32, height: u32, clear_color: [f32; 4]) {
        self.resize(width as usize, (height / CELL_ASPECT) as usize);
        self.background = [clear_color[0], clear_color[1], clear_color[2]];
        self.clear();
    }

    fn use_program(&mut self, program: ShaderProgram) {
        self.program = program;
    }

    fn bind_mesh(&mut self, mesh: MeshHandle) {
        self.bound_mesh = Some(mesh);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.bound_texture = Some(texture);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let Some(handle) = self.bound_mesh else {
            log::warn!("terminal: draw with no mesh bound");
            return;
        };
        let Some(mesh) = self.meshes.get(handle.0 as usize) else {
            log::warn!("terminal: unknown mesh {handle:?}");
            return;
        };
        let (Some(mvp), Some(model)) = (self.mat4("u_mvpMatrix"), self.mat4("u_modelMatrix")) else {
            log::warn!("terminal: draw without transform uniforms");
            return;
        };
        let normal_matrix = self.mat3("u_normalMatrix").unwrap_or_else(Matrix3::identity);
        let glow = match self.program {
            ShaderProgram::Standard => None,
            ShaderProgram::PocketGlow => {
                let time = self.float("u_time").unwrap_or(0.0);
                Some(0.25 + 0.25 * (time * 6.0).sin())
            }
        };
        let base = self.base_color();

        let count = (index_count as usize).min(mesh.index_count()) / 3;
        let shaded: Vec<ScreenTriangle> = mesh
            .triangles()
            .take(count)
            .filter_map(|tri| self.shade_triangle(&tri, &mvp, &model, &normal_matrix, base))
            .collect();
        for triangle in &shaded {
            self.rasterize_triangle(triangle, glow);
        }
    }
}

fn to_terminal_color(rgb: [f32; 3]) -> Color {
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
    Color::Rgb { r, g, b }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
