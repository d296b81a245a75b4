/// Graphics device boundary
///
/// The scene never talks to a GPU API directly. Everything it needs is expressed as the
/// handful of opaque operations on `GraphicsDevice`: upload a mesh, bind it, set named
/// uniforms, bind a texture, issue an indexed triangle draw. Backends (WebGL2 in the
/// browser, the ASCII rasterizer in a terminal) implement the trait; the core never reads
/// anything back from the device.
///
/// Per-draw failures are the device's business: it reports them on its own diagnostic
/// channel (a log line) and carries on. Only mesh upload returns a `Result`, because a
/// mesh that could not be uploaded can never be drawn.
use crate::error::Result;
use crate::geometry::Mesh;

/// Opaque handle to an uploaded mesh (vertex + index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Opaque handle to a texture; bound to a 1x1 placeholder until its image arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Shader programs the scene switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    /// Lit, textured or flat-coloured surfaces
    Standard,
    /// Pulsing rim light drawn over the table while a ball drops into a pocket
    PocketGlow,
}

/// A value for a named shader uniform. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

/// Operations the scene issues against a graphics backend.
pub trait GraphicsDevice {
    /// Allocate GPU buffers for a mesh. Called once per mesh at scene construction.
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle>;

    /// Start loading a texture image. `placeholder` is bound until the image is ready,
    /// and stays bound if loading fails.
    fn load_texture(&mut self, path: &str, placeholder: [u8; 4]) -> TextureHandle;

    /// Clear colour and depth for a new frame and set the viewport.
    fn begin_frame(&mut self, width: u32, height: u32, clear_color: [f32; 4]);

    fn use_program(&mut self, program: ShaderProgram);

    fn bind_mesh(&mut self, mesh: MeshHandle);

    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn bind_texture(&mut self, texture: TextureHandle);

    /// Draw `index_count` indices of the bound mesh as triangles.
    fn draw_indexed(&mut self, index_count: u32);
}

/// One recorded device operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    UploadMesh { vertices: usize, indices: usize },
    LoadTexture { path: String, placeholder: [u8; 4] },
    BeginFrame { width: u32, height: u32 },
    UseProgram(ShaderProgram),
    BindMesh(MeshHandle),
    SetUniform(String, UniformValue),
    BindTexture(TextureHandle),
    DrawIndexed(u32),
}

/// A device that draws nothing and remembers every call, for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<DeviceCall>,
    meshes: u32,
    textures: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Index counts of every draw call, in order.
    pub fn draws(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DrawIndexed(count) => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Most recent value set for a uniform, if any.
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.calls.iter().rev().find_map(|call| match call {
            DeviceCall::SetUniform(n, value) if n == name => Some(*value),
            _ => None,
        })
    }
}

impl GraphicsDevice for RecordingDevice {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle> {
        self.calls.push(DeviceCall::UploadMesh {
            vertices: mesh.vertices.len(),
            indices: mesh.indices.len(),
        });
        self.meshes += 1;
        Ok(MeshHandle(self.meshes - 1))
    }

    fn load_texture(&mut self, path: &str, placeholder: [u8; 4]) -> TextureHandle {
        self.calls.push(DeviceCall::LoadTexture {
            path: path.to_string(),
            placeholder,
        });
        self.textures += 1;
        TextureHandle(self.textures - 1)
    }

    fn begin_frame(&mut self, width: u32, height: u32, _clear_color: [f32; 4]) {
        self.calls.push(DeviceCall::BeginFrame { width, height });
    }

    fn use_program(&mut self, program: ShaderProgram) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn bind_mesh(&mut self, mesh: MeshHandle) {
        self.calls.push(DeviceCall::BindMesh(mesh));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.calls.push(DeviceCall::SetUniform(name.to_string(), value));
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.calls.push(DeviceCall::BindTexture(texture));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(DeviceCall::DrawIndexed(index_count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_device_hands_out_distinct_handles() {
        let mut device = RecordingDevice::new();
        let a = device.upload_mesh(&Mesh::cube(1.0)).unwrap();
        let b = device.upload_mesh(&Mesh::quad(1.0, 1.0, 0.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            device.calls[0],
            DeviceCall::UploadMesh {
                vertices: 24,
                indices: 36
            }
        );
    }

    #[test]
    fn recording_device_last_uniform() {
        let mut device = RecordingDevice::new();
        device.set_uniform("u_time", UniformValue::Float(1.0));
        device.set_uniform("u_time", UniformValue::Float(2.0));
        device.draw_indexed(6);
        assert_eq!(device.last_uniform("u_time"), Some(UniformValue::Float(2.0)));
        assert_eq!(device.last_uniform("u_missing"), None);
        assert_eq!(device.draws(), vec![6]);
    }
}
