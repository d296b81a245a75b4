/// WebGL2 implementation of the scene's graphics device
///
/// Each uploaded mesh gets its own vertex array object. Both shader programs bind
/// `a_position`, `a_normal` and `a_texcoord` to the same attribute slots before linking,
/// so a mesh's VAO works under either program. Uniform locations are looked up once
/// per program and name, then cached.
use pool3d_core::device::{GraphicsDevice, MeshHandle, ShaderProgram, TextureHandle, UniformValue};
use pool3d_core::error::{Result, SceneError};
use pool3d_core::Mesh;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlImageElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::shaders;

const ATTRIB_POSITION: u32 = 0;
const ATTRIB_NORMAL: u32 = 1;
const ATTRIB_TEXCOORD: u32 = 2;

struct GpuMesh {
    vao: WebGlVertexArrayObject,
    // Owned by the VAO; kept so the buffers live as long as the mesh
    _buffers: Vec<WebGlBuffer>,
}

pub struct WebGlDevice {
    gl: Gl,
    standard: WebGlProgram,
    pocket_glow: WebGlProgram,
    current: ShaderProgram,
    meshes: Vec<GpuMesh>,
    bound_mesh: Option<MeshHandle>,
    textures: Vec<Option<WebGlTexture>>,
    uniforms: HashMap<(ShaderProgram, String), Option<WebGlUniformLocation>>,
}

impl WebGlDevice {
    /// Compiles and links both programs. Shader errors are fatal.
    pub fn new(gl: Gl) -> Result<Self> {
        let standard = link_program(&gl, shaders::STANDARD_VERT, shaders::STANDARD_FRAG)?;
        let pocket_glow = link_program(&gl, shaders::STANDARD_VERT, shaders::POCKET_GLOW_FRAG)?;

        gl.enable(Gl::DEPTH_TEST);
        gl.use_program(Some(&standard));

        Ok(Self {
            gl,
            standard,
            pocket_glow,
            current: ShaderProgram::Standard,
            meshes: Vec::new(),
            bound_mesh: None,
            textures: Vec::new(),
            uniforms: HashMap::new(),
        })
    }

    fn program(&self, program: ShaderProgram) -> &WebGlProgram {
        match program {
            ShaderProgram::Standard => &self.standard,
            ShaderProgram::PocketGlow => &self.pocket_glow,
        }
    }

    fn uniform_location(&mut self, name: &str) -> Option<WebGlUniformLocation> {
        let key = (self.current, name.to_string());
        if let Some(location) = self.uniforms.get(&key) {
            return location.clone();
        }
        // Unused uniforms are compiled out; cache the miss too
        let location = self.gl.get_uniform_location(self.program(self.current), name);
        self.uniforms.insert(key, location.clone());
        location
    }

    /// Surfaces any GL error raised since the last check.
    pub fn check_error(&self) -> Result<()> {
        match self.gl.get_error() {
            Gl::NO_ERROR => Ok(()),
            code => Err(SceneError::Device(format!("GL error 0x{:04x}", code))),
        }
    }

    fn create_buffer(&self, target: u32, bytes: &[u8]) -> Result<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| SceneError::Device("failed to create buffer".into()))?;
        self.gl.bind_buffer(target, Some(&buffer));
        self.gl.buffer_data_with_u8_array(target, bytes, Gl::STATIC_DRAW);
        Ok(buffer)
    }

    fn attribute(&self, slot: u32, size: i32, data: &[f32]) -> Result<WebGlBuffer> {
        let buffer = self.create_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(data))?;
        self.gl.enable_vertex_attrib_array(slot);
        self.gl
            .vertex_attrib_pointer_with_i32(slot, size, Gl::FLOAT, false, 0, 0);
        Ok(buffer)
    }
}

impl GraphicsDevice for WebGlDevice {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle> {
        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| SceneError::Device("failed to create vertex array".into()))?;
        self.gl.bind_vertex_array(Some(&vao));

        let buffers = vec![
            self.attribute(ATTRIB_POSITION, 3, &mesh.positions_flat())?,
            self.attribute(ATTRIB_NORMAL, 3, &mesh.normals_flat())?,
            self.attribute(ATTRIB_TEXCOORD, 2, &mesh.texcoords_flat())?,
            // Element buffer binding is recorded in the VAO
            self.create_buffer(Gl::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(&mesh.indices))?,
        ];

        self.gl.bind_vertex_array(None);
        self.bound_mesh = None;

        self.meshes.push(GpuMesh {
            vao,
            _buffers: buffers,
        });
        log::debug!(
            "webgl: uploaded mesh {} ({} vertices, {} indices)",
            self.meshes.len() - 1,
            mesh.vertices.len(),
            mesh.index_count()
        );
        Ok(MeshHandle(self.meshes.len() as u32 - 1))
    }

    fn load_texture(&mut self, path: &str, placeholder: [u8; 4]) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        let Some(texture) = self.gl.create_texture() else {
            log::error!("webgl: failed to create texture for {}", path);
            self.textures.push(None);
            return handle;
        };

        self.gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        if let Err(e) = self
            .gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                1,
                1,
                0,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                Some(&placeholder),
            )
        {
            log::warn!("webgl: placeholder upload for {} failed: {:?}", path, e);
        }
        self.gl
            .tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);

        match HtmlImageElement::new() {
            Ok(image) => fetch_image(&self.gl, &texture, image, path),
            Err(e) => log::warn!("webgl: cannot load {}: {:?}", path, e),
        }

        self.textures.push(Some(texture));
        handle
    }

    fn begin_frame(&mut self, width: u32, height: u32, clear_color: [f32; 4]) {
        let [r, g, b, a] = clear_color;
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.gl.clear_color(r, g, b, a);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn use_program(&mut self, program: ShaderProgram) {
        self.current = program;
        self.gl.use_program(Some(self.program(program)));
        match program {
            ShaderProgram::Standard => {
                self.gl.disable(Gl::BLEND);
                self.gl.depth_func(Gl::LESS);
            }
            // Overdraw on top of already-drawn geometry, additively
            ShaderProgram::PocketGlow => {
                self.gl.enable(Gl::BLEND);
                self.gl.blend_func(Gl::SRC_ALPHA, Gl::ONE);
                self.gl.depth_func(Gl::LEQUAL);
            }
        }
    }

    fn bind_mesh(&mut self, mesh: MeshHandle) {
        match self.meshes.get(mesh.0 as usize) {
            Some(gpu) => {
                self.gl.bind_vertex_array(Some(&gpu.vao));
                self.bound_mesh = Some(mesh);
            }
            None => {
                log::warn!("webgl: unknown mesh {:?}", mesh);
                self.bound_mesh = None;
            }
        }
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let location = self.uniform_location(name);
        let location = location.as_ref();
        match value {
            UniformValue::Int(v) => self.gl.uniform1i(location, v),
            UniformValue::Float(v) => self.gl.uniform1f(location, v),
            UniformValue::Vec3(v) => self.gl.uniform3fv_with_f32_array(location, &v),
            UniformValue::Vec4(v) => self.gl.uniform4fv_with_f32_array(location, &v),
            UniformValue::Mat3(m) => self.gl.uniform_matrix3fv_with_f32_array(location, false, &m),
            UniformValue::Mat4(m) => self.gl.uniform_matrix4fv_with_f32_array(location, false, &m),
        }
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        let texture = self.textures.get(texture.0 as usize).and_then(Option::as_ref);
        self.gl.active_texture(Gl::TEXTURE0);
        self.gl.bind_texture(Gl::TEXTURE_2D, texture);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        if self.bound_mesh.is_none() {
            log::warn!("webgl: draw with no mesh bound");
            return;
        }
        self.gl
            .draw_elements_with_i32(Gl::TRIANGLES, index_count as i32, Gl::UNSIGNED_SHORT, 0);
    }
}

/// Starts an asynchronous image load that replaces the texture's placeholder on success.
fn fetch_image(gl: &Gl, texture: &WebGlTexture, image: HtmlImageElement, path: &str) {
    let onload = {
        let gl = gl.clone();
        let texture = texture.clone();
        let loaded = image.clone();
        let path = path.to_string();
        Closure::<dyn FnMut()>::new(move || {
            gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
            if let Err(e) = gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                &loaded,
            ) {
                log::warn!("webgl: upload of {} failed: {:?}", path, e);
                return;
            }
            gl.generate_mipmap(Gl::TEXTURE_2D);
            gl.tex_parameteri(
                Gl::TEXTURE_2D,
                Gl::TEXTURE_MIN_FILTER,
                Gl::LINEAR_MIPMAP_LINEAR as i32,
            );
            log::info!("webgl: loaded texture {}", path);
        })
    };
    let onerror = {
        let path = path.to_string();
        Closure::<dyn FnMut()>::new(move || {
            log::warn!("webgl: could not load {}, keeping placeholder colour", path);
        })
    };

    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    image.set_src(path);

    // The image element owns the callbacks from here on
    onload.forget();
    onerror.forget();
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| SceneError::Device("failed to create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(SceneError::Device(format!("shader compile failed: {}", info)))
    }
}

fn link_program(gl: &Gl, vertex: &str, fragment: &str) -> Result<WebGlProgram> {
    let vs = compile_shader(gl, Gl::VERTEX_SHADER, vertex)?;
    let fs = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment)?;
    let program = gl
        .create_program()
        .ok_or_else(|| SceneError::Device("failed to create program".into()))?;

    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.bind_attrib_location(&program, ATTRIB_POSITION, "a_position");
    gl.bind_attrib_location(&program, ATTRIB_NORMAL, "a_normal");
    gl.bind_attrib_location(&program, ATTRIB_TEXCOORD, "a_texcoord");
    gl.link_program(&program);

    let linked = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));
    if linked {
        Ok(program)
    } else {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        Err(SceneError::Device(format!("program link failed: {}", info)))
    }
}
