/// Pool3D Core Library - scene logic shared by every front end
///
/// Matrix and camera math, procedural meshes, the pool table entities, the scripted
/// shot animation, and the `GraphicsDevice` boundary the front ends implement.

pub mod animation;
pub mod config;
pub mod device;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod light;
pub mod projection;
pub mod scene;
pub mod time;
pub mod transform;

// Re-export commonly used types
pub use animation::{Animation, AnimationState};
pub use config::SceneConfig;
pub use device::{
    GraphicsDevice, MeshHandle, RecordingDevice, ShaderProgram, TextureHandle, UniformValue,
};
pub use entity::{Ball, Cue, Renderable, Table};
pub use error::SceneError;
pub use geometry::{Mesh, Triangle, Vertex};
pub use light::Light;
pub use projection::{Camera, CameraMode};
pub use scene::{SceneDirector, SceneState, Viewport};
pub use time::{FixedStep, FrameClock};
