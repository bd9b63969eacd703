//! # Lightbox
//!
//! **An interactive viewer for lit primitive meshes.**
//!
//! One primitive (sphere, cube, cylinder, pyramid or torus) sits on a ground
//! slab under up to eight point or directional lights. The camera orbits with
//! the mouse and zooms, dollies or changes its field of view with the wheel.
//! Hotkeys toggle culling, depth testing, wireframe, light gizmos and a
//! normals view; the window title reads back the current parameters.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lightbox::{AppConfig, Primitive, SceneState};
//!
//! fn main() -> Result<(), lightbox::AppError> {
//!     let scene = SceneState::new()
//!         .with_primitive(Primitive::Cylinder)
//!         .with_light_count(3);
//!     lightbox::run(AppConfig::new().size(1024, 768).scene(scene))
//! }
//! ```
//!
//! ## Layout
//!
//! - [`SceneState`] holds everything a frame reads; input and hotkeys mutate it.
//! - [`SceneRenderer`] turns a scene into calls on a [`Rasterizer`].
//! - [`MeshPass`] is the wgpu rasterizer; [`RecordingRasterizer`] records the
//!   calls instead, which is how the frame sequence is tested headlessly.

mod app;
mod camera;
mod color;
mod gpu;
mod input;
mod light;
mod material;
mod mesh;
mod mesh_pass;
mod options;
mod rasterizer;
mod renderer;
mod scene;
mod transform_stack;
mod uniforms;

pub use app::{AppConfig, AppError, run};
pub use camera::{
    Camera, DOLLY_STEP, MAX_FOVY, MIN_EYE_GAP, MIN_FOVY, MIN_NEAR, NEAR_FAR_GAP,
    ORBIT_DEGREES_PER_PIXEL, WheelMode, look_at, normal_matrix, perspective,
};
pub use color::{Color, Rgb8};
pub use gpu::{GpuContext, GpuError};
pub use input::{
    FAR_STEP, Input, InputEvent, LIGHT_NUDGE, NEAR_STEP, SHININESS_STEP, hotkey_edit, wheel_mode,
    wheel_notches,
};
pub use light::{
    LIGHT_HEIGHT, LIGHT_SPACING, Light, LightEdit, LightError, LightSet, MAX_LIGHTS,
};
pub use material::{MIN_SHININESS, Material, MaterialEdit};
pub use mesh::{
    Mesh, MeshData, ParsePrimitiveError, Primitive, TORUS_RADII, Vertex3d, edges_from_triangles,
};
pub use mesh_pass::MeshPass;
pub use options::{PipelineState, PrimitiveMode, RenderOption, RenderOptions};
pub use rasterizer::{Command, ProgramId, Rasterizer, RecordingRasterizer, RenderError};
pub use renderer::{
    CLEAR_COLOR, GIZMO_SCALE, GROUND_SCALE, GROUND_Y, SceneRenderer, required_uniforms,
};
pub use scene::{DEFAULT_LIGHTS, PanelEdit, SceneState};
pub use transform_stack::{StackError, TransformScope, TransformStack};
pub use uniforms::{
    LightField, ProgramLayout, UniformError, UniformKey, UniformKind, UniformLocation,
    UniformTable, UniformValue,
};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
