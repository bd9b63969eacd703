//! The boundary between the scene renderer and whatever draws pixels.
//!
//! [`SceneRenderer`](crate::SceneRenderer) only talks to a [`Rasterizer`]: it
//! links programs, sets fixed-function state, writes uniforms and issues
//! draws. Two implementations exist:
//!
//! - [`MeshPass`](crate::MeshPass): the wgpu backend used by the window
//! - [`RecordingRasterizer`]: keeps every call as a [`Command`], for tests and
//!   the headless `--summary-only` mode
//!
//! Uniform writes follow the semantics of a GL program object: values persist
//! on the program across draws and frames until overwritten, and a draw sees
//! whatever was last written to the program in use.

use std::fmt;

use log::warn;

use crate::color::Color;
use crate::gpu::GpuError;
use crate::mesh::Primitive;
use crate::options::{PipelineState, PrimitiveMode};
use crate::transform_stack::StackError;
use crate::uniforms::{
    ProgramLayout, UniformError, UniformKey, UniformLocation, UniformTable, UniformValue,
};

/// Everything that can stop a frame or the renderer's construction.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Uniform(#[from] UniformError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("draw issued with no program in use")]
    NoProgram,
}

/// The two shader programs of the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramId {
    /// Phong-lit surfaces.
    Lit,
    /// Flat-coloured light gizmos.
    Unlit,
}

impl ProgramId {
    pub const ALL: [ProgramId; 2] = [ProgramId::Lit, ProgramId::Unlit];

    pub fn name(self) -> &'static str {
        match self {
            ProgramId::Lit => "lit",
            ProgramId::Unlit => "unlit",
        }
    }

    /// Uniform block reflection of this program.
    pub fn layout(self) -> ProgramLayout {
        match self {
            ProgramId::Lit => ProgramLayout::lit(),
            ProgramId::Unlit => ProgramLayout::unlit(),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sink for the renderer's per-frame calls.
pub trait Rasterizer {
    /// Links `program` and returns its resolved uniform table.
    fn link(&mut self, program: ProgramId) -> Result<UniformTable, RenderError>;

    /// Starts a frame; the color and depth buffers are cleared.
    fn begin_frame(&mut self, clear: Color);

    fn set_pipeline_state(&mut self, state: PipelineState);

    fn use_program(&mut self, program: ProgramId);

    /// Writes `value` to the program in use.
    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn draw(&mut self, primitive: Primitive, mode: PrimitiveMode) -> Result<(), RenderError>;

    /// Finishes the frame and presents it.
    fn end_frame(&mut self) -> Result<(), RenderError>;
}

/// One recorded rasterizer call.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    BeginFrame(Color),
    PipelineState(PipelineState),
    UseProgram(ProgramId),
    Uniform {
        program: ProgramId,
        key: UniformKey,
        value: UniformValue,
    },
    Draw {
        program: ProgramId,
        primitive: Primitive,
        mode: PrimitiveMode,
    },
    EndFrame,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::BeginFrame(c) => {
                write!(f, "begin_frame clear=[{:.2}, {:.2}, {:.2}]", c.r, c.g, c.b)
            }
            Command::PipelineState(state) => write!(
                f,
                "pipeline cull={} depth={}",
                state.cull_back_faces, state.depth_test
            ),
            Command::UseProgram(program) => write!(f, "use_program {program}"),
            Command::Uniform {
                program,
                key,
                value,
            } => write!(f, "  {program}.{key} = {value}"),
            Command::Draw {
                program,
                primitive,
                mode,
            } => write!(f, "draw {primitive} ({mode:?}) with {program}"),
            Command::EndFrame => f.write_str("end_frame"),
        }
    }
}

/// A [`Rasterizer`] that records calls instead of drawing.
///
/// Programs link against their standard layouts, minus any keys removed with
/// [`without_uniform`](Self::without_uniform).
#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    commands: Vec<Command>,
    current: Option<ProgramId>,
    removed: Vec<(ProgramId, UniformKey)>,
}

impl RecordingRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `program` as if its shader did not declare `key`.
    pub fn without_uniform(mut self, program: ProgramId, key: UniformKey) -> Self {
        self.removed.push((program, key));
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the recorded commands.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// The recorded draws, in order.
    pub fn draws(&self) -> Vec<(ProgramId, Primitive, PrimitiveMode)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::Draw {
                    program,
                    primitive,
                    mode,
                } => Some((*program, *primitive, *mode)),
                _ => None,
            })
            .collect()
    }

    /// Every value written to `key` on `program`, in order.
    pub fn writes(&self, program: ProgramId, key: UniformKey) -> Vec<UniformValue> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::Uniform {
                    program: p,
                    key: k,
                    value,
                } if *p == program && *k == key => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// The last value written to `key` on `program`.
    pub fn last_write(&self, program: ProgramId, key: UniformKey) -> Option<UniformValue> {
        self.writes(program, key).last().copied()
    }
}

impl Rasterizer for RecordingRasterizer {
    fn link(&mut self, program: ProgramId) -> Result<UniformTable, RenderError> {
        let layout = self
            .removed
            .iter()
            .filter(|(p, _)| *p == program)
            .fold(program.layout(), |layout, (_, key)| layout.without(*key));
        Ok(UniformTable::from_layout(&layout))
    }

    fn begin_frame(&mut self, clear: Color) {
        self.commands.push(Command::BeginFrame(clear));
    }

    fn set_pipeline_state(&mut self, state: PipelineState) {
        self.commands.push(Command::PipelineState(state));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.current else {
            warn!("dropping write to {} with no program in use", location.key);
            return;
        };
        self.commands.push(Command::Uniform {
            program,
            key: location.key,
            value,
        });
    }

    fn draw(&mut self, primitive: Primitive, mode: PrimitiveMode) -> Result<(), RenderError> {
        let program = self.current.ok_or(RenderError::NoProgram)?;
        self.commands.push(Command::Draw {
            program,
            primitive,
            mode,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.commands.push(Command::EndFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformKind;
    use glam::Mat4;

    #[test]
    fn draw_without_program_is_an_error() {
        let mut raster = RecordingRasterizer::new();
        let err = raster.draw(Primitive::Cube, PrimitiveMode::Filled).unwrap_err();
        assert!(matches!(err, RenderError::NoProgram));
    }

    #[test]
    fn removed_uniform_does_not_resolve() {
        let mut raster =
            RecordingRasterizer::new().without_uniform(ProgramId::Unlit, UniformKey::Color);
        let unlit = raster.link(ProgramId::Unlit).unwrap();
        let lit = raster.link(ProgramId::Lit).unwrap();
        assert!(unlit.get(UniformKey::Color).is_none());
        assert!(unlit.get(UniformKey::ModelView).is_some());
        assert!(lit.get(UniformKey::ModelView).is_some());
    }

    #[test]
    fn writes_are_attributed_to_the_program_in_use() {
        let mut raster = RecordingRasterizer::new();
        let location = UniformLocation {
            key: UniformKey::Projection,
            offset: 64,
            kind: UniformKind::Mat4,
        };
        raster.write_uniform(location, UniformValue::Mat4(Mat4::IDENTITY));
        assert!(raster.commands().is_empty());

        raster.use_program(ProgramId::Unlit);
        raster.write_uniform(location, UniformValue::Mat4(Mat4::IDENTITY));
        assert_eq!(
            raster.last_write(ProgramId::Unlit, UniformKey::Projection),
            Some(UniformValue::Mat4(Mat4::IDENTITY))
        );
        assert_eq!(raster.last_write(ProgramId::Lit, UniformKey::Projection), None);
    }

    #[test]
    fn commands_render_as_trace_lines() {
        let command = Command::Draw {
            program: ProgramId::Lit,
            primitive: Primitive::Torus,
            mode: PrimitiveMode::Wireframe,
        };
        assert_eq!(command.to_string(), "draw Torus (Wireframe) with lit");
    }
}
