//! The wgpu [`Rasterizer`]: primitive meshes drawn with the lit and unlit
//! programs into the window surface.
//!
//! # Uniform arena
//!
//! Each program keeps a CPU copy of its uniform block. Writes land in that
//! copy and persist across draws and frames, like uniforms on a GL program
//! object. Every draw snapshots the block of the program in use into a
//! per-frame arena at an offset aligned to
//! `min_uniform_buffer_offset_alignment`; the arena is uploaded once in
//! [`end_frame`](Rasterizer::end_frame) and each draw binds its snapshot with
//! a dynamic offset.
//!
//! # Pipelines
//!
//! Culling, depth testing and topology are baked into wgpu pipelines, so
//! pipelines are created on first use and cached per
//! (program, [`PrimitiveMode`], [`PipelineState`]). Wireframe draws use a
//! line list over the mesh's edge index buffer and never cull. Disabling the
//! depth test compares `Always` and stops depth writes.
//!
//! # Depth Buffer
//!
//! The pass owns a `Depth32Float` depth buffer that is recreated whenever the
//! surface size changes.

use std::collections::HashMap;

use log::{debug, warn};

use crate::color::Color;
use crate::gpu::{GpuContext, GpuError};
use crate::mesh::{Mesh, MeshData, Primitive, Vertex3d};
use crate::options::{PipelineState, PrimitiveMode};
use crate::rasterizer::{ProgramId, Rasterizer, RenderError};
use crate::uniforms::{UniformLocation, UniformTable, UniformValue};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_ARENA_SIZE: u64 = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    mode: PrimitiveMode,
    state: PipelineState,
}

#[derive(Clone, Copy, Debug)]
struct QueuedDraw {
    key: PipelineKey,
    primitive: Primitive,
    offset: u32,
}

#[derive(Debug, Default)]
struct FrameState {
    clear: Option<Color>,
    state: PipelineState,
    program: Option<ProgramId>,
    arena: Vec<u8>,
    draws: Vec<QueuedDraw>,
}

/// A linked program: its shader and the CPU copy of its uniform block.
struct Program {
    shader: wgpu::ShaderModule,
    block: Vec<u8>,
    bind_group: wgpu::BindGroup,
}

/// Renders primitive meshes to the window surface.
pub struct MeshPass {
    gpu: GpuContext,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    programs: [Program; 2],
    meshes: HashMap<Primitive, Mesh>,
    arena: wgpu::Buffer,
    arena_size: u64,
    alignment: u64,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    frame: FrameState,
}

impl MeshPass {
    /// Compiles both programs, uploads every primitive mesh and allocates the
    /// uniform arena and depth buffer.
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Block Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let arena = create_arena(device, INITIAL_ARENA_SIZE);

        let programs = ProgramId::ALL.map(|program| {
            let source = match program {
                ProgramId::Lit => include_str!("shaders/lit.wgsl"),
                ProgramId::Unlit => include_str!("shaders/unlit.wgsl"),
            };
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.name()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let size = program.layout().size;
            Program {
                shader,
                block: vec![0; size],
                bind_group: create_bind_group(device, &bind_group_layout, &arena, size),
            }
        });

        let meshes = Primitive::ALL
            .into_iter()
            .map(|primitive| {
                let data = MeshData::for_primitive(primitive);
                (primitive, Mesh::upload(&gpu, &data, primitive.name()))
            })
            .collect();

        let depth_view = create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        Self {
            gpu,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            programs,
            meshes,
            arena,
            arena_size: INITIAL_ARENA_SIZE,
            alignment,
            depth_view,
            depth_size,
            frame: FrameState::default(),
        }
    }

    /// Resizes the surface; the depth buffer follows on the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn ensure_depth_size(&mut self) {
        let size = (self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    /// Grows the arena (and rebinds every program) if `needed` bytes do not fit.
    fn ensure_arena_size(&mut self, needed: u64) {
        if needed <= self.arena_size {
            return;
        }
        let size = needed.next_power_of_two();
        debug!("growing uniform arena to {size} bytes");
        self.arena = create_arena(&self.gpu.device, size);
        self.arena_size = size;
        for (program, id) in self.programs.iter_mut().zip(ProgramId::ALL) {
            program.bind_group = create_bind_group(
                &self.gpu.device,
                &self.bind_group_layout,
                &self.arena,
                id.layout().size,
            );
        }
    }

    fn ensure_pipelines(&mut self) {
        for draw in &self.frame.draws {
            if self.pipelines.contains_key(&draw.key) {
                continue;
            }
            debug!("creating pipeline {:?}", draw.key);
            let pipeline = create_pipeline(
                &self.gpu,
                &self.pipeline_layout,
                &self.programs[draw.key.program.index()].shader,
                draw.key,
            );
            self.pipelines.insert(draw.key, pipeline);
        }
    }
}

impl Rasterizer for MeshPass {
    fn link(&mut self, program: ProgramId) -> Result<UniformTable, RenderError> {
        Ok(UniformTable::from_layout(&program.layout()))
    }

    fn begin_frame(&mut self, clear: Color) {
        self.frame.clear = Some(clear);
        self.frame.arena.clear();
        self.frame.draws.clear();
    }

    fn set_pipeline_state(&mut self, state: PipelineState) {
        self.frame.state = state;
    }

    fn use_program(&mut self, program: ProgramId) {
        self.frame.program = Some(program);
    }

    fn write_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.frame.program else {
            warn!("dropping write to {} with no program in use", location.key);
            return;
        };
        if value.kind() != location.kind {
            warn!(
                "dropping write to {}: expected {:?}, got {:?}",
                location.key,
                location.kind,
                value.kind()
            );
            return;
        }
        let block = &mut self.programs[program.index()].block;
        match block.get_mut(location.offset..location.offset + location.kind.size()) {
            Some(dst) => value.write_bytes(dst),
            None => warn!("{} lies outside the {program} block", location.key),
        }
    }

    fn draw(&mut self, primitive: Primitive, mode: PrimitiveMode) -> Result<(), RenderError> {
        let program = self.frame.program.ok_or(RenderError::NoProgram)?;
        let arena = &mut self.frame.arena;
        let offset = (arena.len() as u64).next_multiple_of(self.alignment) as usize;
        arena.resize(offset, 0);
        arena.extend_from_slice(&self.programs[program.index()].block);

        self.frame.draws.push(QueuedDraw {
            key: PipelineKey {
                program,
                mode,
                state: self.frame.state,
            },
            primitive,
            offset: offset as u32,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let clear = self.frame.clear.take().unwrap_or(Color::BLACK);

        self.ensure_arena_size(self.frame.arena.len() as u64);
        if !self.frame.arena.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.arena, 0, &self.frame.arena);
        }
        self.ensure_pipelines();
        self.ensure_depth_size();

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(GpuError::from(err).into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &self.frame.draws {
                let (Some(pipeline), Some(mesh)) = (
                    self.pipelines.get(&draw.key),
                    self.meshes.get(&draw.primitive),
                ) else {
                    continue;
                };
                let program = &self.programs[draw.key.program.index()];

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &program.bind_group, &[draw.offset]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                match draw.key.mode {
                    PrimitiveMode::Filled => {
                        render_pass.set_index_buffer(
                            mesh.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                    }
                    PrimitiveMode::Wireframe => {
                        render_pass.set_index_buffer(
                            mesh.edge_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..mesh.edge_count, 0, 0..1);
                    }
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_arena(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Uniform Arena"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    arena: &wgpu::Buffer,
    block_size: usize,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Uniform Block"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: arena,
                offset: 0,
                size: wgpu::BufferSize::new(block_size as u64),
            }),
        }],
    })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let (topology, cull_mode) = match key.mode {
        PrimitiveMode::Filled => (
            wgpu::PrimitiveTopology::TriangleList,
            key.state.cull_back_faces.then_some(wgpu::Face::Back),
        ),
        PrimitiveMode::Wireframe => (wgpu::PrimitiveTopology::LineList, None),
    };
    let depth_compare = if key.state.depth_test {
        wgpu::CompareFunction::Less
    } else {
        wgpu::CompareFunction::Always
    };

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(key.program.name()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.state.depth_test,
                depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}
