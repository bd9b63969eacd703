//! Primitive meshes and their GPU buffers.
//!
//! Geometry is built on the CPU as [`MeshData`] and uploaded once with
//! [`Mesh::upload`]:
//!
//! - [`Vertex3d`]: position and normal, the layout every lit and unlit
//!   pipeline reads
//! - [`Primitive`]: the five shapes the viewer can show
//! - [`MeshData`]: triangle indices plus the deduplicated edge list used for
//!   wireframe drawing
//! - [`Mesh`]: GPU-resident vertex, triangle-index and edge-index buffers
//!
//! Every primitive is unit-sized and centred on the origin, so
//! [`Primitive::rest_height`] is how far it must be lifted to sit on `y = 0`.
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//!
//! # Winding Order
//!
//! All primitives use counter-clockwise winding for front faces, matching the
//! back-face culling state of the pipelines.

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::gpu::GpuContext;

/// A vertex with position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// An unknown primitive name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown primitive `{0}` (expected sphere, cube, cylinder, pyramid or torus)")]
pub struct ParsePrimitiveError(pub String);

/// The shapes the viewer can place on the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    #[default]
    Sphere,
    Cube,
    Cylinder,
    Pyramid,
    Torus,
}

/// Major and minor radius of the torus.
pub const TORUS_RADII: (f32, f32) = (0.35, 0.15);

impl Primitive {
    pub const ALL: [Primitive; 5] = [
        Primitive::Sphere,
        Primitive::Cube,
        Primitive::Cylinder,
        Primitive::Pyramid,
        Primitive::Torus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Sphere => "Sphere",
            Primitive::Cube => "Cube",
            Primitive::Cylinder => "Cylinder",
            Primitive::Pyramid => "Pyramid",
            Primitive::Torus => "Torus",
        }
    }

    /// Half the primitive's extent along Y.
    pub fn rest_height(self) -> f32 {
        match self {
            Primitive::Torus => TORUS_RADII.1,
            _ => 0.5,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Primitive {
    type Err = ParsePrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Primitive::ALL
            .into_iter()
            .find(|primitive| primitive.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePrimitiveError(s.to_string()))
    }
}

/// CPU-side geometry of a primitive.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    /// Triangle list, three indices per face.
    pub indices: Vec<u32>,
    /// Line list of unique triangle edges.
    pub edges: Vec<u32>,
}

impl MeshData {
    fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        let edges = edges_from_triangles(&indices);
        Self {
            vertices,
            indices,
            edges,
        }
    }

    pub fn for_primitive(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Sphere => Self::sphere(32, 16),
            Primitive::Cube => Self::cube(),
            Primitive::Cylinder => Self::cylinder(32),
            Primitive::Pyramid => Self::pyramid(),
            Primitive::Torus => Self::torus(32, 16),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit cube centred at the origin, four vertices per face.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        Self::new(vertices, indices)
    }

    /// UV sphere of radius 0.5 with `segments` longitudes and `rings` latitudes.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();
                vertices.push(Vertex3d::new([x * 0.5, y * 0.5, z * 0.5], [x, y, z]));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;
                indices.extend([current, current + 1, next]);
                indices.extend([current + 1, next + 1, next]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Capped cylinder of radius 0.5 and height 1 along Y.
    pub fn cylinder(segments: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side: a bottom/top pair per segment boundary.
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            let (x, z) = (theta.cos(), theta.sin());
            vertices.push(Vertex3d::new([x * 0.5, -0.5, z * 0.5], [x, 0.0, z]));
            vertices.push(Vertex3d::new([x * 0.5, 0.5, z * 0.5], [x, 0.0, z]));
        }
        for seg in 0..segments {
            let bottom = seg * 2;
            let top = bottom + 1;
            let next_bottom = bottom + 2;
            let next_top = bottom + 3;
            indices.extend([bottom, top, next_bottom]);
            indices.extend([next_bottom, top, next_top]);
        }

        // Caps: a centre vertex fanned out to a ring with the cap's normal.
        for (y, normal_y) in [(0.5, 1.0), (-0.5, -1.0)] {
            let centre = vertices.len() as u32;
            vertices.push(Vertex3d::new([0.0, y, 0.0], [0.0, normal_y, 0.0]));
            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                vertices.push(Vertex3d::new(
                    [theta.cos() * 0.5, y, theta.sin() * 0.5],
                    [0.0, normal_y, 0.0],
                ));
            }
            for seg in 0..segments {
                let a = centre + 1 + seg;
                let b = a + 1;
                if normal_y > 0.0 {
                    indices.extend([centre, b, a]);
                } else {
                    indices.extend([centre, a, b]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// Square pyramid with a unit base at `y = -0.5` and its apex at `y = 0.5`.
    pub fn pyramid() -> Self {
        let apex = Vec3::new(0.0, 0.5, 0.0);
        #[rustfmt::skip]
        let base = [
            Vec3::new(-0.5, -0.5,  0.5),
            Vec3::new( 0.5, -0.5,  0.5),
            Vec3::new( 0.5, -0.5, -0.5),
            Vec3::new(-0.5, -0.5, -0.5),
        ];

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for i in 0..base.len() {
            let (a, b) = (base[i], base[(i + 1) % base.len()]);
            let normal = (b - a).cross(apex - a).normalize();
            let first = vertices.len() as u32;
            for p in [a, b, apex] {
                vertices.push(Vertex3d::new(p.to_array(), normal.to_array()));
            }
            indices.extend([first, first + 1, first + 2]);
        }

        let first = vertices.len() as u32;
        for p in base.iter().rev() {
            vertices.push(Vertex3d::new(p.to_array(), [0.0, -1.0, 0.0]));
        }
        indices.extend([first, first + 1, first + 2, first + 2, first + 3, first]);

        Self::new(vertices, indices)
    }

    /// Torus lying in the XZ plane.
    pub fn torus(segments: u32, sides: u32) -> Self {
        let (major, minor) = TORUS_RADII;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            let around = Vec3::new(theta.cos(), 0.0, theta.sin());
            for side in 0..=sides {
                let phi = TAU * side as f32 / sides as f32;
                let normal = around * phi.cos() + Vec3::Y * phi.sin();
                let position = around * major + normal * minor;
                vertices.push(Vertex3d::new(position.to_array(), normal.to_array()));
            }
        }

        for seg in 0..segments {
            for side in 0..sides {
                let current = seg * (sides + 1) + side;
                let next = current + sides + 1;
                indices.extend([current, current + 1, next]);
                indices.extend([current + 1, next + 1, next]);
            }
        }

        Self::new(vertices, indices)
    }
}

/// Unique undirected edges of a triangle list, as a line list.
pub fn edges_from_triangles(indices: &[u32]) -> Vec<u32> {
    let mut edges: Vec<(u32, u32)> = indices
        .chunks_exact(3)
        .flat_map(|tri| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])])
        .map(|(a, b)| (a.min(b), a.max(b)))
        .filter(|(a, b)| a != b)
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
}

/// GPU-resident geometry with triangle and edge index buffers.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) edge_buffer: wgpu::Buffer,
    pub(crate) edge_count: u32,
}

impl Mesh {
    /// Uploads `data` into freshly allocated buffers.
    pub fn upload(gpu: &GpuContext, data: &MeshData, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let edge_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Edge Buffer")),
                contents: bytemuck::cast_slice(&data.edges),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            edge_buffer,
            edge_count: data.edges.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(data: &MeshData) -> (Vec3, Vec3) {
        data.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), v| {
                let p = Vec3::from_array(v.position);
                (lo.min(p), hi.max(p))
            },
        )
    }

    #[test]
    fn primitive_names_parse_case_insensitively() {
        assert_eq!("cylinder".parse::<Primitive>(), Ok(Primitive::Cylinder));
        assert_eq!(" TORUS ".parse::<Primitive>(), Ok(Primitive::Torus));
        assert!("teapot".parse::<Primitive>().is_err());
        for primitive in Primitive::ALL {
            assert_eq!(primitive.to_string().parse::<Primitive>(), Ok(primitive));
        }
    }

    #[test]
    fn rest_height_lifts_primitive_onto_the_ground() {
        for primitive in Primitive::ALL {
            let (lo, hi) = bounds(&MeshData::for_primitive(primitive));
            assert!((lo.y + primitive.rest_height()).abs() < 1e-5, "{primitive}");
            assert!((hi.y - primitive.rest_height()).abs() < 1e-5, "{primitive}");
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        for primitive in Primitive::ALL {
            let data = MeshData::for_primitive(primitive);
            let n = data.vertices.len() as u32;
            assert_eq!(data.indices.len() % 3, 0);
            assert!(data.indices.iter().all(|&i| i < n), "{primitive}");
            assert!(data.edges.iter().all(|&i| i < n), "{primitive}");
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        // For convex shapes, a front face's geometric normal points away from
        // the centre.
        for primitive in [
            Primitive::Sphere,
            Primitive::Cube,
            Primitive::Cylinder,
            Primitive::Pyramid,
        ] {
            let data = MeshData::for_primitive(primitive);
            for tri in data.indices.chunks_exact(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]]
                    .map(|i| Vec3::from_array(data.vertices[i as usize].position));
                let normal = (b - a).cross(c - a);
                if normal.length_squared() < 1e-12 {
                    continue; // degenerate sliver at a sphere pole
                }
                let centroid = (a + b + c) / 3.0;
                assert!(normal.dot(centroid) > 0.0, "{primitive}");
            }
        }
    }

    #[test]
    fn cube_edges_are_unique() {
        let data = MeshData::cube();
        assert_eq!(data.triangle_count(), 12);
        // 4 outline edges plus 1 diagonal per face.
        assert_eq!(data.edges.len(), 6 * 5 * 2);
    }

    #[test]
    fn shared_edges_appear_once() {
        let edges = edges_from_triangles(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(edges, vec![0, 1, 0, 2, 1, 2, 1, 3, 2, 3]);
    }
}
