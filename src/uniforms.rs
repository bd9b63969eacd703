//! Uniform keys, values, and the per-program location table.
//!
//! Every uniform the renderer writes is named by a [`UniformKey`]. Keys map to a
//! dense slot index so that a linked program's [`UniformTable`] is a flat
//! vector: resolving a key is an index, not a string lookup. The string names
//! returned by [`UniformKey::name`] are the wire contract with the shaders and
//! appear in logs and error messages.
//!
//! # Block layout
//!
//! Both programs read a single uniform block whose Rust mirror is a
//! `#[repr(C)]` [`Pod`](bytemuck::Pod) struct ([`LitBlock`], [`UnlitBlock`]).
//! A [`ProgramLayout`] is the reflection data of such a block: for each key it
//! declares, the byte offset and the [`UniformKind`] stored there. Offsets are
//! taken with `offset_of!`, so the Rust struct is the single source of truth
//! and the WGSL struct must follow it field for field.

use std::fmt;
use std::mem::{offset_of, size_of};

use glam::{Mat4, Vec3};

use crate::light::MAX_LIGHTS;

/// A uniform the program cannot provide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniformError {
    #[error("program `{program}` has no uniform `{name}`")]
    Missing { program: &'static str, name: String },
}

/// One field of a `uLight[i]` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightField {
    Pos,
    Ia,
    Id,
    Is,
    IsDirectional,
    IsActive,
}

impl LightField {
    pub const ALL: [LightField; 6] = [
        LightField::Pos,
        LightField::Ia,
        LightField::Id,
        LightField::Is,
        LightField::IsDirectional,
        LightField::IsActive,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LightField::Pos => "pos",
            LightField::Ia => "Ia",
            LightField::Id => "Id",
            LightField::Is => "Is",
            LightField::IsDirectional => "isDirectional",
            LightField::IsActive => "isActive",
        }
    }
}

/// Name of a uniform, independent of any program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKey {
    ModelView,
    Projection,
    View,
    Normals,
    NLights,
    UseNormals,
    MaterialKa,
    MaterialKd,
    MaterialKs,
    MaterialShininess,
    Color,
    Light(usize, LightField),
}

const FIXED_SLOTS: usize = 11;

impl UniformKey {
    /// Number of distinct slots, including every light field of every light.
    pub const SLOT_COUNT: usize = FIXED_SLOTS + MAX_LIGHTS * LightField::ALL.len();

    /// Dense index of this key. Lights past [`MAX_LIGHTS`] land at or beyond
    /// [`SLOT_COUNT`](Self::SLOT_COUNT) and never resolve.
    pub fn slot(self) -> usize {
        match self {
            UniformKey::ModelView => 0,
            UniformKey::Projection => 1,
            UniformKey::View => 2,
            UniformKey::Normals => 3,
            UniformKey::NLights => 4,
            UniformKey::UseNormals => 5,
            UniformKey::MaterialKa => 6,
            UniformKey::MaterialKd => 7,
            UniformKey::MaterialKs => 8,
            UniformKey::MaterialShininess => 9,
            UniformKey::Color => 10,
            UniformKey::Light(index, field) => {
                FIXED_SLOTS + index * LightField::ALL.len() + field.index()
            }
        }
    }

    /// The shader-side name, e.g. `mModelView` or `uLight[2].isActive`.
    pub fn name(self) -> String {
        match self {
            UniformKey::ModelView => "mModelView".into(),
            UniformKey::Projection => "mProjection".into(),
            UniformKey::View => "mView".into(),
            UniformKey::Normals => "mNormals".into(),
            UniformKey::NLights => "uNLights".into(),
            UniformKey::UseNormals => "uUseNormals".into(),
            UniformKey::MaterialKa => "uMaterial.Ka".into(),
            UniformKey::MaterialKd => "uMaterial.Kd".into(),
            UniformKey::MaterialKs => "uMaterial.Ks".into(),
            UniformKey::MaterialShininess => "uMaterial.shininess".into(),
            UniformKey::Color => "uColor".into(),
            UniformKey::Light(index, field) => format!("uLight[{index}].{}", field.name()),
        }
    }
}

impl fmt::Display for UniformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Storage type of a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Float,
    Int,
    Bool,
}

impl UniformKind {
    /// Bytes written for a value of this kind.
    pub fn size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec3 => 12,
            UniformKind::Float | UniformKind::Int | UniformKind::Bool => 4,
        }
    }
}

/// A value written to a uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec3(Vec3),
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Bool(_) => UniformKind::Bool,
        }
    }

    /// Writes the value's std140 bytes to the start of `dst`.
    ///
    /// `dst` must hold at least `self.kind().size()` bytes. Booleans are
    /// written as a `u32` 0 or 1.
    pub fn write_bytes(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Mat4(m) => {
                dst[..64].copy_from_slice(bytemuck::bytes_of(&m.to_cols_array()));
            }
            UniformValue::Vec3(v) => {
                dst[..12].copy_from_slice(bytemuck::bytes_of(&v.to_array()));
            }
            UniformValue::Float(x) => dst[..4].copy_from_slice(&x.to_ne_bytes()),
            UniformValue::Int(x) => dst[..4].copy_from_slice(&x.to_ne_bytes()),
            UniformValue::Bool(b) => dst[..4].copy_from_slice(&u32::from(*b).to_ne_bytes()),
        }
    }
}

impl fmt::Display for UniformValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformValue::Mat4(m) => {
                let t = m.w_axis;
                write!(f, "mat4(t=[{:.3}, {:.3}, {:.3}])", t.x, t.y, t.z)
            }
            UniformValue::Vec3(v) => write!(f, "[{:.3}, {:.3}, {:.3}]", v.x, v.y, v.z),
            UniformValue::Float(x) => write!(f, "{x:.3}"),
            UniformValue::Int(x) => write!(f, "{x}"),
            UniformValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Where a key lives inside a linked program's uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLocation {
    pub key: UniformKey,
    /// Byte offset in the block.
    pub offset: usize,
    pub kind: UniformKind,
}

// --- GPU blocks -------------------------------------------------------------

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialBlock {
    pub ka: [f32; 4],
    pub kd: [f32; 4],
    pub ks: [f32; 4],
    pub shininess: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightBlock {
    pub pos: [f32; 4],
    pub ia: [f32; 4],
    pub id: [f32; 4],
    pub is: [f32; 4],
    pub directional: u32,
    pub active: u32,
    pub _pad: [u32; 2],
}

/// Uniform block of the lit (Phong) program.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LitBlock {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub normals: [[f32; 4]; 4],
    pub material: MaterialBlock,
    pub n_lights: i32,
    pub use_normals: u32,
    pub _pad: [u32; 2],
    pub lights: [LightBlock; MAX_LIGHTS],
}

/// Uniform block of the unlit gizmo program.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UnlitBlock {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Link-time reflection of a program's uniform block.
#[derive(Clone, Debug)]
pub struct ProgramLayout {
    pub name: &'static str,
    /// Size of the block in bytes.
    pub size: usize,
    pub entries: Vec<UniformLocation>,
}

impl ProgramLayout {
    pub fn lit() -> Self {
        use UniformKind as K;

        let mut entries = vec![
            entry(UniformKey::ModelView, offset_of!(LitBlock, model_view), K::Mat4),
            entry(UniformKey::Projection, offset_of!(LitBlock, projection), K::Mat4),
            entry(UniformKey::View, offset_of!(LitBlock, view), K::Mat4),
            entry(UniformKey::Normals, offset_of!(LitBlock, normals), K::Mat4),
            entry(UniformKey::MaterialKa, offset_of!(LitBlock, material.ka), K::Vec3),
            entry(UniformKey::MaterialKd, offset_of!(LitBlock, material.kd), K::Vec3),
            entry(UniformKey::MaterialKs, offset_of!(LitBlock, material.ks), K::Vec3),
            entry(
                UniformKey::MaterialShininess,
                offset_of!(LitBlock, material.shininess),
                K::Float,
            ),
            entry(UniformKey::NLights, offset_of!(LitBlock, n_lights), K::Int),
            entry(UniformKey::UseNormals, offset_of!(LitBlock, use_normals), K::Bool),
        ];

        for index in 0..MAX_LIGHTS {
            let base = offset_of!(LitBlock, lights) + index * size_of::<LightBlock>();
            for field in LightField::ALL {
                let (offset, kind) = match field {
                    LightField::Pos => (offset_of!(LightBlock, pos), K::Vec3),
                    LightField::Ia => (offset_of!(LightBlock, ia), K::Vec3),
                    LightField::Id => (offset_of!(LightBlock, id), K::Vec3),
                    LightField::Is => (offset_of!(LightBlock, is), K::Vec3),
                    LightField::IsDirectional => (offset_of!(LightBlock, directional), K::Bool),
                    LightField::IsActive => (offset_of!(LightBlock, active), K::Bool),
                };
                entries.push(entry(UniformKey::Light(index, field), base + offset, kind));
            }
        }

        Self {
            name: "lit",
            size: size_of::<LitBlock>(),
            entries,
        }
    }

    pub fn unlit() -> Self {
        Self {
            name: "unlit",
            size: size_of::<UnlitBlock>(),
            entries: vec![
                entry(
                    UniformKey::ModelView,
                    offset_of!(UnlitBlock, model_view),
                    UniformKind::Mat4,
                ),
                entry(
                    UniformKey::Projection,
                    offset_of!(UnlitBlock, projection),
                    UniformKind::Mat4,
                ),
                entry(UniformKey::Color, offset_of!(UnlitBlock, color), UniformKind::Vec3),
            ],
        }
    }

    /// Removes `key` from the layout, as if the shader never declared it.
    pub fn without(mut self, key: UniformKey) -> Self {
        self.entries.retain(|location| location.key != key);
        self
    }
}

fn entry(key: UniformKey, offset: usize, kind: UniformKind) -> UniformLocation {
    UniformLocation { key, offset, kind }
}

/// Resolved uniform locations of one linked program, indexed by key slot.
#[derive(Clone, Debug)]
pub struct UniformTable {
    program: &'static str,
    slots: Vec<Option<UniformLocation>>,
}

impl UniformTable {
    pub fn from_layout(layout: &ProgramLayout) -> Self {
        let mut slots = vec![None; UniformKey::SLOT_COUNT];
        for location in &layout.entries {
            if let Some(slot) = slots.get_mut(location.key.slot()) {
                *slot = Some(*location);
            }
        }
        Self {
            program: layout.name,
            slots,
        }
    }

    pub fn program(&self) -> &'static str {
        self.program
    }

    pub fn get(&self, key: UniformKey) -> Option<UniformLocation> {
        self.slots.get(key.slot()).copied().flatten()
    }

    pub fn require(&self, key: UniformKey) -> Result<UniformLocation, UniformError> {
        self.get(key).ok_or_else(|| UniformError::Missing {
            program: self.program,
            name: key.name(),
        })
    }

    /// Checks that every key in `keys` resolves.
    pub fn require_all(
        &self,
        keys: impl IntoIterator<Item = UniformKey>,
    ) -> Result<(), UniformError> {
        keys.into_iter().try_for_each(|key| self.require(key).map(drop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_dense_and_unique() {
        let mut keys = vec![
            UniformKey::ModelView,
            UniformKey::Projection,
            UniformKey::View,
            UniformKey::Normals,
            UniformKey::NLights,
            UniformKey::UseNormals,
            UniformKey::MaterialKa,
            UniformKey::MaterialKd,
            UniformKey::MaterialKs,
            UniformKey::MaterialShininess,
            UniformKey::Color,
        ];
        for index in 0..MAX_LIGHTS {
            keys.extend(LightField::ALL.map(|field| UniformKey::Light(index, field)));
        }
        let mut slots: Vec<usize> = keys.iter().map(|key| key.slot()).collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..UniformKey::SLOT_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn names_match_shader_spelling() {
        assert_eq!(UniformKey::ModelView.name(), "mModelView");
        assert_eq!(UniformKey::MaterialShininess.name(), "uMaterial.shininess");
        assert_eq!(
            UniformKey::Light(3, LightField::IsDirectional).name(),
            "uLight[3].isDirectional"
        );
        assert_eq!(UniformKey::Light(0, LightField::Is).to_string(), "uLight[0].Is");
    }

    #[test]
    fn lit_block_matches_wgsl_layout() {
        assert_eq!(size_of::<MaterialBlock>(), 64);
        assert_eq!(size_of::<LightBlock>(), 80);
        assert_eq!(offset_of!(LitBlock, material), 256);
        assert_eq!(offset_of!(LitBlock, n_lights), 320);
        assert_eq!(offset_of!(LitBlock, lights), 336);
        assert_eq!(size_of::<LitBlock>(), 336 + 80 * MAX_LIGHTS);
        assert_eq!(size_of::<UnlitBlock>(), 144);
    }

    #[test]
    fn lit_table_resolves_every_light_field() {
        let table = UniformTable::from_layout(&ProgramLayout::lit());
        let loc = table.require(UniformKey::Light(1, LightField::Id)).unwrap();
        assert_eq!(loc.offset, 336 + 80 + 32);
        assert_eq!(loc.kind, UniformKind::Vec3);
        assert!(table.get(UniformKey::Color).is_none());
        assert!(table.get(UniformKey::Light(MAX_LIGHTS, LightField::Pos)).is_none());
    }

    #[test]
    fn missing_key_names_program_and_uniform() {
        let table = UniformTable::from_layout(&ProgramLayout::unlit().without(UniformKey::Color));
        let err = table
            .require_all([UniformKey::ModelView, UniformKey::Color])
            .unwrap_err();
        assert_eq!(
            err,
            UniformError::Missing {
                program: "unlit",
                name: "uColor".into()
            }
        );
        assert_eq!(err.to_string(), "program `unlit` has no uniform `uColor`");
    }

    #[test]
    fn values_encode_as_std140_words() {
        let mut bytes = [0u8; 64];
        UniformValue::Bool(true).write_bytes(&mut bytes);
        assert_eq!(&bytes[..4], &1u32.to_ne_bytes());

        UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)).write_bytes(&mut bytes);
        assert_eq!(floats(&bytes[..12]), vec![1.0, 2.0, 3.0]);

        UniformValue::Mat4(Mat4::from_translation(Vec3::X)).write_bytes(&mut bytes);
        assert_eq!(floats(&bytes)[12], 1.0);
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|word| f32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
            .collect()
    }
}
