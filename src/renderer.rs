//! One frame of the viewer: ground, object, and light gizmos.
//!
//! [`SceneRenderer::render_frame`] issues the same sequence every tick:
//!
//! 1. clear, then apply the render options as pipeline state
//! 2. reset the transform stack to the view matrix
//! 3. lit program: per-frame matrices, the light array and the ground material
//! 4. ground plane and selected primitive, each inside its own push scope
//! 5. unlit program: one small sphere per active light, if gizmos are shown
//!
//! Nothing is cached between frames except the uniform tables resolved when
//! the renderer is created.

use glam::{Mat4, Vec3};
use log::{debug, trace};

use crate::camera::normal_matrix;
use crate::color::Color;
use crate::light::{LightSet, MAX_LIGHTS};
use crate::material::Material;
use crate::mesh::Primitive;
use crate::options::PrimitiveMode;
use crate::rasterizer::{ProgramId, Rasterizer, RenderError};
use crate::scene::SceneState;
use crate::transform_stack::TransformStack;
use crate::uniforms::{LightField, UniformKey, UniformTable, UniformValue};

pub const CLEAR_COLOR: Color = Color::BLACK;
/// Ground slab placement; its top face sits at `y = 0`.
pub const GROUND_Y: f32 = -0.05;
pub const GROUND_SCALE: Vec3 = Vec3::new(3.0, 0.1, 3.0);
/// Uniform scale of the light gizmo sphere.
pub const GIZMO_SCALE: f32 = 0.1;

/// Uniforms the renderer cannot do without, per program.
///
/// `uUseNormals` is optional: a lit shader that does not declare it still
/// links, and the normals view is simply unavailable.
pub fn required_uniforms(program: ProgramId) -> Vec<UniformKey> {
    match program {
        ProgramId::Lit => {
            let mut keys = vec![
                UniformKey::ModelView,
                UniformKey::Projection,
                UniformKey::View,
                UniformKey::Normals,
                UniformKey::NLights,
                UniformKey::MaterialKa,
                UniformKey::MaterialKd,
                UniformKey::MaterialKs,
                UniformKey::MaterialShininess,
            ];
            for index in 0..MAX_LIGHTS {
                keys.extend(LightField::ALL.map(|field| UniformKey::Light(index, field)));
            }
            keys
        }
        ProgramId::Unlit => vec![
            UniformKey::ModelView,
            UniformKey::Projection,
            UniformKey::Color,
        ],
    }
}

/// Drives a [`Rasterizer`] through one frame of a [`SceneState`].
pub struct SceneRenderer {
    lit: UniformTable,
    unlit: UniformTable,
    stack: TransformStack,
}

impl SceneRenderer {
    /// Links both programs and checks that every required uniform resolves.
    pub fn new<R: Rasterizer + ?Sized>(raster: &mut R) -> Result<Self, RenderError> {
        let lit = raster.link(ProgramId::Lit)?;
        lit.require_all(required_uniforms(ProgramId::Lit))?;
        let unlit = raster.link(ProgramId::Unlit)?;
        unlit.require_all(required_uniforms(ProgramId::Unlit))?;
        debug!("linked lit and unlit programs");

        Ok(Self {
            lit,
            unlit,
            stack: TransformStack::new(),
        })
    }

    pub fn render_frame<R: Rasterizer + ?Sized>(
        &mut self,
        scene: &SceneState,
        raster: &mut R,
    ) -> Result<(), RenderError> {
        let options = &scene.options;
        let mode = options.primitive_mode();
        let view = scene.camera.view_matrix();
        let projection = scene.camera.projection_matrix();

        raster.begin_frame(CLEAR_COLOR);
        raster.set_pipeline_state(options.pipeline_state());
        self.stack.reset(view);

        raster.use_program(ProgramId::Lit);
        let lit = &self.lit;
        upload(raster, lit, UniformKey::View, UniformValue::Mat4(view));
        upload(raster, lit, UniformKey::Projection, UniformValue::Mat4(projection));
        upload(raster, lit, UniformKey::Normals, UniformValue::Mat4(normal_matrix(view)));
        upload(
            raster,
            lit,
            UniformKey::UseNormals,
            UniformValue::Bool(options.show_normals),
        );
        upload_lights(raster, lit, &scene.lights);
        upload_material(raster, lit, &scene.ground_material);

        {
            let mut ground = self.stack.push();
            ground
                .translate(Vec3::new(0.0, GROUND_Y, 0.0))
                .scale(GROUND_SCALE);
            upload_model_view(raster, lit, ground.current());
            raster.draw(Primitive::Cube, mode)?;
        }

        upload_material(raster, lit, &scene.object_material);
        {
            let mut object = self.stack.push();
            object.translate(Vec3::new(0.0, scene.primitive.rest_height(), 0.0));
            upload_model_view(raster, lit, object.current());
            raster.draw(scene.primitive, mode)?;
        }

        if options.show_lights {
            raster.use_program(ProgramId::Unlit);
            let unlit = &self.unlit;
            upload(raster, unlit, UniformKey::Projection, UniformValue::Mat4(projection));
            for light in scene.lights.iter_active() {
                let mut gizmo = self.stack.push();
                gizmo
                    .translate(light.position)
                    .scale(Vec3::splat(GIZMO_SCALE));
                let model_view = UniformValue::Mat4(gizmo.current());
                upload(raster, unlit, UniformKey::ModelView, model_view);
                upload(
                    raster,
                    unlit,
                    UniformKey::Color,
                    UniformValue::Vec3(light.specular.to_unit()),
                );
                raster.draw(Primitive::Sphere, PrimitiveMode::Filled)?;
            }
        }

        self.stack.finish()?;
        raster.end_frame()
    }
}

/// Writes `value` if the program declares `key`; otherwise the write is dropped.
fn upload<R: Rasterizer + ?Sized>(
    raster: &mut R,
    table: &UniformTable,
    key: UniformKey,
    value: UniformValue,
) {
    match table.get(key) {
        Some(location) => raster.write_uniform(location, value),
        None => trace!("{} has no {key}, write dropped", table.program()),
    }
}

fn upload_model_view<R: Rasterizer + ?Sized>(
    raster: &mut R,
    table: &UniformTable,
    model_view: Mat4,
) {
    upload(raster, table, UniformKey::ModelView, UniformValue::Mat4(model_view));
    upload(
        raster,
        table,
        UniformKey::Normals,
        UniformValue::Mat4(normal_matrix(model_view)),
    );
}

fn upload_lights<R: Rasterizer + ?Sized>(
    raster: &mut R,
    table: &UniformTable,
    lights: &LightSet,
) {
    upload(raster, table, UniformKey::NLights, UniformValue::Int(lights.count() as i32));
    for (index, light) in lights.iter().enumerate() {
        let fields = [
            (LightField::Pos, UniformValue::Vec3(light.position)),
            (LightField::Ia, UniformValue::Vec3(light.ambient.to_unit())),
            (LightField::Id, UniformValue::Vec3(light.diffuse.to_unit())),
            (LightField::Is, UniformValue::Vec3(light.specular.to_unit())),
            (LightField::IsDirectional, UniformValue::Bool(light.directional)),
            (LightField::IsActive, UniformValue::Bool(light.active)),
        ];
        for (field, value) in fields {
            upload(raster, table, UniformKey::Light(index, field), value);
        }
    }
}

fn upload_material<R: Rasterizer + ?Sized>(
    raster: &mut R,
    table: &UniformTable,
    material: &Material,
) {
    upload(raster, table, UniformKey::MaterialKa, UniformValue::Vec3(material.ka.to_unit()));
    upload(raster, table, UniformKey::MaterialKd, UniformValue::Vec3(material.kd.to_unit()));
    upload(raster, table, UniformKey::MaterialKs, UniformValue::Vec3(material.ks.to_unit()));
    upload(
        raster,
        table,
        UniformKey::MaterialShininess,
        UniformValue::Float(material.shininess),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::RecordingRasterizer;
    use crate::uniforms::UniformError;

    #[test]
    fn missing_required_uniform_fails_at_link_time() {
        let mut raster = RecordingRasterizer::new()
            .without_uniform(ProgramId::Lit, UniformKey::Light(7, LightField::IsActive));
        let err = SceneRenderer::new(&mut raster).err().unwrap();
        assert!(matches!(
            err,
            RenderError::Uniform(UniformError::Missing { program: "lit", ref name })
                if name == "uLight[7].isActive"
        ));
    }

    #[test]
    fn optional_uniform_is_dropped_silently() {
        let mut raster =
            RecordingRasterizer::new().without_uniform(ProgramId::Lit, UniformKey::UseNormals);
        let mut renderer = SceneRenderer::new(&mut raster).unwrap();
        renderer
            .render_frame(&SceneState::new(), &mut raster)
            .unwrap();
        assert!(raster.writes(ProgramId::Lit, UniformKey::UseNormals).is_empty());
        assert_eq!(raster.draws().len(), 3);
    }

    #[test]
    fn ground_top_sits_at_zero() {
        let top = GROUND_Y + GROUND_SCALE.y / 2.0;
        assert!(top.abs() < 1e-6);
    }
}
