//! Everything the renderer reads each frame, in one explicit value.
//!
//! Input handlers and panel edits mutate a [`SceneState`] through `&mut`; the
//! renderer borrows it immutably at the start of the frame, so it always sees
//! a settled snapshot.

use glam::{Vec2, Vec3};
use log::info;

use crate::camera::Camera;
use crate::input::InputEvent;
use crate::light::{LightEdit, LightError, LightSet};
use crate::material::{Material, MaterialEdit};
use crate::mesh::Primitive;
use crate::options::{RenderOption, RenderOptions};

/// Number of lights in a fresh scene.
pub const DEFAULT_LIGHTS: usize = 1;

/// A discrete edit from the parameter surface (hotkeys, CLI, or a panel).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelEdit {
    Fovy(f32),
    Near(f32),
    Far(f32),
    Eye(Vec3),
    At(Vec3),
    Up(Vec3),
    LightCount(usize),
    ToggleLight(usize),
    Light { index: usize, edit: LightEdit },
    Material(MaterialEdit),
    ToggleOption(RenderOption),
    Select(Primitive),
}

/// The viewer's mutable state.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneState {
    pub camera: Camera,
    pub lights: LightSet,
    pub object_material: Material,
    pub ground_material: Material,
    pub options: RenderOptions,
    pub primitive: Primitive,
    /// Last pointer sample while a drag is in progress.
    drag: Option<Vec2>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            lights: LightSet::with_count(DEFAULT_LIGHTS),
            object_material: Material::object(),
            ground_material: Material::ground(),
            options: RenderOptions::default(),
            primitive: Primitive::default(),
            drag: None,
        }
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = primitive;
        self
    }

    pub fn with_light_count(mut self, count: usize) -> Self {
        self.lights.set_count(count);
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Applies a pointer, wheel or resize event.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Wheel { notches, mode } => self.camera.wheel(notches, mode),
            InputEvent::PointerDown { position } => self.drag = Some(position),
            InputEvent::PointerMove { position } => {
                if let Some(last) = self.drag {
                    self.camera.orbit(position - last);
                    self.drag = Some(position);
                }
            }
            InputEvent::PointerUp => self.drag = None,
            InputEvent::Resize { width, height } => self.camera.resize(width, height),
        }
    }

    /// Applies a panel edit. Light edits addressing a missing light fail and
    /// leave the scene untouched.
    pub fn apply(&mut self, edit: PanelEdit) -> Result<(), LightError> {
        match edit {
            PanelEdit::Fovy(fovy) => self.camera.set_fovy(fovy),
            PanelEdit::Near(near) => self.camera.set_near(near),
            PanelEdit::Far(far) => self.camera.set_far(far),
            PanelEdit::Eye(eye) => self.camera.set_eye(eye),
            PanelEdit::At(at) => self.camera.set_at(at),
            PanelEdit::Up(up) => self.camera.set_up(up),
            PanelEdit::LightCount(count) => {
                let count = self.lights.set_count(count);
                info!("light count set to {count}");
            }
            PanelEdit::ToggleLight(index) => {
                let active = self.lights.toggle_active(index)?;
                info!("light {index} {}", if active { "on" } else { "off" });
            }
            PanelEdit::Light { index, edit } => self.lights.edit(index, edit)?,
            PanelEdit::Material(edit) => self.object_material.apply(edit),
            PanelEdit::ToggleOption(option) => {
                let value = self.options.toggle(option);
                info!("{option:?} {}", if value { "on" } else { "off" });
            }
            PanelEdit::Select(primitive) => {
                self.primitive = primitive;
                info!("showing {primitive}");
            }
        }
        Ok(())
    }

    /// One-line readout of the parameters, for the window title.
    pub fn summary(&self) -> String {
        let camera = &self.camera;
        let options = &self.options;
        let flag = |on: bool| if on { "on" } else { "off" };
        format!(
            "{} | fovy {:.0} near {:.1} far {:.1} | lights {}/{} | cull {} depth {} wire {} gizmos {} normals {}",
            self.primitive,
            camera.fovy,
            camera.near,
            camera.far,
            self.lights.active_count(),
            self.lights.count(),
            flag(options.backface_culling),
            flag(options.depth_test),
            flag(options.wireframe),
            flag(options.show_lights),
            flag(options.show_normals),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::WheelMode;

    #[test]
    fn pointer_moves_orbit_only_while_pressed() {
        let mut scene = SceneState::new();
        let start = scene.camera;

        scene.handle(InputEvent::PointerMove {
            position: Vec2::new(50.0, 0.0),
        });
        assert_eq!(scene.camera, start);

        scene.handle(InputEvent::PointerDown {
            position: Vec2::new(50.0, 0.0),
        });
        scene.handle(InputEvent::PointerMove {
            position: Vec2::new(60.0, 0.0),
        });
        assert_ne!(scene.camera.eye, start.eye);
        assert!((scene.camera.distance() - start.distance()).abs() < 1e-4);

        scene.handle(InputEvent::PointerUp);
        let released = scene.camera;
        scene.handle(InputEvent::PointerMove {
            position: Vec2::new(200.0, 40.0),
        });
        assert_eq!(scene.camera, released);
    }

    #[test]
    fn wheel_and_resize_reach_the_camera() {
        let mut scene = SceneState::new();
        scene.handle(InputEvent::Wheel {
            notches: -3.0,
            mode: WheelMode::Fov,
        });
        assert_eq!(scene.camera.fovy, 44.0);
        scene.handle(InputEvent::Resize {
            width: 1600,
            height: 800,
        });
        assert_eq!(scene.camera.aspect, 2.0);
    }

    #[test]
    fn out_of_range_light_edit_leaves_scene_unchanged() {
        let mut scene = SceneState::new().with_light_count(2);
        let before = scene.clone();
        assert_eq!(
            scene.apply(PanelEdit::ToggleLight(5)),
            Err(LightError::IndexOutOfRange { index: 5, count: 2 })
        );
        assert_eq!(scene, before);
    }

    #[test]
    fn edits_update_the_summary() {
        let mut scene = SceneState::new();
        scene.apply(PanelEdit::Select(Primitive::Pyramid)).unwrap();
        scene.apply(PanelEdit::LightCount(3)).unwrap();
        scene.apply(PanelEdit::ToggleLight(0)).unwrap();
        scene
            .apply(PanelEdit::ToggleOption(RenderOption::Wireframe))
            .unwrap();
        let summary = scene.summary();
        assert!(summary.starts_with("Pyramid |"), "{summary}");
        assert!(summary.contains("lights 2/3"), "{summary}");
        assert!(summary.contains("wire on"), "{summary}");
    }

    #[test]
    fn material_edit_targets_the_object_only() {
        let mut scene = SceneState::new();
        scene
            .apply(PanelEdit::Material(MaterialEdit::Shininess(0.0)))
            .unwrap();
        assert_eq!(scene.object_material.shininess, 1.0);
        assert_eq!(scene.ground_material, Material::ground());
    }
}
