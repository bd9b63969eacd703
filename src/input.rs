use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState};

use crate::camera::WheelMode;
use crate::light::LightEdit;
use crate::material::MaterialEdit;
use crate::mesh::Primitive;
use crate::options::RenderOption;
use crate::scene::{PanelEdit, SceneState};

/// Near-plane step of the Home/End hotkeys.
pub const NEAR_STEP: f32 = 0.1;
/// Far-plane step of the PageUp/PageDown hotkeys.
pub const FAR_STEP: f32 = 0.5;
/// Shininess step of the bracket hotkeys.
pub const SHININESS_STEP: f32 = 5.0;
/// Distance the arrow keys move the first light.
pub const LIGHT_NUDGE: f32 = 0.1;

/// A window event reduced to what the scene cares about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// One wheel event; only the sign of `notches` is used.
    Wheel { notches: f32, mode: WheelMode },
    PointerDown { position: Vec2 },
    PointerMove { position: Vec2 },
    PointerUp,
    Resize { width: u32, height: u32 },
}

/// Tracks modifier keys and the cursor between window events.
#[derive(Debug, Default)]
pub struct Input {
    modifiers: ModifiersState,
    cursor: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the wheel does with the modifiers currently held.
    pub fn wheel_mode(&self) -> WheelMode {
        wheel_mode(self.modifiers)
    }

    /// Updates tracked state and returns the scene event for `event`, if any.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::PointerMove {
                    position: self.cursor,
                })
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => InputEvent::PointerDown {
                    position: self.cursor,
                },
                ElementState::Released => InputEvent::PointerUp,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                wheel_notches(y).map(|notches| InputEvent::Wheel {
                    notches,
                    mode: self.wheel_mode(),
                })
            }
            WindowEvent::Resized(size) => Some(InputEvent::Resize {
                width: size.width,
                height: size.height,
            }),
            _ => None,
        }
    }
}

/// Shift dollies the eye, Alt dollies the whole rig; Shift wins if both are held.
pub fn wheel_mode(modifiers: ModifiersState) -> WheelMode {
    if modifiers.shift_key() {
        WheelMode::DollyEye
    } else if modifiers.alt_key() {
        WheelMode::DollyRig
    } else {
        WheelMode::Fov
    }
}

/// Converts a winit vertical scroll amount into a notch sign.
///
/// winit reports scrolling away from the user as positive; that direction
/// zooms in, so the sign is flipped.
pub fn wheel_notches(y: f32) -> Option<f32> {
    (y != 0.0).then(|| -y.signum())
}

/// The panel edit bound to `key`, if any.
///
/// Arrow keys move the first light in the ground plane and `D` flips it
/// between point and directional; with no lights they do nothing.
pub fn hotkey_edit(key: KeyCode, scene: &SceneState) -> Option<PanelEdit> {
    let camera = &scene.camera;
    let count = scene.lights.count();
    let shininess = scene.object_material.shininess;
    let first = scene.lights.get(0);
    let nudge = |offset: Vec3| {
        first.map(|light| PanelEdit::Light {
            index: 0,
            edit: LightEdit::Position(light.position + offset),
        })
    };
    let edit = match key {
        KeyCode::Digit1 => PanelEdit::Select(Primitive::Sphere),
        KeyCode::Digit2 => PanelEdit::Select(Primitive::Cube),
        KeyCode::Digit3 => PanelEdit::Select(Primitive::Cylinder),
        KeyCode::Digit4 => PanelEdit::Select(Primitive::Pyramid),
        KeyCode::Digit5 => PanelEdit::Select(Primitive::Torus),
        KeyCode::KeyB => PanelEdit::ToggleOption(RenderOption::BackfaceCulling),
        KeyCode::KeyZ => PanelEdit::ToggleOption(RenderOption::DepthTest),
        KeyCode::KeyW => PanelEdit::ToggleOption(RenderOption::Wireframe),
        KeyCode::KeyL => PanelEdit::ToggleOption(RenderOption::ShowLights),
        KeyCode::KeyN => PanelEdit::ToggleOption(RenderOption::ShowNormals),
        KeyCode::Equal | KeyCode::NumpadAdd => PanelEdit::LightCount(count + 1),
        KeyCode::Minus | KeyCode::NumpadSubtract => {
            PanelEdit::LightCount(count.saturating_sub(1))
        }
        KeyCode::F1 => PanelEdit::ToggleLight(0),
        KeyCode::F2 => PanelEdit::ToggleLight(1),
        KeyCode::F3 => PanelEdit::ToggleLight(2),
        KeyCode::F4 => PanelEdit::ToggleLight(3),
        KeyCode::F5 => PanelEdit::ToggleLight(4),
        KeyCode::F6 => PanelEdit::ToggleLight(5),
        KeyCode::F7 => PanelEdit::ToggleLight(6),
        KeyCode::F8 => PanelEdit::ToggleLight(7),
        KeyCode::Home => PanelEdit::Near(camera.near + NEAR_STEP),
        KeyCode::End => PanelEdit::Near(camera.near - NEAR_STEP),
        KeyCode::PageUp => PanelEdit::Far(camera.far + FAR_STEP),
        KeyCode::PageDown => PanelEdit::Far(camera.far - FAR_STEP),
        KeyCode::BracketLeft => {
            PanelEdit::Material(MaterialEdit::Shininess(shininess - SHININESS_STEP))
        }
        KeyCode::BracketRight => {
            PanelEdit::Material(MaterialEdit::Shininess(shininess + SHININESS_STEP))
        }
        KeyCode::ArrowLeft => return nudge(Vec3::new(-LIGHT_NUDGE, 0.0, 0.0)),
        KeyCode::ArrowRight => return nudge(Vec3::new(LIGHT_NUDGE, 0.0, 0.0)),
        KeyCode::ArrowUp => return nudge(Vec3::new(0.0, 0.0, -LIGHT_NUDGE)),
        KeyCode::ArrowDown => return nudge(Vec3::new(0.0, 0.0, LIGHT_NUDGE)),
        KeyCode::KeyD => {
            return first.map(|light| PanelEdit::Light {
                index: 0,
                edit: LightEdit::Directional(!light.directional),
            });
        }
        _ => return None,
    };
    Some(edit)
}
