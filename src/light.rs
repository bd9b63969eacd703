//! The scene's lights.
//!
//! A [`LightSet`] is an ordered list of at most [`MAX_LIGHTS`] [`Light`]s. The
//! index of a light is its identity: it addresses the `uLight[i]` uniform slot
//! and is how edits name it. Lights are never reordered.

use glam::Vec3;
use log::warn;

use crate::color::Rgb8;

/// Capacity of the light set and of the shader's light array.
pub const MAX_LIGHTS: usize = 8;
/// Height at which default lights are placed.
pub const LIGHT_HEIGHT: f32 = 1.5;
/// Spacing between default lights along X.
pub const LIGHT_SPACING: f32 = 0.5;

/// An out-of-range light index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LightError {
    #[error("light index {index} out of range, {count} light(s) defined")]
    IndexOutOfRange { index: usize, count: usize },
}

/// A point or directional light.
///
/// Colours stay in the 0–255 range; they are rescaled when uploaded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// World-space position, or direction toward the light when `directional`.
    pub position: Vec3,
    pub ambient: Rgb8,
    pub diffuse: Rgb8,
    pub specular: Rgb8,
    pub directional: bool,
    pub active: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, LIGHT_HEIGHT, 0.0),
            ambient: Rgb8::gray(75),
            diffuse: Rgb8::gray(175),
            specular: Rgb8::WHITE,
            directional: false,
            active: true,
        }
    }
}

impl Light {
    /// The default light for slot `index` of a set holding `count` lights.
    ///
    /// Lights are spread evenly along X, centred on the origin.
    pub fn default_for_slot(index: usize, count: usize) -> Self {
        let offset = index as f32 - (count.max(1) - 1) as f32 / 2.0;
        Self {
            position: Vec3::new(offset * LIGHT_SPACING, LIGHT_HEIGHT, 0.0),
            ..Self::default()
        }
    }
}

/// A single-field edit of a light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightEdit {
    Position(Vec3),
    Ambient(Rgb8),
    Diffuse(Rgb8),
    Specular(Rgb8),
    Directional(bool),
    Active(bool),
}

/// Ordered, capacity-limited collection of lights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightSet {
    lights: Vec<Light>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set of `count` default lights (clamped to [`MAX_LIGHTS`]).
    pub fn with_count(count: usize) -> Self {
        let mut set = Self::new();
        set.set_count(count);
        set
    }

    /// Resizes the set, clamping to `[0, MAX_LIGHTS]`.
    ///
    /// Lights kept from before keep their values; added lights get the default
    /// pose for their slot. Returns the resulting count.
    pub fn set_count(&mut self, count: usize) -> usize {
        if count > MAX_LIGHTS {
            warn!("requested {count} lights, clamping to {MAX_LIGHTS}");
        }
        let count = count.min(MAX_LIGHTS);
        let existing = self.lights.len();
        self.lights.truncate(count);
        self.lights
            .extend((existing..count).map(|index| Light::default_for_slot(index, count)));
        count
    }

    pub fn count(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    /// All lights in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    /// Active lights in index order.
    pub fn iter_active(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(|light| light.active)
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// Flips the active flag of light `index`, returning the new value.
    pub fn toggle_active(&mut self, index: usize) -> Result<bool, LightError> {
        let light = self.slot_mut(index)?;
        light.active = !light.active;
        Ok(light.active)
    }

    /// Applies a field edit to light `index`.
    pub fn edit(&mut self, index: usize, edit: LightEdit) -> Result<(), LightError> {
        let light = self.slot_mut(index)?;
        match edit {
            LightEdit::Position(position) => light.position = position,
            LightEdit::Ambient(color) => light.ambient = color,
            LightEdit::Diffuse(color) => light.diffuse = color,
            LightEdit::Specular(color) => light.specular = color,
            LightEdit::Directional(directional) => light.directional = directional,
            LightEdit::Active(active) => light.active = active,
        }
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Light, LightError> {
        let count = self.lights.len();
        self.lights
            .get_mut(index)
            .ok_or(LightError::IndexOutOfRange { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_clamped_to_capacity() {
        let mut set = LightSet::new();
        assert_eq!(set.set_count(42), MAX_LIGHTS);
        assert_eq!(set.count(), MAX_LIGHTS);
    }

    #[test]
    fn default_layout_is_symmetric_and_deterministic() {
        let set = LightSet::with_count(100);
        let xs: Vec<f32> = set.iter().map(|light| light.position.x).collect();
        assert_eq!(xs, vec![-1.75, -1.25, -0.75, -0.25, 0.25, 0.75, 1.25, 1.75]);
        assert!(set.iter().all(|light| light.position.y == LIGHT_HEIGHT));
        assert_eq!(set, LightSet::with_count(MAX_LIGHTS));
    }

    #[test]
    fn single_light_sits_over_the_origin() {
        let set = LightSet::with_count(1);
        assert_eq!(set.get(0).map(|l| l.position), Some(Vec3::new(0.0, LIGHT_HEIGHT, 0.0)));
    }

    #[test]
    fn new_lights_use_default_colours() {
        let set = LightSet::with_count(3);
        for light in set.iter() {
            assert_eq!(light.ambient, Rgb8::gray(75));
            assert_eq!(light.diffuse, Rgb8::gray(175));
            assert_eq!(light.specular, Rgb8::WHITE);
            assert!(light.active);
            assert!(!light.directional);
        }
    }

    #[test]
    fn growing_keeps_edited_lights() {
        let mut set = LightSet::with_count(1);
        set.edit(0, LightEdit::Position(Vec3::new(4.0, 4.0, 4.0))).unwrap();
        set.set_count(2);
        assert_eq!(set.get(0).unwrap().position, Vec3::new(4.0, 4.0, 4.0));
        assert_eq!(set.get(1).unwrap().position.x, 0.25);
    }

    #[test]
    fn zero_lights_is_allowed() {
        let mut set = LightSet::with_count(4);
        assert_eq!(set.set_count(0), 0);
        assert!(set.is_empty());
        assert_eq!(set.iter_active().count(), 0);
    }

    #[test]
    fn edits_out_of_range_are_rejected() {
        let mut set = LightSet::with_count(2);
        let err = set.edit(2, LightEdit::Active(false)).unwrap_err();
        assert_eq!(err, LightError::IndexOutOfRange { index: 2, count: 2 });
        assert!(set.toggle_active(7).is_err());
        assert_eq!(set, LightSet::with_count(2));
    }

    #[test]
    fn toggle_flips_active_flag() {
        let mut set = LightSet::with_count(2);
        assert_eq!(set.toggle_active(1), Ok(false));
        assert_eq!(set.active_count(), 1);
        assert_eq!(set.toggle_active(1), Ok(true));
        assert_eq!(set.active_count(), 2);
    }

    #[test]
    fn colour_edits_are_stored_unscaled() {
        let mut set = LightSet::with_count(1);
        set.edit(0, LightEdit::Specular(Rgb8::new(255, 128, 0))).unwrap();
        assert_eq!(set.get(0).unwrap().specular, Rgb8::new(255, 128, 0));
    }
}
