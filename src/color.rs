//! Colour types used by the viewer.
//!
//! Two representations exist on purpose:
//!
//! - [`Rgb8`]: three 0–255 channels, the form every light and material keeps
//!   in storage because it is what a colour picker edits.
//! - [`Color`]: linear `f32` RGBA, used for the clear colour.
//!
//! Channel scaling from 0–255 to 0–1 happens exactly once, in [`Rgb8::to_unit`],
//! which only the uniform upload path calls.

use glam::Vec3;

/// Linear RGBA colour with `f32` channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
}

impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        }
    }
}

/// An RGB colour with 0–255 channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A grey with all three channels set to `value`.
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    pub const WHITE: Rgb8 = Rgb8::gray(255);

    /// Rescales the channels to `[0, 1]` for upload.
    pub fn to_unit(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl std::fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_white_scales_to_unit_vector() {
        assert_eq!(Rgb8::WHITE.to_unit(), Vec3::ONE);
    }

    #[test]
    fn partial_channels_scale_linearly() {
        let unit = Rgb8::new(0, 51, 255).to_unit();
        assert_eq!(unit.x, 0.0);
        assert!((unit.y - 0.2).abs() < 1e-6);
        assert_eq!(unit.z, 1.0);
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(Rgb8::new(0, 100, 255).to_string(), "#0064ff");
    }
}
