use crate::color::Rgb8;

/// Lowest shininess exponent accepted.
pub const MIN_SHININESS: f32 = 1.0;

/// Phong material coefficients. Colours are 0–255 and scaled on upload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ka: Rgb8,
    pub kd: Rgb8,
    pub ks: Rgb8,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::object()
    }
}

impl Material {
    /// The selected primitive's starting material: a glossy green.
    pub const fn object() -> Self {
        Self {
            ka: Rgb8::new(0, 25, 0),
            kd: Rgb8::new(0, 100, 0),
            ks: Rgb8::WHITE,
            shininess: 50.0,
        }
    }

    /// The ground plane's fixed material: a light grey.
    pub const fn ground() -> Self {
        Self {
            ka: Rgb8::gray(50),
            kd: Rgb8::gray(150),
            ks: Rgb8::gray(200),
            shininess: 100.0,
        }
    }

    pub fn apply(&mut self, edit: MaterialEdit) {
        match edit {
            MaterialEdit::Ka(color) => self.ka = color,
            MaterialEdit::Kd(color) => self.kd = color,
            MaterialEdit::Ks(color) => self.ks = color,
            MaterialEdit::Shininess(value) => self.shininess = value.max(MIN_SHININESS),
        }
    }
}

/// A single-field edit of a material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialEdit {
    Ka(Rgb8),
    Kd(Rgb8),
    Ks(Rgb8),
    Shininess(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shininess_has_a_floor() {
        let mut material = Material::object();
        material.apply(MaterialEdit::Shininess(0.2));
        assert_eq!(material.shininess, MIN_SHININESS);
        material.apply(MaterialEdit::Shininess(8.0));
        assert_eq!(material.shininess, 8.0);
    }

    #[test]
    fn colour_edits_replace_one_coefficient() {
        let mut material = Material::object();
        material.apply(MaterialEdit::Kd(Rgb8::new(200, 10, 10)));
        assert_eq!(material.kd, Rgb8::new(200, 10, 10));
        assert_eq!(material.ka, Material::object().ka);
        assert_eq!(material.ks, Material::object().ks);
    }
}
