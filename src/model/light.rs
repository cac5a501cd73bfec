use glam::{Vec3, Vec4};

/// Most lights the shader program accepts per frame
pub const MAX_LIGHTS: usize = 2;

/// A point light (`w == 1`) or a directional light (`w == 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position_or_vector: Vec4,
    pub color: Vec4,
    pub attenuation: f32,
}

impl Light {
    /// `size` is the light's reach; falloff factor is its reciprocal.
    pub fn new(position_or_vector: Vec4, color: Vec4, size: f32) -> Self {
        Self {
            position_or_vector,
            color,
            attenuation: 1.0 / size,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.position_or_vector.w == 0.0
    }

    /// Unnormalized vector from `surface` toward the light
    pub fn surface_to_light(&self, surface: Vec3) -> Vec3 {
        self.position_or_vector.truncate() - self.position_or_vector.w * surface
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec4::new(0.0, 5.0, 5.0, 1.0), Vec4::ONE, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light_is_white_point_light() {
        let light = Light::default();
        assert!(!light.is_directional());
        assert_eq!(light.color, Vec4::ONE);
        assert!((light.attenuation - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_surface_to_light_depends_on_w() {
        let point = Light::new(Vec4::new(0.0, 5.0, 0.0, 1.0), Vec4::ONE, 1.0);
        assert_eq!(point.surface_to_light(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(0.0, 4.0, 0.0));

        let sun = Light::new(Vec4::new(0.0, 1.0, 0.0, 0.0), Vec4::ONE, 1.0);
        assert!(sun.is_directional());
        assert_eq!(sun.surface_to_light(Vec3::new(9.0, 9.0, 9.0)), Vec3::Y);
    }
}
