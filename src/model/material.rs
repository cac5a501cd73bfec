use glam::Vec4;

/// Path of the stone texture decaled onto every platform
pub const PLATFORM_TEXTURE: &str = "assets/wall_stones.png";

/// Which color source the fragment stage samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shading {
    Flat,
    Textured,
}

/// Phong reflection coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongParams {
    pub ambient: f32,
    pub diffusivity: f32,
    pub specularity: f32,
    pub smoothness: f32,
}

impl Default for PhongParams {
    fn default() -> Self {
        Self { ambient: 0.0, diffusivity: 1.0, specularity: 1.0, smoothness: 40.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub params: PhongParams,
    pub color: Vec4,
    pub texture: Option<String>,
}

impl Material {
    /// White plastic used for the avatar sphere
    pub fn plastic() -> Self {
        Self {
            shading: Shading::Flat,
            params: PhongParams { ambient: 0.4, diffusivity: 0.6, ..Default::default() },
            color: Vec4::ONE,
            texture: None,
        }
    }

    /// Pastel green stone used for the platform cubes
    pub fn stone(texture: &str) -> Self {
        Self {
            shading: Shading::Textured,
            params: PhongParams { ambient: 0.1, diffusivity: 0.2, specularity: 0.0, ..Default::default() },
            color: Vec4::new(0.64, 0.94, 0.74, 1.0),
            texture: Some(texture.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKey {
    Avatar,
    Platform,
}

#[derive(Debug, Clone)]
pub struct Materials {
    pub avatar: Material,
    pub platform: Material,
}

impl Materials {
    pub fn new(platform_texture: &str) -> Self {
        Self {
            avatar: Material::plastic(),
            platform: Material::stone(platform_texture),
        }
    }

    pub fn get(&self, key: MaterialKey) -> &Material {
        match key {
            MaterialKey::Avatar => &self.avatar,
            MaterialKey::Platform => &self.platform,
        }
    }

    /// Every texture path referenced by a material, without duplicates
    pub fn texture_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = [&self.avatar, &self.platform]
            .iter()
            .filter_map(|m| m.texture.as_deref())
            .collect();
        paths.dedup();
        paths
    }
}

impl Default for Materials {
    fn default() -> Self {
        Self::new(PLATFORM_TEXTURE)
    }
}
