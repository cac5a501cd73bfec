use crate::model::material::PLATFORM_TEXTURE;

/// Host-side settings shared by the browser and native entry points
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub width: u32,
    pub height: u32,
    /// Longest frame the physics step will see, in seconds
    pub max_frame_dt: f32,
    pub platform_texture: String,
    pub title: String,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            width: 1080,
            height: 600,
            max_frame_dt: 0.1,
            platform_texture: PLATFORM_TEXTURE.to_string(),
            title: "Sphere Hop".to_string(),
        }
    }

    /// Frame delta fed to the controller. Stalls (tab switches, debugger
    /// pauses) collapse to `max_frame_dt`; negative clock jumps to zero.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() {
            dt.clamp(0.0, self.max_frame_dt)
        } else {
            0.0
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
