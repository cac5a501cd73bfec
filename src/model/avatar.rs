use glam::{Mat4, Vec3};

/// The player-controlled sphere.
///
/// `thrust` doubles as input intent and effective velocity: keys write its
/// axes directly, gravity drains its `y`, and the physics step scales it into
/// a displacement.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub position: Vec3,
    pub thrust: Vec3,
    pub radius: f32,
    /// Set by a platform contact, cleared by a jump.
    pub grounded: bool,
    start: Vec3,
    transform: Mat4,
}

impl Avatar {
    pub fn new(start: Vec3, radius: f32) -> Self {
        Self {
            position: start,
            thrust: Vec3::ZERO,
            radius,
            grounded: false,
            start,
            transform: Self::compose(start, radius),
        }
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// translation(position) * scale(radius)
    pub fn recompute_transform(&mut self) {
        self.transform = Self::compose(self.position, self.radius);
    }

    /// Respawn at the start point. Horizontal thrust is left alone so held
    /// keys keep steering after the respawn.
    pub fn reset(&mut self) {
        self.position = self.start;
        self.thrust.y = 0.0;
        self.recompute_transform();
    }

    fn compose(position: Vec3, radius: f32) -> Mat4 {
        Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_avatar_transform_matches_start() {
        let avatar = Avatar::new(Vec3::new(0.0, 7.0, 0.0), 0.5);
        let expected = Mat4::from_translation(Vec3::new(0.0, 7.0, 0.0)) * Mat4::from_scale(Vec3::splat(0.5));
        assert_eq!(avatar.transform(), expected);
        assert!(!avatar.grounded);
        assert_eq!(avatar.thrust, Vec3::ZERO);
    }

    #[test]
    fn test_recompute_transform_is_idempotent() {
        let mut avatar = Avatar::new(Vec3::new(0.0, 7.0, 0.0), 0.5);
        avatar.position = Vec3::new(1.25, -0.3, 4.1);
        avatar.recompute_transform();
        let first = avatar.transform().to_cols_array();
        avatar.recompute_transform();
        let second = avatar.transform().to_cols_array();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_reset_restores_start_and_keeps_horizontal_thrust() {
        let mut avatar = Avatar::new(Vec3::new(0.0, 7.0, 0.0), 0.5);
        avatar.position = Vec3::new(3.0, -4.0, -2.0);
        avatar.thrust = Vec3::new(1.0, -0.6, -1.0);
        avatar.reset();
        assert_eq!(avatar.position, Vec3::new(0.0, 7.0, 0.0));
        assert_eq!(avatar.thrust, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(avatar.transform().w_axis.truncate(), avatar.start());
    }
}
