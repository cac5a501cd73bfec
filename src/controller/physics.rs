use crate::model::{Avatar, PlatformGrid};

/// How the per-frame gravity decrement relates to elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityMode {
    /// Subtract `gravity` from thrust.y once per frame, whatever the frame length.
    PerFrame,
    /// Subtract `gravity * dt / reference_dt`, so a frame of `reference_dt`
    /// seconds matches `PerFrame`.
    TimeScaled { reference_dt: f32 },
}

/// What happened during one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Platform boxes the avatar intersected
    pub contacts: usize,
    /// A falling avatar was pushed up onto a platform
    pub landed: bool,
    /// The avatar fell out of the world and was respawned
    pub reset: bool,
}

/// Handles avatar physics (thrust integration, gravity, collision, respawn)
pub struct PhysicsSystem {
    pub meters_per_frame: f32,
    pub speed_multiplier: f32,
    pub gravity: f32,
    pub gravity_mode: GravityMode,
    /// Landing correction only applies above `landing_height_factor * box_size`
    pub landing_height_factor: f32,
    /// At or below this height the avatar respawns
    pub reset_height: f32,
}

impl PhysicsSystem {
    pub fn new() -> Self {
        Self {
            meters_per_frame: 7.0,
            speed_multiplier: 1.0,
            gravity: 0.02,
            gravity_mode: GravityMode::PerFrame,
            landing_height_factor: 0.1,
            reset_height: -3.0,
        }
    }

    /// Advance the avatar by `dt` seconds against the static platforms.
    pub fn update(&self, avatar: &mut Avatar, platforms: &PlatformGrid, dt: f32) -> StepReport {
        if self.respawn_if_fallen(avatar) {
            return StepReport { reset: true, ..Default::default() };
        }

        // Integrate displacement
        let displacement = avatar.thrust * (dt * self.speed_multiplier * self.meters_per_frame);
        avatar.position += displacement;

        // Gravity
        avatar.thrust.y -= self.gravity_step(dt);

        let mut report = self.resolve_collisions(avatar, platforms);
        avatar.recompute_transform();

        if self.respawn_if_fallen(avatar) {
            report.reset = true;
        }
        report
    }

    pub fn gravity_step(&self, dt: f32) -> f32 {
        match self.gravity_mode {
            GravityMode::PerFrame => self.gravity,
            GravityMode::TimeScaled { reference_dt } if reference_dt > 0.0 => self.gravity * dt / reference_dt,
            GravityMode::TimeScaled { .. } => self.gravity,
        }
    }

    /// Clamped-point test against every platform box. Corrections are applied
    /// per box as they are found, so several contacts in one frame compound.
    pub fn resolve_collisions(&self, avatar: &mut Avatar, platforms: &PlatformGrid) -> StepReport {
        let mut report = StepReport::default();
        let landing_height = self.landing_height_factor * platforms.box_size();

        for bounds in platforms.bounds() {
            let distance = bounds.distance_to(avatar.position);
            if distance >= avatar.radius {
                continue;
            }
            let overlap = avatar.radius - distance;
            report.contacts += 1;
            avatar.grounded = true;

            if avatar.thrust.y < 0.0 && avatar.position.y > landing_height {
                avatar.position.y += overlap;
                avatar.thrust.y = 0.0;
                report.landed = true;
            }

            // Back out of the wall on whichever side we are moving into
            if avatar.thrust.x > 0.0 {
                avatar.position.x -= overlap;
            } else if avatar.thrust.x < 0.0 {
                avatar.position.x += overlap;
            }
            if avatar.thrust.z > 0.0 {
                avatar.position.z -= overlap;
            } else if avatar.thrust.z < 0.0 {
                avatar.position.z += overlap;
            }
        }

        report
    }

    fn respawn_if_fallen(&self, avatar: &mut Avatar) -> bool {
        if avatar.position.y > self.reset_height {
            return false;
        }
        tracing::info!(y = avatar.position.y, "avatar fell out of the world, respawning");
        avatar.reset();
        true
    }
}

impl Default for PhysicsSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlatformCell, GRID_DIMS, BOX_SIZE};
    use glam::{IVec3, Vec3};

    fn avatar_at(p: Vec3) -> Avatar {
        let mut avatar = Avatar::new(Vec3::new(0.0, 7.0, 0.0), 0.5);
        avatar.position = p;
        avatar.recompute_transform();
        avatar
    }

    #[test]
    fn test_contact_inside_any_cell_grounds_avatar() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new(GRID_DIMS, BOX_SIZE);
        for cell in grid.cells() {
            let mut avatar = avatar_at(cell.center(BOX_SIZE));
            let report = physics.update(&mut avatar, &grid, 0.0);
            assert!(avatar.grounded, "cell {:?} did not ground the avatar", cell);
            assert!(report.contacts >= 1);
        }
    }

    #[test]
    fn test_exact_touch_is_not_a_contact() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new(GRID_DIMS, BOX_SIZE);
        let mut avatar = avatar_at(Vec3::new(0.0, 1.5, 0.0));
        let report = physics.update(&mut avatar, &grid, 0.0);
        assert_eq!(report.contacts, 0);
        assert!(!avatar.grounded);
        assert_eq!(avatar.position.y, 1.5);
    }

    #[test]
    fn test_landing_pushes_up_by_penetration_and_stops_fall() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new(GRID_DIMS, BOX_SIZE);
        let mut avatar = avatar_at(Vec3::new(0.0, 1.4, 0.0));
        avatar.thrust.y = -0.1;

        let distance = grid.cells()[0].bounds(BOX_SIZE).distance_to(avatar.position);
        let expected = avatar.position.y + (avatar.radius - distance);

        let report = physics.update(&mut avatar, &grid, 0.0);
        assert!(report.landed);
        assert_eq!(avatar.thrust.y, 0.0);
        assert_eq!(avatar.position.y, expected);
        assert_eq!(avatar.transform().w_axis.y, expected);
    }

    #[test]
    fn test_no_landing_correction_near_ground_level() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new(GRID_DIMS, BOX_SIZE);
        let mut avatar = avatar_at(Vec3::new(-1.3, 0.1, 0.0));
        avatar.thrust = Vec3::new(1.0, -0.5, 0.0);

        let report = physics.update(&mut avatar, &grid, 0.0);
        assert!(!report.landed);
        assert!(avatar.grounded);
        assert_eq!(avatar.position.y, 0.1);
        // pushed back out of the wall it was moving into
        assert!((avatar.position.x - -1.5).abs() < 1e-6);
    }

    #[test]
    fn test_contacts_across_a_seam_compound() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new([2, 1, 1], BOX_SIZE);
        // on the shared face of cells x=0 and x=1, low enough that no landing applies
        let mut avatar = avatar_at(Vec3::new(1.0, 0.1, 0.0));
        avatar.thrust = Vec3::new(-1.0, -0.1, 0.0);

        let report = physics.update(&mut avatar, &grid, 0.0);
        assert_eq!(report.contacts, 2);
        assert!(!report.landed);
        // each box pushes a full radius toward +X, the second from where the first left it
        assert_eq!(avatar.position.x, 2.0);
        assert_eq!(avatar.position.y, 0.1);
        assert!(avatar.grounded);
    }

    #[test]
    fn test_corrections_from_one_box_apply_before_the_next_is_tested() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new([2, 1, 1], BOX_SIZE);
        // overlaps both cells at the start of the step
        let start = Vec3::new(0.8, 1.3, 0.0);
        for bounds in grid.bounds() {
            assert!(bounds.distance_to(start) < 0.5);
        }
        let mut avatar = avatar_at(start);
        avatar.thrust = Vec3::new(1.0, -0.1, 0.0);

        let report = physics.update(&mut avatar, &grid, 0.0);
        // landing on the first box lifts the avatar clear of the second
        assert_eq!(report.contacts, 1);
        assert!(report.landed);
        assert!((avatar.position.y - 1.5).abs() < 1e-6);
        assert!((avatar.position.x - 0.6).abs() < 1e-6);
        assert_eq!(avatar.thrust.y, 0.0);
    }

    #[test]
    fn test_wall_push_follows_z_thrust_sign() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new([1, 1, 1], BOX_SIZE);
        // just past the +Z face of cell (0,0,0), moving toward -Z into it
        let mut avatar = avatar_at(Vec3::new(0.0, 0.1, 1.2));
        avatar.thrust = Vec3::new(0.0, 0.0, -1.0);

        physics.update(&mut avatar, &grid, 0.0);
        assert!((avatar.position.z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallen_avatar_respawns_regardless_of_thrust() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::default();
        for (y, thrust) in [(-3.0, Vec3::new(1.0, 5.0, -1.0)), (-40.0, Vec3::new(0.0, -9.0, 0.0))] {
            let mut avatar = avatar_at(Vec3::new(4.0, y, -4.0));
            avatar.thrust = thrust;
            let report = physics.update(&mut avatar, &grid, 1.0);
            assert!(report.reset);
            assert_eq!(avatar.position, Vec3::new(0.0, 7.0, 0.0));
            assert_eq!(avatar.thrust.y, 0.0);
            assert_eq!(report.contacts, 0);
        }
    }

    #[test]
    fn test_free_fall_follows_per_frame_gravity_then_respawns() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::empty();
        let mut avatar = avatar_at(Vec3::new(0.0, 7.0, 0.0));
        let scale = physics.meters_per_frame * physics.speed_multiplier;

        for k in 1..=12u32 {
            let report = physics.update(&mut avatar, &grid, 1.0);
            assert!(!report.reset, "respawned early at frame {}", k);
            // thrust.y entering frame j is -0.02 * (j - 1)
            let fallen = physics.gravity * scale * (k * (k - 1)) as f32 / 2.0;
            assert!((avatar.position.y - (7.0 - fallen)).abs() < 1e-3, "frame {}: y = {}", k, avatar.position.y);
        }

        let report = physics.update(&mut avatar, &grid, 1.0);
        assert!(report.reset);
        assert_eq!(avatar.position, Vec3::new(0.0, 7.0, 0.0));
        assert_eq!(avatar.thrust.y, 0.0);
    }

    #[test]
    fn test_respawn_point_is_not_moved_by_landing() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new([1, 1, 1], BOX_SIZE);
        let mut avatar = avatar_at(Vec3::new(0.0, 1.3, 0.0));
        avatar.thrust.y = -1.0;
        physics.update(&mut avatar, &grid, 0.0);
        assert_eq!(avatar.start(), Vec3::new(0.0, 7.0, 0.0));
    }

    #[test]
    fn test_time_scaled_gravity_matches_per_frame_at_reference_dt() {
        let per_frame = PhysicsSystem::new();
        let scaled = PhysicsSystem {
            gravity_mode: GravityMode::TimeScaled { reference_dt: 1.0 / 60.0 },
            ..PhysicsSystem::new()
        };
        assert!((scaled.gravity_step(1.0 / 60.0) - per_frame.gravity_step(1.0 / 60.0)).abs() < 1e-7);
        assert!((scaled.gravity_step(1.0 / 30.0) - 2.0 * per_frame.gravity).abs() < 1e-7);
        assert_eq!(per_frame.gravity_step(1.0 / 30.0), per_frame.gravity);
    }

    #[test]
    fn test_landing_on_single_cell_grid() {
        let physics = PhysicsSystem::new();
        let grid = PlatformGrid::new([1, 1, 1], BOX_SIZE);
        let cell = PlatformCell(IVec3::ZERO);
        let mut avatar = avatar_at(cell.center(BOX_SIZE) + Vec3::new(0.0, 1.2, 0.0));
        avatar.thrust.y = -0.5;
        let report = physics.update(&mut avatar, &grid, 0.0);
        assert!(report.landed);
        assert!((avatar.position.y - 1.5).abs() < 1e-6);
    }
}
