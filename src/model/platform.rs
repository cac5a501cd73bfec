use glam::{IVec3, Mat4, Vec3};

/// Dimensions of the platform grid in cells (x, y, z)
pub const GRID_DIMS: [i32; 3] = [8, 1, 8];

/// Edge length of one platform cube in world units
pub const BOX_SIZE: f32 = 2.0;

/// Axis-aligned box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extent: f32) -> Self {
        Self {
            min: center - Vec3::splat(half_extent),
            max: center + Vec3::splat(half_extent),
        }
    }

    /// Per-axis clamp of `p` into the box
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.max(self.min).min(self.max)
    }

    pub fn distance_to(&self, p: Vec3) -> f32 {
        (self.closest_point(p) - p).length()
    }
}

/// Integer grid coordinate of one platform cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformCell(pub IVec3);

impl PlatformCell {
    /// World-space center. The grid grows toward -Z, so the z index is negated.
    pub fn center(&self, box_size: f32) -> Vec3 {
        Vec3::new(
            self.0.x as f32 * box_size,
            self.0.y as f32 * box_size,
            -self.0.z as f32 * box_size,
        )
    }

    pub fn bounds(&self, box_size: f32) -> Aabb {
        Aabb::from_center(self.center(box_size), box_size * 0.5)
    }

    /// Model matrix for the unit cube mesh (which spans -1..1, i.e. a
    /// `BOX_SIZE` of 2 needs only a translation).
    pub fn transform(&self, box_size: f32) -> Mat4 {
        Mat4::from_translation(self.center(box_size)) * Mat4::from_scale(Vec3::splat(box_size * 0.5))
    }
}

/// The static set of platform cubes. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct PlatformGrid {
    cells: Vec<PlatformCell>,
    box_size: f32,
}

impl PlatformGrid {
    pub fn new(dims: [i32; 3], box_size: f32) -> Self {
        let mut cells = Vec::with_capacity((dims[0] * dims[1] * dims[2]).max(0) as usize);
        for x in 0..dims[0] {
            for y in 0..dims[1] {
                for z in 0..dims[2] {
                    cells.push(PlatformCell(IVec3::new(x, y, z)));
                }
            }
        }
        Self { cells, box_size }
    }

    /// A grid with no cells (nothing to stand on)
    pub fn empty() -> Self {
        Self { cells: Vec::new(), box_size: BOX_SIZE }
    }

    pub fn cells(&self) -> &[PlatformCell] {
        &self.cells
    }

    pub fn box_size(&self) -> f32 {
        self.box_size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn bounds(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.cells.iter().map(move |c| c.bounds(self.box_size))
    }
}

impl Default for PlatformGrid {
    fn default() -> Self {
        Self::new(GRID_DIMS, BOX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_has_64_cells() {
        let grid = PlatformGrid::default();
        assert_eq!(grid.len(), 64);
        assert!(grid.cells().iter().all(|c| c.0.y == 0));
    }

    #[test]
    fn test_cell_bounds_extend_toward_negative_z() {
        let cell = PlatformCell(IVec3::new(1, 0, 3));
        let b = cell.bounds(2.0);
        assert_eq!(b.min, Vec3::new(1.0, -1.0, -7.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, -5.0));
    }

    #[test]
    fn test_closest_point_clamps_per_axis() {
        let b = Aabb::from_center(Vec3::ZERO, 1.0);
        assert_eq!(b.closest_point(Vec3::new(0.5, 3.0, -2.0)), Vec3::new(0.5, 1.0, -1.0));
        assert_eq!(b.closest_point(Vec3::new(0.2, 0.1, 0.0)), Vec3::new(0.2, 0.1, 0.0));
        assert_eq!(b.distance_to(Vec3::new(0.0, 1.5, 0.0)), 0.5);
    }

    #[test]
    fn test_cell_transform_for_box_size_two_is_pure_translation() {
        let cell = PlatformCell(IVec3::new(2, 0, 1));
        assert_eq!(cell.transform(2.0), Mat4::from_translation(Vec3::new(4.0, 0.0, -2.0)));
    }
}
