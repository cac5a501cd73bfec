// MODEL: Scene state and data, no GPU types
pub mod avatar;
pub mod platform;
pub mod camera;
pub mod light;
pub mod material;
pub mod shading;
pub mod scene;

pub use avatar::Avatar;
pub use platform::{Aabb, PlatformCell, PlatformGrid, BOX_SIZE, GRID_DIMS};
pub use camera::Camera;
pub use light::{Light, MAX_LIGHTS};
pub use material::{Material, MaterialKey, Materials, PhongParams, Shading};
pub use scene::Scene;
