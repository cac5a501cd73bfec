// VIEW: Rendering and graphics
pub mod gpu_init;
pub mod mesh;
pub mod render;
pub mod texture;

pub use gpu_init::{GpuContext, GpuInitError};
pub use render::{EguiFrame, SceneRenderer};
pub use texture::{LoadState, TextureError};
