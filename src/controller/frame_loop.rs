use glam::{Mat4, Vec3};

use crate::model::shading::squared_scale;
use crate::model::{Camera, Light, Material, MaterialKey, Scene, MAX_LIGHTS};
use super::camera_controller::CameraController;
use super::input::{InputProcessor, InputState};
use super::physics::{PhysicsSystem, StepReport};

/// Per-frame uniform shared by every draw (camera and lights)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_center: [f32; 3],
    pub light_count: u32,
    pub light_positions_or_vectors: [[f32; 4]; MAX_LIGHTS],
    pub light_colors: [[f32; 4]; MAX_LIGHTS],
    pub light_attenuation_factors: [f32; 4],
}

impl FrameUniform {
    pub fn new(camera: &Camera, lights: &[Light]) -> Self {
        let mut uniform = Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_center: camera.eye.to_array(),
            light_count: 0,
            light_positions_or_vectors: [[0.0; 4]; MAX_LIGHTS],
            light_colors: [[0.0; 4]; MAX_LIGHTS],
            light_attenuation_factors: [0.0; 4],
        };
        for (i, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            uniform.light_positions_or_vectors[i] = light.position_or_vector.to_array();
            uniform.light_colors[i] = light.color.to_array();
            uniform.light_attenuation_factors[i] = light.attenuation;
            uniform.light_count += 1;
        }
        uniform
    }
}

/// Per-draw uniform: transform plus material
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub shape_color: [f32; 4],
    pub squared_scale: [f32; 3],
    pub ambient: f32,
    pub diffusivity: f32,
    pub specularity: f32,
    pub smoothness: f32,
    pub _pad: f32,
}

impl ObjectUniform {
    pub fn new(model: &Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            shape_color: material.color.to_array(),
            squared_scale: squared_scale(model).to_array(),
            ambient: material.params.ambient,
            diffusivity: material.params.diffusivity,
            specularity: material.params.specularity,
            smoothness: material.params.smoothness,
            _pad: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Sphere,
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub shape: Shape,
    pub model: Mat4,
    pub material: MaterialKey,
}

/// Everything the renderer needs for one frame
pub struct FrameOutput {
    pub frame: FrameUniform,
    pub draws: Vec<DrawCommand>,
    pub report: StepReport,
}

/// Owns the scene and runs input, physics, camera and draw-list building
/// once per animation frame.
pub struct SceneController {
    pub scene: Scene,
    pub camera: Camera,
    pub physics: PhysicsSystem,
    pub input_processor: InputProcessor,
    pub camera_controller: CameraController,
    last_report: StepReport,
}

impl SceneController {
    pub fn new(scene: Scene, width: u32, height: u32) -> Self {
        let mut camera = Camera::new(width, height);
        let camera_controller = CameraController::new();
        camera_controller.follow(&mut camera, scene.avatar.position);
        Self {
            scene,
            camera,
            physics: PhysicsSystem::new(),
            input_processor: InputProcessor::new(),
            camera_controller,
            last_report: StepReport::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    pub fn last_report(&self) -> StepReport {
        self.last_report
    }

    /// Advance one frame of `dt` seconds and build its draw list
    pub fn update(&mut self, input: &mut InputState, dt: f32) -> FrameOutput {
        let events = input.drain_events();
        if !events.is_empty() {
            tracing::trace!(?events, "applying input");
        }
        self.input_processor.apply(&events, &mut self.scene.avatar);

        let was_grounded = self.scene.avatar.grounded;
        let report = self.physics.update(&mut self.scene.avatar, &self.scene.platforms, dt);
        if report.landed && !was_grounded {
            tracing::debug!(pos = ?self.scene.avatar.position, "landed");
        }
        self.last_report = report;

        self.camera_controller.follow(&mut self.camera, self.scene.avatar.position);

        FrameOutput {
            frame: FrameUniform::new(&self.camera, self.scene.active_lights()),
            draws: self.draw_list(),
            report,
        }
    }

    /// The avatar sphere first, then one cube per platform cell
    pub fn draw_list(&self) -> Vec<DrawCommand> {
        let platforms = &self.scene.platforms;
        let mut draws = Vec::with_capacity(platforms.len() + 1);
        draws.push(DrawCommand {
            shape: Shape::Sphere,
            model: self.scene.avatar.transform(),
            material: MaterialKey::Avatar,
        });
        draws.extend(platforms.cells().iter().map(|cell| DrawCommand {
            shape: Shape::Cube,
            model: cell.transform(platforms.box_size()),
            material: MaterialKey::Platform,
        }));
        draws
    }

    pub fn avatar_position(&self) -> Vec3 {
        self.scene.avatar.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;
    use crate::model::PlatformGrid;

    #[test]
    fn test_uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 160);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 112);
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniform>() % 16, 0);
    }

    #[test]
    fn test_frame_uniform_packs_lights() {
        let camera = Camera::new(800, 600);
        let lights = vec![Light::default(); 3];
        let uniform = FrameUniform::new(&camera, &lights);
        assert_eq!(uniform.light_count, MAX_LIGHTS as u32);
        assert_eq!(uniform.light_positions_or_vectors[0], [0.0, 5.0, 5.0, 1.0]);
        assert_eq!(uniform.light_attenuation_factors[2], 0.0);
        assert_eq!(uniform.camera_center, camera.eye.to_array());
    }

    #[test]
    fn test_draw_list_has_avatar_then_every_platform() {
        let mut controller = SceneController::new(Scene::default(), 800, 600);
        let mut input = InputState::new();
        let out = controller.update(&mut input, 1.0 / 60.0);

        assert_eq!(out.draws.len(), 65);
        assert_eq!(out.draws[0].shape, Shape::Sphere);
        assert_eq!(out.draws[0].material, MaterialKey::Avatar);
        assert_eq!(out.draws[0].model, controller.scene.avatar.transform());
        assert!(out.draws[1..].iter().all(|d| d.shape == Shape::Cube && d.material == MaterialKey::Platform));
    }

    #[test]
    fn test_camera_tracks_avatar_each_frame() {
        let mut controller = SceneController::new(Scene::default(), 800, 600);
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("d".to_string()));
        for _ in 0..10 {
            controller.update(&mut input, 1.0 / 60.0);
        }
        let pos = controller.avatar_position();
        assert!(pos.x > 0.0);
        assert_eq!(controller.camera.target, pos);
        assert_eq!(controller.camera.eye, pos + controller.camera_controller.follow_offset);
    }

    #[test]
    fn test_avatar_settles_on_platform_and_can_jump() {
        let mut controller = SceneController::new(Scene::default(), 800, 600);
        let mut input = InputState::new();
        for _ in 0..600 {
            controller.update(&mut input, 1.0 / 60.0);
        }
        let avatar = &controller.scene.avatar;
        assert!(avatar.grounded);
        assert!(avatar.position.y > 1.0 && avatar.position.y < 1.6, "y = {}", avatar.position.y);

        input.process_event(&InputEvent::KeyDown(" ".to_string()));
        controller.update(&mut input, 1.0 / 60.0);
        assert!(controller.scene.avatar.position.y > 1.0);
        assert!(controller.scene.avatar.thrust.y > 1.0);
    }

    #[test]
    fn test_object_uniform_carries_material() {
        let scene = Scene::default();
        let material = scene.materials.get(MaterialKey::Platform);
        let model = Mat4::from_translation(Vec3::new(2.0, 0.0, -4.0));
        let uniform = ObjectUniform::new(&model, material);
        assert_eq!(uniform.shape_color, material.color.to_array());
        assert_eq!(uniform.squared_scale, [1.0, 1.0, 1.0]);
        assert_eq!(uniform.ambient, 0.1);
    }

    #[test]
    fn test_empty_grid_draws_only_avatar() {
        let scene = Scene::new(PlatformGrid::empty(), Default::default());
        let controller = SceneController::new(scene, 800, 600);
        assert_eq!(controller.draw_list().len(), 1);
    }
}
