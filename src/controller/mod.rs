// CONTROLLER: Input, scene logic, and update loop
pub mod input;
pub mod physics;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{Action, ActionEvent, InputEvent, InputProcessor, InputState, KeyBindings};
pub use physics::{GravityMode, PhysicsSystem, StepReport};
pub use camera_controller::CameraController;
pub use frame_loop::{DrawCommand, FrameOutput, FrameUniform, ObjectUniform, SceneController, Shape};
