use std::sync::Arc;
use std::time::Instant;

use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::Window,
};

// Import from the library crate
use sphere_hop::{
    config::AppConfig,
    controller::{input::native::key_to_input, InputEvent, InputState, SceneController},
    logging,
    model::{Materials, PlatformGrid, Scene},
    ui,
    view::{EguiFrame, GpuContext, GpuInitError, SceneRenderer},
};

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: SceneRenderer,
    controller: SceneController,
    input: InputState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    config: AppConfig,
    last_frame_time: Instant,
}

impl App {
    async fn new(window: Arc<Window>, config: AppConfig) -> Result<Self, GpuInitError> {
        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone(), size.width, size.height).await?;

        let scene = Scene::new(PlatformGrid::default(), Materials::new(&config.platform_texture));
        let renderer = SceneRenderer::new(&gpu, &scene.materials);
        let controller = SceneController::new(scene, gpu.config.width, gpu.config.height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            controller,
            input: InputState::new(),
            egui_state,
            egui_ctx,
            config,
            last_frame_time: Instant::now(),
        })
    }

    /// Returns true when the event was fully handled here
    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event
        if self.egui_state.on_window_event(self.window.as_ref(), event).consumed {
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    if let Some(input_event) = key_to_input(*code, *state == ElementState::Pressed) {
                        self.input.process_event(&input_event);
                    }
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.input.process_event(&InputEvent::FocusLost);
                true
            }
            WindowEvent::Occluded(occluded) => {
                self.input.process_event(&InputEvent::VisibilityChanged { visible: !occluded });
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gpu.resize(new_size.width, new_size.height);
            self.renderer.resize(&self.gpu);
            self.controller.resize(new_size.width, new_size.height);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = self.config.clamp_dt((now - self.last_frame_time).as_secs_f32());
        self.last_frame_time = now;

        let output = self.controller.update(&mut self.input, dt);
        self.renderer.poll_textures(&self.gpu);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let stats = ui::HudStats {
            dt,
            texture_state: self.renderer.texture_state(&self.config.platform_texture),
        };
        let full_output = ui::build_ui(&self.egui_ctx, raw_input, &self.controller, &mut self.input, stats);
        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);
        let primitives = self.egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        self.renderer.draw_frame(
            &self.gpu,
            &output,
            &self.controller.scene.materials,
            Some(EguiFrame {
                primitives,
                textures_delta: full_output.textures_delta,
                pixels_per_point: full_output.pixels_per_point,
            }),
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let config = AppConfig::new();

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
    #[allow(deprecated)]
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window, config))?;
    tracing::info!("starting native event loop");

    #[allow(deprecated)]
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => app.redraw(),
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
