// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use {
    std::cell::RefCell,
    std::rc::Rc,
    wasm_bindgen::closure::Closure,
    wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue},
    web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window},
};

#[cfg(target_arch = "wasm32")]
use {
    config::AppConfig,
    controller::{InputEvent, InputState, SceneController},
    model::{Materials, PlatformGrid, Scene},
    view::{EguiFrame, GpuContext, SceneRenderer},
};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let config = AppConfig::new();
    let (window, document, canvas) = init_canvas(config.width, config.height)?;
    setup_app(window, document, canvas, config).await
}

/// Everything the animation frame callback touches
#[cfg(target_arch = "wasm32")]
struct WebApp {
    gpu: GpuContext,
    renderer: SceneRenderer,
    controller: SceneController,
    input: Rc<RefCell<InputState>>,
    egui_ctx: egui::Context,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
    window: Window,
    config: AppConfig,
    last_time: f64,
}

#[cfg(target_arch = "wasm32")]
impl WebApp {
    fn frame(&mut self) {
        let now = self.window.performance().map(|p| p.now()).unwrap_or(self.last_time);
        let dt = self.config.clamp_dt(((now - self.last_time) / 1000.0) as f32);
        self.last_time = now;

        let output = self.controller.update(&mut self.input.borrow_mut(), dt);
        self.renderer.poll_textures(&self.gpu);

        let events = std::mem::take(&mut *self.egui_events.borrow_mut());
        let raw_input = ui::canvas_raw_input(events, self.gpu.config.width, self.gpu.config.height, now);
        let stats = ui::HudStats {
            dt,
            texture_state: self.renderer.texture_state(&self.config.platform_texture),
        };
        let full_output = ui::build_ui(
            &self.egui_ctx,
            raw_input,
            &self.controller,
            &mut self.input.borrow_mut(),
            stats,
        );
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

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    config: AppConfig,
) -> Result<(), JsValue> {
    let gpu = GpuContext::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), config.width, config.height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

    let scene = Scene::new(PlatformGrid::default(), Materials::new(&config.platform_texture));
    let renderer = SceneRenderer::new(&gpu, &scene.materials);
    let controller = SceneController::new(scene, gpu.config.width, gpu.config.height);

    let input = Rc::new(RefCell::new(InputState::new()));
    let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));

    setup_input_listeners(&document, &window, &canvas, input.clone(), egui_events.clone())?;

    let last_time = window.performance().map(|p| p.now()).unwrap_or(0.0);
    let mut app = WebApp {
        gpu,
        renderer,
        controller,
        input,
        egui_ctx: egui::Context::default(),
        egui_events,
        window: window.clone(),
        config,
        last_time,
    };

    RcCellCallback::new(window, move || app.frame()).start()
}

#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    input: Rc<RefCell<InputState>>,
    egui_events: Rc<RefCell<Vec<egui::Event>>>,
) -> Result<(), JsValue> {
    use controller::input::wasm::keyboard_event_to_input;

    // Keyboard down/up
    for (kind, is_down) in [("keydown", true), ("keyup", false)] {
        let input = input.clone();
        let listener = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let mut state = input.borrow_mut();
            if state.bindings().action_for(&e.key()).is_some() {
                e.prevent_default();
            }
            state.process_event(&keyboard_event_to_input(&e, is_down));
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
        listener.forget();
    }

    // Focus loss - release everything
    {
        let input = input.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input.borrow_mut().process_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - release everything
    {
        let input = input.clone();
        let doc = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let visible = !doc.hidden();
            input.borrow_mut().process_event(&InputEvent::VisibilityChanged { visible });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Mouse move - egui pointer
    {
        let egui_events = egui_events.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Mouse down/up - egui buttons, including the hold-to-move controls
    for (kind, pressed) in [("mousedown", true), ("mouseup", false)] {
        let egui_events = egui_events.clone();
        let listener = Closure::wrap(Box::new(move |e: MouseEvent| {
            if e.button() != 0 {
                return;
            }
            let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
            egui_events.borrow_mut().push(egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                modifiers: egui::Modifiers::default(),
            });
            e.prevent_default();
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
        listener.forget();
    }

    // Leaving the canvas lets go of any held button
    {
        let egui_events = egui_events.clone();
        let leave = Closure::wrap(Box::new(move |_e: MouseEvent| {
            egui_events.borrow_mut().push(egui::Event::PointerGone);
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("mouseleave", leave.as_ref().unchecked_ref())?;
        leave.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas(width: u32, height: u32) -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas_el.set_width(width);
    canvas_el.set_height(height);
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

/// requestAnimationFrame loop around a boxed frame closure
#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(error = ?e, "requestAnimationFrame failed, stopping frame loop");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
        Ok(())
    }
}
