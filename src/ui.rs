use egui::Context;

use crate::controller::{Action, InputState, SceneController};

/// Per-frame numbers shown in the control panel that the scene doesn't own
#[derive(Debug, Clone, Copy)]
pub struct HudStats {
    pub dt: f32,
    pub texture_state: &'static str,
}

/// How a bound key is printed on its button
pub fn key_display(key: &str) -> &str {
    match key {
        " " => "space",
        other => other,
    }
}

/// Raw egui input for a canvas of the given size, with pointer events
/// collected by the browser listeners since the last frame.
pub fn canvas_raw_input(events: Vec<egui::Event>, width: u32, height: u32, now_ms: f64) -> egui::RawInput {
    egui::RawInput {
        time: Some(now_ms / 1000.0),
        screen_rect: Some(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(width as f32, height as f32),
        )),
        events,
        ..Default::default()
    }
}

/// Build the complete UI and return egui output
pub fn build_ui(
    egui_ctx: &Context,
    raw_input: egui::RawInput,
    controller: &SceneController,
    input: &mut InputState,
    stats: HudStats,
) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_controls_window(ctx, controller, input, stats);
    })
}

fn draw_controls_window(ctx: &Context, controller: &SceneController, input: &mut InputState, stats: HudStats) {
    let avatar = &controller.scene.avatar;

    egui::Window::new("Controls")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for action in [Action::Forward, Action::Left, Action::Back, Action::Right] {
                    hold_button(ui, input, action);
                }
            });
            hold_button(ui, input, Action::Jump);

            ui.separator();
            ui.label(
                egui::RichText::new(format!("FPS: {:.0}", if stats.dt > 0.0 { 1.0 / stats.dt } else { 0.0 }))
                    .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Pos: x: {:.2} y: {:.2} z: {:.2}",
                    avatar.position.x, avatar.position.y, avatar.position.z
                ))
                .small(),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Thrust: x: {:.1} y: {:.2} z: {:.1}",
                    avatar.thrust.x, avatar.thrust.y, avatar.thrust.z
                ))
                .small(),
            );
            ui.label(egui::RichText::new(format!("Grounded: {}", avatar.grounded)).small());
            ui.label(egui::RichText::new(format!("Texture: {}", stats.texture_state)).small());
        });
}

/// A button that counts as held for as long as the pointer is pressed on it
fn hold_button(ui: &mut egui::Ui, input: &mut InputState, action: Action) {
    let key = key_display(input.bindings().key_for(action)).to_string();
    let response = ui.button(format!("{} ({key})", action.label()));
    input.set_button_held(action, response.is_pointer_button_down_on());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scene;

    #[test]
    fn test_key_display() {
        assert_eq!(key_display(" "), "space");
        assert_eq!(key_display("w"), "w");
    }

    #[test]
    fn test_panel_without_pointer_holds_nothing() {
        let ctx = Context::default();
        let controller = SceneController::new(Scene::default(), 800, 600);
        let mut input = InputState::new();
        let stats = HudStats { dt: 1.0 / 60.0, texture_state: "loading" };

        for frame in 0..3 {
            let raw = canvas_raw_input(Vec::new(), 800, 600, frame as f64 * 16.0);
            build_ui(&ctx, raw, &controller, &mut input, stats);
        }
        assert!(Action::ALL.iter().all(|a| !input.is_action_down(*a)));
        assert!(input.drain_events().is_empty());
    }

    #[test]
    fn test_canvas_raw_input_covers_canvas() {
        let raw = canvas_raw_input(vec![egui::Event::PointerGone], 640, 480, 2000.0);
        assert_eq!(raw.time, Some(2.0));
        assert_eq!(raw.screen_rect.map(|r| r.size()), Some(egui::vec2(640.0, 480.0)));
        assert_eq!(raw.events.len(), 1);
    }
}
