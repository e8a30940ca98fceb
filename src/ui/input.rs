use eframe::egui::{self, Color32, RichText};
use liblegion::state::{MAX_SENSITIVITY, MIN_SENSITIVITY};
use liblegion::types::InputMode;
use strum::IntoEnumIterator;

const ACTIVE_COLOR: Color32 = Color32::from_rgb(0, 140, 80);

/// Actions that can be triggered from the input-mode UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    SetMode(InputMode),
    SetSensitivity(u32),
}

/// Renders the controller/touchpad mouse section.
pub fn render_input_section(
    ui: &mut egui::Ui,
    current: InputMode,
    sensitivity: &mut u32,
) -> InputAction {
    let mut action = InputAction::None;

    ui.group(|ui| {
        ui.add(egui::Label::new("🖱 Controller Mouse").selectable(false));
        ui.separator();

        ui.horizontal(|ui| {
            for mode in InputMode::iter() {
                let selected = current == mode;
                let button = egui::Button::new(RichText::new(mode.to_string()).color(Color32::WHITE))
                    .fill(if selected { ACTIVE_COLOR } else { Color32::TRANSPARENT })
                    .stroke(egui::Stroke::new(1.0, ACTIVE_COLOR));
                if ui.add(button).clicked() && !selected {
                    action = InputAction::SetMode(mode);
                }
            }
        });

        ui.horizontal(|ui| {
            let enabled = current != InputMode::Disabled;
            // The label mirrors the original popup: slider units read as 2% steps.
            ui.add_enabled(
                enabled,
                egui::Label::new(format!("Sensitivity: {}%", *sensitivity * 2)).selectable(false),
            );
            let slider = ui.add_enabled(
                enabled,
                egui::Slider::new(sensitivity, MIN_SENSITIVITY..=MAX_SENSITIVITY),
            );
            if slider.changed() {
                action = InputAction::SetSensitivity(*sensitivity);
            }
        });
    });

    action
}
