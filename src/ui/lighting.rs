use eframe::egui::{self, Color32, RichText};
use liblegion::types::{LedMode, Rgb};
use strum::IntoEnumIterator;

const MODE_COLOR: Color32 = Color32::from_rgb(180, 120, 0);

/// Actions requested from the lighting UI. More than one can be set in a
/// frame (e.g. a color drag plus a slider release).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightingAction {
    pub mode: Option<LedMode>,
    pub color: Option<Rgb>,
    pub brightness: Option<u8>,
}

/// Renders the LED section: effect buttons, color picker, brightness.
pub fn render_lighting_section(
    ui: &mut egui::Ui,
    current_mode: LedMode,
    color: &mut [u8; 3],
    brightness_pct: &mut u8,
) -> LightingAction {
    let mut action = LightingAction::default();

    ui.group(|ui| {
        ui.add(egui::Label::new("💡 Lighting").selectable(false));
        ui.separator();

        ui.horizontal(|ui| {
            for mode in LedMode::iter() {
                let selected = current_mode == mode;
                let button = egui::Button::new(RichText::new(mode.to_string()).color(Color32::WHITE))
                    .fill(if selected { MODE_COLOR } else { Color32::TRANSPARENT })
                    .stroke(egui::Stroke::new(1.0, MODE_COLOR));
                if ui.add(button).clicked() && !selected {
                    action.mode = Some(mode);
                }
            }
        });

        ui.horizontal(|ui| {
            ui.add(egui::Label::new("Color:").selectable(false));
            if ui.color_edit_button_srgb(color).changed() {
                action.color = Some(Rgb::new(color[0], color[1], color[2]));
            }

            ui.add(egui::Label::new(format!("Brightness: {brightness_pct}%")).selectable(false));
            let slider = ui.add(egui::Slider::new(brightness_pct, 0..=100).suffix("%"));
            if slider.drag_stopped() || slider.lost_focus() {
                action.brightness = Some(*brightness_pct);
            }
        });
    });

    action
}
