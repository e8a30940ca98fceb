use eframe::egui::{self, Align, Color32, Layout, RichText};
use liblegion::types::{ThermalStatus, MAX_CUSTOM_WATTS, MIN_CUSTOM_WATTS};
use strum::IntoEnumIterator;

const QUIET_COLOR: Color32 = Color32::from_rgb(0, 102, 204);
const BALANCED_COLOR: Color32 = Color32::from_rgb(120, 120, 120);
const PERFORMANCE_COLOR: Color32 = Color32::from_rgb(178, 34, 34);
const CUSTOM_COLOR: Color32 = Color32::from_rgb(140, 0, 180);

/// Actions that can be triggered from the thermal UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalAction {
    None,
    /// One of the profile buttons was clicked.
    SetProfile(ThermalStatus),
    /// The TDP slider was released on a new wattage (Custom active).
    SetWatts(u32),
}

/// Renders the thermal section: profile buttons plus the custom TDP slider.
pub fn render_thermal_section(
    ui: &mut egui::Ui,
    current: ThermalStatus,
    custom_watts: &mut u32,
) -> ThermalAction {
    let mut action = ThermalAction::None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.add(egui::Label::new("🌡 Thermal Mode").selectable(false));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.add(
                    egui::Label::new(RichText::new(current.describe()).color(Color32::LIGHT_GRAY))
                        .selectable(false),
                );
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            for status in ThermalStatus::iter() {
                if status == ThermalStatus::Unknown {
                    continue;
                }
                let selected = current == status;
                let color = profile_color(status);
                let button = egui::Button::new(RichText::new(status.to_string()).color(Color32::WHITE))
                    .fill(if selected { color } else { Color32::TRANSPARENT })
                    .stroke(egui::Stroke::new(1.0, color));
                if ui.add(button).clicked() && !selected {
                    action = ThermalAction::SetProfile(status);
                }
            }
        });

        let custom_active = current == ThermalStatus::Custom;
        ui.horizontal(|ui| {
            ui.add_enabled(
                custom_active,
                egui::Label::new(format!("TDP: {custom_watts}W")).selectable(false),
            );
            let slider = ui.add_enabled(
                custom_active,
                egui::Slider::new(custom_watts, MIN_CUSTOM_WATTS..=MAX_CUSTOM_WATTS).suffix("W"),
            );
            if slider.drag_stopped() || slider.lost_focus() {
                action = ThermalAction::SetWatts(*custom_watts);
            }
        });
    });

    action
}

fn profile_color(status: ThermalStatus) -> Color32 {
    match status {
        ThermalStatus::Quiet => QUIET_COLOR,
        ThermalStatus::Balanced => BALANCED_COLOR,
        ThermalStatus::Performance => PERFORMANCE_COLOR,
        ThermalStatus::Custom | ThermalStatus::Unknown => CUSTOM_COLOR,
    }
}
