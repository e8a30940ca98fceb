use eframe::egui::{self, Align, Color32, Layout, RichText};

/// Actions that can be triggered from the screen UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAction {
    None,
    /// Flip between the two supported refresh rates.
    ToggleRefreshRate,
    /// Brightness slider released on a new percentage.
    SetBrightness(u8),
}

/// Renders the screen section: refresh-rate toggle plus brightness.
///
/// `pending` is true between a refresh request and its confirmation re-read,
/// during which the shown rate is the *requested* one.
pub fn render_display_section(
    ui: &mut egui::Ui,
    refresh_hz: u32,
    pending: bool,
    brightness_pct: &mut u8,
) -> DisplayAction {
    let mut action = DisplayAction::None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.add(egui::Label::new("🖥 Screen").selectable(false));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if pending {
                    ui.spinner();
                }
                ui.add(
                    egui::Label::new(
                        RichText::new(format!("{refresh_hz}Hz")).color(Color32::LIGHT_GRAY),
                    )
                    .selectable(false),
                );
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            // The button advertises the rate it will switch to.
            let target_label = if refresh_hz > 100 { "60Hz" } else { "144Hz" };
            if ui.add_enabled(!pending, egui::Button::new(target_label)).clicked() {
                action = DisplayAction::ToggleRefreshRate;
            }

            ui.add(egui::Label::new(format!("Brightness: {brightness_pct}%")).selectable(false));
            let slider = ui.add(egui::Slider::new(brightness_pct, 0..=100).suffix("%"));
            if slider.drag_stopped() || slider.lost_focus() {
                action = DisplayAction::SetBrightness(*brightness_pct);
            }
        });
    });

    action
}
