use eframe::egui::{self, Align, Color32, Layout, RichText};

/// Actions that can be triggered from the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterAction {
    None,
    ToggleMute,
    ToggleAutostart,
    DisableGameBar,
    Quit,
}

/// Renders the footer: battery status, app toggles, version.
pub fn render_footer(
    ui: &mut egui::Ui,
    battery: &str,
    muted: bool,
    autostart: bool,
) -> FooterAction {
    let mut action = FooterAction::None;

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.add(egui::Label::new(battery).selectable(false));
        ui.separator();

        let mut muted_flag = muted;
        if ui.checkbox(&mut muted_flag, "Mute sounds").clicked() {
            action = FooterAction::ToggleMute;
        }
        let mut autostart_flag = autostart;
        if ui.checkbox(&mut autostart_flag, "Start with Windows").clicked() {
            action = FooterAction::ToggleAutostart;
        }
        if ui.button("Disable Game Bar").on_hover_text("Stops Game Bar from capturing the popup").clicked() {
            action = FooterAction::DisableGameBar;
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("Exit").clicked() {
                action = FooterAction::Quit;
            }
            ui.add(
                egui::Label::new(
                    RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                        .color(Color32::GRAY),
                )
                .selectable(false),
            );
        });
    });
    ui.add_space(6.0);

    action
}
