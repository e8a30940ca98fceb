use eframe::egui::{self, Align, Color32, Layout, RichText};

use crate::messaging::{MessageCenter, StatusKind};

/// Renders the header: device name left, CPU temperature and the status
/// line right.
pub fn render_header(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    device_model: &str,
    cpu_temp: &str,
    messages: &MessageCenter,
) {
    ui.horizontal(|ui| {
        ui.add(
            egui::Label::new(RichText::new(format!("🎮 {device_model}")).heading())
                .selectable(false),
        );

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            ui.add(
                egui::Label::new(RichText::new(cpu_temp).color(Color32::LIGHT_GRAY))
                    .selectable(false),
            );
            render_status_line(ui, ctx, messages);
        });
    });
}

fn render_status_line(ui: &mut egui::Ui, ctx: &egui::Context, messages: &MessageCenter) {
    let Some(line) = messages.current() else {
        return;
    };
    let (color, icon) = match line.kind {
        StatusKind::Info => (Color32::LIGHT_BLUE, "ℹ"),
        StatusKind::Error => (Color32::RED, "⚠"),
    };
    let opacity = line.opacity();
    let faded = Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (255.0 * opacity) as u8,
    );
    ui.add(
        egui::Label::new(RichText::new(format!("{icon} {}", line.text)).color(faded))
            .selectable(false),
    );
    if opacity < 1.0 {
        ctx.request_repaint();
    }
}
