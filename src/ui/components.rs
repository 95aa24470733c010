//! Shared UI components.

use eframe::egui::{self, Color32, Response, RichText, Sense, StrokeKind, Ui};

/// Render a clickable dashboard card with dynamic size.
///
/// Returns the response which can be checked for `.clicked()`.
pub fn dashboard_card(ui: &mut Ui, title: &str, description: &str, icon: &str, size: egui::Vec2) -> Response {
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());

    if ui.is_rect_visible(rect) {
        let visuals = ui.style().interact(&response);

        // Scale factor based on width (200 is the reference size)
        let scale = size.x / 200.0;

        ui.painter().rect_filled(rect, 8.0, visuals.bg_fill);
        ui.painter()
            .rect_stroke(rect, 8.0, visuals.bg_stroke, StrokeKind::Outside);

        let icon_pos = egui::pos2(rect.center().x, rect.top() + size.y * 0.25);
        ui.painter().text(
            icon_pos,
            egui::Align2::CENTER_CENTER,
            icon,
            egui::FontId::proportional(34.0 * scale),
            colors::ACCENT,
        );

        let title_pos = egui::pos2(rect.center().x, rect.center().y + size.y * 0.07);
        ui.painter().text(
            title_pos,
            egui::Align2::CENTER_CENTER,
            title,
            egui::FontId::proportional(17.0 * scale),
            visuals.text_color(),
        );

        let desc_pos = egui::pos2(rect.center().x, rect.bottom() - size.y * 0.17);
        ui.painter().text(
            desc_pos,
            egui::Align2::CENTER_CENTER,
            description,
            egui::FontId::proportional(12.0 * scale),
            ui.visuals().weak_text_color(),
        );
    }

    response
}

/// Status indicator colors.
pub mod colors {
    use super::Color32;

    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    pub const ERROR: Color32 = Color32::from_rgb(255, 100, 100);
    pub const WARNING: Color32 = Color32::from_rgb(255, 200, 100);
    pub const NEUTRAL: Color32 = Color32::from_rgb(150, 150, 150);
    pub const INFO: Color32 = Color32::from_rgb(100, 150, 230);
    pub const ACCENT: Color32 = Color32::from_rgb(46, 125, 107);
}

/// Render a back button that returns true when clicked.
pub fn back_button(ui: &mut Ui) -> bool {
    ui.button(RichText::new("< Back to Dashboard").size(14.0)).clicked()
}

/// Render a panel header with title.
pub fn panel_header(ui: &mut Ui, title: &str) {
    ui.heading(RichText::new(title).size(24.0));
    ui.add_space(10.0);
    ui.separator();
    ui.add_space(20.0);
}

/// Plain toolbar button.
pub fn styled_button(ui: &mut Ui, label: &str) -> Response {
    ui.add(egui::Button::new(RichText::new(label).size(14.0)).min_size(egui::vec2(80.0, 28.0)))
}

/// Toolbar button with a leading icon.
pub fn styled_button_with_icon(ui: &mut Ui, icon: &str, label: &str) -> Response {
    ui.add(egui::Button::new(RichText::new(format!("{icon} {label}")).size(14.0)).min_size(egui::vec2(80.0, 28.0)))
}

/// Highlighted button for the main action of a panel or form.
pub fn primary_button_with_icon(ui: &mut Ui, icon: &str, label: &str) -> Response {
    let text = if icon.is_empty() {
        label.to_string()
    } else {
        format!("{icon} {label}")
    };
    ui.add(
        egui::Button::new(RichText::new(text).size(14.0).color(Color32::WHITE))
            .fill(colors::ACCENT)
            .min_size(egui::vec2(90.0, 28.0)),
    )
}

/// Small icon button used in table rows.
pub fn action_button(ui: &mut Ui, icon: &str, tooltip: &str) -> Response {
    ui.add(egui::Button::new(RichText::new(icon).size(15.0)).frame(false))
        .on_hover_text(tooltip)
}

/// Table-row icon button for destructive actions.
pub fn danger_action_button(ui: &mut Ui, icon: &str, tooltip: &str) -> Response {
    ui.add(egui::Button::new(RichText::new(icon).size(15.0).color(colors::ERROR)).frame(false))
        .on_hover_text(tooltip)
}

/// Colored pill showing a status label.
pub fn status_badge(ui: &mut Ui, label: &str, color: Color32) {
    egui::Frame::new()
        .fill(color.gamma_multiply(0.25))
        .corner_radius(egui::CornerRadius::same(10))
        .inner_margin(egui::Margin::symmetric(8, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(label).small().color(color));
        });
}

/// Centered spinner shown while data loads.
pub fn loading_spinner(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(30.0);
        ui.add(egui::Spinner::new().size(32.0));
        ui.add_space(8.0);
        ui.label(RichText::new(message).weak());
    });
}

/// Placeholder for empty lists.
pub fn empty_state(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(30.0);
        ui.label(RichText::new(message).size(16.0).weak());
    });
}

/// Framed section with a bold title, as used on dashboards and detail views.
pub fn section<R>(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(egui::Margin::same(15))
        .corner_radius(egui::CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(title).strong());
            ui.add_space(8.0);
            add_contents(ui)
        })
        .inner
}

/// Single-line text input inside a form grid row.
pub fn form_row(ui: &mut Ui, label: &str, value: &mut String, hint: &str) {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(value).desired_width(260.0).hint_text(hint));
    ui.end_row();
}

/// Button clicked in a dialog's bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    None,
    Cancel,
    Save,
}

/// Cancel / Save row at the bottom of a dialog.
pub fn dialog_buttons(ui: &mut Ui) -> DialogAction {
    ui.add_space(15.0);
    ui.separator();
    ui.add_space(10.0);

    let mut action = DialogAction::None;
    ui.horizontal(|ui| {
        if styled_button(ui, "Cancel").clicked() {
            action = DialogAction::Cancel;
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if primary_button_with_icon(ui, "", "Save").clicked() {
                action = DialogAction::Save;
            }
        });
    });
    action
}
