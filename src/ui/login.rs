//! Login screen shown whenever no session is stored.

use eframe::egui::{self, Key, RichText, Ui};
use egui_phosphor::regular::FIRST_AID;

use super::app::App;
use super::components::{colors, primary_button_with_icon};

pub fn show(app: &mut App, ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);

        ui.label(RichText::new(FIRST_AID).size(48.0).color(colors::ACCENT));
        ui.label(RichText::new("Healthcare Portal").size(32.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new("Sign in to continue").size(14.0).weak());
        ui.add_space(30.0);

        egui::Frame::new()
            .fill(ui.style().visuals.extreme_bg_color)
            .inner_margin(egui::Margin::same(20))
            .corner_radius(egui::CornerRadius::same(8))
            .show(ui, |ui| {
                ui.set_max_width(340.0);

                let busy = app.login_form.in_progress;
                let mut submit = false;

                egui::Grid::new("login_grid")
                    .num_columns(2)
                    .spacing([12.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Username:");
                        ui.add_enabled(
                            !busy,
                            egui::TextEdit::singleline(&mut app.login_form.username).desired_width(220.0),
                        );
                        ui.end_row();

                        ui.label("Password:");
                        let response = ui.add_enabled(
                            !busy,
                            egui::TextEdit::singleline(&mut app.login_form.password)
                                .password(true)
                                .desired_width(220.0),
                        );
                        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                            submit = true;
                        }
                        ui.end_row();
                    });

                if let Some(error) = &app.login_form.error {
                    ui.add_space(8.0);
                    ui.colored_label(colors::ERROR, error);
                }

                ui.add_space(15.0);
                ui.add_enabled_ui(!busy, |ui| {
                    if primary_button_with_icon(ui, "", "Sign In").clicked() {
                        submit = true;
                    }
                });

                if submit && !busy {
                    app.login();
                }
            });

        ui.add_space(15.0);
        ui.label(RichText::new(app.api.base_url()).small().weak());
    });
}
