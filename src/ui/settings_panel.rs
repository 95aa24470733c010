//! Settings panel for backend connection, display, and session options.

use eframe::egui::{self, RichText};

use super::app::App;
use super::components::{back_button, colors, panel_header};

/// Show the settings panel.
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut egui::Ui) -> bool {
    let go_back = back_button(ui);
    panel_header(ui, "Settings");

    egui::ScrollArea::vertical().show(ui, |ui| {
        // Backend connection
        ui.group(|ui| {
            ui.heading("Backend Connection");
            ui.add_space(5.0);

            egui::Grid::new("api_settings_grid")
                .num_columns(2)
                .spacing([10.0, 8.0])
                .show(ui, |ui| {
                    ui.label("API base URL:");
                    if ui
                        .add(egui::TextEdit::singleline(&mut app.config.api.base_url).desired_width(320.0))
                        .changed()
                    {
                        app.config_modified = true;
                        app.connection_test = None; // Reset status on change
                    }
                    ui.end_row();

                    ui.label("Timeout (seconds):");
                    let mut timeout_str = app.config.api.timeout_secs.to_string();
                    if ui.text_edit_singleline(&mut timeout_str).changed()
                        && let Ok(timeout) = timeout_str.parse()
                    {
                        app.config.api.timeout_secs = timeout;
                        app.config_modified = true;
                    }
                    ui.end_row();
                });

            ui.add_space(5.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!app.connection_testing, egui::Button::new("Test Connection"))
                    .clicked()
                {
                    app.test_connection();
                }

                // Inline status indicator
                if app.connection_testing {
                    ui.spinner();
                }
                match &app.connection_test {
                    Some(Ok(())) => {
                        ui.label(RichText::new("Reachable").color(colors::SUCCESS));
                    }
                    Some(Err(e)) => {
                        ui.label(RichText::new("Unreachable").color(colors::ERROR)).on_hover_text(e);
                    }
                    None => {}
                }
            });

            if let Some(url) = &app.config.api.env_base_url {
                ui.add_space(5.0);
                ui.label(
                    RichText::new(format!(
                        "Connected to {url} from {} for this run; the saved URL is used once it is unset",
                        crate::config::API_URL_ENV
                    ))
                    .small()
                    .color(colors::WARNING),
                );
            }
        });

        ui.add_space(15.0);

        // Display
        ui.group(|ui| {
            ui.heading("Display");
            ui.add_space(5.0);

            egui::Grid::new("ui_settings_grid")
                .num_columns(2)
                .spacing([10.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Notification duration (ms):");
                    let mut duration_str = app.config.ui.toast_duration_ms.to_string();
                    if ui.text_edit_singleline(&mut duration_str).changed()
                        && let Ok(ms) = duration_str.parse()
                    {
                        app.config.ui.toast_duration_ms = ms;
                        app.config_modified = true;
                    }
                    ui.end_row();
                });

            if ui.checkbox(&mut app.config.ui.dark_mode, "Dark mode").changed() {
                app.config_modified = true;
                ui.ctx().set_visuals(if app.config.ui.dark_mode {
                    egui::Visuals::dark()
                } else {
                    egui::Visuals::light()
                });
            }
        });

        ui.add_space(15.0);

        // Session
        ui.group(|ui| {
            ui.heading("Session");
            ui.add_space(5.0);

            if ui
                .checkbox(&mut app.config.session.remember_login, "Stay signed in between launches")
                .changed()
            {
                app.config_modified = true;
            }
            ui.label(RichText::new("Takes effect the next time the portal starts").small().weak());
        });

        ui.add_space(15.0);

        ui.label(RichText::new(format!("Config file: {}", app.config_path.display())).small().weak());

        ui.add_space(20.0);

        // Action buttons
        ui.horizontal(|ui| {
            let save_btn = egui::Button::new("Save Settings");
            if ui.add_enabled(app.config_modified, save_btn).clicked() {
                app.save_config();
            }

            if app.config_modified {
                ui.label(RichText::new("(unsaved changes)").color(colors::WARNING).italics());
            }

            if ui.button("Reset to Defaults").clicked() {
                app.config.reset_to_defaults();
                app.config_modified = true;
                app.connection_test = None;
            }
        });
    });

    go_back
}
