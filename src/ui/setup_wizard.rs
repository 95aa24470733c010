//! First-run setup wizard for configuration.

use crate::api;
use crate::config::AppConfig;
use eframe::egui::{self, Color32, RichText};
use std::sync::mpsc;

/// Connection test state.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionTestState {
    #[default]
    NotTested,
    Testing,
    Success,
    Failed(String),
}

/// Setup wizard state.
pub struct SetupWizard {
    /// Current step (0-3).
    pub current_step: usize,
    /// Configuration being built.
    pub config: AppConfig,
    /// Backend reachability test state.
    pub backend_test_state: ConnectionTestState,
    /// Wizard completed flag.
    pub completed: bool,
    /// Timeout input as string for text editing.
    timeout_input: String,
    /// Toast duration input as string.
    toast_input: String,
}

impl Default for SetupWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupWizard {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Start from an existing (possibly invalid) configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            current_step: 0,
            timeout_input: config.api.timeout_secs.to_string(),
            toast_input: config.ui.toast_duration_ms.to_string(),
            config,
            backend_test_state: ConnectionTestState::NotTested,
            completed: false,
        }
    }

    /// Check if user can proceed to next step.
    pub fn can_proceed(&self) -> bool {
        match self.current_step {
            0 => true, // Welcome - always can proceed
            1 => matches!(self.backend_test_state, ConnectionTestState::Success),
            2 => self.config.validate().is_ok(),
            3 => true, // Confirmation
            _ => false,
        }
    }

    /// Get step title.
    fn step_title(&self) -> &'static str {
        match self.current_step {
            0 => "Welcome",
            1 => "Backend Connection",
            2 => "Preferences",
            3 => "Confirmation",
            _ => "Setup",
        }
    }

    /// Total number of steps.
    const TOTAL_STEPS: usize = 4;
}

/// Setup wizard application.
pub struct SetupApp {
    pub wizard: SetupWizard,
    pub initial_error: Option<String>,
    pub rt: tokio::runtime::Runtime,
    backend_test_rx: Option<mpsc::Receiver<Result<(), String>>>,
}

impl SetupApp {
    pub fn new(wizard: SetupWizard, initial_error: Option<String>, rt: tokio::runtime::Runtime) -> Self {
        Self {
            wizard,
            initial_error,
            rt,
            backend_test_rx: None,
        }
    }

    /// Test backend reachability asynchronously.
    fn start_backend_test(&mut self) {
        let url = self.wizard.config.api.normalized_base_url();
        let (tx, rx) = mpsc::channel();
        self.backend_test_rx = Some(rx);
        self.wizard.backend_test_state = ConnectionTestState::Testing;

        self.rt.spawn(async move {
            let result = api::check_backend(&url).await.map_err(|e| e.user_message());
            let _ = tx.send(result);
        });
    }

    /// Check for async test results.
    fn poll_test_results(&mut self) {
        if let Some(rx) = &self.backend_test_rx
            && let Ok(result) = rx.try_recv()
        {
            self.wizard.backend_test_state = match result {
                Ok(()) => ConnectionTestState::Success,
                Err(e) => ConnectionTestState::Failed(e),
            };
            self.backend_test_rx = None;
        }
    }
}

impl eframe::App for SetupApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async test results
        self.poll_test_results();

        // Request repaint while testing
        if matches!(self.wizard.backend_test_state, ConnectionTestState::Testing) {
            ctx.request_repaint();
        }

        // Show initial error dialog
        if let Some(err) = self.initial_error.clone() {
            egui::Window::new("Configuration Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(Color32::from_rgb(255, 100, 100), &err);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.initial_error = None;
                    }
                });
            return;
        }

        // Main wizard panel
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);

                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Healthcare Portal Setup").size(24.0).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!(
                            "Step {} of {}",
                            self.wizard.current_step + 1,
                            SetupWizard::TOTAL_STEPS
                        ));
                    });
                });

                ui.separator();
                ui.add_space(10.0);

                // Step title
                ui.heading(self.wizard.step_title());
                ui.add_space(20.0);

                // Step content
                let needs_test = match self.wizard.current_step {
                    0 => {
                        show_welcome_step(ui);
                        false
                    }
                    1 => show_backend_step(ui, &mut self.wizard),
                    2 => {
                        show_preferences_step(ui, &mut self.wizard);
                        false
                    }
                    3 => {
                        show_confirmation_step(ui, &self.wizard);
                        false
                    }
                    _ => false,
                };

                if needs_test {
                    self.start_backend_test();
                }

                ui.add_space(30.0);
                ui.separator();

                // Navigation buttons
                ui.horizontal(|ui| {
                    if self.wizard.current_step > 0 && ui.button("< Back").clicked() {
                        self.wizard.current_step -= 1;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.wizard.current_step < SetupWizard::TOTAL_STEPS - 1 {
                            let btn_text = if self.wizard.current_step == 0 {
                                "Get Started >"
                            } else {
                                "Next >"
                            };
                            let enabled = self.wizard.can_proceed();
                            if ui.add_enabled(enabled, egui::Button::new(btn_text)).clicked() {
                                self.wizard.current_step += 1;
                            }
                        } else if ui.button("Save & Exit").clicked() {
                            self.wizard.completed = true;
                        }
                    });
                });
            });
        });

        // Handle completion
        if self.wizard.completed {
            let path = AppConfig::default_path();
            match self.wizard.config.save(&path) {
                Ok(()) => {
                    tracing::info!("Setup complete, config written to {:?}", path);
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                Err(e) => {
                    self.initial_error = Some(format!("Failed to save config: {}", e));
                    self.wizard.completed = false;
                }
            }
        }
    }
}

fn show_welcome_step(ui: &mut egui::Ui) {
    ui.label("Welcome to the Healthcare Portal!");
    ui.add_space(10.0);
    ui.label("This wizard will help you configure the application.");
    ui.add_space(20.0);
    ui.label("You will need:");
    ui.add_space(5.0);
    ui.label("  - The base URL of the hospital's REST API");
    ui.label("  - A portal account (patient, doctor, radiologist, or admin)");
}

fn show_backend_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) -> bool {
    let mut needs_test = false;

    egui::Grid::new("backend_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("API base URL:");
            if ui
                .add(egui::TextEdit::singleline(&mut wizard.config.api.base_url).desired_width(320.0))
                .changed()
            {
                wizard.backend_test_state = ConnectionTestState::NotTested;
            }
            ui.end_row();

            ui.label("Timeout (seconds):");
            if ui.text_edit_singleline(&mut wizard.timeout_input).changed()
                && let Ok(t) = wizard.timeout_input.parse()
            {
                wizard.config.api.timeout_secs = t;
            }
            ui.end_row();
        });

    ui.add_space(20.0);

    ui.horizontal(|ui| {
        let testing = matches!(wizard.backend_test_state, ConnectionTestState::Testing);
        if ui.add_enabled(!testing, egui::Button::new("Test Connection")).clicked() {
            needs_test = true;
        }

        ui.add_space(10.0);

        match &wizard.backend_test_state {
            ConnectionTestState::NotTested => {
                ui.label("Not tested");
            }
            ConnectionTestState::Testing => {
                ui.spinner();
                ui.label("Testing...");
            }
            ConnectionTestState::Success => {
                ui.colored_label(Color32::from_rgb(100, 200, 100), "Backend reachable!");
            }
            ConnectionTestState::Failed(e) => {
                ui.colored_label(Color32::from_rgb(255, 100, 100), format!("Failed: {}", e));
            }
        }
    });

    needs_test
}

fn show_preferences_step(ui: &mut egui::Ui, wizard: &mut SetupWizard) {
    ui.label("Display and session preferences.");
    ui.label(RichText::new("These can be changed later under Settings.").italics());
    ui.add_space(10.0);

    egui::Grid::new("prefs_grid")
        .num_columns(2)
        .spacing([20.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Notification duration (ms):");
            if ui.text_edit_singleline(&mut wizard.toast_input).changed()
                && let Ok(ms) = wizard.toast_input.parse()
            {
                wizard.config.ui.toast_duration_ms = ms;
            }
            ui.end_row();

            ui.label("Dark mode:");
            ui.checkbox(&mut wizard.config.ui.dark_mode, "Use dark theme");
            ui.end_row();

            ui.label("Session:");
            ui.checkbox(&mut wizard.config.session.remember_login, "Stay signed in between launches");
            ui.end_row();
        });

    // Validation feedback
    if let Err(e) = wizard.config.validate() {
        ui.add_space(10.0);
        ui.colored_label(Color32::from_rgb(255, 100, 100), e.to_string());
    }
}

fn show_confirmation_step(ui: &mut egui::Ui, wizard: &SetupWizard) {
    ui.label("Review your configuration:");
    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Backend");
        ui.label(format!("  {}", wizard.config.api.normalized_base_url()));
        ui.label(format!("  Timeout: {}s", wizard.config.api.timeout_secs));
    });

    ui.add_space(10.0);

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.heading("Preferences");
        ui.label(format!("  Notifications: {}ms", wizard.config.ui.toast_duration_ms));
        ui.label(format!(
            "  Theme: {}",
            if wizard.config.ui.dark_mode { "Dark" } else { "Light" }
        ));
        ui.label(format!(
            "  Stay signed in: {}",
            if wizard.config.session.remember_login { "Yes" } else { "No" }
        ));
    });

    ui.add_space(20.0);
    ui.label("Click 'Save & Exit' to save and close the wizard.");
    ui.label("You will need to restart the application after setup.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_step_requires_successful_test() {
        let mut wizard = SetupWizard::new();
        assert!(wizard.can_proceed());

        wizard.current_step = 1;
        assert!(!wizard.can_proceed());

        wizard.backend_test_state = ConnectionTestState::Failed("refused".to_string());
        assert!(!wizard.can_proceed());

        wizard.backend_test_state = ConnectionTestState::Success;
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_preferences_step_validates_config() {
        let mut wizard = SetupWizard::new();
        wizard.current_step = 2;
        assert!(wizard.can_proceed());

        wizard.config.ui.toast_duration_ms = 10;
        assert!(!wizard.can_proceed());
    }

    #[test]
    fn test_with_config_seeds_inputs() {
        let mut config = AppConfig::default();
        config.api.timeout_secs = 12;
        let wizard = SetupWizard::with_config(config);
        assert_eq!(wizard.timeout_input, "12");
        assert_eq!(wizard.step_title(), "Welcome");
    }
}
