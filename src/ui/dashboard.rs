//! Role dashboards: stats, navigation cards, quick actions, and activity log.

use eframe::egui::{self, Color32, CornerRadius, Margin, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{CALENDAR_CHECK, CREDIT_CARD, FILE_TEXT, GEAR, IDENTIFICATION_CARD, IMAGE, STETHOSCOPE, USERS};

use super::app::{App, LogLevel, Profile};
use super::forms::{PatientForm, ScanRequestForm, StaffForm};
use crate::models::ScanStatus;
use crate::models::billing::outstanding_total;
use crate::routing::{Panel, Role};

/// Icon shown on a panel's navigation card.
pub fn panel_icon(panel: Panel) -> &'static str {
    match panel {
        Panel::Dashboard | Panel::Settings => GEAR,
        Panel::Profile => IDENTIFICATION_CARD,
        Panel::PatientRecords => USERS,
        Panel::ImageReview => IMAGE,
        Panel::Reports => FILE_TEXT,
        Panel::Billing => CREDIT_CARD,
        Panel::ScanAppointments => CALENDAR_CHECK,
        Panel::Staff => STETHOSCOPE,
    }
}

/// Show the dashboard for `role`.
///
/// Returns `Some(panel)` if navigation is requested.
pub fn show(app: &mut App, ui: &mut Ui, role: Role) -> Option<Panel> {
    let mut next_panel = None;

    ui.vertical_centered(|ui| {
        ui.add_space(30.0);

        // Header
        let greeting = match &app.profile {
            Some(Profile::Patient(p)) => format!("Welcome, {}", p.first_name),
            Some(Profile::Staff(s)) => format!("Welcome, {}", s.display_name()),
            None => "Welcome".to_string(),
        };
        ui.label(RichText::new(greeting).size(32.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new(format!("{} Dashboard", role.label())).size(14.0).weak());

        ui.add_space(30.0);

        // Stat cards row
        let stats = role_stats(app, role);
        ui.horizontal(|ui| {
            let available = ui.available_width();
            let start_offset = ((available - 180.0 * stats.len() as f32) / 2.0).max(0.0);
            ui.add_space(start_offset);

            for (title, value, subtitle) in &stats {
                stat_card(ui, title, value, subtitle);
            }
        });

        ui.add_space(30.0);

        // Navigation cards row
        let panels = role.panels();
        let available = ui.available_width();
        let num_cards = panels.len() as f32;
        let spacing = 24.0;
        let total_spacing = spacing * (num_cards - 1.0);
        let card_width = ((available - total_spacing) / num_cards).clamp(140.0, 220.0);
        let card_height = card_width * 0.75;
        let card_size = egui::vec2(card_width, card_height);
        let total_width = card_width * num_cards + total_spacing;
        let start_offset = ((available - total_width) / 2.0).max(0.0);

        ui.horizontal(|ui| {
            ui.add_space(start_offset);

            for (idx, panel) in panels.iter().enumerate() {
                if idx > 0 {
                    ui.add_space(spacing);
                }
                if super::components::dashboard_card(ui, panel.name(), panel.description(), panel_icon(*panel), card_size)
                    .clicked()
                {
                    next_panel = Some(*panel);
                }
            }
        });

        ui.add_space(30.0);
    });

    // Two-column layout: Quick Actions | Recent Activity
    let available_width = ui.available_width();
    let column_width = (available_width - 40.0) / 2.0;

    ui.horizontal(|ui| {
        ui.add_space(10.0);

        // Left column - Quick Actions
        ui.vertical(|ui| {
            ui.set_width(column_width);

            egui::Frame::new()
                .fill(ui.style().visuals.extreme_bg_color)
                .inner_margin(Margin::same(15))
                .corner_radius(CornerRadius::same(8))
                .show(ui, |ui| {
                    ui.set_min_width(column_width - 30.0);

                    ui.label(RichText::new("Quick Actions").strong());
                    ui.add_space(10.0);

                    if let Some(panel) = quick_actions(app, ui, role) {
                        next_panel = Some(panel);
                    }

                    ui.add_space(5.0);

                    if ui.button("Refresh").clicked() {
                        app.load_dashboard_data();
                    }
                });
        });

        ui.add_space(20.0);

        // Right column - Recent Activity
        ui.vertical(|ui| {
            ui.set_width(column_width);

            egui::Frame::new()
                .fill(ui.style().visuals.extreme_bg_color)
                .inner_margin(Margin::same(15))
                .corner_radius(CornerRadius::same(8))
                .show(ui, |ui| {
                    ui.set_min_width(column_width - 30.0);

                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Recent Activity").strong());
                        if !app.log_messages.is_empty() && ui.small_button("Clear").clicked() {
                            app.clear_log();
                        }
                    });
                    ui.add_space(10.0);

                    ScrollArea::vertical().max_height(150.0).show(ui, |ui| {
                        if app.log_messages.is_empty() {
                            ui.label(RichText::new("No recent activity").weak());
                        } else {
                            for entry in app.log_messages.iter().rev().take(10) {
                                let color = match entry.level {
                                    LogLevel::Info => Color32::GRAY,
                                    LogLevel::Success => Color32::from_rgb(100, 200, 100),
                                    LogLevel::Warning => Color32::from_rgb(230, 180, 50),
                                    LogLevel::Error => Color32::from_rgb(230, 100, 100),
                                };

                                ui.horizontal(|ui| {
                                    ui.label(
                                        RichText::new(entry.timestamp.format("%H:%M:%S").to_string())
                                            .small()
                                            .color(Color32::DARK_GRAY),
                                    );
                                    ui.label(RichText::new(&entry.message).color(color));
                                });
                            }
                        }
                    });
                });
        });
    });

    next_panel
}

/// Stat cards for each role: (title, value, subtitle).
fn role_stats(app: &App, role: Role) -> Vec<(String, String, String)> {
    let open = app.appointments.iter().filter(|a| !a.status.is_terminal()).count();

    match role {
        Role::Patient => {
            let outstanding = app
                .statement
                .as_ref()
                .map(|s| outstanding_total(&s.charges))
                .unwrap_or(0.0);
            vec![
                stat("Upcoming Scans", open, "Requested or scheduled"),
                (
                    "Outstanding".to_string(),
                    format!("{outstanding:.2}"),
                    "Unpaid charges".to_string(),
                ),
            ]
        }
        Role::Doctor => {
            let completed = app
                .appointments
                .iter()
                .filter(|a| a.status == ScanStatus::Completed)
                .count();
            vec![
                stat("Patients", app.patients.len(), "Registered patients"),
                stat("Open Requests", open, "Scans awaiting results"),
                stat("Completed", completed, "Scans with results"),
            ]
        }
        Role::Radiologist => vec![
            stat("My Worklist", open, "Assigned, not finished"),
            stat("Unassigned", app.unassigned.len(), "Requests to pick up"),
            stat("Images", app.images.len(), "Stored images"),
        ],
        Role::Admin => vec![
            stat("Patients", app.patients.len(), "Registered patients"),
            stat("Staff", app.staff.len(), "Doctors, radiologists, admins"),
            stat("Open Scans", open, "Across all departments"),
        ],
    }
}

fn stat(title: &str, value: usize, subtitle: &str) -> (String, String, String) {
    (title.to_string(), value.to_string(), subtitle.to_string())
}

fn quick_actions(app: &mut App, ui: &mut Ui, role: Role) -> Option<Panel> {
    let mut next_panel = None;

    match role {
        Role::Patient => {
            if ui.button("View My Statement").clicked() {
                next_panel = Some(Panel::Billing);
            }
            ui.add_space(5.0);
            if ui.button("My Reports").clicked() {
                next_panel = Some(Panel::Reports);
            }
        }
        Role::Doctor => {
            if ui.button("Request Scan").clicked() {
                app.scan_form = ScanRequestForm::for_patient(None);
                next_panel = Some(Panel::ScanAppointments);
            }
            ui.add_space(5.0);
            if ui.button("Find Patient").clicked() {
                next_panel = Some(Panel::PatientRecords);
            }
        }
        Role::Radiologist => {
            if ui.button("Review Scan Requests").clicked() {
                next_panel = Some(Panel::ScanAppointments);
            }
            ui.add_space(5.0);
            if ui.button("Upload Image").clicked() {
                app.upload_form = super::forms::UploadForm::open_new();
                next_panel = Some(Panel::ImageReview);
            }
        }
        Role::Admin => {
            if ui.button("Add Patient").clicked() {
                app.patient_form = PatientForm::open_new();
                next_panel = Some(Panel::PatientRecords);
            }
            ui.add_space(5.0);
            if ui.button("Add Staff Member").clicked() {
                app.staff_form = StaffForm::open_new();
                next_panel = Some(Panel::Staff);
            }
        }
    }

    next_panel
}

/// Render a stat card with title, value, and subtitle.
fn stat_card(ui: &mut Ui, title: &str, value: &str, subtitle: &str) {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .outer_margin(Margin::same(5))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(150.0);

            ui.vertical(|ui| {
                ui.label(RichText::new(title).small());
                ui.label(RichText::new(value).heading().strong());
                ui.label(RichText::new(subtitle).small().weak());
            });
        });
}
