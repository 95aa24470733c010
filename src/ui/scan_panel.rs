//! Scan appointment workflow: requests, scheduling, and status changes.

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;
use egui_phosphor::regular::{ARROWS_CLOCKWISE, PLUS, TRASH};

use super::app::{App, DeleteTarget};
use super::components::{
    DialogAction, back_button, colors, danger_action_button, dialog_buttons, empty_state, panel_header,
    primary_button_with_icon, section, status_badge, styled_button_with_icon,
};
use super::forms::{SCAN_TYPES, ScanRequestForm};
use crate::models::staff::staff_name;
use crate::models::{Priority, ScanAppointment, ScanStatus};
use crate::routing::Role;

enum RowAction {
    Status(ScanAppointment, ScanStatus),
    Delete(i64, String),
}

pub fn status_color(status: ScanStatus) -> Color32 {
    match status {
        ScanStatus::Requested => colors::INFO,
        ScanStatus::Scheduled => colors::ACCENT,
        ScanStatus::InProgress => colors::WARNING,
        ScanStatus::Completed => colors::SUCCESS,
        ScanStatus::Cancelled => colors::NEUTRAL,
        ScanStatus::Rejected => colors::ERROR,
    }
}

fn priority_color(priority: Priority) -> Color32 {
    match priority {
        Priority::Urgent => colors::ERROR,
        Priority::High => colors::WARNING,
        Priority::Normal | Priority::Low => colors::NEUTRAL,
    }
}

/// Show the scan appointments panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui, role: Role) -> bool {
    let go_back = back_button(ui);

    let title = match role {
        Role::Patient => "My Scan Appointments",
        Role::Doctor => "Scans I Requested",
        Role::Radiologist => "Radiology Worklist",
        Role::Admin => "All Scan Appointments",
    };
    panel_header(ui, title);

    // Toolbar
    ui.horizontal(|ui| {
        if role == Role::Doctor && primary_button_with_icon(ui, PLUS, "Request Scan").clicked() {
            app.scan_form = ScanRequestForm::for_patient(None);
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_appointments();
        }

        ui.add_space(20.0);

        ui.label("Status:");
        egui::ComboBox::from_id_salt("appointment_status_filter")
            .width(140.0)
            .selected_text(app.appointment_status_filter.map(|s| s.label()).unwrap_or("All"))
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(app.appointment_status_filter.is_none(), "All")
                    .clicked()
                {
                    app.appointment_status_filter = None;
                }
                for status in ScanStatus::ALL {
                    if ui
                        .selectable_label(app.appointment_status_filter == Some(status), status.label())
                        .clicked()
                    {
                        app.appointment_status_filter = Some(status);
                    }
                }
            });
    });

    ui.add_space(15.0);

    let mut action = None;

    if role == Role::Radiologist {
        if let Some(a) = show_unassigned(app, ui) {
            action = Some(a);
        }
        ui.add_space(15.0);
    }

    if let Some(a) = show_table(app, ui, role) {
        action = Some(a);
    }

    match action {
        Some(RowAction::Status(appointment, status)) => app.change_scan_status(&appointment, status),
        Some(RowAction::Delete(id, label)) => {
            app.delete_target = Some(DeleteTarget::Appointment(id, label));
            app.show_delete_confirm = true;
        }
        None => {}
    }

    let ctx = ui.ctx().clone();
    if app.scan_form.is_open {
        show_request_dialog(app, &ctx);
    }
    if app.schedule_form.is_open {
        show_schedule_dialog(app, &ctx);
    }

    go_back
}

/// Requests no radiologist has picked up.
fn show_unassigned(app: &App, ui: &mut Ui) -> Option<RowAction> {
    let mut action = None;

    section(ui, &format!("Unassigned Requests ({})", app.unassigned.len()), |ui| {
        if app.unassigned.is_empty() {
            ui.label(RichText::new("Nothing waiting").weak());
            return;
        }

        egui::Grid::new("unassigned_grid")
            .num_columns(6)
            .striped(true)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.strong("Patient");
                ui.strong("Scan");
                ui.strong("Priority");
                ui.strong("Reason");
                ui.strong("Requested By");
                ui.strong("Actions");
                ui.end_row();

                for appt in &app.unassigned {
                    ui.label(app.patient_name(appt.patient_id));
                    ui.label(scan_label(appt));
                    ui.label(RichText::new(appt.priority.label()).color(priority_color(appt.priority)));
                    ui.label(appt.reason.as_deref().unwrap_or("-"));
                    ui.label(staff_name(&app.staff, appt.doctor_id));
                    ui.horizontal(|ui| {
                        for next in appt.status.next_statuses(Role::Radiologist) {
                            if status_button(ui, *next).clicked() {
                                action = Some(RowAction::Status(appt.clone(), *next));
                            }
                        }
                    });
                    ui.end_row();
                }
            });
    });

    action
}

fn show_table(app: &App, ui: &mut Ui, role: Role) -> Option<RowAction> {
    let mut action = None;

    let filtered: Vec<&ScanAppointment> = app
        .appointments
        .iter()
        .filter(|a| app.appointment_status_filter.is_none_or(|s| a.status == s))
        .collect();

    ui.label(format!(
        "Showing {} of {} appointments",
        filtered.len(),
        app.appointments.len()
    ));
    ui.add_space(10.0);

    if filtered.is_empty() {
        empty_state(ui, "No scan appointments");
        return None;
    }

    ScrollArea::vertical().id_salt("appointments_scroll").show(ui, |ui| {
        ui.add_space(4.0);
        egui::Grid::new("appointments_grid")
            .num_columns(9)
            .striped(true)
            .min_col_width(50.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                // Header
                ui.strong("#");
                ui.strong("Patient");
                ui.strong("Scan");
                ui.strong("Priority");
                ui.strong("Status");
                ui.strong("Scheduled");
                ui.strong("Doctor");
                ui.strong("Radiologist");
                ui.strong("Actions");
                ui.end_row();

                for appt in filtered {
                    ui.label(appt.id.to_string());
                    ui.label(app.patient_name(appt.patient_id));
                    ui.label(scan_label(appt)).on_hover_text(appt.reason.as_deref().unwrap_or(""));
                    ui.label(RichText::new(appt.priority.label()).color(priority_color(appt.priority)));
                    status_badge(ui, appt.status.label(), status_color(appt.status));
                    ui.label(
                        appt.scheduled_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or("-".to_string()),
                    );
                    ui.label(staff_name(&app.staff, appt.doctor_id));
                    ui.label(staff_name(&app.staff, appt.radiologist_id));

                    ui.horizontal(|ui| {
                        for next in appt.status.next_statuses(role) {
                            if status_button(ui, *next).clicked() {
                                action = Some(RowAction::Status(appt.clone(), *next));
                            }
                        }
                        if role == Role::Admin && appt.status.is_terminal() {
                            ui.add_space(4.0);
                            if danger_action_button(ui, TRASH, "Delete").clicked() {
                                action = Some(RowAction::Delete(appt.id, format!("#{} {}", appt.id, appt.scan_type)));
                            }
                        }
                    });

                    ui.end_row();
                }
            });
    });

    action
}

fn scan_label(appt: &ScanAppointment) -> String {
    match &appt.body_part {
        Some(part) => format!("{} ({part})", appt.scan_type),
        None => appt.scan_type.clone(),
    }
}

fn status_button(ui: &mut Ui, status: ScanStatus) -> egui::Response {
    let label = match status {
        ScanStatus::Scheduled => "Schedule",
        ScanStatus::InProgress => "Start",
        ScanStatus::Completed => "Complete",
        ScanStatus::Cancelled => "Cancel",
        ScanStatus::Rejected => "Reject",
        ScanStatus::Requested => "Reopen",
    };
    ui.add(egui::Button::new(RichText::new(label).small().color(status_color(status))))
}

/// Scan request dialog; also opened from the patient records panel.
pub fn show_request_dialog(app: &mut App, ctx: &egui::Context) {
    egui::Window::new("Request Scan")
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            let selected_name = app
                .scan_form
                .patient_id
                .map(|id| app.patient_name(id))
                .unwrap_or_else(|| "Select...".to_string());

            egui::Grid::new("scan_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.scan_form;

                    ui.label("Patient:");
                    egui::ComboBox::from_id_salt("scan_form_patient")
                        .width(250.0)
                        .selected_text(selected_name)
                        .show_ui(ui, |ui| {
                            for patient in &app.patients {
                                if ui
                                    .selectable_label(form.patient_id == Some(patient.id), patient.full_name())
                                    .clicked()
                                {
                                    form.patient_id = Some(patient.id);
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Scan Type:");
                    egui::ComboBox::from_id_salt("scan_form_type")
                        .width(150.0)
                        .selected_text(form.scan_type.as_str())
                        .show_ui(ui, |ui| {
                            for scan_type in SCAN_TYPES {
                                if ui.selectable_label(form.scan_type == scan_type, scan_type).clicked() {
                                    form.scan_type = scan_type.to_string();
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Body Part:");
                    ui.add(egui::TextEdit::singleline(&mut form.body_part).desired_width(250.0).hint_text("Optional"));
                    ui.end_row();

                    ui.label("Priority:");
                    ui.horizontal(|ui| {
                        for priority in Priority::ALL {
                            ui.selectable_value(&mut form.priority, priority, priority.label());
                        }
                    });
                    ui.end_row();

                    ui.label("Reason:");
                    ui.add(
                        egui::TextEdit::multiline(&mut form.reason)
                            .desired_rows(3)
                            .desired_width(250.0)
                            .hint_text("Clinical indication (required)"),
                    );
                    ui.end_row();
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.scan_form.reset(),
                DialogAction::Save => app.request_scan(),
                DialogAction::None => {}
            }
        });
}

fn show_schedule_dialog(app: &mut App, ctx: &egui::Context) {
    let title = match app.schedule_form.appointment_id {
        Some(id) => format!("Schedule Appointment #{id}"),
        None => "Schedule Appointment".to_string(),
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("schedule_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.schedule_form;

                    ui.label("Date:");
                    ui.add(DatePickerButton::new(&mut form.date).id_salt("schedule_date"));
                    ui.end_row();

                    ui.label("Time:");
                    let valid = form.scheduled_at().is_ok();
                    ui.add(
                        egui::TextEdit::singleline(&mut form.time_input)
                            .desired_width(80.0)
                            .hint_text("HH:MM")
                            .text_color(if valid { ui.visuals().text_color() } else { colors::ERROR }),
                    );
                    ui.end_row();

                    ui.label("Notes:");
                    ui.add(egui::TextEdit::multiline(&mut form.notes).desired_rows(2).desired_width(220.0));
                    ui.end_row();
                });

            if app.role() == Some(Role::Radiologist) {
                ui.add_space(5.0);
                ui.label(RichText::new("The appointment will be assigned to you.").small().weak());
            }

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.schedule_form.reset(),
                DialogAction::Save => app.schedule_scan(),
                DialogAction::None => {}
            }
        });
}
