//! Patient search, CRUD, and medical history.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;
use egui_phosphor::regular::{ARROWS_CLOCKWISE, CALENDAR_PLUS, EYE, FILE_XLS, PENCIL, PLUS, TRASH};

use super::app::{App, DeleteTarget};
use super::components::{
    DialogAction, action_button, back_button, colors, danger_action_button, dialog_buttons, empty_state, form_row,
    loading_spinner, panel_header, primary_button_with_icon, section, styled_button, styled_button_with_icon,
};
use super::forms::{DiagnosisForm, PatientForm, RecordForm, SEVERITIES, ScanRequestForm};
use super::scan_panel;
use crate::models::staff::staff_name;
use crate::report::ReportContent;
use crate::routing::Role;
use crate::search::filter_patients;

enum RowAction {
    View(i64),
    Edit(i64),
    Delete(i64, String),
    RequestScan(i64),
}

/// Show the patient records panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);
    panel_header(ui, "Patient Records");

    let role = app.role();
    let is_admin = role == Some(Role::Admin);

    // Toolbar row 1: Action buttons
    ui.horizontal(|ui| {
        if is_admin && primary_button_with_icon(ui, PLUS, "Add Patient").clicked() {
            app.patient_form = PatientForm::open_new();
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_patients();
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, FILE_XLS, "Export to Excel").clicked() {
            app.export_patients();
        }
    });

    ui.add_space(10.0);

    // Toolbar row 2: Search
    ui.horizontal(|ui| {
        ui.label("Search:");
        ui.add(
            egui::TextEdit::singleline(&mut app.patient_search)
                .desired_width(260.0)
                .hint_text("Name, email, address or birth date..."),
        );

        if !app.patient_search.is_empty() {
            ui.add_space(10.0);
            if styled_button(ui, "Clear").clicked() {
                app.patient_search.clear();
            }
        }
    });

    ui.add_space(15.0);

    let action = show_table(app, ui, role);
    match action {
        Some(RowAction::View(id)) => app.load_history(id),
        Some(RowAction::Edit(id)) => {
            if let Some(patient) = app.patients.iter().find(|p| p.id == id) {
                app.patient_form = PatientForm::edit(patient);
            }
        }
        Some(RowAction::Delete(id, name)) => {
            app.delete_target = Some(DeleteTarget::Patient(id, name));
            app.show_delete_confirm = true;
        }
        Some(RowAction::RequestScan(id)) => {
            app.scan_form = ScanRequestForm::for_patient(Some(id));
        }
        None => {}
    }

    ui.add_space(15.0);

    if app.selected_patient.is_some() {
        show_history(app, ui);
    }

    // Form dialogs
    let ctx = ui.ctx().clone();
    if app.patient_form.is_open {
        show_patient_dialog(app, &ctx);
    }
    if app.record_form.is_open {
        show_record_dialog(app, &ctx);
    }
    if app.diagnosis_form.is_open {
        show_diagnosis_dialog(app, &ctx);
    }
    if app.scan_form.is_open {
        scan_panel::show_request_dialog(app, &ctx);
    }

    go_back
}

fn show_table(app: &App, ui: &mut Ui, role: Option<Role>) -> Option<RowAction> {
    let mut action = None;
    let filtered = filter_patients(&app.patients, &app.patient_search);

    ui.label(format!(
        "Showing {} of {} patients",
        filtered.len(),
        app.patients.len()
    ));

    ui.add_space(10.0);

    if app.patients.is_empty() {
        empty_state(ui, "No patients loaded");
        return None;
    }

    ScrollArea::vertical()
        .id_salt("patients_scroll")
        .max_height(280.0)
        .show(ui, |ui| {
            ui.add_space(4.0);
            egui::Grid::new("patients_grid")
                .num_columns(7)
                .striped(true)
                .min_col_width(60.0)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    // Header
                    ui.strong("Name");
                    ui.strong("Email");
                    ui.strong("Phone");
                    ui.strong("Date of Birth");
                    ui.strong("Gender");
                    ui.strong("Address");
                    ui.strong("Actions");
                    ui.end_row();

                    // Data rows
                    for patient in filtered {
                        let selected = app.selected_patient == Some(patient.id);
                        let name = patient.full_name();
                        if ui.selectable_label(selected, &name).clicked() {
                            action = Some(RowAction::View(patient.id));
                        }
                        ui.label(&patient.email);
                        ui.label(patient.phone_number.as_deref().unwrap_or("-"));
                        ui.label(patient.date_of_birth.map(|d| d.to_string()).unwrap_or("-".to_string()));
                        ui.label(patient.gender.as_deref().unwrap_or("-"));
                        ui.label(patient.address.as_deref().unwrap_or("-"));

                        ui.horizontal(|ui| {
                            ui.add_space(8.0);
                            if action_button(ui, EYE, "View history").clicked() {
                                action = Some(RowAction::View(patient.id));
                            }
                            if role == Some(Role::Doctor) {
                                ui.add_space(4.0);
                                if action_button(ui, CALENDAR_PLUS, "Request scan").clicked() {
                                    action = Some(RowAction::RequestScan(patient.id));
                                }
                            }
                            if role == Some(Role::Admin) {
                                ui.add_space(4.0);
                                if action_button(ui, PENCIL, "Edit").clicked() {
                                    action = Some(RowAction::Edit(patient.id));
                                }
                                ui.add_space(4.0);
                                if danger_action_button(ui, TRASH, "Delete").clicked() {
                                    action = Some(RowAction::Delete(patient.id, name.clone()));
                                }
                            }
                        });

                        ui.end_row();
                    }
                });
        });

    action
}

fn show_history(app: &mut App, ui: &mut Ui) {
    let Some(patient_id) = app.selected_patient else {
        return;
    };
    let is_doctor = app.role() == Some(Role::Doctor);
    let title = format!("Medical History: {}", app.patient_name(patient_id));

    let mut add_record = false;
    let mut add_diagnosis = false;

    section(ui, &title, |ui| {
        ui.horizontal(|ui| {
            if is_doctor {
                add_record = styled_button_with_icon(ui, PLUS, "Add Record").clicked();
                add_diagnosis = styled_button_with_icon(ui, PLUS, "Add Diagnosis").clicked();
            }
            if styled_button(ui, "Close").clicked() {
                app.selected_patient = None;
                app.history = None;
            }
        });
        ui.add_space(10.0);

        let Some(history) = app.history.as_ref().filter(|h| h.patient_id == patient_id) else {
            loading_spinner(ui, "Loading history...");
            return;
        };

        ScrollArea::vertical().id_salt("history_scroll").show(ui, |ui| {
            ui.label(RichText::new("Visits").strong());
            match &history.records {
                Ok(records) if records.is_empty() => {
                    ui.label(RichText::new("No visits recorded").weak());
                }
                Ok(records) => {
                    for record in records {
                        ui.horizontal(|ui| {
                            ui.label(record.visit_date.map(|d| d.to_string()).unwrap_or("-".to_string()));
                            ui.label(RichText::new(staff_name(&app.staff, record.doctor_id)).weak());
                            ui.label(record.chief_complaint.as_deref().unwrap_or(""));
                        });
                        if let Some(notes) = &record.notes {
                            ui.label(RichText::new(notes).small());
                        }
                        if let Some(treatment) = &record.treatment {
                            ui.label(RichText::new(format!("Treatment: {treatment}")).small());
                        }
                    }
                }
                Err(e) => {
                    ui.colored_label(colors::ERROR, format!("Could not load visits: {e}"));
                }
            }

            ui.add_space(10.0);
            ui.label(RichText::new("Diagnoses").strong());
            match &history.diagnoses {
                Ok(diagnoses) if diagnoses.is_empty() => {
                    ui.label(RichText::new("No diagnoses").weak());
                }
                Ok(diagnoses) => {
                    for diagnosis in diagnoses {
                        ui.horizontal(|ui| {
                            if let Some(code) = &diagnosis.code {
                                ui.monospace(code);
                            }
                            ui.label(&diagnosis.description);
                            if let Some(severity) = &diagnosis.severity {
                                ui.label(RichText::new(severity).color(colors::WARNING));
                            }
                        });
                    }
                }
                Err(e) => {
                    ui.colored_label(colors::ERROR, format!("Could not load diagnoses: {e}"));
                }
            }

            ui.add_space(10.0);
            ui.label(RichText::new("Reports").strong());
            match &history.reports {
                Ok(reports) if reports.is_empty() => {
                    ui.label(RichText::new("No reports").weak());
                }
                Ok(reports) => {
                    for report in reports {
                        let title = report.title.clone().unwrap_or_else(|| format!("Report #{}", report.id));
                        ui.collapsing(title, |ui| {
                            super::reports_panel::render_content(ui, &ReportContent::parse(&report.report_content));
                        });
                    }
                }
                Err(e) => {
                    ui.colored_label(colors::ERROR, format!("Could not load reports: {e}"));
                }
            }
        });
    });

    if add_record {
        app.record_form = RecordForm::for_patient(patient_id);
    }
    if add_diagnosis {
        app.diagnosis_form = DiagnosisForm::for_patient(patient_id);
    }
}

/// Add/edit patient dialog; the profile panel reuses it for self-edits.
pub(super) fn show_patient_dialog(app: &mut App, ctx: &egui::Context) {
    let title = if app.patient_form.is_editing {
        "Edit Patient"
    } else {
        "Add Patient"
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .max_height(520.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                egui::Grid::new("patient_form_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        let form = &mut app.patient_form;
                        form_row(ui, "First Name:", &mut form.first_name, "");
                        form_row(ui, "Last Name:", &mut form.last_name, "");
                        form_row(ui, "Email:", &mut form.email, "name@example.org");
                        form_row(ui, "Phone:", &mut form.phone_number, "Optional");
                        form_row(ui, "Address:", &mut form.address, "Optional");

                        ui.label("Date of Birth:");
                        ui.vertical(|ui| {
                            let is_valid = form.date_of_birth_input.trim().is_empty()
                                || super::forms::parse_flexible_date(&form.date_of_birth_input).is_some();
                            let text_color = if is_valid {
                                ui.visuals().text_color()
                            } else {
                                colors::ERROR
                            };
                            ui.add(
                                egui::TextEdit::singleline(&mut form.date_of_birth_input)
                                    .desired_width(120.0)
                                    .hint_text("YYYY-MM-DD")
                                    .text_color(text_color),
                            );
                            if !is_valid {
                                ui.colored_label(colors::ERROR, "Invalid date format");
                            }
                        });
                        ui.end_row();

                        ui.label("Gender:");
                        egui::ComboBox::from_id_salt("patient_form_gender")
                            .width(150.0)
                            .selected_text(form.gender.as_deref().unwrap_or("Select..."))
                            .show_ui(ui, |ui| {
                                if ui.selectable_label(form.gender.is_none(), "None").clicked() {
                                    form.gender = None;
                                }
                                for gender in &["MALE", "FEMALE", "OTHER"] {
                                    if ui
                                        .selectable_label(form.gender.as_deref() == Some(*gender), *gender)
                                        .clicked()
                                    {
                                        form.gender = Some(gender.to_string());
                                    }
                                }
                            });
                        ui.end_row();

                        form_row(ui, "Blood Type:", &mut form.blood_type, "e.g. O+");
                        form_row(ui, "Emergency Contact:", &mut form.emergency_contact, "Optional");
                    });
            });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.patient_form.reset(),
                DialogAction::Save => app.save_patient(),
                DialogAction::None => {}
            }
        });
}

fn show_record_dialog(app: &mut App, ctx: &egui::Context) {
    egui::Window::new("Add Medical Record")
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("record_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.record_form;
                    ui.label("Visit Date:");
                    ui.add(DatePickerButton::new(&mut form.visit_date).id_salt("record_visit_date"));
                    ui.end_row();

                    form_row(ui, "Chief Complaint:", &mut form.chief_complaint, "");

                    ui.label("Notes:");
                    ui.add(egui::TextEdit::multiline(&mut form.notes).desired_rows(4).desired_width(260.0));
                    ui.end_row();

                    form_row(ui, "Treatment:", &mut form.treatment, "Optional");
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.record_form.reset(),
                DialogAction::Save => app.save_record(),
                DialogAction::None => {}
            }
        });
}

fn show_diagnosis_dialog(app: &mut App, ctx: &egui::Context) {
    egui::Window::new("Add Diagnosis")
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            let records: Vec<(i64, String)> = app
                .history
                .as_ref()
                .and_then(|h| h.records.as_ref().ok())
                .map(|records| {
                    records
                        .iter()
                        .map(|r| {
                            let date = r.visit_date.map(|d| d.to_string()).unwrap_or_default();
                            (r.id, format!("#{} {}", r.id, date))
                        })
                        .collect()
                })
                .unwrap_or_default();

            egui::Grid::new("diagnosis_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.diagnosis_form;
                    form_row(ui, "Code:", &mut form.code, "ICD-10, optional");
                    form_row(ui, "Description:", &mut form.description, "");

                    ui.label("Severity:");
                    egui::ComboBox::from_id_salt("diagnosis_severity")
                        .width(150.0)
                        .selected_text(form.severity.as_deref().unwrap_or("None"))
                        .show_ui(ui, |ui| {
                            if ui.selectable_label(form.severity.is_none(), "None").clicked() {
                                form.severity = None;
                            }
                            for severity in SEVERITIES {
                                if ui
                                    .selectable_label(form.severity.as_deref() == Some(severity), severity)
                                    .clicked()
                                {
                                    form.severity = Some(severity.to_string());
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Visit:");
                    let selected = form
                        .medical_record_id
                        .and_then(|id| records.iter().find(|(rid, _)| *rid == id))
                        .map(|(_, label)| label.as_str())
                        .unwrap_or("None");
                    egui::ComboBox::from_id_salt("diagnosis_record")
                        .width(200.0)
                        .selected_text(selected)
                        .show_ui(ui, |ui| {
                            if ui.selectable_label(form.medical_record_id.is_none(), "None").clicked() {
                                form.medical_record_id = None;
                            }
                            for (id, label) in &records {
                                if ui
                                    .selectable_label(form.medical_record_id == Some(*id), label)
                                    .clicked()
                                {
                                    form.medical_record_id = Some(*id);
                                }
                            }
                        });
                    ui.end_row();
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.diagnosis_form.reset(),
                DialogAction::Save => app.save_diagnosis(),
                DialogAction::None => {}
            }
        });
}
