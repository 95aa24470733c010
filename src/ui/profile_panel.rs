//! The signed-in user's own patient or staff record.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, PENCIL};

use super::app::{App, Profile};
use super::components::{back_button, empty_state, loading_spinner, panel_header, section, styled_button_with_icon};
use super::forms::{PatientForm, StaffForm};
use super::{patient_records_panel, staff_panel};
use crate::models::{MedicalStaff, Patient};

/// Show the profile panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "My Profile");

    ui.horizontal(|ui| {
        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_profile();
        }
        ui.add_space(10.0);
        if app.profile.is_some() && styled_button_with_icon(ui, PENCIL, "Edit").clicked() {
            match &app.profile {
                Some(Profile::Patient(patient)) => app.patient_form = PatientForm::edit(patient),
                Some(Profile::Staff(staff)) => app.staff_form = StaffForm::edit(staff),
                None => {}
            }
        }
    });
    ui.add_space(15.0);

    if let Some(session) = app.session() {
        section(ui, "Account", |ui| {
            field_grid(ui, "account_grid", |ui| {
                row(ui, "Username", &session.username);
                row(ui, "Role", session.role.label());
                if let Some(expires) = session.expires_at {
                    row(ui, "Session expires", &expires.format("%Y-%m-%d %H:%M UTC").to_string());
                }
            });
        });
        ui.add_space(10.0);
    }

    match &app.profile {
        Some(Profile::Patient(patient)) => show_patient(ui, patient),
        Some(Profile::Staff(staff)) => show_staff(ui, staff),
        None if app.profile_id().is_none() => empty_state(ui, "Your account is not linked to a profile"),
        None if app.is_loading() => loading_spinner(ui, "Loading profile..."),
        None => empty_state(ui, "Profile not loaded"),
    }

    let ctx = ui.ctx().clone();
    if app.patient_form.is_open {
        patient_records_panel::show_patient_dialog(app, &ctx);
    }
    if app.staff_form.is_open {
        staff_panel::show_form_dialog(app, &ctx);
    }

    go_back
}

fn show_patient(ui: &mut Ui, patient: &Patient) {
    section(ui, &patient.full_name(), |ui| {
        field_grid(ui, "patient_profile_grid", |ui| {
            row(ui, "Patient ID", &patient.id.to_string());
            row(ui, "Email", &patient.email);
            row(ui, "Phone", patient.phone_number.as_deref().unwrap_or("-"));
            row(ui, "Address", patient.address.as_deref().unwrap_or("-"));
            row(
                ui,
                "Date of birth",
                &patient
                    .date_of_birth
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or("-".to_string()),
            );
            row(ui, "Gender", patient.gender.as_deref().unwrap_or("-"));
            row(ui, "Blood type", patient.blood_type.as_deref().unwrap_or("-"));
            row(ui, "Emergency contact", patient.emergency_contact.as_deref().unwrap_or("-"));
        });
    });
}

fn show_staff(ui: &mut Ui, staff: &MedicalStaff) {
    section(ui, &staff.display_name(), |ui| {
        field_grid(ui, "staff_profile_grid", |ui| {
            row(ui, "Staff ID", &staff.id.to_string());
            row(ui, "Role", staff.role.label());
            row(ui, "Email", &staff.email);
            row(ui, "Phone", staff.phone_number.as_deref().unwrap_or("-"));
            row(ui, "Specialization", staff.specialization.as_deref().unwrap_or("-"));
            row(ui, "Department", staff.department.as_deref().unwrap_or("-"));
            row(ui, "License", staff.license_number.as_deref().unwrap_or("-"));
        });
    });
}

fn field_grid(ui: &mut Ui, id: &str, add_rows: impl FnOnce(&mut Ui)) {
    egui::Grid::new(id)
        .num_columns(2)
        .spacing([24.0, 6.0])
        .show(ui, add_rows);
}

fn row(ui: &mut Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).weak());
    ui.label(value);
    ui.end_row();
}
