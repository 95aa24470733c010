//! Billing statements: account summary, charges, payments, and export.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, CREDIT_CARD, FILE_XLS, PLUS};

use super::app::{App, Statement};
use super::components::{
    DialogAction, back_button, colors, dialog_buttons, empty_state, form_row, loading_spinner, panel_header,
    primary_button_with_icon, section, status_badge, styled_button_with_icon,
};
use super::forms::ChargeForm;
use crate::models::ChargeStatus;
use crate::models::billing::outstanding_total;
use crate::routing::Role;

pub fn charge_status_color(status: ChargeStatus) -> egui::Color32 {
    match status {
        ChargeStatus::Pending => colors::WARNING,
        ChargeStatus::Paid => colors::SUCCESS,
        ChargeStatus::Cancelled => colors::NEUTRAL,
    }
}

/// What the statement area should show for the chosen patient.
enum StatementView<'a> {
    Missing,
    Loading,
    Unavailable,
    Ready(&'a Statement),
}

fn statement_view(app: &App, patient_id: i64) -> StatementView<'_> {
    if matches!(statement_view(app, patient_id), StatementView::Missing) {
        return StatementView::Missing;
    }
    match &app.statement {
        Some(statement) if statement.patient_id == patient_id => StatementView::Ready(statement),
        _ if app.is_loading() => StatementView::Loading,
        _ => StatementView::Unavailable,
    }
}

/// Show the billing panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);
    let role = app.role();
    let is_patient = role == Some(Role::Patient);
    let is_admin = role == Some(Role::Admin);
    let can_charge = matches!(role, Some(Role::Doctor | Role::Admin));

    panel_header(ui, if is_patient { "My Billing Statement" } else { "Billing" });

    ui.horizontal(|ui| {
        if !is_patient {
            ui.label("Patient:");
            let selected = app
                .billing_patient
                .map(|id| app.patient_name(id))
                .unwrap_or_else(|| "Select...".to_string());
            let mut chosen = None;
            egui::ComboBox::from_id_salt("billing_patient")
                .width(240.0)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for patient in &app.patients {
                        if ui
                            .selectable_label(app.billing_patient == Some(patient.id), patient.full_name())
                            .clicked()
                        {
                            chosen = Some(patient.id);
                        }
                    }
                });
            if let Some(id) = chosen {
                app.load_statement(id);
            }
            ui.add_space(10.0);
        }

        if let Some(id) = app.billing_patient
            && styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked()
        {
            app.load_statement(id);
        }

        if app.statement.is_some() {
            ui.add_space(10.0);
            if styled_button_with_icon(ui, FILE_XLS, "Export").clicked() {
                app.export_statement();
            }
        }
    });

    ui.add_space(15.0);

    let Some(patient_id) = app.billing_patient else {
        if is_patient {
            empty_state(ui, "Your account is not linked to a patient record");
        } else {
            empty_state(ui, "Choose a patient to view their statement");
        }
        return go_back;
    };

    if app.missing_statement == Some(patient_id) {
        ui.vertical_centered(|ui| {
            ui.add_space(30.0);
            ui.label(RichText::new("No billing account exists for this patient").weak());
            if is_admin {
                ui.add_space(10.0);
                if primary_button_with_icon(ui, CREDIT_CARD, "Create Billing Account").clicked() {
                    app.create_billing_account(patient_id);
                }
            }
        });
        return go_back;
    }

    let mut pay = None;
    let mut open_charge_form = None;

    match statement_view(app, patient_id) {
        StatementView::Missing => {}
        StatementView::Loading => loading_spinner(ui, "Loading statement..."),
        StatementView::Unavailable => empty_state(ui, "Statement could not be loaded. Use Refresh to try again."),
        StatementView::Ready(statement) => {
            let outstanding = outstanding_total(&statement.charges);

            section(ui, "Account", |ui| {
                egui::Grid::new("billing_account_grid")
                    .num_columns(2)
                    .spacing([20.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Patient:");
                        ui.label(RichText::new(app.patient_name(statement.patient_id)).strong());
                        ui.end_row();

                        ui.label("Account:");
                        ui.label(format!("#{}", statement.account.id));
                        ui.end_row();

                        ui.label("Insurance:");
                        ui.label(statement.account.insurance_provider.as_deref().unwrap_or("-"));
                        ui.end_row();

                        ui.label("Policy:");
                        ui.label(statement.account.policy_number.as_deref().unwrap_or("-"));
                        ui.end_row();

                        ui.label("Balance:");
                        ui.label(format!("{:.2}", statement.account.balance));
                        ui.end_row();

                        ui.label("Outstanding:");
                        let color = if outstanding > 0.0 { colors::WARNING } else { colors::SUCCESS };
                        ui.label(RichText::new(format!("{outstanding:.2}")).strong().color(color));
                        ui.end_row();
                    });
            });

            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.label(RichText::new("Charges").strong());
                if can_charge {
                    ui.add_space(10.0);
                    if primary_button_with_icon(ui, PLUS, "Add Charge").clicked() {
                        open_charge_form = Some(statement.account.id);
                    }
                }
            });
            ui.add_space(6.0);

            if statement.charges.is_empty() {
                empty_state(ui, "No charges on this account");
            } else {
                ScrollArea::vertical().id_salt("charges_scroll").show(ui, |ui| {
                    egui::Grid::new("charges_grid")
                        .num_columns(6)
                        .striped(true)
                        .spacing([12.0, 8.0])
                        .show(ui, |ui| {
                            ui.strong("Date");
                            ui.strong("Description");
                            ui.strong("Service");
                            ui.strong("Amount");
                            ui.strong("Status");
                            ui.strong("");
                            ui.end_row();

                            for charge in &statement.charges {
                                ui.label(
                                    charge
                                        .created_at
                                        .map(|t| t.format("%Y-%m-%d").to_string())
                                        .unwrap_or("-".to_string()),
                                );
                                ui.label(&charge.description);
                                ui.label(charge.service_type.as_deref().unwrap_or("-"));
                                ui.label(format!("{:.2}", charge.amount));
                                status_badge(ui, charge.status.label(), charge_status_color(charge.status));
                                if charge.status == ChargeStatus::Pending {
                                    if ui.button("Pay").clicked() {
                                        pay = Some(charge.id);
                                    }
                                } else {
                                    ui.label("");
                                }
                                ui.end_row();
                            }
                        });
                });
            }
        }
    }

    if let Some(charge_id) = pay {
        app.pay_charge(charge_id);
    }
    if let Some(account_id) = open_charge_form {
        app.charge_form = ChargeForm::for_account(account_id);
    }

    if app.charge_form.is_open {
        let ctx = ui.ctx().clone();
        show_charge_dialog(app, &ctx);
    }

    go_back
}

fn show_charge_dialog(app: &mut App, ctx: &egui::Context) {
    egui::Window::new("Add Charge")
        .collapsible(false)
        .resizable(false)
        .default_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("charge_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.charge_form;
                    form_row(ui, "Description:", &mut form.description, "Required");
                    form_row(ui, "Amount:", &mut form.amount_input, "0.00");
                    form_row(ui, "Service Type:", &mut form.service_type, "Optional");
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.charge_form.reset(),
                DialogAction::Save => app.add_charge(),
                DialogAction::None => {}
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::app::tests::test_app;

    #[test]
    fn test_failed_load_stops_spinner() {
        let mut app = test_app();
        app.billing_patient = Some(4);
        assert!(matches!(statement_view(&app, 4), StatementView::Unavailable));

        app.load_statement(4);
        assert!(matches!(statement_view(&app, 4), StatementView::Loading));
    }

    #[test]
    fn test_missing_account() {
        let mut app = test_app();
        app.billing_patient = Some(4);
        app.missing_statement = Some(4);
        assert!(matches!(statement_view(&app, 4), StatementView::Missing));
        assert!(matches!(statement_view(&app, 5), StatementView::Unavailable));
    }
}
