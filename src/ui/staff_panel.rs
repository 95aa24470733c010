//! Medical staff management with CRUD, search, and role filter.

use eframe::egui::{self, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, PENCIL, PLUS, TRASH};

use super::app::{App, DeleteTarget};
use super::components::{
    DialogAction, action_button, back_button, danger_action_button, dialog_buttons, empty_state, form_row,
    panel_header, primary_button_with_icon, styled_button, styled_button_with_icon,
};
use super::forms::StaffForm;
use crate::routing::Role;
use crate::search;

const STAFF_ROLES: [Role; 3] = [Role::Doctor, Role::Radiologist, Role::Admin];

enum RowAction {
    Edit(i64),
    Delete(i64, String),
}

/// Show the staff panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Manage Staff");

    // Toolbar row 1: Action buttons
    ui.horizontal(|ui| {
        if primary_button_with_icon(ui, PLUS, "Add Staff Member").clicked() {
            app.staff_form = StaffForm::open_new();
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_staff();
        }
    });

    ui.add_space(10.0);

    // Toolbar row 2: Search and filter
    ui.horizontal(|ui| {
        ui.label("Search:");
        ui.add(
            egui::TextEdit::singleline(&mut app.staff_search)
                .desired_width(200.0)
                .hint_text("Name, email, specialization..."),
        );

        ui.add_space(20.0);

        ui.label("Role:");
        if ui.selectable_label(app.staff_role_filter.is_none(), "All").clicked() {
            app.staff_role_filter = None;
        }
        for role in STAFF_ROLES {
            if ui
                .selectable_label(app.staff_role_filter == Some(role), role.label())
                .clicked()
            {
                app.staff_role_filter = Some(role);
            }
        }

        if !app.staff_search.is_empty() || app.staff_role_filter.is_some() {
            ui.add_space(10.0);
            if styled_button(ui, "Clear").clicked() {
                app.staff_search.clear();
                app.staff_role_filter = None;
            }
        }
    });

    ui.add_space(15.0);

    match show_table(app, ui) {
        Some(RowAction::Edit(id)) => {
            if let Some(member) = app.staff.iter().find(|s| s.id == id) {
                app.staff_form = StaffForm::edit(member);
            }
        }
        Some(RowAction::Delete(id, name)) => {
            app.delete_target = Some(DeleteTarget::Staff(id, name));
            app.show_delete_confirm = true;
        }
        None => {}
    }

    if app.staff_form.is_open {
        let ctx = ui.ctx().clone();
        show_form_dialog(app, &ctx);
    }

    go_back
}

fn show_table(app: &App, ui: &mut Ui) -> Option<RowAction> {
    let mut action = None;

    let filtered: Vec<_> = search::filter_staff(&app.staff, &app.staff_search)
        .into_iter()
        .filter(|s| app.staff_role_filter.is_none_or(|r| s.role == r))
        .collect();

    ui.label(format!("Showing {} of {} staff members", filtered.len(), app.staff.len()));

    ui.add_space(10.0);

    if filtered.is_empty() {
        empty_state(ui, "No staff members found");
        return None;
    }

    ScrollArea::vertical().id_salt("staff_scroll").show(ui, |ui| {
        ui.add_space(4.0);
        egui::Grid::new("staff_grid")
            .num_columns(7)
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                // Header
                ui.strong("Name");
                ui.strong("Role");
                ui.strong("Email");
                ui.strong("Phone");
                ui.strong("Specialization");
                ui.strong("Department");
                ui.strong("Actions");
                ui.end_row();

                for member in filtered {
                    ui.label(member.full_name());
                    ui.label(member.role.label());
                    ui.label(&member.email);
                    ui.label(member.phone_number.as_deref().unwrap_or("-"));
                    ui.label(member.specialization.as_deref().unwrap_or("-"));
                    ui.label(member.department.as_deref().unwrap_or("-"));

                    ui.horizontal(|ui| {
                        ui.add_space(8.0);
                        if action_button(ui, PENCIL, "Edit").clicked() {
                            action = Some(RowAction::Edit(member.id));
                        }
                        ui.add_space(4.0);
                        if danger_action_button(ui, TRASH, "Delete").clicked() {
                            action = Some(RowAction::Delete(member.id, member.full_name()));
                        }
                    });

                    ui.end_row();
                }
            });
    });

    action
}

/// Add/edit staff dialog; the profile panel reuses it for self-edits.
pub(super) fn show_form_dialog(app: &mut App, ctx: &egui::Context) {
    let title = if app.staff_form.is_editing {
        "Edit Staff Member"
    } else {
        "Add Staff Member"
    };
    // Only admins may change a role
    let can_change_role = app.role() == Some(Role::Admin);

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .max_height(500.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                egui::Grid::new("staff_form_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        let form = &mut app.staff_form;

                        form_row(ui, "First Name:", &mut form.first_name, "Required");
                        form_row(ui, "Last Name:", &mut form.last_name, "Required");
                        form_row(ui, "Email:", &mut form.email, "Required");

                        ui.label("Role:");
                        if can_change_role {
                            egui::ComboBox::from_id_salt("staff_form_role")
                                .width(150.0)
                                .selected_text(form.role.label())
                                .show_ui(ui, |ui| {
                                    for role in STAFF_ROLES {
                                        ui.selectable_value(&mut form.role, role, role.label());
                                    }
                                });
                        } else {
                            ui.label(form.role.label());
                        }
                        ui.end_row();

                        form_row(ui, "Phone:", &mut form.phone_number, "Optional");
                        form_row(ui, "Specialization:", &mut form.specialization, "Optional");
                        form_row(ui, "Department:", &mut form.department, "Optional");
                        form_row(ui, "License Number:", &mut form.license_number, "Optional");
                    });
            });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.staff_form.reset(),
                DialogAction::Save => app.save_staff(),
                DialogAction::None => {}
            }
        });
}
