//! Radiology reports: list, structured preview, and radiologist editing.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, COPY, PENCIL_SIMPLE, PLUS, TRASH};

use super::app::{App, DeleteTarget};
use super::components::{
    DialogAction, action_button, back_button, colors, danger_action_button, dialog_buttons, empty_state,
    panel_header, primary_button_with_icon, section, status_badge, styled_button_with_icon,
};
use super::forms::{REPORT_STATUSES, ReportForm};
use crate::models::Report;
use crate::models::staff::staff_name;
use crate::report::ReportContent;
use crate::routing::Role;

enum RowAction {
    Select(i64),
    Edit(i64),
    Delete(i64, String),
}

/// Render parsed report content.
pub fn render_content(ui: &mut Ui, content: &ReportContent) {
    match content {
        ReportContent::Empty => {
            ui.label(RichText::new("No content").weak().italics());
        }
        ReportContent::Sections(sections) => {
            for s in sections {
                ui.label(RichText::new(&s.label).strong());
                ui.label(&s.text);
                ui.add_space(6.0);
            }
        }
        ReportContent::Json(text) => {
            ui.label(RichText::new(text).monospace());
        }
        ReportContent::Raw(text) => {
            ui.label(text);
        }
    }
}

pub fn report_status_color(status: Option<&str>) -> egui::Color32 {
    match status.map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("final") => colors::SUCCESS,
        Some("preliminary") => colors::WARNING,
        Some("amended") => colors::INFO,
        _ => colors::NEUTRAL,
    }
}

fn report_title(report: &Report) -> String {
    report
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Report #{}", report.id))
}

/// Show the reports panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);
    let can_write = app.role() == Some(Role::Radiologist);

    panel_header(ui, "Reports");

    ui.horizontal(|ui| {
        if can_write && primary_button_with_icon(ui, PLUS, "New Report").clicked() {
            app.report_form = ReportForm {
                is_open: true,
                ..ReportForm::default()
            };
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_reports();
        }

        ui.add_space(20.0);
        ui.label(format!("{} reports", app.reports.len()));
    });

    ui.add_space(15.0);

    if app.reports.is_empty() {
        if app.is_loading() {
            super::components::loading_spinner(ui, "Loading reports...");
        } else {
            empty_state(ui, "No reports yet");
        }
    } else {
        let action = show_list_and_preview(app, ui, can_write);

        match action {
            Some(RowAction::Select(id)) => app.selected_report = Some(id),
            Some(RowAction::Edit(id)) => {
                if let Some(report) = app.reports.iter().find(|r| r.id == id) {
                    app.report_form = ReportForm::edit(report);
                }
            }
            Some(RowAction::Delete(id, title)) => {
                app.delete_target = Some(DeleteTarget::Report(id, title));
                app.show_delete_confirm = true;
            }
            None => {}
        }
    }

    if app.report_form.is_open {
        let ctx = ui.ctx().clone();
        show_report_dialog(app, &ctx);
    }

    go_back
}

fn show_list_and_preview(app: &App, ui: &mut Ui, can_write: bool) -> Option<RowAction> {
    let mut action = None;
    let list_width = (ui.available_width() * 0.45).max(320.0);

    ui.horizontal_top(|ui| {
        // Left: report list
        ui.vertical(|ui| {
            ui.set_width(list_width);
            ScrollArea::vertical().id_salt("reports_list").show(ui, |ui| {
                egui::Grid::new("reports_grid")
                    .num_columns(4)
                    .striped(true)
                    .spacing([10.0, 6.0])
                    .show(ui, |ui| {
                        ui.strong("Title");
                        ui.strong("Patient");
                        ui.strong("Status");
                        ui.strong("");
                        ui.end_row();

                        for report in &app.reports {
                            let selected = app.selected_report == Some(report.id);
                            if ui.selectable_label(selected, report_title(report)).clicked() {
                                action = Some(RowAction::Select(report.id));
                            }
                            ui.label(app.patient_name(report.patient_id));
                            status_badge(
                                ui,
                                report.status.as_deref().unwrap_or("draft"),
                                report_status_color(report.status.as_deref()),
                            );
                            ui.horizontal(|ui| {
                                if can_write {
                                    if action_button(ui, PENCIL_SIMPLE, "Edit").clicked() {
                                        action = Some(RowAction::Edit(report.id));
                                    }
                                    if danger_action_button(ui, TRASH, "Delete").clicked() {
                                        action = Some(RowAction::Delete(report.id, report_title(report)));
                                    }
                                }
                            });
                            ui.end_row();
                        }
                    });
            });
        });

        ui.add_space(20.0);

        // Right: preview
        ui.vertical(|ui| {
            let selected = app
                .selected_report
                .and_then(|id| app.reports.iter().find(|r| r.id == id));

            match selected {
                Some(report) => show_preview(app, ui, report),
                None => {
                    ui.add_space(40.0);
                    ui.label(RichText::new("Select a report to preview").weak());
                }
            }
        });
    });

    action
}

fn show_preview(app: &App, ui: &mut Ui, report: &Report) {
    section(ui, &report_title(report), |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(app.patient_name(report.patient_id)).strong());
            ui.separator();
            ui.label(format!("Radiologist: {}", staff_name(&app.staff, report.radiologist_id)));
            if let Some(created) = report.created_at {
                ui.separator();
                ui.label(created.format("%Y-%m-%d %H:%M").to_string());
            }
            if let Some(image_id) = report.image_id {
                ui.separator();
                ui.label(format!("Image #{image_id}"));
            }
        });
        ui.separator();

        let content = ReportContent::parse(&report.report_content);
        ScrollArea::vertical().id_salt("report_preview").max_height(400.0).show(ui, |ui| {
            render_content(ui, &content);
        });

        ui.add_space(8.0);
        if ui.button(format!("{COPY} Copy text")).clicked() {
            ui.ctx().copy_text(content.to_plain_text());
        }
    });
}

fn show_report_dialog(app: &mut App, ctx: &egui::Context) {
    let title = match app.report_form.id {
        Some(id) => format!("Edit Report #{id}"),
        None => "New Report".to_string(),
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(true)
        .default_width(520.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("report_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.report_form;

                    ui.label("Patient ID:");
                    ui.add_enabled(
                        form.id.is_none(),
                        egui::TextEdit::singleline(&mut form.patient_id_input).desired_width(120.0),
                    );
                    ui.end_row();

                    if let Some(image_id) = form.image_id {
                        ui.label("Image:");
                        ui.label(format!("#{image_id}"));
                        ui.end_row();
                    }

                    ui.label("Title:");
                    ui.add(egui::TextEdit::singleline(&mut form.title).desired_width(340.0));
                    ui.end_row();

                    ui.label("Status:");
                    egui::ComboBox::from_id_salt("report_form_status")
                        .selected_text(form.status.as_str())
                        .show_ui(ui, |ui| {
                            for status in REPORT_STATUSES {
                                if ui.selectable_label(form.status == status, status).clicked() {
                                    form.status = status.to_string();
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Content:");
                    ui.add(
                        egui::TextEdit::multiline(&mut form.content)
                            .desired_rows(10)
                            .desired_width(340.0)
                            .hint_text("Findings and impression (plain text or JSON)"),
                    );
                    ui.end_row();
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.report_form.reset(),
                DialogAction::Save => app.save_report(),
                DialogAction::None => {}
            }
        });
}
