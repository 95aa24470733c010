//! Medical image library: search, upload, download, and report hand-off.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, DOWNLOAD_SIMPLE, FILE_TEXT, FOLDER_OPEN, MAGNIFYING_GLASS, TRASH, UPLOAD_SIMPLE};

use super::app::{App, DeleteTarget};
use super::components::{
    DialogAction, action_button, back_button, danger_action_button, dialog_buttons, empty_state, loading_spinner,
    panel_header, primary_button_with_icon, styled_button_with_icon,
};
use super::forms::{IMAGE_TYPES, ReportForm, UploadForm};
use crate::models::MedicalImage;
use crate::routing::Role;
use crate::search;

enum RowAction {
    Download(MedicalImage),
    WriteReport(i64, i64),
    Delete(i64, String),
}

fn image_label(image: &MedicalImage) -> String {
    image
        .file_name
        .clone()
        .unwrap_or_else(|| format!("Image #{}", image.id))
}

/// Show the image review panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);
    let role = app.role();
    let can_upload = matches!(role, Some(Role::Radiologist | Role::Admin));
    let can_report = role == Some(Role::Radiologist);
    let can_delete = role == Some(Role::Admin);

    panel_header(ui, "Medical Images");

    ui.horizontal(|ui| {
        if can_upload && primary_button_with_icon(ui, UPLOAD_SIMPLE, "Upload Image").clicked() {
            app.upload_form = UploadForm::open_new();
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            app.load_images();
        }

        ui.add_space(20.0);

        ui.label(MAGNIFYING_GLASS);
        ui.add(
            egui::TextEdit::singleline(&mut app.image_search)
                .hint_text("Type, body part, tag, or file name")
                .desired_width(260.0),
        );
        if !app.image_search.is_empty() && ui.small_button("Clear").clicked() {
            app.image_search.clear();
        }
    });

    ui.add_space(15.0);

    let mut action = None;
    let filtered = search::filter_images(&app.images, &app.image_search);

    ui.label(format!("Showing {} of {} images", filtered.len(), app.images.len()));
    ui.add_space(10.0);

    if filtered.is_empty() {
        if app.is_loading() {
            loading_spinner(ui, "Loading images...");
        } else if app.images.is_empty() {
            empty_state(ui, "No images stored");
        } else {
            empty_state(ui, "No images match your search");
        }
    } else {
        ScrollArea::vertical().id_salt("images_scroll").show(ui, |ui| {
            egui::Grid::new("images_grid")
                .num_columns(8)
                .striped(true)
                .min_col_width(50.0)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.strong("#");
                    ui.strong("File");
                    ui.strong("Patient");
                    ui.strong("Type");
                    ui.strong("Body Part");
                    ui.strong("Tag");
                    ui.strong("Uploaded");
                    ui.strong("Actions");
                    ui.end_row();

                    for image in &filtered {
                        ui.label(image.id.to_string());
                        ui.label(image_label(image))
                            .on_hover_text(image.description.as_deref().unwrap_or(""));
                        ui.label(app.patient_name(image.patient_id));
                        ui.label(image.image_type.as_deref().unwrap_or("-"));
                        ui.label(image.body_part.as_deref().unwrap_or("-"));
                        ui.label(image.tag.as_deref().unwrap_or("-"));
                        ui.label(
                            image
                                .uploaded_at
                                .map(|t| t.format("%Y-%m-%d").to_string())
                                .unwrap_or("-".to_string()),
                        );

                        ui.horizontal(|ui| {
                            if action_button(ui, DOWNLOAD_SIMPLE, "Download").clicked() {
                                action = Some(RowAction::Download((*image).clone()));
                            }
                            if can_report && action_button(ui, FILE_TEXT, "Write report").clicked() {
                                action = Some(RowAction::WriteReport(image.patient_id, image.id));
                            }
                            if can_delete && danger_action_button(ui, TRASH, "Delete").clicked() {
                                action = Some(RowAction::Delete(image.id, image_label(image)));
                            }
                        });
                        ui.end_row();
                    }
                });
        });
    }

    match action {
        Some(RowAction::Download(image)) => app.download_image(&image),
        Some(RowAction::WriteReport(patient_id, image_id)) => {
            app.report_form = ReportForm::for_image(patient_id, Some(image_id));
            app.open_panel(crate::routing::Panel::Reports);
        }
        Some(RowAction::Delete(id, name)) => {
            app.delete_target = Some(DeleteTarget::Image(id, name));
            app.show_delete_confirm = true;
        }
        None => {}
    }

    if app.upload_form.is_open {
        let ctx = ui.ctx().clone();
        show_upload_dialog(app, &ctx);
    }

    go_back
}

fn show_upload_dialog(app: &mut App, ctx: &egui::Context) {
    egui::Window::new("Upload Image")
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("upload_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    let form = &mut app.upload_form;

                    ui.label("File:");
                    ui.horizontal(|ui| {
                        let shown = form
                            .path
                            .as_ref()
                            .and_then(|p| p.file_name())
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "No file chosen".to_string());
                        ui.label(RichText::new(shown).monospace());
                        if ui.button(format!("{FOLDER_OPEN} Browse...")).clicked()
                            && let Some(path) = rfd::FileDialog::new()
                                .add_filter("Images", &["dcm", "png", "jpg", "jpeg"])
                                .add_filter("All files", &["*"])
                                .pick_file()
                        {
                            form.path = Some(path);
                        }
                    });
                    ui.end_row();

                    ui.label("Patient ID:");
                    ui.add(egui::TextEdit::singleline(&mut form.patient_id_input).desired_width(120.0));
                    ui.end_row();

                    ui.label("Image Type:");
                    egui::ComboBox::from_id_salt("upload_form_type")
                        .selected_text(form.image_type.as_str())
                        .show_ui(ui, |ui| {
                            for image_type in IMAGE_TYPES {
                                if ui.selectable_label(form.image_type == image_type, image_type).clicked() {
                                    form.image_type = image_type.to_string();
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Body Part:");
                    ui.add(egui::TextEdit::singleline(&mut form.body_part).desired_width(250.0));
                    ui.end_row();

                    ui.label("Tag:");
                    ui.add(egui::TextEdit::singleline(&mut form.tag).desired_width(250.0));
                    ui.end_row();

                    ui.label("Description:");
                    ui.add(egui::TextEdit::multiline(&mut form.description).desired_rows(2).desired_width(250.0));
                    ui.end_row();
                });

            match dialog_buttons(ui) {
                DialogAction::Cancel => app.upload_form.reset(),
                DialogAction::Save => app.upload_image(),
                DialogAction::None => {}
            }
        });
}
