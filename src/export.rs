//! Excel export of patient lists and billing statements.

use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};

use crate::models::billing::outstanding_total;
use crate::models::{BillingAccount, Charge, Patient};

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x2E7D6B))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin)
}

fn write_headers(worksheet: &mut Worksheet, headers: &[&str], widths: &[f64]) -> Result<(), XlsxError> {
    let format = header_format();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    for (col, width) in widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}

/// Export the (possibly filtered) patient list.
pub fn export_patients_to_excel(patients: &[&Patient], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Patients")?;

    let headers = ["ID", "Full Name", "Email", "Phone", "Date of Birth", "Gender", "Address"];
    write_headers(worksheet, &headers, &[8.0, 28.0, 30.0, 16.0, 14.0, 10.0, 40.0])?;

    for (idx, patient) in patients.iter().enumerate() {
        let row = (idx + 1) as u32;

        worksheet.write_number(row, 0, patient.id as f64)?;
        worksheet.write_string(row, 1, patient.full_name())?;
        worksheet.write_string(row, 2, &patient.email)?;
        worksheet.write_string(row, 3, patient.phone_number.as_deref().unwrap_or(""))?;
        worksheet.write_string(
            row,
            4,
            patient.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
        )?;
        worksheet.write_string(row, 5, patient.gender.as_deref().unwrap_or(""))?;
        worksheet.write_string(row, 6, patient.address.as_deref().unwrap_or(""))?;
    }

    if !patients.is_empty() {
        worksheet.autofilter(0, 0, patients.len() as u32, (headers.len() - 1) as u16)?;
    }

    // Freeze top row
    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

/// Export one account's charges with an outstanding total row.
pub fn export_statement_to_excel(
    patient_name: &str,
    account: &BillingAccount,
    charges: &[Charge],
    path: &Path,
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Statement")?;

    let money = Format::new().set_num_format("#,##0.00");
    let bold = Format::new().set_bold();

    let headers = ["Charge #", "Date", "Description", "Service", "Status", "Amount"];
    write_headers(worksheet, &headers, &[10.0, 18.0, 36.0, 14.0, 12.0, 14.0])?;

    for (idx, charge) in charges.iter().enumerate() {
        let row = (idx + 1) as u32;

        worksheet.write_number(row, 0, charge.id as f64)?;
        worksheet.write_string(
            row,
            1,
            charge
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        )?;
        worksheet.write_string(row, 2, &charge.description)?;
        worksheet.write_string(row, 3, charge.service_type.as_deref().unwrap_or(""))?;
        worksheet.write_string(row, 4, charge.status.label())?;
        worksheet.write_number_with_format(row, 5, charge.amount, &money)?;
    }

    let summary_row = charges.len() as u32 + 2;
    worksheet.write_string_with_format(summary_row, 0, "Patient", &bold)?;
    worksheet.write_string(summary_row, 2, patient_name)?;
    worksheet.write_string_with_format(summary_row + 1, 0, "Insurance", &bold)?;
    worksheet.write_string(
        summary_row + 1,
        2,
        account.insurance_provider.as_deref().unwrap_or("None"),
    )?;
    worksheet.write_string_with_format(summary_row + 2, 0, "Outstanding", &bold)?;
    worksheet.write_number_with_format(summary_row + 2, 5, outstanding_total(charges), &money)?;

    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

/// Open save file dialog and return selected path.
pub fn show_save_dialog(default_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_file_name(default_name)
        .add_filter("Excel Files", &["xlsx"])
        .save_file()
}

/// Generate default filename for export.
pub fn generate_export_filename(prefix: &str) -> String {
    let now = Local::now();
    format!("{prefix}_{ts}.xlsx", ts = now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChargeStatus;

    #[test]
    fn test_generate_export_filename() {
        let name = generate_export_filename("patients");
        assert!(name.starts_with("patients_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn test_export_statement_writes_file() {
        let account = BillingAccount {
            id: 1,
            patient_id: 2,
            balance: 0.0,
            insurance_provider: Some("Acme Health".to_string()),
            policy_number: None,
        };
        let charges = vec![Charge {
            id: 10,
            account_id: 1,
            description: "CT scan".to_string(),
            amount: 450.0,
            status: ChargeStatus::Pending,
            service_type: Some("SCAN".to_string()),
            created_at: None,
        }];
        let path = std::env::temp_dir().join(format!("portal_statement_{}.xlsx", std::process::id()));

        export_statement_to_excel("Ada Lovelace", &account, &charges, &path).unwrap();
        assert!(path.exists());

        std::fs::remove_file(&path).ok();
    }
}
