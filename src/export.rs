//! CSV and workbook exports for the report and mandays views.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

use crate::error::AppError;
use crate::model::{MandaysMetric, MandaysRecord, ProjectMappingEntry, TimesheetRecord};
use crate::summary::{SummaryGrid, TOTAL_KEY};

const FONT_NAME: &str = "Verdana";

const RECORD_HEADER: [&str; 9] = [
    "code",
    "date",
    "project",
    "module",
    "status",
    "billable",
    "man_hours",
    "name",
    "project_code",
];

/// Where an export lands: an explicit directory gets the default file name,
/// an explicit file path wins outright, no target falls back to the
/// configured export directory.
pub fn resolve_export_path(
    target: Option<&Path>,
    export_dir: &Path,
    file_name: &str,
) -> PathBuf {
    match target {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => export_dir.join(file_name),
    }
}

pub fn mandays_csv_name(metric: MandaysMetric) -> String {
    format!(
        "timesheet_per_project_{}_{}.csv",
        metric.slug(),
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

pub fn mandays_workbook_name() -> String {
    format!("remaining_mandays_{}.xlsx", Local::now().format("%Y%m%d_%H%M%S"))
}

/// The filtered record set, man hours as decimal hours so spreadsheets can
/// sum the column directly.
pub fn write_records_csv(path: &Path, records: &[TimesheetRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(RECORD_HEADER)?;
    for record in records {
        writer.write_record([
            record.employee_code.clone(),
            record.date.to_string(),
            record.project_name.clone().unwrap_or_default(),
            record.module_name.clone().unwrap_or_default(),
            record.status.as_str().to_string(),
            record.billable.as_str().to_string(),
            record.man_hours.hours().to_string(),
            record.employee_name.clone(),
            record.project_code.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn grid_row(grid: &SummaryGrid, row_key: &str) -> Vec<String> {
    let mut fields = vec![row_key.to_string()];
    for col_key in grid.col_keys() {
        fields.push(grid.value(row_key, col_key).to_string());
    }
    fields.push(grid.value(row_key, TOTAL_KEY).to_string());
    fields
}

/// A summary grid with its total column and total row. Values keep full
/// precision; rounding is left to whatever reads the file.
pub fn write_grid_csv(path: &Path, grid: &SummaryGrid, row_label: &str) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![row_label.to_string()];
    header.extend(grid.col_keys().map(String::from));
    header.push(TOTAL_KEY.to_string());
    writer.write_record(&header)?;

    for row_key in grid.row_keys() {
        writer.write_record(&grid_row(grid, row_key))?;
    }
    writer.write_record(&grid_row(grid, TOTAL_KEY))?;
    writer.flush()?;
    Ok(())
}

/// The mandays grid. With a name index the label axis splits into code and
/// name columns, mirroring the on-screen table.
pub fn write_mandays_csv(
    path: &Path,
    grid: &SummaryGrid,
    names: Option<&HashMap<String, String>>,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = match names {
        Some(_) => vec!["project_code".to_string(), "project_name".to_string()],
        None => vec!["project".to_string()],
    };
    header.extend(grid.col_keys().map(String::from));
    header.push(TOTAL_KEY.to_string());
    writer.write_record(&header)?;

    for row_key in grid.row_keys() {
        let mut fields = grid_row(grid, row_key);
        if let Some(names) = names {
            let display = names.get(row_key).cloned().unwrap_or_default();
            fields.insert(1, display);
        }
        writer.write_record(&fields)?;
    }

    let mut footer = grid_row(grid, TOTAL_KEY);
    if names.is_some() {
        footer.insert(1, String::new());
    }
    writer.write_record(&footer)?;
    writer.flush()?;
    Ok(())
}

/// The two-axis mandays workbook. Each employee gets a pair of columns under
/// a merged code header, split into billable and non-billable remainders on
/// the second header row. The label columns carry no header text.
pub fn write_mandays_workbook(
    path: &Path,
    records: &[MandaysRecord],
    names: Option<&HashMap<String, String>>,
) -> Result<(), AppError> {
    let billable = SummaryGrid::build(
        records
            .iter()
            .map(|r| (r.project.clone(), r.employee_code.clone(), r.remaining_billable_mandays)),
    );
    let non_billable = SummaryGrid::build(records.iter().map(|r| {
        (r.project.clone(), r.employee_code.clone(), r.remaining_non_billable_mandays)
    }));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_fmt = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_font_name(FONT_NAME)
        .set_font_size(10);
    let label_fmt = Format::new().set_font_name(FONT_NAME).set_font_size(10);
    let value_fmt = Format::new()
        .set_num_format("0.00")
        .set_align(FormatAlign::Center)
        .set_font_name(FONT_NAME)
        .set_font_size(10);
    let total_fmt = Format::new()
        .set_bold()
        .set_num_format("0.00")
        .set_align(FormatAlign::Center)
        .set_font_name(FONT_NAME)
        .set_font_size(10);

    let label_cols: u16 = if names.is_some() { 2 } else { 1 };
    for col in 0..label_cols {
        worksheet.write_string_with_format(0, col, "", &header_fmt)?;
        worksheet.write_string_with_format(1, col, "", &header_fmt)?;
    }
    worksheet.set_column_width(0, 16)?;
    if names.is_some() {
        worksheet.set_column_width(1, 32)?;
    }

    for (i, employee) in billable.col_keys().enumerate() {
        let col = label_cols + 2 * i as u16;
        worksheet.merge_range(0, col, 0, col + 1, employee, &header_fmt)?;
        worksheet.write_string_with_format(1, col, "Bill", &header_fmt)?;
        worksheet.write_string_with_format(1, col + 1, "Non Bill", &header_fmt)?;
        worksheet.set_column_width(col, 10)?;
        worksheet.set_column_width(col + 1, 10)?;
    }
    let total_col = label_cols + 2 * billable.data_col_count() as u16;
    worksheet.merge_range(0, total_col, 0, total_col + 1, TOTAL_KEY, &header_fmt)?;
    worksheet.write_string_with_format(1, total_col, "Bill", &header_fmt)?;
    worksheet.write_string_with_format(1, total_col + 1, "Non Bill", &header_fmt)?;
    worksheet.set_column_width(total_col, 10)?;
    worksheet.set_column_width(total_col + 1, 10)?;

    for (i, project) in billable.row_keys().enumerate() {
        let row = 2 + i as u32;
        worksheet.write_string_with_format(row, 0, project, &label_fmt)?;
        if let Some(names) = names {
            let display = names.get(project).map(String::as_str).unwrap_or("");
            worksheet.write_string_with_format(row, 1, display, &label_fmt)?;
        }
        for (j, employee) in billable.col_keys().enumerate() {
            let col = label_cols + 2 * j as u16;
            worksheet.write_number_with_format(
                row,
                col,
                billable.value(project, employee),
                &value_fmt,
            )?;
            worksheet.write_number_with_format(
                row,
                col + 1,
                non_billable.value(project, employee),
                &value_fmt,
            )?;
        }
        worksheet.write_number_with_format(
            row,
            total_col,
            billable.value(project, TOTAL_KEY),
            &value_fmt,
        )?;
        worksheet.write_number_with_format(
            row,
            total_col + 1,
            non_billable.value(project, TOTAL_KEY),
            &value_fmt,
        )?;
    }

    let total_row = 2 + billable.data_row_count() as u32;
    worksheet.write_string_with_format(total_row, 0, TOTAL_KEY, &total_fmt)?;
    if names.is_some() {
        worksheet.write_string_with_format(total_row, 1, "", &total_fmt)?;
    }
    for (j, employee) in billable.col_keys().enumerate() {
        let col = label_cols + 2 * j as u16;
        worksheet.write_number_with_format(
            total_row,
            col,
            billable.value(TOTAL_KEY, employee),
            &total_fmt,
        )?;
        worksheet.write_number_with_format(
            total_row,
            col + 1,
            non_billable.value(TOTAL_KEY, employee),
            &total_fmt,
        )?;
    }
    worksheet.write_number_with_format(total_row, total_col, billable.grand_total(), &total_fmt)?;
    worksheet.write_number_with_format(
        total_row,
        total_col + 1,
        non_billable.grand_total(),
        &total_fmt,
    )?;

    workbook.save(path)?;
    Ok(())
}

/// The mapping sheet mirrors the store layout: column A reserved, names in
/// column B, codes in column C, no header row.
pub fn write_mapping_workbook(path: &Path, entries: &[ProjectMappingEntry]) -> Result<(), AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (i, entry) in entries.iter().enumerate() {
        let row = i as u32;
        worksheet.write_string(row, 1, &entry.project_name)?;
        worksheet.write_string(row, 2, &entry.project_code)?;
    }
    worksheet.set_column_width(1, 40)?;
    worksheet.set_column_width(2, 16)?;

    workbook.save(path)?;
    Ok(())
}
