//! Terminal tables for the record, grid and mapping views.

use std::collections::HashMap;

use prettytable::{Cell, Row, Table, format};

use crate::model::{MandaysRecord, ProjectMappingEntry, TimesheetRecord};
use crate::summary::{SummaryGrid, TOTAL_KEY};

/// Presentation class of one grid cell, decided from the cell coordinates
/// and value alone. The grid data itself is never touched; a zero in a
/// non-total cell is a gap worth flagging, not a different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEmphasis {
    Normal,
    ZeroGap,
    Total,
}

pub fn cell_emphasis(
    row_key: &str,
    col_key: &str,
    value: f64,
    is_total_row: bool,
    is_total_col: bool,
) -> CellEmphasis {
    if is_total_row || is_total_col || row_key == TOTAL_KEY || col_key == TOTAL_KEY {
        CellEmphasis::Total
    } else if value == 0.0 {
        CellEmphasis::ZeroGap
    } else {
        CellEmphasis::Normal
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table
}

fn value_cell(
    grid: &SummaryGrid,
    row_key: &str,
    col_key: &str,
    is_total_row: bool,
    is_total_col: bool,
) -> Cell {
    let value = grid.value(row_key, col_key);
    let style = match cell_emphasis(row_key, col_key, value, is_total_row, is_total_col) {
        CellEmphasis::Total if is_total_row && is_total_col => "bub",
        CellEmphasis::Total => "bc",
        CellEmphasis::ZeroGap => "cBr",
        CellEmphasis::Normal => "c",
    };
    Cell::new(&format!("{value:.2}")).style_spec(style)
}

/// The filtered record set, columns in query order.
pub fn records_table(records: &[TimesheetRecord]) -> Table {
    let mut table = base_table();
    table.set_titles(Row::new(vec![
        Cell::new("code"),
        Cell::new("date"),
        Cell::new("project"),
        Cell::new("module"),
        Cell::new("status"),
        Cell::new("billable"),
        Cell::new("man_hours"),
        Cell::new("name"),
        Cell::new("project_code"),
    ]));

    for record in records {
        table.add_row(Row::new(vec![
            Cell::new(&record.employee_code),
            Cell::new(&record.date.to_string()),
            Cell::new(record.project_name.as_deref().unwrap_or("")),
            Cell::new(record.module_name.as_deref().unwrap_or("")),
            Cell::new(record.status.as_str()),
            Cell::new(record.billable.as_str()),
            Cell::new(&record.man_hours.to_string()).style_spec("r"),
            Cell::new(&record.employee_name),
            Cell::new(record.project_code.as_deref().unwrap_or("")),
        ]));
    }
    table
}

/// A summary grid with one label column, a total column and a total row.
pub fn grid_table(grid: &SummaryGrid, row_label: &str) -> Table {
    let mut table = base_table();

    let mut header = vec![Cell::new(row_label).style_spec("b")];
    for col_key in grid.col_keys() {
        header.push(Cell::new(col_key).style_spec("bc"));
    }
    header.push(Cell::new(TOTAL_KEY).style_spec("bc"));
    table.set_titles(Row::new(header));

    for row_key in grid.row_keys() {
        let mut cells = vec![Cell::new(row_key)];
        for col_key in grid.col_keys() {
            cells.push(value_cell(grid, row_key, col_key, false, false));
        }
        cells.push(value_cell(grid, row_key, TOTAL_KEY, false, true));
        table.add_row(Row::new(cells));
    }

    let mut footer = vec![Cell::new(TOTAL_KEY).style_spec("b")];
    for col_key in grid.col_keys() {
        footer.push(value_cell(grid, TOTAL_KEY, col_key, true, false));
    }
    footer.push(value_cell(grid, TOTAL_KEY, TOTAL_KEY, true, true));
    table.add_row(Row::new(footer));

    table
}

/// The project by employee mandays grid. With a name index the label axis
/// splits into code and display name columns; without one only the raw
/// project key is shown.
pub fn mandays_table(grid: &SummaryGrid, names: Option<&HashMap<String, String>>) -> Table {
    let mut table = base_table();

    let mut header = match names {
        Some(_) => vec![
            Cell::new("project_code").style_spec("b"),
            Cell::new("project_name").style_spec("b"),
        ],
        None => vec![Cell::new("project").style_spec("b")],
    };
    for col_key in grid.col_keys() {
        header.push(Cell::new(col_key).style_spec("bc"));
    }
    header.push(Cell::new(TOTAL_KEY).style_spec("bc"));
    table.set_titles(Row::new(header));

    for row_key in grid.row_keys() {
        let mut cells = vec![Cell::new(row_key)];
        if let Some(names) = names {
            let display = names.get(row_key).map(String::as_str).unwrap_or("");
            cells.push(Cell::new(display));
        }
        for col_key in grid.col_keys() {
            cells.push(value_cell(grid, row_key, col_key, false, false));
        }
        cells.push(value_cell(grid, row_key, TOTAL_KEY, false, true));
        table.add_row(Row::new(cells));
    }

    let mut footer = vec![Cell::new(TOTAL_KEY).style_spec("b")];
    if names.is_some() {
        footer.push(Cell::new(""));
    }
    for col_key in grid.col_keys() {
        footer.push(value_cell(grid, TOTAL_KEY, col_key, true, false));
    }
    footer.push(value_cell(grid, TOTAL_KEY, TOTAL_KEY, true, true));
    table.add_row(Row::new(footer));

    table
}

/// Raw mandays pairs, columns in query order.
pub fn mandays_records_table(records: &[MandaysRecord]) -> Table {
    let mut table = base_table();
    table.set_titles(Row::new(vec![
        Cell::new("project"),
        Cell::new("ops_project_id"),
        Cell::new("total_mandays"),
        Cell::new("employee_code"),
        Cell::new("remaining_billable_mandays"),
        Cell::new("remaining_non_billable_mandays"),
        Cell::new("remaining_mandays"),
    ]));

    for record in records {
        table.add_row(Row::new(vec![
            Cell::new(&record.project),
            Cell::new(&record.ops_project_id.to_string()).style_spec("r"),
            Cell::new(&format!("{:.2}", record.total_mandays)).style_spec("r"),
            Cell::new(&record.employee_code),
            Cell::new(&format!("{:.2}", record.remaining_billable_mandays)).style_spec("r"),
            Cell::new(&format!("{:.2}", record.remaining_non_billable_mandays)).style_spec("r"),
            Cell::new(&format!("{:.2}", record.remaining_mandays)).style_spec("r"),
        ]));
    }
    table
}

pub fn mapping_table(entries: &[ProjectMappingEntry]) -> Table {
    let mut table = base_table();
    table.set_titles(Row::new(vec![
        Cell::new("project_name"),
        Cell::new("project_code"),
    ]));
    for entry in entries {
        table.add_row(Row::new(vec![
            Cell::new(&entry.project_name),
            Cell::new(&entry.project_code),
        ]));
    }
    table
}
