//! Record types shared by the query, filter and report layers.

use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};

/// Workflow state of a timesheet line, as stored in the status parameter
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Status {
    Draft,
    Pending,
    Modified,
    Approved,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Pending => "Pending",
            Status::Modified => "Modified",
            Status::Approved => "Approved",
        }
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Draft" => Ok(Status::Draft),
            "Pending" => Ok(Status::Pending),
            "Modified" => Ok(Status::Modified),
            "Approved" => Ok(Status::Approved),
            other => Err(FromSqlError::Other(
                format!("unknown timesheet status '{other}'").into(),
            )),
        }
    }
}

/// Invoicing axis of a timesheet line. Each source row can carry hours on
/// both axes; the query emits one line per non-zero axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Billable {
    Billable,
    NonBillable,
}

impl Billable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Billable::Billable => "Billable",
            Billable::NonBillable => "Non-Billable",
        }
    }
}

impl FromSql for Billable {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Billable" => Ok(Billable::Billable),
            "Non-Billable" => Ok(Billable::NonBillable),
            other => Err(FromSqlError::Other(
                format!("unknown billable tag '{other}'").into(),
            )),
        }
    }
}

/// Worked duration, parsed from the schema's `HH:MM` or `HH:MM:SS` text
/// columns. Reports sum it as fractional hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ManHours {
    seconds: i64,
}

impl ManHours {
    pub fn parse(text: &str) -> Option<ManHours> {
        let mut parts = text.split(':');
        let hours: u32 = parts.next()?.parse().ok()?;
        let minutes: u32 = parts.next()?.parse().ok()?;
        let seconds: u32 = match parts.next() {
            Some(part) => part.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() || minutes > 59 || seconds > 59 {
            return None;
        }
        Some(ManHours {
            seconds: i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds),
        })
    }

    /// Total seconds divided by 3600.
    pub fn hours(&self) -> f64 {
        self.seconds as f64 / 3600.0
    }
}

impl FromSql for ManHours {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        ManHours::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("invalid man hours value '{text}'").into())
        })
    }
}

impl fmt::Display for ManHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.seconds / 3600;
        let minutes = self.seconds % 3600 / 60;
        let seconds = self.seconds % 60;
        if seconds == 0 {
            write!(f, "{hours:02}:{minutes:02}")
        } else {
            write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
        }
    }
}

/// One reported timesheet line as emitted by the combined billable and
/// non-billable query. Lines always carry a positive duration; zero rows
/// are excluded at the source.
#[derive(Debug, Clone)]
pub struct TimesheetRecord {
    pub employee_code: String,
    pub date: NaiveDate,
    pub project_name: Option<String>,
    pub module_name: Option<String>,
    pub status: Status,
    pub billable: Billable,
    pub man_hours: ManHours,
    pub employee_name: String,
    pub project_code: Option<String>,
}

/// Planned-versus-realized effort for one project and employee pair.
/// Remaining values go negative when the pair is overrun.
#[derive(Debug, Clone)]
pub struct MandaysRecord {
    /// Project code, falling back to the raw project name when the project
    /// was never assigned a code.
    pub project: String,
    pub ops_project_id: i64,
    /// Planned mandays for the pair, billable and non-billable combined.
    pub total_mandays: f64,
    pub employee_code: String,
    pub remaining_billable_mandays: f64,
    pub remaining_non_billable_mandays: f64,
    pub remaining_mandays: f64,
}

/// Which remaining mandays column feeds the project grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MandaysMetric {
    Total,
    Billable,
    NonBillable,
}

impl MandaysMetric {
    pub fn title(&self) -> &'static str {
        match self {
            MandaysMetric::Total => "Total Remaining Mandays",
            MandaysMetric::Billable => "Remaining Billable Mandays",
            MandaysMetric::NonBillable => "Remaining Non-Billable Mandays",
        }
    }

    /// Column name, used in export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            MandaysMetric::Total => "remaining_mandays",
            MandaysMetric::Billable => "remaining_billable_mandays",
            MandaysMetric::NonBillable => "remaining_non_billable_mandays",
        }
    }

    pub fn value_of(&self, record: &MandaysRecord) -> f64 {
        match self {
            MandaysMetric::Total => record.remaining_mandays,
            MandaysMetric::Billable => record.remaining_billable_mandays,
            MandaysMetric::NonBillable => record.remaining_non_billable_mandays,
        }
    }
}

/// One row of the curated project mapping: a display name per project code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMappingEntry {
    pub project_name: String,
    pub project_code: String,
}

impl fmt::Display for ProjectMappingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.project_code, self.project_name)
    }
}
