//! Predicate filters applied to the reconciled record set.

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{Billable, Status, TimesheetRecord};

/// Filter criteria for the timesheet report. The predicates are pure and
/// AND-composed, so they can run in any order with the same result. Empty
/// selections impose no restriction at all.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    /// Case-insensitive substring matched against the employee code. The
    /// empty string matches every record.
    pub employee_code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub statuses: Vec<Status>,
    pub billable: Vec<Billable>,
    /// Project display names, matched after reconciliation. Records with
    /// no project never match a non-empty selection.
    pub projects: Vec<String>,
}

impl ReportFilter {
    /// True when start lies after end. The report warns about it and still
    /// runs; the range then simply matches nothing.
    pub fn range_is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn matches(&self, record: &TimesheetRecord) -> bool {
        self.matches_employee(record)
            && self.matches_date(record)
            && self.matches_status(record)
            && self.matches_billable(record)
            && self.matches_project(record)
    }

    fn matches_employee(&self, record: &TimesheetRecord) -> bool {
        if self.employee_code.is_empty() {
            return true;
        }
        record
            .employee_code
            .to_lowercase()
            .contains(&self.employee_code.to_lowercase())
    }

    fn matches_date(&self, record: &TimesheetRecord) -> bool {
        self.start <= record.date && record.date <= self.end
    }

    fn matches_status(&self, record: &TimesheetRecord) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&record.status)
    }

    fn matches_billable(&self, record: &TimesheetRecord) -> bool {
        self.billable.is_empty() || self.billable.contains(&record.billable)
    }

    fn matches_project(&self, record: &TimesheetRecord) -> bool {
        if self.projects.is_empty() {
            return true;
        }
        match &record.project_name {
            Some(name) => self.projects.contains(name),
            None => false,
        }
    }
}

/// Monday and Sunday of the week before the given day, the report's
/// default range.
pub fn previous_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_from_monday = i64::from(today.weekday().num_days_from_monday());
    let start = today - Duration::days(days_from_monday + 7);
    (start, start + Duration::days(6))
}
