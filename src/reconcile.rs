//! Display-name reconciliation against the project mapping.

use std::collections::HashMap;

use crate::model::{ProjectMappingEntry, TimesheetRecord};

/// Index from project code to curated display name, built once per run.
/// When several entries share a code, the first one in table order wins;
/// later duplicates are ignored.
pub fn name_index(entries: &[ProjectMappingEntry]) -> HashMap<String, String> {
    let mut index = HashMap::with_capacity(entries.len());
    for entry in entries {
        index
            .entry(entry.project_code.clone())
            .or_insert_with(|| entry.project_name.clone());
    }
    index
}

/// Replaces each record's project name with the mapped display name when
/// its code has an entry in the index. Codes match exactly, case included.
/// Records without a code, or with an unmapped one, keep their raw name.
pub fn apply(records: &mut [TimesheetRecord], index: &HashMap<String, String>) {
    for record in records.iter_mut() {
        if let Some(code) = &record.project_code {
            if let Some(name) = index.get(code) {
                record.project_name = Some(name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Billable, ManHours, Status};

    fn entry(name: &str, code: &str) -> ProjectMappingEntry {
        ProjectMappingEntry {
            project_name: name.to_string(),
            project_code: code.to_string(),
        }
    }

    fn record(project_name: Option<&str>, project_code: Option<&str>) -> TimesheetRecord {
        TimesheetRecord {
            employee_code: "A01".to_string(),
            date: "2024-01-01".parse().unwrap(),
            project_name: project_name.map(str::to_string),
            module_name: None,
            status: Status::Approved,
            billable: Billable::Billable,
            man_hours: ManHours::parse("04:00").unwrap(),
            employee_name: "Ada Lovelace".to_string(),
            project_code: project_code.map(str::to_string),
        }
    }

    #[test]
    fn mapped_codes_take_the_curated_name() {
        let index = name_index(&[entry("Alpha", "P001")]);
        let mut records = vec![
            record(Some("RawAlpha"), Some("P001")),
            record(Some("Mystery"), Some("P999")),
        ];

        apply(&mut records, &index);
        assert_eq!(records[0].project_name.as_deref(), Some("Alpha"));
        assert_eq!(records[1].project_name.as_deref(), Some("Mystery"));
    }

    #[test]
    fn records_without_a_code_pass_through() {
        let index = name_index(&[entry("Alpha", "P001")]);
        let mut records = vec![record(Some("Internal Ops"), None)];

        apply(&mut records, &index);
        assert_eq!(records[0].project_name.as_deref(), Some("Internal Ops"));
    }

    #[test]
    fn code_matching_is_case_sensitive() {
        let index = name_index(&[entry("Alpha", "P001")]);
        let mut records = vec![record(Some("RawAlpha"), Some("p001"))];

        apply(&mut records, &index);
        assert_eq!(records[0].project_name.as_deref(), Some("RawAlpha"));
    }

    #[test]
    fn reapplying_the_same_mapping_changes_nothing() {
        let index = name_index(&[entry("Alpha", "P001")]);
        let mut records = vec![record(Some("RawAlpha"), Some("P001"))];

        apply(&mut records, &index);
        let after_first: Vec<Option<String>> =
            records.iter().map(|r| r.project_name.clone()).collect();

        apply(&mut records, &index);
        let after_second: Vec<Option<String>> =
            records.iter().map(|r| r.project_name.clone()).collect();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn the_first_entry_wins_on_duplicate_codes() {
        let index = name_index(&[entry("First", "P001"), entry("Second", "P001")]);
        assert_eq!(index.get("P001").map(String::as_str), Some("First"));
    }
}
