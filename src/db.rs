//! SQLite access for the timesheet and mandays reports.
//!
//! The schema is the normalized timesheet database this tool reports on;
//! nothing here writes to it. Man-hour columns are `HH:MM` text, so the
//! queries compare against `'00:00'` to drop zero rows and the mandays
//! query converts them to seconds before dividing down to mandays.

use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::{MandaysRecord, TimesheetRecord};

/// Billable and non-billable timesheet lines unioned into one flat set.
/// A source row holds hours on both axes; each axis becomes its own output
/// line, tagged with the literal axis name, and only when its hours are
/// above zero.
const TIMESHEET_QUERY: &str = r#"
    SELECT employee_code AS code,
           timesheet.date AS date,
           CASE WHEN ops_project.project_name IS NOT NULL
                THEN ops_project.project_name
                ELSE NULL END AS project,
           CASE WHEN ops_static_module.module_name IS NOT NULL
                THEN ops_static_module.module_name
                WHEN ops_general_module.module_name IS NOT NULL
                THEN ops_general_module.module_name
                ELSE "module".module_name END AS module,
           tsp.parameter_name AS status,
           'Billable' AS billable,
           timesheet."manHoursBillable" AS man_hours,
           first_name || ' ' || last_name AS name,
           CASE WHEN project.project_code IS NOT NULL
                THEN project.project_code
                ELSE NULL END AS project_code
    FROM employee
    JOIN job ON employee.job_id = job.id
    JOIN timesheet ON employee.id = timesheet.employee_id
    JOIN ops_project ON timesheet.ops_project_id = ops_project.id
    JOIN timesheet_status ON timesheet.timesheet_status_id = timesheet_status.id
    JOIN parameter tsp ON timesheet_status.status_id = tsp.id
    LEFT JOIN project ON ops_project.project_id = project.id
    LEFT JOIN ops_static_module ON timesheet.ops_static_module_id = ops_static_module.id
    LEFT JOIN ops_project_module ON timesheet.ops_project_module_id = ops_project_module.id
    LEFT JOIN "module" ON ops_project_module.module_id = "module".id
    LEFT JOIN ops_general_module ON ops_project_module.ops_general_module_id = ops_general_module.id
    WHERE timesheet."manHoursBillable" > '00:00'
    AND timesheet.date BETWEEN ?1 AND ?2
    UNION ALL
    SELECT employee_code AS code,
           timesheet.date AS date,
           CASE WHEN ops_project.project_name IS NOT NULL
                THEN ops_project.project_name
                ELSE NULL END AS project,
           CASE WHEN ops_static_module.module_name IS NOT NULL
                THEN ops_static_module.module_name
                WHEN ops_general_module.module_name IS NOT NULL
                THEN ops_general_module.module_name
                ELSE "module".module_name END AS module,
           tsp.parameter_name AS status,
           'Non-Billable' AS billable,
           timesheet."manHoursNonBillable" AS man_hours,
           first_name || ' ' || last_name AS name,
           CASE WHEN project.project_code IS NOT NULL
                THEN project.project_code
                ELSE NULL END AS project_code
    FROM employee
    JOIN job ON employee.job_id = job.id
    JOIN timesheet ON employee.id = timesheet.employee_id
    JOIN ops_project ON timesheet.ops_project_id = ops_project.id
    JOIN timesheet_status ON timesheet.timesheet_status_id = timesheet_status.id
    JOIN parameter tsp ON timesheet_status.status_id = tsp.id
    LEFT JOIN project ON ops_project.project_id = project.id
    LEFT JOIN ops_static_module ON timesheet.ops_static_module_id = ops_static_module.id
    LEFT JOIN ops_project_module ON timesheet.ops_project_module_id = ops_project_module.id
    LEFT JOIN "module" ON ops_project_module.module_id = "module".id
    LEFT JOIN ops_general_module ON ops_project_module.ops_general_module_id = ops_general_module.id
    WHERE timesheet."manHoursNonBillable" > '00:00'
    AND timesheet.date BETWEEN ?1 AND ?2
    ORDER BY code, date, project, module, status, billable
"#;

/// Planned mandays per project and employee from the planning table, minus
/// mandays realized in the timesheet (summed seconds / 3600 / 8). Pairs
/// with no timesheet lines keep their full plan; overruns go negative.
const MANDAYS_QUERY: &str = r#"
    WITH planned AS (
        SELECT ops_project_mandays.ops_project_id AS ops_project_id,
               employee.employee_code AS employee_code,
               ops_project_mandays.billable_mandays AS billable_mandays,
               ops_project_mandays.non_billable_mandays AS non_billable_mandays
        FROM ops_project_mandays
        JOIN employee ON ops_project_mandays.employee_id = employee.id
    ),
    realized AS (
        SELECT timesheet.ops_project_id AS ops_project_id,
               employee.employee_code AS employee_code,
               SUM(strftime('%H', timesheet."manHoursBillable") * 3600
                 + strftime('%M', timesheet."manHoursBillable") * 60
                 + strftime('%S', timesheet."manHoursBillable")) / 3600.0 / 8.0
                   AS billable_mandays,
               SUM(strftime('%H', timesheet."manHoursNonBillable") * 3600
                 + strftime('%M', timesheet."manHoursNonBillable") * 60
                 + strftime('%S', timesheet."manHoursNonBillable")) / 3600.0 / 8.0
                   AS non_billable_mandays
        FROM timesheet
        JOIN employee ON timesheet.employee_id = employee.id
        GROUP BY timesheet.ops_project_id, employee.employee_code
    )
    SELECT CASE WHEN project.project_code IS NOT NULL
                THEN project.project_code
                ELSE ops_project.project_name END AS project,
           ops_project.id AS ops_project_id,
           planned.billable_mandays + planned.non_billable_mandays AS total_mandays,
           planned.employee_code AS employee_code,
           planned.billable_mandays - COALESCE(realized.billable_mandays, 0)
               AS remaining_billable_mandays,
           planned.non_billable_mandays - COALESCE(realized.non_billable_mandays, 0)
               AS remaining_non_billable_mandays,
           planned.billable_mandays + planned.non_billable_mandays
             - COALESCE(realized.billable_mandays, 0)
             - COALESCE(realized.non_billable_mandays, 0) AS remaining_mandays
    FROM planned
    JOIN ops_project ON planned.ops_project_id = ops_project.id
    LEFT JOIN project ON ops_project.project_id = project.id
    LEFT JOIN realized ON realized.ops_project_id = planned.ops_project_id
                      AND realized.employee_code = planned.employee_code
    ORDER BY project, employee_code
"#;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the configured database file. The handle is created once at
    /// startup and passed down into the report pipeline.
    pub fn open(config: &AppConfig) -> Result<Database, AppError> {
        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Ok(Database { conn })
    }

    /// Timesheet lines between the two dates, both ends inclusive.
    pub fn load_timesheet(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetRecord>, AppError> {
        let mut stmt = self.conn.prepare(TIMESHEET_QUERY)?;
        let rows = stmt.query_map(params![start, end], |row| {
            Ok(TimesheetRecord {
                employee_code: row.get(0)?,
                date: row.get(1)?,
                project_name: row.get(2)?,
                module_name: row.get(3)?,
                status: row.get(4)?,
                billable: row.get(5)?,
                man_hours: row.get(6)?,
                employee_name: row.get(7)?,
                project_code: row.get(8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Planned-versus-realized mandays for every planned project and
    /// employee pair.
    pub fn load_mandays(&self) -> Result<Vec<MandaysRecord>, AppError> {
        let mut stmt = self.conn.prepare(MANDAYS_QUERY)?;
        let rows = stmt.query_map([], |row| {
            Ok(MandaysRecord {
                project: row.get(0)?,
                ops_project_id: row.get(1)?,
                total_mandays: row.get(2)?,
                employee_code: row.get(3)?,
                remaining_billable_mandays: row.get(4)?,
                remaining_non_billable_mandays: row.get(5)?,
                remaining_mandays: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Billable, Status};

    const SCHEMA: &str = r#"
        CREATE TABLE job (id INTEGER PRIMARY KEY);
        CREATE TABLE employee (
            id INTEGER PRIMARY KEY,
            job_id INTEGER NOT NULL,
            employee_code TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        );
        CREATE TABLE project (id INTEGER PRIMARY KEY, project_code TEXT);
        CREATE TABLE ops_project (
            id INTEGER PRIMARY KEY,
            project_id INTEGER,
            project_name TEXT
        );
        CREATE TABLE parameter (id INTEGER PRIMARY KEY, parameter_name TEXT NOT NULL);
        CREATE TABLE timesheet_status (id INTEGER PRIMARY KEY, status_id INTEGER NOT NULL);
        CREATE TABLE ops_static_module (id INTEGER PRIMARY KEY, module_name TEXT);
        CREATE TABLE "module" (id INTEGER PRIMARY KEY, module_name TEXT);
        CREATE TABLE ops_general_module (id INTEGER PRIMARY KEY, module_name TEXT);
        CREATE TABLE ops_project_module (
            id INTEGER PRIMARY KEY,
            module_id INTEGER,
            ops_general_module_id INTEGER
        );
        CREATE TABLE timesheet (
            id INTEGER PRIMARY KEY,
            employee_id INTEGER NOT NULL,
            ops_project_id INTEGER NOT NULL,
            timesheet_status_id INTEGER NOT NULL,
            ops_static_module_id INTEGER,
            ops_project_module_id INTEGER,
            date TEXT NOT NULL,
            "manHoursBillable" TEXT NOT NULL DEFAULT '00:00',
            "manHoursNonBillable" TEXT NOT NULL DEFAULT '00:00'
        );
        CREATE TABLE ops_project_mandays (
            id INTEGER PRIMARY KEY,
            ops_project_id INTEGER NOT NULL,
            employee_id INTEGER NOT NULL,
            billable_mandays REAL NOT NULL,
            non_billable_mandays REAL NOT NULL
        );
    "#;

    fn test_db() -> Database {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO job (id) VALUES (1);
             INSERT INTO employee (id, job_id, employee_code, first_name, last_name)
                 VALUES (1, 1, 'A01', 'Ada', 'Lovelace'),
                        (2, 1, 'B02', 'Brian', 'Kernighan');
             INSERT INTO parameter (id, parameter_name)
                 VALUES (1, 'Draft'), (2, 'Pending'), (3, 'Modified'), (4, 'Approved');
             INSERT INTO timesheet_status (id, status_id)
                 VALUES (1, 1), (2, 2), (3, 3), (4, 4);
             INSERT INTO project (id, project_code) VALUES (1, 'P001');
             INSERT INTO ops_project (id, project_id, project_name)
                 VALUES (1, 1, 'RawAlpha'), (2, NULL, 'Internal Ops');",
        )
        .unwrap();
        Database { conn }
    }

    fn insert_timesheet(
        db: &Database,
        employee_id: i64,
        ops_project_id: i64,
        status_id: i64,
        date: &str,
        billable: &str,
        non_billable: &str,
    ) {
        insert_timesheet_with_modules(
            db,
            employee_id,
            ops_project_id,
            status_id,
            date,
            billable,
            non_billable,
            None,
            None,
        );
    }

    fn insert_timesheet_with_modules(
        db: &Database,
        employee_id: i64,
        ops_project_id: i64,
        status_id: i64,
        date: &str,
        billable: &str,
        non_billable: &str,
        static_module_id: Option<i64>,
        project_module_id: Option<i64>,
    ) {
        db.conn
            .execute(
                "INSERT INTO timesheet
                     (employee_id, ops_project_id, timesheet_status_id,
                      ops_static_module_id, ops_project_module_id, date,
                      \"manHoursBillable\", \"manHoursNonBillable\")
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    employee_id,
                    ops_project_id,
                    status_id,
                    static_module_id,
                    project_module_id,
                    date,
                    billable,
                    non_billable
                ],
            )
            .unwrap();
    }

    fn date(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test]
    fn each_nonzero_axis_becomes_its_own_line() {
        let db = test_db();
        insert_timesheet(&db, 1, 1, 4, "2024-01-02", "07:30", "01:00");

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        assert_eq!(records.len(), 2);

        let billable = &records[0];
        assert_eq!(billable.employee_code, "A01");
        assert_eq!(billable.employee_name, "Ada Lovelace");
        assert_eq!(billable.date, date("2024-01-02"));
        assert_eq!(billable.project_name.as_deref(), Some("RawAlpha"));
        assert_eq!(billable.project_code.as_deref(), Some("P001"));
        assert_eq!(billable.module_name, None);
        assert_eq!(billable.status, Status::Approved);
        assert_eq!(billable.billable, Billable::Billable);
        assert_eq!(billable.man_hours.hours(), 7.5);

        let non_billable = &records[1];
        assert_eq!(non_billable.billable, Billable::NonBillable);
        assert_eq!(non_billable.man_hours.hours(), 1.0);
    }

    #[test]
    fn zero_hour_axes_never_appear() {
        let db = test_db();
        insert_timesheet(&db, 1, 1, 4, "2024-01-03", "04:00", "00:00");
        insert_timesheet(&db, 2, 1, 4, "2024-01-03", "00:00", "00:00");

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employee_code, "A01");
        assert_eq!(records[0].billable, Billable::Billable);
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let db = test_db();
        for day in ["2023-12-31", "2024-01-01", "2024-01-07", "2024-01-08"] {
            insert_timesheet(&db, 1, 1, 4, day, "01:00", "00:00");
        }

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date("2024-01-01"), date("2024-01-07")]);
    }

    #[test]
    fn statuses_come_from_the_parameter_table() {
        let db = test_db();
        insert_timesheet(&db, 1, 1, 1, "2024-01-02", "01:00", "00:00");
        insert_timesheet(&db, 1, 1, 2, "2024-01-03", "01:00", "00:00");
        insert_timesheet(&db, 1, 1, 3, "2024-01-04", "01:00", "00:00");

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        let statuses: Vec<Status> = records.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![Status::Draft, Status::Pending, Status::Modified]);
    }

    #[test]
    fn unmapped_projects_have_no_code() {
        let db = test_db();
        insert_timesheet(&db, 1, 2, 4, "2024-01-02", "02:00", "00:00");

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_name.as_deref(), Some("Internal Ops"));
        assert_eq!(records[0].project_code, None);
    }

    #[test]
    fn module_name_prefers_static_then_general_then_plain() {
        let db = test_db();
        db.conn
            .execute_batch(
                "INSERT INTO ops_static_module (id, module_name) VALUES (1, 'Static Module');
                 INSERT INTO \"module\" (id, module_name) VALUES (1, 'Plain Module');
                 INSERT INTO ops_general_module (id, module_name) VALUES (1, 'General Module');
                 INSERT INTO ops_project_module (id, module_id, ops_general_module_id)
                     VALUES (1, 1, NULL), (2, 1, 1);",
            )
            .unwrap();
        insert_timesheet_with_modules(&db, 1, 1, 4, "2024-01-02", "01:00", "00:00", Some(1), Some(2));
        insert_timesheet_with_modules(&db, 1, 1, 4, "2024-01-03", "01:00", "00:00", None, Some(2));
        insert_timesheet_with_modules(&db, 1, 1, 4, "2024-01-04", "01:00", "00:00", None, Some(1));

        let records = db
            .load_timesheet(date("2024-01-01"), date("2024-01-07"))
            .unwrap();
        let modules: Vec<Option<&str>> = records.iter().map(|r| r.module_name.as_deref()).collect();
        assert_eq!(
            modules,
            vec![Some("Static Module"), Some("General Module"), Some("Plain Module")]
        );
    }

    #[test]
    fn mandays_subtract_realized_hours_from_the_plan() {
        let db = test_db();
        db.conn
            .execute_batch(
                "INSERT INTO ops_project_mandays
                     (ops_project_id, employee_id, billable_mandays, non_billable_mandays)
                 VALUES (1, 1, 10.0, 2.0);",
            )
            .unwrap();
        insert_timesheet(&db, 1, 1, 4, "2024-01-02", "08:00", "00:00");
        insert_timesheet(&db, 1, 1, 4, "2024-01-03", "08:00", "02:00");

        let records = db.load_mandays().unwrap();
        assert_eq!(records.len(), 1);

        let pair = &records[0];
        assert_eq!(pair.project, "P001");
        assert_eq!(pair.ops_project_id, 1);
        assert_eq!(pair.employee_code, "A01");
        assert_eq!(pair.total_mandays, 12.0);
        assert_eq!(pair.remaining_billable_mandays, 8.0);
        assert_eq!(pair.remaining_non_billable_mandays, 1.75);
        assert_eq!(pair.remaining_mandays, 9.75);
    }

    #[test]
    fn pairs_without_timesheet_lines_keep_their_full_plan() {
        let db = test_db();
        db.conn
            .execute_batch(
                "INSERT INTO ops_project_mandays
                     (ops_project_id, employee_id, billable_mandays, non_billable_mandays)
                 VALUES (1, 2, 5.0, 0.0);",
            )
            .unwrap();

        let records = db.load_mandays().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employee_code, "B02");
        assert_eq!(records[0].remaining_billable_mandays, 5.0);
        assert_eq!(records[0].remaining_mandays, 5.0);
    }

    #[test]
    fn mandays_fall_back_to_the_raw_name_for_codeless_projects() {
        let db = test_db();
        db.conn
            .execute_batch(
                "INSERT INTO ops_project_mandays
                     (ops_project_id, employee_id, billable_mandays, non_billable_mandays)
                 VALUES (2, 1, 1.0, 1.0), (1, 1, 3.0, 0.0);",
            )
            .unwrap();

        let records = db.load_mandays().unwrap();
        let projects: Vec<&str> = records.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(projects, vec!["Internal Ops", "P001"]);
    }

    #[test]
    fn overruns_go_negative() {
        let db = test_db();
        db.conn
            .execute_batch(
                "INSERT INTO ops_project_mandays
                     (ops_project_id, employee_id, billable_mandays, non_billable_mandays)
                 VALUES (1, 1, 1.0, 0.0);",
            )
            .unwrap();
        insert_timesheet(&db, 1, 1, 4, "2024-01-02", "08:00", "00:00");
        insert_timesheet(&db, 1, 1, 4, "2024-01-03", "08:00", "00:00");

        let records = db.load_mandays().unwrap();
        assert_eq!(records[0].remaining_billable_mandays, -1.0);
        assert_eq!(records[0].remaining_mandays, -1.0);
    }
}
