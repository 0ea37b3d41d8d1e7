use std::env;

/// Runtime settings, read once at startup. Values come from the process
/// environment; a local `.env` file is picked up before this runs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file with the timesheet schema.
    pub database_path: String,
    /// Backing file of the project mapping store.
    pub mapping_path: String,
    /// Directory exports land in when no explicit path is given.
    pub export_dir: String,
    /// How long a query waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        AppConfig {
            database_path: env::var("TIMESHEET_DB").unwrap_or("timesheet.db".to_string()),
            mapping_path: env::var("MAPPING_FILE")
                .unwrap_or("master_project_mapping.csv".to_string()),
            export_dir: env::var("EXPORT_DIR").unwrap_or(".".to_string()),
            busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5000),
        }
    }
}
