//! Project mapping store.
//!
//! The mapping is a flat name-per-code table kept in a headerless CSV file
//! with the spreadsheet column convention of the curated master list: the
//! first column is reserved and stays empty, the second holds the project
//! name, the third the project code. Every write replaces the whole table
//! through a temp file and an atomic rename, so readers never observe a
//! half-written file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::MappingError;
use crate::model::ProjectMappingEntry;

/// Content hash of the backing file. A save that passes the revision
/// observed at load fails when the file moved underneath the editor,
/// instead of silently dropping the other writer's work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRevision(String);

pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> MappingStore {
        MappingStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole table. Rows missing either the name or the code are
    /// dropped; an empty table is valid. Fails with `NotFound` when the
    /// backing file is absent so callers can degrade to raw identifiers.
    pub fn load(&self) -> Result<(Vec<ProjectMappingEntry>, MappingRevision), MappingError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(MappingError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        let entries = parse_entries(&bytes)?;
        Ok((entries, revision_of(&bytes)))
    }

    /// Replaces the whole table with the given entries. Entries with a
    /// blank name or code are excluded. With `expected` given, the write
    /// only goes through while the file still matches that revision.
    pub fn save(
        &self,
        entries: &[ProjectMappingEntry],
        expected: Option<&MappingRevision>,
    ) -> Result<MappingRevision, MappingError> {
        if let Some(expected) = expected {
            if self.current_revision()?.as_ref() != Some(expected) {
                return Err(MappingError::RevisionConflict);
            }
        }
        let bytes = serialize_entries(entries)?;
        self.install(&bytes)?;
        Ok(revision_of(&bytes))
    }

    /// Parses a candidate file without touching the store, for previews and
    /// upload validation.
    pub fn preview(source: &Path) -> Result<Vec<ProjectMappingEntry>, MappingError> {
        let bytes = fs::read(source)?;
        let entries = parse_entries(&bytes)?;
        if entries.is_empty() {
            return Err(MappingError::Malformed {
                path: source.to_path_buf(),
                reason: "no rows with both a project name and a project code".to_string(),
            });
        }
        Ok(entries)
    }

    /// Validates an uploaded file and installs it as the new table. The
    /// current file is left untouched unless validation passes.
    pub fn replace(&self, source: &Path) -> Result<usize, MappingError> {
        let entries = Self::preview(source)?;
        let bytes = serialize_entries(&entries)?;
        self.install(&bytes)?;
        Ok(entries.len())
    }

    fn current_revision(&self) -> Result<Option<MappingRevision>, MappingError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(revision_of(&bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn install(&self, bytes: &[u8]) -> Result<(), MappingError> {
        // Same directory, so the rename cannot cross filesystems.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn revision_of(bytes: &[u8]) -> MappingRevision {
    MappingRevision(hex::encode(Sha256::digest(bytes)))
}

fn parse_entries(bytes: &[u8]) -> Result<Vec<ProjectMappingEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record?;
        let name = record.get(1).unwrap_or("").trim();
        let code = record.get(2).unwrap_or("").trim();
        if name.is_empty() || code.is_empty() {
            continue;
        }
        entries.push(ProjectMappingEntry {
            project_name: name.to_string(),
            project_code: code.to_string(),
        });
    }
    Ok(entries)
}

fn serialize_entries(entries: &[ProjectMappingEntry]) -> Result<Vec<u8>, MappingError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for entry in entries {
            let name = entry.project_name.trim();
            let code = entry.project_code.trim();
            if name.is_empty() || code.is_empty() {
                continue;
            }
            writer.write_record(["", name, code])?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, code: &str) -> ProjectMappingEntry {
        ProjectMappingEntry {
            project_name: name.to_string(),
            project_code: code.to_string(),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        let entries = vec![entry("Alpha", "P001"), entry("Beta", "P002")];

        let saved = store.save(&entries, None).unwrap();
        let (loaded, revision) = store.load().unwrap();
        assert_eq!(loaded, entries);
        assert_eq!(revision, saved);
    }

    #[test]
    fn blank_entries_are_excluded_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        let entries = vec![entry("Alpha", "P001"), entry("", "P002"), entry("Gamma", "  ")];

        store.save(&entries, None).unwrap();
        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("Alpha", "P001")]);
    }

    #[test]
    fn loading_a_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        assert!(matches!(store.load(), Err(MappingError::NotFound { .. })));
    }

    #[test]
    fn ragged_and_padded_rows_still_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        fs::write(&path, ",Alpha,P001,ignored\nleftover\n,Beta,P002\n").unwrap();

        let store = MappingStore::new(&path);
        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("Alpha", "P001"), entry("Beta", "P002")]);
    }

    #[test]
    fn replace_rejects_files_without_usable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        store.save(&[entry("Alpha", "P001")], None).unwrap();

        let upload = dir.path().join("upload.csv");
        fs::write(&upload, ",name only,\n,,code only\n").unwrap();
        assert!(matches!(
            store.replace(&upload),
            Err(MappingError::Malformed { .. })
        ));

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("Alpha", "P001")]);
    }

    #[test]
    fn replace_rejects_unreadable_bytes_and_keeps_the_current_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        store.save(&[entry("Alpha", "P001")], None).unwrap();

        let upload = dir.path().join("upload.csv");
        fs::write(&upload, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert!(matches!(store.replace(&upload), Err(MappingError::Csv(_))));

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("Alpha", "P001")]);
    }

    #[test]
    fn replace_installs_a_valid_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        store.save(&[entry("Alpha", "P001")], None).unwrap();

        let upload = dir.path().join("upload.csv");
        fs::write(&upload, ",New Alpha,P001\n,Beta,P002\n").unwrap();
        assert_eq!(store.replace(&upload).unwrap(), 2);

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("New Alpha", "P001"), entry("Beta", "P002")]);
    }

    #[test]
    fn a_stale_revision_cannot_overwrite_newer_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        let stale = store.save(&[entry("Alpha", "P001")], None).unwrap();

        // Another editor writes in between.
        store.save(&[entry("Beta", "P002")], None).unwrap();

        let result = store.save(&[entry("Mine", "P003")], Some(&stale));
        assert!(matches!(result, Err(MappingError::RevisionConflict)));

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, vec![entry("Beta", "P002")]);
    }

    #[test]
    fn a_current_revision_saves_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mapping.csv"));
        store.save(&[entry("Alpha", "P001")], None).unwrap();

        let (mut entries, revision) = store.load().unwrap();
        entries.push(entry("Beta", "P002"));
        store.save(&entries, Some(&revision)).unwrap();

        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
    }
}
