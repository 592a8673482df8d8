//! Loading and saving the flat file.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::{PatientStore, StoreError, StoreResult};
use crate::codec::{decode_with_warnings, encode, is_header, Decoded, HEADER};

impl PatientStore {
    /// Replace the store's contents with the records in `path`.
    ///
    /// A missing file leaves the store empty. Malformed lines are kept as
    /// partially-default records and bytes that are not valid UTF-8 are
    /// replaced. Explicit ids keep their first owner in the file; records
    /// with id `0` or a repeated id get fresh ids afterwards, in file order.
    /// Returns the number of records loaded. On a read error the store is
    /// left empty.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> StoreResult<usize> {
        let path = path.as_ref();
        self.patients.clear();

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Data file not found, starting empty");
                return Ok(0);
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let contents = String::from_utf8_lossy(&bytes);
        if matches!(contents, Cow::Owned(_)) {
            warn!(path = %path.display(), "Data file is not valid UTF-8, unreadable bytes replaced");
        }

        let mut lines = contents.lines().enumerate().peekable();
        if lines.peek().is_some_and(|(_, line)| is_header(line)) {
            lines.next();
        }

        let mut claimed = HashSet::new();
        let mut needs_id = Vec::new();

        for (idx, line) in lines {
            let line_no = idx + 1;
            let line = if idx == 0 {
                line.trim_start_matches('\u{feff}')
            } else {
                line
            };
            if line.trim().is_empty() {
                continue;
            }

            let Decoded {
                mut patient,
                warnings,
            } = decode_with_warnings(line);
            for warning in &warnings {
                warn!(
                    path = %path.display(),
                    line = line_no,
                    %warning,
                    "Unreadable field, using default"
                );
            }

            if !patient.is_persisted() || !claimed.insert(patient.id) {
                needs_id.push((self.patients.len(), line_no, patient.id));
                patient.id = 0;
            }
            self.patients.push(patient);
        }

        for (pos, line_no, original_id) in needs_id {
            let id = self.next_id();
            self.patients[pos].id = id;
            warn!(
                path = %path.display(),
                line = line_no,
                original_id,
                assigned_id = id,
                "Missing or duplicate id, assigned a new one"
            );
        }

        debug!(path = %path.display(), count = self.patients.len(), "Loaded patients");
        Ok(self.patients.len())
    }

    /// Write a header and every record to `path`, replacing its contents.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        let path = path.as_ref();

        let mut out = String::with_capacity(HEADER.len() + 1 + self.patients.len() * 128);
        out.push_str(HEADER);
        out.push('\n');
        for patient in &self.patients {
            out.push_str(&encode(patient));
            out.push('\n');
        }

        fs::write(path, out).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), count = self.patients.len(), "Saved patients");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn patient(last_name: &str, diagnosis: &str) -> Patient {
        Patient {
            last_name: last_name.into(),
            first_name: "Test".into(),
            diagnosis: diagnosis.into(),
            ..Patient::default()
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PatientStore::new();
        store.add(patient("Stale", ""));

        let count = store.load(dir.path().join("absent.csv")).unwrap();
        assert_eq!(count, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_writes_header_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        let mut store = PatientStore::new();
        store.add(patient("Ivanov", "Flu"));
        store.save(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("1,\"Ivanov\""));
    }

    #[test]
    fn test_load_without_header_and_with_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        std::fs::write(
            &path,
            "2,\"Petrov\",\"Petr\"\r\n\r\n   \n4,\"Sidorov\",\"Sidor\"\n",
        )
        .unwrap();

        let mut store = PatientStore::new();
        assert_eq!(store.load(&path).unwrap(), 2);
        let ids: Vec<i32> = store.patients().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(store.patients()[1].first_name, "Sidor");
    }

    #[test]
    fn test_load_skips_header_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        std::fs::write(&path, format!("\u{feff}{}\n1,\"A\"\n", HEADER)).unwrap();

        let mut store = PatientStore::new();
        assert_eq!(store.load(&path).unwrap(), 1);
        assert_eq!(store.patients()[0].last_name, "A");
    }

    #[test]
    fn test_load_keeps_malformed_lines_with_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        std::fs::write(
            &path,
            format!("{}\n3,\"A\"\ngarbage\n3,\"B\"\n", HEADER),
        )
        .unwrap();

        let mut store = PatientStore::new();
        assert_eq!(store.load(&path).unwrap(), 3);
        let ids: Vec<i32> = store.patients().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(store.patients()[1].last_name, "");
        assert_eq!(store.patients()[2].last_name, "B");
    }

    #[test]
    fn test_load_explicit_ids_win_over_earlier_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        std::fs::write(
            &path,
            format!("{}\ngarbage\n1,\"Real\",\"Record\"\n", HEADER),
        )
        .unwrap();

        let mut store = PatientStore::new();
        assert_eq!(store.load(&path).unwrap(), 2);
        assert_eq!(store.get(1).unwrap().last_name, "Real");
        let ids: Vec<(i32, &str)> = store
            .patients()
            .iter()
            .map(|p| (p.id, p.last_name.as_str()))
            .collect();
        assert_eq!(ids, vec![(2, ""), (1, "Real")]);
    }

    #[test]
    fn test_load_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        let mut bytes = format!("{}\n1,\"Ivanov\",\"Ivan\"\n2,\"", HEADER).into_bytes();
        // "Петров" in CP1251
        bytes.extend_from_slice(&[0xCF, 0xE5, 0xF2, 0xF0, 0xEE, 0xE2]);
        bytes.extend_from_slice(b"\",\"Petr\"\n");
        std::fs::write(&path, bytes).unwrap();

        let mut store = PatientStore::new();
        assert_eq!(store.load(&path).unwrap(), 2);
        assert_eq!(store.get(1).unwrap().last_name, "Ivanov");
        let second = store.get(2).unwrap();
        assert!(second.last_name.contains('\u{fffd}'));
        assert_eq!(second.first_name, "Petr");
    }

    #[test]
    fn test_load_unreadable_file_leaves_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PatientStore::new();
        store.add(patient("Stale", ""));

        // A directory cannot be read as a file.
        let err = store.load(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PatientStore::new();
        let err = store
            .save(dir.path().join("no-such-dir").join("patients.csv"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
