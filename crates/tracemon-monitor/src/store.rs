use anyhow::{Context, Result};
use serde::Serialize;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracemon_model::TraceSnapshot;

/// Durable home of the last persisted snapshot.
pub trait SnapshotStore {
    /// Loads the last saved snapshot; an empty snapshot when nothing was saved yet.
    fn load(&self) -> Result<TraceSnapshot>;
    fn save(&self, snapshot: &TraceSnapshot) -> Result<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> Result<TraceSnapshot> {
        (**self).load()
    }

    fn save(&self, snapshot: &TraceSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

/// Snapshot kept as an indented JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<TraceSnapshot> {
        if !self.path.exists() {
            return Ok(TraceSnapshot::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file {:?}", self.path))?;
        serde_json::from_str(&non_finite_as_null(&contents))
            .with_context(|| format!("failed to parse state file {:?}", self.path))
    }

    fn save(&self, snapshot: &TraceSnapshot) -> Result<()> {
        write_json(&self.path, snapshot)
    }
}

/// State files written by Python's `json` module carry bare `Infinity`, `-Infinity`
/// and `NaN` tokens. They become `null`, which loads as an all-timeout hop.
fn non_finite_as_null(text: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    if !text.contains("Infinity") && !text.contains("NaN") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if !in_string {
            if let Some(token) = TOKENS.iter().find(|token| rest.starts_with(**token)) {
                out.push_str("null");
                rest = &rest[token.len()..];
                continue;
            }
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
    value.serialize(&mut serializer)?;
    replace_file(path, &json)
}

/// Stages `data` next to `path`, then renames it over the previous state.
fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create directory for state file {}", path.display()))?;
    }

    let staging = staging_path(path);
    let written = fs::File::create(&staging)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staging, path));

    if let Err(err) = written {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("cannot store snapshot in {}", path.display()));
    }

    if let Some(dir) = dir {
        if let Ok(handle) = fs::File::open(dir) {
            let _ = handle.sync_all();
        }
    }

    Ok(())
}

/// `<name>.<pid>.tmp` beside the state file; one coordinator owns each file.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracemon_model::HopRecord;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_restores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));
        let snapshot: TraceSnapshot = [
            HopRecord::new(1, "192.168.1.1", 1.5),
            HopRecord::new(2, "unknown", f64::INFINITY),
        ]
        .into_iter()
        .collect();

        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);

        let leftovers: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn written_file_is_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let snapshot: TraceSnapshot = [HopRecord::new(1, "10.0.0.1", 2.0)].into_iter().collect();

        store.save(&snapshot).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n    \"1\": {\n        \"ip\": \"10.0.0.1\""));
        assert!(text.contains("\"average_ping\": 2.0"));
    }

    #[test]
    fn loads_state_written_by_python_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traceroute_log.json");
        fs::write(
            &path,
            r#"{
    "1": {
        "ip": "192.168.1.1",
        "average_ping": 1.2895
    },
    "2": {
        "ip": "unknown",
        "average_ping": Infinity
    }
}"#,
        )
        .unwrap();

        let snapshot = JsonFileStore::new(path).load().unwrap();
        assert_eq!(snapshot.get(1).unwrap().address, "192.168.1.1");
        assert!(snapshot.get(2).unwrap().is_unknown());
        assert!(snapshot.get(2).unwrap().timed_out());
    }

    #[test]
    fn non_finite_tokens_inside_strings_are_kept() {
        let text = r#"{"1": {"ip": "Infinity \"NaN\"", "average_ping": NaN}}"#;
        assert_eq!(
            non_finite_as_null(text),
            r#"{"1": {"ip": "Infinity \"NaN\"", "average_ping": null}}"#
        );
        assert!(matches!(
            non_finite_as_null(r#"{"1": {"ip": "10.0.0.1", "average_ping": 2.0}}"#),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileStore::new(path).load().is_err());
    }
}
