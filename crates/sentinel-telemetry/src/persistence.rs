//! File-per-key JSON persistence helpers shared by the Audit Log and the Agent Registry

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Write `value` to `path` as pretty JSON, via a temp file + rename so a
/// reader never observes a partially written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> std::io::Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(std::io::Error::from)
}

pub fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn round_trips_through_atomic_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        write_json_atomic(&path, &Sample { value: 7 }).unwrap();
        let back: Sample = read_json(&path).unwrap();
        assert_eq!(back, Sample { value: 7 });
    }

    #[test]
    fn lists_only_json_files() {
        let dir = TempDir::new().unwrap();
        write_json_atomic(&dir.path().join("a.json"), &Sample { value: 1 }).unwrap();
        fs::write(dir.path().join("b.tmp"), b"not json").unwrap();
        assert_eq!(list_json_files(dir.path()).len(), 1);
    }
}
