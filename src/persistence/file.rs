//! JSON files on disk, one per key

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{PersistenceError, PersistenceResult, Storage};

/// Stores each record as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, err: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        key: key.to_string(),
        message: err.to_string(),
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> PersistenceResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key, err)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        fs::create_dir_all(&self.dir).map_err(|err| io_error(key, err))?;
        let path = self.path_for(key);
        // Temp file then rename over the record
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|err| io_error(key, err))?;
        fs::rename(&tmp, &path).map_err(|err| io_error(key, err))?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("tank-arena-test-{}", std::process::id()));
        let mut storage = FileStorage::new(&dir);
        assert_eq!(storage.read("profile").unwrap(), None);
        storage.write("profile", "{\"shields\":2}").unwrap();
        assert_eq!(
            storage.read("profile").unwrap().as_deref(),
            Some("{\"shields\":2}")
        );
        let _ = fs::remove_dir_all(&dir);
    }
}
