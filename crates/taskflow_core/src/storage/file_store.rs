use super::KeyValueStore;
use crate::error::AppError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "storage.json";
const STORE_ENV_VAR: &str = "TASKFLOW_STORE_PATH";

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| AppError::persistence("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskflow").join(STORE_FILE_NAME))
    } else {
        let home =
            std::env::var("HOME").map_err(|_| AppError::persistence("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskflow")
            .join(STORE_FILE_NAME))
    }
}

/// A key/value store kept as a single JSON object on disk.
///
/// Every call goes to the file; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::persistence(format!("{}: {}", self.path.display(), err)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|err| {
            AppError::persistence(format!("invalid JSON in {}: {}", self.path.display(), err))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)?;
        }

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        // An unreadable file is replaced rather than blocking every later write.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
