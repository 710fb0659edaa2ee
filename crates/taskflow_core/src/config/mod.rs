use crate::error::AppError;
use crate::query::{Features, SortMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKFLOW_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub default_sort: SortMode,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub search: Option<bool>,
    pub due_dates: Option<bool>,
    pub categories: Option<bool>,
    pub default_sort: Option<SortMode>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| AppError::invalid_input("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskflow")
            .join(CONFIG_FILE_NAME))
    } else {
        let home =
            std::env::var("HOME").map_err(|_| AppError::invalid_input("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskflow")
            .join(CONFIG_FILE_NAME))
    }
}

/// Never fails: a missing file yields defaults silently, an unreadable or
/// invalid one yields defaults together with the error.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::invalid_input(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_input(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(search) = overrides.search {
        merged.features.search = search;
    }
    if let Some(due_dates) = overrides.due_dates {
        merged.features.due_dates = due_dates;
    }
    if let Some(categories) = overrides.categories {
        merged.features.categories = categories;
    }
    if let Some(sort) = overrides.default_sort {
        merged.default_sort = sort;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, load_config_from_path, load_config_with_fallback_from_path,
        merge_overrides,
    };
    use crate::query::{Features, SortMode};
    use std::fs;

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_with_fallback_from_path(&dir.path().join("missing.json"));

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_input"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let content = serde_json::json!({
            "features": { "due_dates": false },
            "default_sort": "alphabetical"
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();

        assert!(loaded.features.search);
        assert!(!loaded.features.due_dates);
        assert!(loaded.features.categories);
        assert_eq!(loaded.default_sort, SortMode::Alphabetical);
    }

    #[test]
    fn load_config_rejects_unknown_sort_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_sort": "random"}"#).unwrap();

        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn merge_overrides_updates_only_given_fields() {
        let base = Config {
            features: Features::default(),
            default_sort: SortMode::Completion,
        };
        let overrides = ConfigOverrides {
            categories: Some(false),
            default_sort: Some(SortMode::DueDate),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert!(merged.features.search);
        assert!(merged.features.due_dates);
        assert!(!merged.features.categories);
        assert_eq!(merged.default_sort, SortMode::DueDate);
        assert_eq!(base.default_sort, SortMode::Completion);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            features: Features {
                search: false,
                due_dates: true,
                categories: false,
            },
            default_sort: SortMode::CreatedAsc,
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }
}
