//! Configuration management for laundry-survey.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::entry::{ENTRIES_TABLE_NAME, PHOTO_PATH_PREFIX, STORAGE_BUCKET_NAME};
use crate::error::{Error, Result};
use crate::export::{EXPORT_FILE_NAME, SHEET_NAME};
use crate::gateway::local::schema::is_valid_table_name;
use crate::geo::Coordinates;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "laundry-survey";

/// Default local database file name.
const DATABASE_FILE_NAME: &str = "entries.db";

/// Default local objects directory name.
const OBJECTS_DIR_NAME: &str = "objects";

/// Environment variable prefix.
const ENV_PREFIX: &str = "LAUNDRY_SURVEY_";

/// Longest sheet name a workbook accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LAUNDRY_SURVEY_`, sections
///    separated by `__`, e.g. `LAUNDRY_SURVEY_BACKEND__API_KEY`)
/// 2. TOML config file at `~/.config/laundry-survey/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend configuration.
    pub backend: BackendConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Dashboard configuration.
    pub dashboard: DashboardConfig,
    /// Fallback position when none is given on the command line.
    pub location: LocationConfig,
}

/// Which gateway to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted database and object storage over HTTP.
    Rest,
    /// Local `SQLite` file and objects directory.
    #[default]
    Local,
    /// Process memory; nothing survives the process.
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rest => write!(f, "rest"),
            Self::Local => write!(f, "local"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Backend-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Gateway to use.
    pub kind: BackendKind,
    /// Project URL of the hosted backend.
    pub url: Option<String>,
    /// API key of the hosted backend.
    pub api_key: Option<String>,
    /// Entries table name.
    pub table: String,
    /// Photo storage bucket.
    pub bucket: String,
    /// Object path prefix for photos.
    pub photo_prefix: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Local database path.
    /// Defaults to `~/.local/share/laundry-survey/entries.db`
    pub database_path: Option<PathBuf>,
    /// Local objects directory.
    /// Defaults to `~/.local/share/laundry-survey/objects`
    pub objects_dir: Option<PathBuf>,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Worksheet name.
    pub sheet_name: String,
    /// Output file name.
    pub file_name: String,
    /// Output directory. Defaults to the current directory.
    pub directory: Option<PathBuf>,
}

/// Dashboard-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Rows per page.
    pub page_size: usize,
}

/// Fallback device position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            api_key: None,
            table: ENTRIES_TABLE_NAME.to_string(),
            bucket: STORAGE_BUCKET_NAME.to_string(),
            photo_prefix: PHOTO_PATH_PREFIX.to_string(),
            timeout_secs: 30,
            database_path: None, // Resolved at runtime
            objects_dir: None,   // Resolved at runtime
        }
    }
}

impl BackendConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: SHEET_NAME.to_string(),
            file_name: EXPORT_FILE_NAME.to_string(),
            directory: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            page_size: crate::dashboard::DEFAULT_PAGE_SIZE,
        }
    }
}

impl LocationConfig {
    /// The configured position, if both coordinates are set.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is out of range.
    pub fn coordinates(&self) -> Result<Option<Coordinates>> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).map(Some),
            _ => Ok(None),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let backend = &self.backend;

        if backend.kind == BackendKind::Rest {
            let Some(url) = backend.url.as_deref() else {
                return Err(invalid("backend.url is required for the rest backend"));
            };
            if reqwest::Url::parse(url).is_err() {
                return Err(invalid(format!("backend.url is not a valid URL: {url}")));
            }
            if backend.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(invalid("backend.api_key is required for the rest backend"));
            }
        }

        if !is_valid_table_name(&backend.table) {
            return Err(invalid(format!("invalid table name: {}", backend.table)));
        }
        if backend.bucket.trim().is_empty() {
            return Err(invalid("backend.bucket must not be empty"));
        }
        if !is_valid_photo_prefix(&backend.photo_prefix) {
            return Err(invalid(format!(
                "backend.photo_prefix must be a relative path like \"establishments\": {:?}",
                backend.photo_prefix
            )));
        }
        if backend.timeout_secs == 0 {
            return Err(invalid("backend.timeout_secs must be greater than 0"));
        }

        if self.dashboard.page_size == 0 {
            return Err(invalid("dashboard.page_size must be greater than 0"));
        }

        let sheet_len = self.export.sheet_name.chars().count();
        if sheet_len == 0 || sheet_len > MAX_SHEET_NAME_LEN {
            return Err(invalid(format!(
                "export.sheet_name must be 1 to {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(invalid("export.file_name must not be empty"));
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(invalid(
                    "location.latitude and location.longitude must be set together",
                ));
            }
            _ => {}
        }
        self.location.coordinates().map_err(|e| invalid(e.to_string()))?;

        Ok(())
    }

    /// Get the local database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.backend
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the local objects directory, resolving defaults if not set.
    #[must_use]
    pub fn objects_dir(&self) -> PathBuf {
        self.backend
            .objects_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(OBJECTS_DIR_NAME))
    }

    /// Get the export path, resolving defaults if not set.
    #[must_use]
    pub fn export_path(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_default()
            .join(&self.export.file_name)
    }
}

/// Non-empty, relative, with no `.` or `..` segments. A trailing `/` is fine.
fn is_valid_photo_prefix(prefix: &str) -> bool {
    let trimmed = prefix.trim_end_matches('/');
    !trimmed.trim().is_empty()
        && !trimmed.starts_with('/')
        && trimmed
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.backend.kind, BackendKind::Local);
        assert_eq!(config.backend.table, "laundry_entries");
        assert_eq!(config.backend.bucket, "establishment-photos");
        assert_eq!(config.backend.photo_prefix, "establishments");
        assert_eq!(config.export.sheet_name, "Laundry Entries");
        assert_eq!(config.export.file_name, "Survey_Data.xlsx");
        assert_eq!(config.dashboard.page_size, 10);
        assert!(config.location.latitude.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rest_requires_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Rest;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("backend.url"));
    }

    #[test]
    fn test_validate_rest_requires_api_key() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Rest;
        config.backend.url = Some("https://project.example.co".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("backend.api_key"));

        config.backend.api_key = Some("anon".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rest_bad_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Rest;
        config.backend.url = Some("project dot example".to_string());
        config.backend.api_key = Some("anon".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("not a valid URL"));
    }

    #[test]
    fn test_validate_table_name() {
        let mut config = Config::default();
        config.backend.table = "laundry-entries".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_photo_prefix() {
        let mut config = Config::default();
        for bad in ["", "   ", "/", "/establishments", "../up", "a//b", "a/./b"] {
            config.backend.photo_prefix = bad.to_string();
            let err = config.validate().unwrap_err().to_string();
            assert!(err.contains("photo_prefix"), "{bad:?}: {err}");
        }
        for good in ["establishments", "establishments/", "pilot/2024"] {
            config.backend.photo_prefix = good.to_string();
            assert!(config.validate().is_ok(), "{good:?}");
        }
    }

    #[test]
    fn test_load_rejects_empty_photo_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nphoto_prefix = \"\"\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.dashboard.page_size = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("page_size"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_secs = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }

    #[test]
    fn test_validate_sheet_name_length() {
        let mut config = Config::default();
        config.export.sheet_name = "x".repeat(32);
        assert!(config.validate().is_err());
        config.export.sheet_name = "x".repeat(31);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_location_pairs() {
        let mut config = Config::default();
        config.location.latitude = Some(12.0);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("set together"));

        config.location.longitude = Some(77.0);
        assert!(config.validate().is_ok());

        config.location.latitude = Some(123.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_location_coordinates() {
        let location = LocationConfig {
            latitude: Some(1.0),
            longitude: Some(2.0),
        };
        let coords = location.coordinates().unwrap().unwrap();
        assert_eq!(coords.maps_link(), "https://www.google.com/maps?q=1,2");
        assert!(LocationConfig::default().coordinates().unwrap().is_none());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("entries.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.backend.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_objects_dir_default() {
        let config = Config::default();
        let dir = config.objects_dir();
        assert!(dir.to_string_lossy().contains("laundry-survey"));
        assert!(dir.ends_with("objects"));
    }

    #[test]
    fn test_export_path() {
        let mut config = Config::default();
        assert_eq!(config.export_path(), PathBuf::from("Survey_Data.xlsx"));
        config.export.directory = Some(PathBuf::from("/srv/exports"));
        assert_eq!(
            config.export_path(),
            PathBuf::from("/srv/exports/Survey_Data.xlsx")
        );
    }

    #[test]
    fn test_timeout() {
        let config = Config::default();
        assert_eq!(config.backend.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("laundry-survey"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.backend.table, Config::default().backend.table);
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backend]
kind = "rest"
url = "https://project.example.co"
api_key = "anon"

[dashboard]
page_size = 25
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Rest);
        assert_eq!(config.dashboard.page_size, 25);
        assert_eq!(config.backend.bucket, "establishment-photos");
    }

    #[test]
    fn test_load_invalid_toml_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nkind = \"rest\"\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_backend_kind_serde() {
        let json = serde_json::to_string(&BackendKind::Rest).unwrap();
        assert_eq!(json, "\"rest\"");
        let kind: BackendKind = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(kind, BackendKind::Memory);
        assert_eq!(BackendKind::Local.to_string(), "local");
    }

    #[test]
    fn test_backend_config_deserialize_partial() {
        let json = r#"{"kind": "rest", "timeout_secs": 5}"#;
        let backend: BackendConfig = serde_json::from_str(json).unwrap();
        assert_eq!(backend.kind, BackendKind::Rest);
        assert_eq!(backend.timeout_secs, 5);
        assert_eq!(backend.table, "laundry_entries");
    }
}
