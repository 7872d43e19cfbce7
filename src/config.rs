//! Settings loading and validation.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `AQUAWATCH_*` environment variables (`__`
//! separates nested keys, e.g. `AQUAWATCH_STORE__PROJECT`). Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! refresh = "30s"
//! range = "24h"
//! page_size = 100
//! theme = "auto"
//!
//! [store]
//! project = "my-project"
//! database = "water"
//! collection = "readings"
//! api_key = "..."
//!
//! [thresholds.ph]
//! warning_low = 6.8
//! warning_high = 8.2
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aquawatch_adapters::{AdapterError, ReadingStore};
use aquawatch_types::{Parameter, TimeRange};

use crate::data::duration::parse_duration;
use crate::data::{Band, InvalidBand, ThresholdPolicy};
use crate::source::{FileStore, DEFAULT_PAGE_SIZE};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AQUAWATCH";

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("invalid thresholds for {parameter}: {source}")]
    Thresholds {
        parameter: Parameter,
        source: InvalidBand,
    },

    #[error("cannot open reading store: {0}")]
    Store(#[from] AdapterError),
}

/// Terminal color scheme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    /// Detect from the terminal background.
    #[default]
    Auto,
    Dark,
    Light,
}

impl fmt::Display for ThemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemeChoice::Auto => "auto",
            ThemeChoice::Dark => "dark",
            ThemeChoice::Light => "light",
        })
    }
}

impl FromStr for ThemeChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ThemeChoice::Auto),
            "dark" => Ok(ThemeChoice::Dark),
            "light" => Ok(ThemeChoice::Light),
            other => Err(format!("expected auto, dark or light, got '{}'", other)),
        }
    }
}

/// Raw settings as read from file and environment.
///
/// Durations, the range and the theme stay strings here and are checked by
/// [`Settings::resolve`], so every mistake is reported with the key at fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

fn default_refresh() -> String {
    "30s".to_string()
}

fn default_range() -> String {
    TimeRange::default().to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_theme() -> String {
    ThemeChoice::default().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
            range: default_range(),
            page_size: default_page_size(),
            theme: default_theme(),
            store: StoreSettings::default(),
            thresholds: ThresholdOverrides::default(),
        }
    }
}

/// Connection settings for the Appwrite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub project: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub jwt: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_endpoint() -> String {
    "https://cloud.appwrite.io/v1".to_string()
}

fn default_timeout() -> String {
    "10s".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project: None,
            database: None,
            collection: None,
            jwt: None,
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

/// Partial band; unset bounds keep their default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandOverride {
    pub warning_low: Option<f64>,
    pub warning_high: Option<f64>,
    pub critical_low: Option<f64>,
    pub critical_high: Option<f64>,
}

impl BandOverride {
    fn apply(&self, band: &mut Band) {
        if let Some(v) = self.warning_low {
            band.warning_low = Some(v);
        }
        if let Some(v) = self.warning_high {
            band.warning_high = Some(v);
        }
        if let Some(v) = self.critical_low {
            band.critical_low = Some(v);
        }
        if let Some(v) = self.critical_high {
            band.critical_high = Some(v);
        }
    }
}

/// Per-parameter threshold overrides (`[thresholds.<param>]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub ph: Option<BandOverride>,
    pub temperature: Option<BandOverride>,
    pub turbidity: Option<BandOverride>,
    pub tds: Option<BandOverride>,
}

impl ThresholdOverrides {
    fn get(&self, parameter: Parameter) -> Option<&BandOverride> {
        match parameter {
            Parameter::Ph => self.ph.as_ref(),
            Parameter::Temperature => self.temperature.as_ref(),
            Parameter::Turbidity => self.turbidity.as_ref(),
            Parameter::Tds => self.tds.as_ref(),
        }
    }

    /// The default policy with these overrides applied, validated.
    pub fn policy(&self) -> Result<ThresholdPolicy, ConfigError> {
        let mut policy = ThresholdPolicy::default();
        for parameter in Parameter::ALL {
            if let Some(o) = self.get(parameter) {
                o.apply(policy.band_mut(parameter));
            }
        }
        policy
            .validate()
            .map_err(|(parameter, source)| ConfigError::Thresholds { parameter, source })?;
        Ok(policy)
    }
}

/// Validated settings ready for use.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub refresh: Duration,
    pub range: TimeRange,
    pub page_size: usize,
    pub theme: ThemeChoice,
    pub policy: ThresholdPolicy,
    pub store: StoreSettings,
    pub store_timeout: Duration,
}

impl Settings {
    /// Load settings from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(path, None)
    }

    /// Load settings, reading environment variables from `env` instead of the
    /// process environment when given.
    fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string (without environment).
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Check every value and convert to runtime types.
    pub fn resolve(&self) -> Result<ResolvedSettings, ConfigError> {
        let refresh = parse_duration(&self.refresh).map_err(|e| ConfigError::Invalid {
            field: "refresh",
            message: e.to_string(),
        })?;
        if refresh.is_zero() {
            return Err(ConfigError::Invalid {
                field: "refresh",
                message: "interval must be greater than zero".to_string(),
            });
        }

        let range = self.range.parse::<TimeRange>().map_err(|e| ConfigError::Invalid {
            field: "range",
            message: e.to_string(),
        })?;

        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                message: "must be at least 1".to_string(),
            });
        }

        let theme = self
            .theme
            .parse::<ThemeChoice>()
            .map_err(|message| ConfigError::Invalid { field: "theme", message })?;

        let store_timeout = parse_duration(&self.store.timeout).map_err(|e| ConfigError::Invalid {
            field: "store.timeout",
            message: e.to_string(),
        })?;

        Ok(ResolvedSettings {
            refresh,
            range,
            page_size: self.page_size,
            theme,
            policy: self.thresholds.policy()?,
            store: self.store.clone(),
            store_timeout,
        })
    }
}

impl ResolvedSettings {
    /// Open the reading store: a JSON file when `file` is given, otherwise
    /// the configured Appwrite collection.
    pub fn open_store(&self, file: Option<&Path>) -> Result<Arc<dyn ReadingStore>, ConfigError> {
        if let Some(path) = file {
            return Ok(Arc::new(FileStore::new(path)));
        }
        self.open_remote_store()
    }

    #[cfg(feature = "appwrite")]
    fn open_remote_store(&self) -> Result<Arc<dyn ReadingStore>, ConfigError> {
        use aquawatch_adapters::appwrite::AppwriteStore;

        let store = &self.store;
        let mut builder = AppwriteStore::builder()
            .endpoint(&store.endpoint)
            .timeout(self.store_timeout);
        if let Some(ref project) = store.project {
            builder = builder.project(project);
        }
        if let Some(ref database) = store.database {
            builder = builder.database(database);
        }
        if let Some(ref collection) = store.collection {
            builder = builder.collection(collection);
        }
        if let Some(ref key) = store.api_key {
            builder = builder.api_key(key);
        } else if let Some(ref jwt) = store.jwt {
            builder = builder.jwt(jwt);
        }
        Ok(Arc::new(builder.build()?))
    }

    #[cfg(not(feature = "appwrite"))]
    fn open_remote_store(&self) -> Result<Arc<dyn ReadingStore>, ConfigError> {
        Err(ConfigError::Invalid {
            field: "store",
            message: "built without the appwrite feature; use --file".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::DEFAULT_INTERVAL;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let resolved = Settings::default().resolve().unwrap();
        assert_eq!(resolved.refresh, DEFAULT_INTERVAL);
        assert_eq!(resolved.range, TimeRange::Day);
        assert_eq!(resolved.page_size, 100);
        assert_eq!(resolved.theme, ThemeChoice::Auto);
        assert_eq!(resolved.policy, ThresholdPolicy::default());
        assert_eq!(resolved.store_timeout, Duration::from_secs(10));
        assert_eq!(resolved.store.endpoint, "https://cloud.appwrite.io/v1");
    }

    #[test]
    fn test_from_toml() {
        let settings = Settings::from_toml(
            r#"
            refresh = "1m"
            range = "7d"
            theme = "light"

            [store]
            project = "proj"
            database = "water"
            collection = "readings"

            [thresholds.ph]
            warning_low = 7.0
            "#,
        )
        .unwrap();

        let resolved = settings.resolve().unwrap();
        assert_eq!(resolved.refresh, Duration::from_secs(60));
        assert_eq!(resolved.range, TimeRange::Week);
        assert_eq!(resolved.theme, ThemeChoice::Light);
        assert_eq!(resolved.store.project.as_deref(), Some("proj"));
        assert_eq!(resolved.policy.ph.warning_low, Some(7.0));
        assert_eq!(resolved.policy.ph.critical_low, Some(6.5));
    }

    #[test]
    fn test_load_file_and_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "page_size = 50\n[store]\nproject = \"from-file\"").unwrap();

        let env = HashMap::from([
            ("AQUAWATCH_STORE__PROJECT".to_string(), "from-env".to_string()),
            ("AQUAWATCH_RANGE".to_string(), "1h".to_string()),
        ]);

        let settings = Settings::load_from(Some(file.path()), Some(env)).unwrap();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.store.project.as_deref(), Some("from-env"));
        assert_eq!(settings.range, "1h");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Settings::load_from(Some(Path::new("/nonexistent/aquawatch.toml")), None);
        assert!(matches!(err, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_values_name_the_field() {
        let settings = Settings {
            refresh: "often".into(),
            ..Settings::default()
        };
        let err = settings.resolve().unwrap_err();
        assert!(err.to_string().starts_with("invalid refresh"));

        let settings = Settings {
            range: "2w".into(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve(),
            Err(ConfigError::Invalid { field: "range", .. })
        ));

        let settings = Settings {
            refresh: "0s".into(),
            ..Settings::default()
        };
        assert!(settings.resolve().is_err());
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let settings = Settings::from_toml(
            r#"
            [thresholds.tds]
            warning_high = 2000.0
            "#,
        )
        .unwrap();

        match settings.resolve() {
            Err(ConfigError::Thresholds { parameter, .. }) => assert_eq!(parameter, Parameter::Tds),
            other => panic!("expected threshold error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_file_store_selected_by_path() {
        let resolved = Settings::default().resolve().unwrap();
        let store = resolved.open_store(Some(Path::new("readings.json"))).unwrap();
        assert_eq!(store.description(), "file: readings.json");
    }

    #[cfg(feature = "appwrite")]
    #[test]
    fn test_remote_store_requires_ids() {
        let resolved = Settings::default().resolve().unwrap();
        assert!(matches!(
            resolved.open_store(None),
            Err(ConfigError::Store(AdapterError::Config(_)))
        ));
    }

    #[test]
    fn test_theme_choice_parse() {
        assert_eq!("Dark".parse::<ThemeChoice>(), Ok(ThemeChoice::Dark));
        assert!("purple".parse::<ThemeChoice>().is_err());
    }
}
