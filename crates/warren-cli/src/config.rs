// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run configuration and the storage port it is loaded through.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Logical key of the run configuration.
pub const CONFIG_KEY: &str = "warren";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load and deserialize the value for `key`. `Ok(None)` if missing or empty.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist the value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
        Err(err) => Err(ConfigError::Io(err)),
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;
    Ok(())
}

/// JSON files named `<key>.json` under the platform config directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store rooted at the user config directory (e.g. `~/.config/warren`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "warren")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Ok(Self::at(proj.config_dir()))
    }

    /// Store rooted at an explicit directory.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        read_file(&self.path_for(key))
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        write_file(&self.path_for(key), data)
    }
}

/// A single file given with `--config`; the key is ignored.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileConfigStore {
    fn load_raw(&self, _key: &str) -> Result<Vec<u8>, ConfigError> {
        read_file(&self.path)
    }

    fn save_raw(&self, _key: &str, data: &[u8]) -> Result<(), ConfigError> {
        write_file(&self.path, data)
    }
}

/// What the CLI writes to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Graph document (`{nodes, edges}`).
    Json,
    /// Graphviz digraph.
    Dot,
    /// One line: seed, steps, halt reason, sizes, digest.
    #[default]
    Summary,
}

/// Persistent run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Fixed generator seed; clock-derived when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Step budget.
    pub max_steps: u64,
    /// Depth bound for the demo grammar.
    pub max_depth: u32,
    /// Style token for flavor text.
    pub style: String,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: 10_000,
            max_depth: 3,
            style: "dungeon".to_owned(),
            format: OutputFormat::default(),
        }
    }
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--seed`
    pub seed: Option<u64>,
    /// `--steps`
    pub max_steps: Option<u64>,
    /// `--max-depth`
    pub max_depth: Option<u32>,
    /// `--style`
    pub style: Option<String>,
    /// `--format`
    pub format: Option<OutputFormat>,
}

impl RunConfig {
    /// Layers command-line values over `self`.
    pub fn with_overrides(self, o: Overrides) -> Self {
        Self {
            seed: o.seed.or(self.seed),
            max_steps: o.max_steps.unwrap_or(self.max_steps),
            max_depth: o.max_depth.unwrap_or(self.max_depth),
            style: o.style.unwrap_or(self.style),
            format: o.format.unwrap_or(self.format),
        }
    }
}

/// Where the run configuration lives.
pub enum ConfigSource {
    /// Explicit `--config` file; must exist when loading.
    File(ConfigService<FileConfigStore>),
    /// Platform config directory; absence means defaults.
    User(ConfigService<FsConfigStore>),
}

impl ConfigSource {
    /// Picks the explicit file when given, else the user config directory.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(match path {
            Some(path) => Self::File(ConfigService::new(FileConfigStore::new(path))),
            None => Self::User(ConfigService::new(FsConfigStore::new()?)),
        })
    }

    /// Loads the stored configuration, falling back to defaults when the user
    /// file is absent.
    pub fn load(&self) -> Result<RunConfig, ConfigError> {
        match self {
            Self::File(service) => service.load(CONFIG_KEY)?.ok_or(ConfigError::NotFound),
            Self::User(service) => Ok(service.load(CONFIG_KEY)?.unwrap_or_else(|| {
                debug!("no user config; using defaults");
                RunConfig::default()
            })),
        }
    }

    /// Loads the stored configuration as the base for a save; a missing file
    /// yields defaults so the save can create it.
    pub fn load_for_update(&self) -> Result<RunConfig, ConfigError> {
        match self.load() {
            Err(ConfigError::NotFound) => Ok(RunConfig::default()),
            other => other,
        }
    }

    /// Persists `config`.
    pub fn save(&self, config: &RunConfig) -> Result<(), ConfigError> {
        match self {
            Self::File(service) => service.save(CONFIG_KEY, config),
            Self::User(service) => service.save(CONFIG_KEY, config),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{ "max_depth": 5, "format": "dot" }"#).unwrap();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.format, OutputFormat::Dot);
        assert_eq!(config.max_steps, RunConfig::default().max_steps);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn flags_win_over_file() {
        let file = RunConfig {
            seed: Some(1),
            max_steps: 50,
            ..RunConfig::default()
        };
        let merged = file.with_overrides(Overrides {
            max_steps: Some(3),
            style: Some("crypt".into()),
            ..Overrides::default()
        });
        assert_eq!(merged.seed, Some(1));
        assert_eq!(merged.max_steps, 3);
        assert_eq!(merged.style, "crypt");
        assert_eq!(merged.max_depth, 3);
    }

    #[test]
    fn fs_store_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path().join("nested")));
        assert!(service.load::<RunConfig>(CONFIG_KEY).unwrap().is_none());

        let config = RunConfig {
            seed: Some(9),
            ..RunConfig::default()
        };
        service.save(CONFIG_KEY, &config).unwrap();
        assert_eq!(service.load::<RunConfig>(CONFIG_KEY).unwrap(), Some(config));
    }

    #[test]
    fn saving_creates_a_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("warren.json");
        let source = ConfigSource::resolve(Some(&path)).unwrap();
        let base = source.load_for_update().unwrap();
        assert_eq!(base, RunConfig::default());

        let config = base.with_overrides(Overrides {
            max_depth: Some(5),
            ..Overrides::default()
        });
        source.save(&config).unwrap();
        assert_eq!(source.load().unwrap(), config);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource::resolve(Some(&dir.path().join("absent.json"))).unwrap();
        assert!(matches!(source.load(), Err(ConfigError::NotFound)));
    }
}
