use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{MapperError, Result};

const DEFAULT_COUNT: u32 = 50;
const DEFAULT_AUTO_ACCEPT_SCORE: u32 = 90;
const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 1000;
const DEFAULT_SEARCH_LIMIT: u32 = 5;
const DEFAULT_FALLBACK_SEARCH_LIMIT: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_accept_score: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_request_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_search_limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicbrainz_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub listenbrainz_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labs_url: Option<String>,

    /// Program and leading arguments; the prompt is appended as the last argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator_command: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_cache: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in values for every tunable.
    pub fn builtin_defaults() -> Self {
        Config {
            user: None,
            count: Some(DEFAULT_COUNT),
            auto_accept_score: Some(DEFAULT_AUTO_ACCEPT_SCORE),
            min_request_interval_ms: Some(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            search_limit: Some(DEFAULT_SEARCH_LIMIT),
            fallback_search_limit: Some(DEFAULT_FALLBACK_SEARCH_LIMIT),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            musicbrainz_url: Some(crate::musicbrainz::DEFAULT_BASE_URL.to_string()),
            listenbrainz_url: Some(crate::listenbrainz::DEFAULT_BASE_URL.to_string()),
            labs_url: Some(crate::labs::DEFAULT_BASE_URL.to_string()),
            translator_command: None,
            translation_cache: crate::translation_cache::default_cache_path(),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Get the config file path (~/.state/lbmapper/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| MapperError::Config("HOME environment variable not set".into()))?;
        Ok(Path::new(&home)
            .join(".state")
            .join("lbmapper")
            .join("defaults.toml"))
    }

    /// Load config from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`; a missing file is an empty config
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::new());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Built-in defaults, overridden by saved defaults, overridden by `cmdline`.
    pub fn layered(cmdline: &Config) -> Self {
        let mut config = Self::builtin_defaults();
        match Self::load() {
            Ok(saved) => config.merge(&saved),
            Err(e) => log::warn!("Ignoring saved defaults: {}", e),
        }
        config.merge(cmdline);
        config
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.user.is_some() {
            self.user = other.user.clone();
        }
        if other.count.is_some() {
            self.count = other.count;
        }
        if other.auto_accept_score.is_some() {
            self.auto_accept_score = other.auto_accept_score;
        }
        if other.min_request_interval_ms.is_some() {
            self.min_request_interval_ms = other.min_request_interval_ms;
        }
        if other.search_limit.is_some() {
            self.search_limit = other.search_limit;
        }
        if other.fallback_search_limit.is_some() {
            self.fallback_search_limit = other.fallback_search_limit;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.musicbrainz_url.is_some() {
            self.musicbrainz_url = other.musicbrainz_url.clone();
        }
        if other.listenbrainz_url.is_some() {
            self.listenbrainz_url = other.listenbrainz_url.clone();
        }
        if other.labs_url.is_some() {
            self.labs_url = other.labs_url.clone();
        }
        if other.translator_command.is_some() {
            self.translator_command = other.translator_command.clone();
        }
        if other.translation_cache.is_some() {
            self.translation_cache = other.translation_cache.clone();
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level.clone();
        }
    }

    pub fn count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_COUNT)
    }

    pub fn auto_accept_score(&self) -> u32 {
        self.auto_accept_score.unwrap_or(DEFAULT_AUTO_ACCEPT_SCORE)
    }

    pub fn min_request_interval_ms(&self) -> u64 {
        self.min_request_interval_ms
            .unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_MS)
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    pub fn fallback_search_limit(&self) -> u32 {
        self.fallback_search_limit
            .unwrap_or(DEFAULT_FALLBACK_SEARCH_LIMIT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn musicbrainz_url(&self) -> String {
        self.musicbrainz_url
            .clone()
            .unwrap_or_else(|| crate::musicbrainz::DEFAULT_BASE_URL.to_string())
    }

    pub fn listenbrainz_url(&self) -> String {
        self.listenbrainz_url
            .clone()
            .unwrap_or_else(|| crate::listenbrainz::DEFAULT_BASE_URL.to_string())
    }

    pub fn labs_url(&self) -> String {
        self.labs_url
            .clone()
            .unwrap_or_else(|| crate::labs::DEFAULT_BASE_URL.to_string())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(user) = &self.user {
            println!("  User:                  {}", user);
        }
        if let Some(count) = self.count {
            println!("  Listens per run:       {}", count);
        }
        if let Some(score) = self.auto_accept_score {
            println!("  Auto-accept score:     {}", score);
        }
        if let Some(ms) = self.min_request_interval_ms {
            println!("  Request interval:      {} ms", ms);
        }
        if let Some(limit) = self.search_limit {
            println!("  Search limit:          {}", limit);
        }
        if let Some(limit) = self.fallback_search_limit {
            println!("  Fallback search limit: {}", limit);
        }
        if let Some(secs) = self.timeout_secs {
            println!("  HTTP timeout:          {} s", secs);
        }
        if let Some(url) = &self.musicbrainz_url {
            println!("  MusicBrainz:           {}", url);
        }
        if let Some(url) = &self.listenbrainz_url {
            println!("  ListenBrainz:          {}", url);
        }
        if let Some(url) = &self.labs_url {
            println!("  Labs search:           {}", url);
        }
        match &self.translator_command {
            Some(cmd) => println!("  Translator:            {}", cmd.join(" ")),
            None => println!("  Translator:            (none)"),
        }
        if let Some(path) = &self.translation_cache {
            println!("  Translation cache:     {}", path.display());
        }
        if let Some(level) = &self.log_level {
            println!("  Log level:             {}", level);
        }
    }
}

/// ListenBrainz user token from the environment (after `.env` loading).
pub fn listenbrainz_token() -> Result<String> {
    match std::env::var("LB_TOKEN") {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(MapperError::Config("LB_TOKEN was not set".into())),
    }
}

/// Default ListenBrainz user from the environment, if any.
pub fn listenbrainz_user() -> Option<String> {
    std::env::var("LB_USER")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load `.env` from the working directory, without overriding the environment.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Could not read .env: {}", e),
    }
}
