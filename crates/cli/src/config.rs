//! Environment configuration.
//!
//! Variables come from the process environment, optionally seeded from a
//! `.env` file in the working directory. Loading is split so that commands
//! which only touch the topic documents do not require API credentials.

use std::fmt;
use std::path::PathBuf;

use pipeline::DEFAULT_COOLDOWN_WINDOW;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Model used when `ANTHROPIC_MODEL` is unset.
pub const DEFAULT_MODEL: &str = llm::DEFAULT_MODEL;

const HINTS: &[(&str, &str)] = &[
    ("WORDPRESS_URL", "The URL of your WordPress site (e.g., https://example.com)"),
    ("WORDPRESS_USERNAME", "Your WordPress username"),
    (
        "WORDPRESS_APP_PASSWORD",
        "WordPress Application Password (Users → Profile → Application Passwords)",
    ),
    ("ANTHROPIC_API_KEY", "Get your key at https://console.anthropic.com/settings/keys"),
    ("TAVILY_API_KEY", "Get your key at https://tavily.com (free tier available)"),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", missing_message(.0))]
    Missing(Vec<&'static str>),

    #[error("WORDPRESS_URL must start with http:// or https:// (current value: {0}; expected format: https://example.com)")]
    InvalidUrl(String),

    #[error("LOG_LEVEL must be one of: DEBUG, INFO, WARNING, ERROR, CRITICAL (current value: {0})")]
    InvalidLogLevel(String),

    #[error("TOPIC_COOLDOWN must be a non-negative integer (current value: {0})")]
    InvalidCooldown(String),
}

fn missing_message(vars: &[&'static str]) -> String {
    let mut lines = vec!["Missing required environment variables:".to_owned()];
    for var in vars {
        lines.push(format!("  • {var}"));
        if let Some((_, hint)) = HINTS.iter().find(|(name, _)| name == var) {
            lines.push(format!("    └─ {hint}"));
        }
    }
    lines.push("Copy .env.example to .env and fill in the values.".to_owned());
    lines.join("\n")
}

/// Console verbosity, named as operators write it in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parses a `LOG_LEVEL` value, ignoring case and surrounding space.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Reads `LOG_LEVEL` through `lookup`, defaulting to INFO when unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match Reader::new(&lookup).optional("LOG_LEVEL") {
            Some(raw) => Self::parse(&raw).ok_or(ConfigError::InvalidLogLevel(raw)),
            None => Ok(Self::default()),
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

/// Location of the topic documents and the cooldown window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub topics_file: PathBuf,
    pub published_file: PathBuf,
    pub topic_cooldown: usize,
}

impl StoreConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Reader::new(&lookup);
        let topic_cooldown = match env.optional("TOPIC_COOLDOWN") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidCooldown(raw.clone()))?,
            None => DEFAULT_COOLDOWN_WINDOW,
        };
        Ok(Self {
            topics_file: env
                .optional("TOPICS_FILE")
                .map_or_else(|| PathBuf::from("topics.json"), PathBuf::from),
            published_file: env
                .optional("PUBLISHED_FILE")
                .map_or_else(|| PathBuf::from("published.json"), PathBuf::from),
            topic_cooldown,
        })
    }
}

/// WordPress site and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct WordPressConfig {
    pub url: String,
    pub username: String,
    pub app_password: String,
}

impl fmt::Debug for WordPressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordPressConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("app_password", &"***")
            .finish()
    }
}

impl WordPressConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = Reader::new(&lookup);
        let wordpress = env.wordpress();
        env.finish()?;
        wordpress.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.url));
        }
        Ok(self)
    }
}

/// Everything a pipeline run needs.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub wordpress: WordPressConfig,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub tavily_api_key: String,
    pub dry_run: bool,
    pub store: StoreConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("wordpress", &self.wordpress)
            .field("anthropic_api_key", &"***")
            .field("anthropic_model", &self.anthropic_model)
            .field("tavily_api_key", &"***")
            .field("dry_run", &self.dry_run)
            .field("store", &self.store)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Every missing required variable
    /// is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut env = Reader::new(&lookup);
        let wordpress = env.wordpress();
        let anthropic_api_key = env.required("ANTHROPIC_API_KEY");
        let tavily_api_key = env.required("TAVILY_API_KEY");
        env.finish()?;

        let wordpress = wordpress.validated()?;
        let dry_run = env
            .optional("DRY_RUN")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"));

        Ok(Self {
            wordpress,
            anthropic_api_key,
            anthropic_model: env
                .optional("ANTHROPIC_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            tavily_api_key,
            dry_run,
            store: StoreConfig::from_lookup(&lookup)?,
        })
    }
}

/// Loads a `.env` file from the working directory; its absence is not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Trimmed, non-empty lookups that remember which required keys were absent.
struct Reader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
    missing: Vec<&'static str>,
}

impl<'a> Reader<'a> {
    fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &'static str) -> String {
        self.optional(key).unwrap_or_else(|| {
            self.missing.push(key);
            String::new()
        })
    }

    fn wordpress(&mut self) -> WordPressConfig {
        WordPressConfig {
            url: self.required("WORDPRESS_URL"),
            username: self.required("WORDPRESS_USERNAME"),
            app_password: self.required("WORDPRESS_APP_PASSWORD"),
        }
    }

    fn finish(&mut self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(std::mem::take(&mut self.missing)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("WORDPRESS_URL", "https://parga.example"),
        ("WORDPRESS_USERNAME", "editor"),
        ("WORDPRESS_APP_PASSWORD", "abcd efgh ijkl"),
        ("ANTHROPIC_API_KEY", "sk-ant-secret"),
        ("TAVILY_API_KEY", "tvly-secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = AppConfig::from_lookup(lookup(COMPLETE)).unwrap();

        assert_eq!(config.anthropic_model, DEFAULT_MODEL);
        assert!(!config.dry_run);
        assert_eq!(config.store.topics_file, PathBuf::from("topics.json"));
        assert_eq!(config.store.published_file, PathBuf::from("published.json"));
        assert_eq!(config.store.topic_cooldown, 10);
    }

    #[test]
    fn every_missing_variable_is_listed_with_a_hint() {
        let err = AppConfig::from_lookup(lookup(&[("WORDPRESS_URL", "  ")])).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Missing(vec![
                "WORDPRESS_URL",
                "WORDPRESS_USERNAME",
                "WORDPRESS_APP_PASSWORD",
                "ANTHROPIC_API_KEY",
                "TAVILY_API_KEY",
            ])
        );
        assert!(err.to_string().contains("console.anthropic.com"));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let mut pairs = COMPLETE.to_vec();
        pairs[0] = ("WORDPRESS_URL", "parga.example");
        assert!(matches!(
            AppConfig::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn log_level_is_parsed_from_the_environment() {
        assert_eq!(LogLevel::from_lookup(lookup(&[])), Ok(LogLevel::Info));

        let level = LogLevel::from_lookup(lookup(&[("LOG_LEVEL", " warning ")])).unwrap();
        assert_eq!(level, LogLevel::Warning);
        assert_eq!(level.as_filter(), LevelFilter::WARN);
        assert_eq!(
            LogLevel::from_lookup(lookup(&[("LOG_LEVEL", "critical")])).unwrap().as_filter(),
            LevelFilter::ERROR
        );

        assert_eq!(
            LogLevel::from_lookup(lookup(&[("LOG_LEVEL", "verbose")])),
            Err(ConfigError::InvalidLogLevel("verbose".into()))
        );
    }

    #[test]
    fn optional_values_are_parsed() {
        let mut pairs = COMPLETE.to_vec();
        pairs.extend([
            ("DRY_RUN", "Yes"),
            ("TOPIC_COOLDOWN", "3"),
            ("TOPICS_FILE", "data/topics.json"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        assert!(config.dry_run);
        assert_eq!(config.store.topic_cooldown, 3);
        assert_eq!(config.store.topics_file, PathBuf::from("data/topics.json"));

        let bad = StoreConfig::from_lookup(lookup(&[("TOPIC_COOLDOWN", "-1")]));
        assert_eq!(bad, Err(ConfigError::InvalidCooldown("-1".into())));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(COMPLETE)).unwrap();
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("sk-ant-secret"));
        assert!(!rendered.contains("tvly-secret"));
        assert!(!rendered.contains("abcd efgh"));
        assert!(rendered.contains("https://parga.example"));
    }

    #[test]
    fn wordpress_config_needs_only_site_credentials() {
        let config = WordPressConfig::from_lookup(lookup(&COMPLETE[..3])).unwrap();
        assert_eq!(config.username, "editor");
        assert!(WordPressConfig::from_lookup(lookup(&[])).is_err());
    }
}
