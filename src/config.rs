use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::parser::DateOrder;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub parser: ParserConfig,
    pub analysis: AnalysisConfig,
    pub cache: CacheConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Order of the day and month components in export timestamps
    pub date_order: DateOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub top_users: usize,
    pub top_words: usize,
    pub top_emojis: usize,
    pub tfidf_terms: usize,
    pub lda_topics: usize,
    pub lda_words_per_topic: usize,
    pub lda_iterations: usize,
    pub lda_seed: u64,
    /// Scores within `[-band, band]` are labelled neutral
    pub sentiment_neutral_band: f32,
    /// Extra words excluded from word frequencies and topics
    pub extra_stopwords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            parser: ParserConfig {
                date_order: DateOrder::Auto,
            },
            analysis: AnalysisConfig {
                top_users: 5,
                top_words: 25,
                top_emojis: 10,
                tfidf_terms: 5,
                lda_topics: 5,
                lda_words_per_topic: 5,
                lda_iterations: 200,
                lda_seed: 42,
                sentiment_neutral_band: 0.05,
                extra_stopwords: vec!["omitted".to_string(), "media".to_string()],
            },
            cache: CacheConfig {
                enabled: true,
                directory: ".chat_cache".to_string(),
            },
            export: ExportConfig {
                default_format: "json".to_string(),
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Defaults, then `config/default`, `config/local` and `chat-analyzer`
    /// files when present, then `explicit` (required), then
    /// `CHAT_ANALYZER__SECTION__KEY` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("chat-analyzer").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("CHAT_ANALYZER").separator("__"))
            .build()
            .context("Failed to load configuration")?;

        let app_config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        let analysis = &self.analysis;
        for (name, value) in [
            ("top_users", analysis.top_users),
            ("top_words", analysis.top_words),
            ("top_emojis", analysis.top_emojis),
            ("tfidf_terms", analysis.tfidf_terms),
            ("lda_topics", analysis.lda_topics),
            ("lda_words_per_topic", analysis.lda_words_per_topic),
            ("lda_iterations", analysis.lda_iterations),
        ] {
            InputValidator::validate_top_n(name, value)?;
        }
        InputValidator::validate_sentiment_band(analysis.sentiment_neutral_band)?;

        if self.cache.enabled && self.cache.directory.trim().is_empty() {
            return Err(anyhow::anyhow!("cache.directory must be set when the cache is enabled"));
        }

        let valid_exports = ["txt", "csv", "json"];
        if !valid_exports.contains(&self.export.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format,
                valid_exports
            ));
        }

        Ok(())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Directory of the parse cache
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache.directory)
    }

    /// Place a relative export path under `export.output_directory`
    pub fn resolve_output(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.export.output_directory).join(path)
        }
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render configuration as YAML")
    }
}
