use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::llm::{GeminiSettings, RetryPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to the verse corpus (JSON array)
    #[arg(long, env = "CORPUS_PATH")]
    pub corpus: Option<String>,

    /// Gemini API key; the chatbot endpoint is disabled without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Together AI API key (accepted, not used by any route)
    #[arg(long, env = "TOGETHER_API_KEY", hide_env_values = true)]
    pub together_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub gemini: GeminiConfig,
    pub retry: RetryConfig,
    pub together: TogetherConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub path: String,
}

#[derive(Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Alternate completion provider. Loaded so deployments that set it still
/// parse; no route uses it.
#[derive(Deserialize, Clone)]
pub struct TogetherConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl std::fmt::Debug for TogetherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TogetherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 10000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("corpus.path", "data/rigveda.json")?
            .set_default(
                "gemini.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("together.base_url", "https://api.together.xyz/v1")?;

        // 2. Config file: explicit path, else an optional ./config.{yaml,toml,json}
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Prefixed environment, e.g. RIGVEDA_RETRY__MAX_ATTEMPTS=5
        builder = builder.add_source(
            Environment::with_prefix("RIGVEDA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags and their conventional env vars win over everything
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(path) = cli.corpus {
            builder = builder.set_override("corpus.path", path)?;
        }
        if let Some(key) = cli.gemini_api_key {
            builder = builder.set_override("gemini.api_key", key)?;
        }
        if let Some(key) = cli.together_api_key {
            builder = builder.set_override("together.api_key", key)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Gemini settings with a blank key treated as absent.
    #[must_use]
    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            api_key: self
                .gemini
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            base_url: self.gemini.base_url.clone(),
            model: self.gemini.model.clone(),
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }
}
