//! Backend selection and credentials

use super::{DeepSeekService, GeminiService, LlmService, LoggingService};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Value shipped in the sample `.env`; treated as "not configured"
const PLACEHOLDER_KEY: &str = "ваш_ключ_здесь";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown chat backend `{0}` (expected `deepseek` or `gemini`)")]
    UnknownBackend(String),
    #[error("invalid value for {name}: `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

/// The two interchangeable completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    DeepSeek,
    Gemini,
}

impl Backend {
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Backend::DeepSeek => "DEEPSEEK_API_KEY",
            Backend::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::DeepSeek => "deepseek",
            Backend::Gemini => "gemini",
        })
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Backend::DeepSeek),
            "gemini" => Ok(Backend::Gemini),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration for the completion backends
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub backend: Backend,
    pub deepseek_api_key: Option<String>,
    pub deepseek_base_url: Option<String>,
    pub deepseek_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub gemini_model: Option<String>,
}

impl LlmConfig {
    /// Build from an arbitrary variable source. The `VITE_`-prefixed names
    /// are accepted so a frontend `.env` can be reused as-is.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let usable = |name: &str| {
            lookup(name)
                .map(|k| k.trim().to_string())
                .filter(|k| is_usable_key(k))
        };
        let key = |primary: &str, alias: &str| usable(primary).or_else(|| usable(alias));

        let backend = match lookup("BESTIARY_BACKEND") {
            Some(name) => name.parse()?,
            None => Backend::default(),
        };

        Ok(Self {
            backend,
            deepseek_api_key: key("DEEPSEEK_API_KEY", "VITE_DEEPSEEK_API_KEY"),
            deepseek_base_url: lookup("DEEPSEEK_BASE_URL"),
            deepseek_model: lookup("DEEPSEEK_MODEL"),
            gemini_api_key: key("GEMINI_API_KEY", "VITE_GEMINI_API_KEY"),
            gemini_base_url: lookup("GEMINI_BASE_URL"),
            gemini_model: lookup("GEMINI_MODEL"),
        })
    }

    /// Key for the selected backend, if one is usable
    pub fn active_api_key(&self) -> Option<&str> {
        match self.backend {
            Backend::DeepSeek => self.deepseek_api_key.as_deref(),
            Backend::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    /// Build the service for the selected backend.
    ///
    /// Returns `None` when no credential is configured; callers route every
    /// message to the fallback responder in that case.
    pub fn build_service(&self) -> Option<Arc<dyn LlmService>> {
        let api_key = self.active_api_key()?.to_string();

        let service: Arc<dyn LlmService> = match self.backend {
            Backend::DeepSeek => Arc::new(DeepSeekService::new(
                api_key,
                self.deepseek_model.as_deref(),
                self.deepseek_base_url.as_deref(),
            )),
            Backend::Gemini => Arc::new(GeminiService::new(
                api_key,
                self.gemini_model.as_deref(),
                self.gemini_base_url.as_deref(),
            )),
        };

        Some(Arc::new(LoggingService::new(service)))
    }
}

fn is_usable_key(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_KEY
}
