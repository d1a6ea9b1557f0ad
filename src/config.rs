//! Process configuration read from the environment

use crate::chat::DispatcherConfig;
use crate::feedback::FeedbackConfig;
use crate::llm::{ConfigError, LlmConfig};
use chrono::Duration;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 3002;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub llm: LlmConfig,
    pub chat: DispatcherConfig,
    pub feedback: FeedbackConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "BESTIARY_PORT")?.unwrap_or(DEFAULT_PORT);

        let mut chat = DispatcherConfig::default();
        if let Some(secs) = parse_var::<i64>(&lookup, "BESTIARY_SESSION_IDLE_SECS")? {
            chat.idle_threshold = Some(secs)
                .filter(|secs| *secs > 0)
                .and_then(Duration::try_seconds)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: "BESTIARY_SESSION_IDLE_SECS",
                    value: secs.to_string(),
                })?;
        }
        if let Some(window) = parse_var::<usize>(&lookup, "BESTIARY_HISTORY_WINDOW")? {
            if window == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "BESTIARY_HISTORY_WINDOW",
                    value: window.to_string(),
                });
            }
            chat.history_window = window;
        }
        chat.fallback_seed = parse_var(&lookup, "BESTIARY_FALLBACK_SEED")?;

        Ok(Self {
            port,
            llm: LlmConfig::from_lookup(&lookup)?,
            chat,
            feedback: FeedbackConfig::from_lookup(&lookup),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 3002);
        assert_eq!(config.chat.history_window, 8);
        assert_eq!(config.chat.idle_threshold, Duration::hours(3));
        assert!(config.chat.fallback_seed.is_none());
        assert!(config.llm.active_api_key().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(|name| match name {
            "BESTIARY_PORT" => Some("8080".to_string()),
            "BESTIARY_SESSION_IDLE_SECS" => Some("60".to_string()),
            "BESTIARY_HISTORY_WINDOW" => Some(" 4 ".to_string()),
            "BESTIARY_FALLBACK_SEED" => Some("99".to_string()),
            "DEEPSEEK_API_KEY" => Some("sk-live".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.chat.idle_threshold, Duration::seconds(60));
        assert_eq!(config.chat.history_window, 4);
        assert_eq!(config.chat.fallback_seed, Some(99));
        assert_eq!(config.llm.active_api_key(), Some("sk-live"));
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(|name| {
            (name == "BESTIARY_PORT").then(|| "not-a-port".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "BESTIARY_PORT", .. }));

        let err = AppConfig::from_lookup(|name| {
            (name == "BESTIARY_HISTORY_WINDOW").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_idle_secs_out_of_range() {
        for value in ["0", "-60", "9223372036854775807"] {
            let err = AppConfig::from_lookup(|name| {
                (name == "BESTIARY_SESSION_IDLE_SECS").then(|| value.to_string())
            })
            .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue {
                    name: "BESTIARY_SESSION_IDLE_SECS",
                    ..
                }
            ));
        }
    }
}
