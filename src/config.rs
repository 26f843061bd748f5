use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

/// Timing of the automated side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before the automated side plays the first move of a freshly loaded puzzle.
    pub opening_delay_ms: u64,
    /// Delay between an accepted player move and the automated reply.
    pub reply_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            opening_delay_ms: 500,
            reply_delay_ms: 100,
        }
    }
}

impl SessionConfig {
    /// Defaults, overridden by `PUZZLE_OPENING_DELAY_MS` and `PUZZLE_REPLY_DELAY_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            opening_delay_ms: env::var("PUZZLE_OPENING_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.opening_delay_ms),
            reply_delay_ms: env::var("PUZZLE_REPLY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reply_delay_ms),
        }
    }

    pub fn opening_delay(&self) -> Duration {
        Duration::from_millis(self.opening_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

#[cfg(feature = "server")]
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON puzzle pack to serve instead of the built-in one.
    pub catalog_path: Option<String>,
    pub session: SessionConfig,
}

#[cfg(feature = "server")]
impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            catalog_path: env::var("PUZZLE_CATALOG").ok(),
            session: SessionConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays() {
        let config = SessionConfig::default();
        assert_eq!(config.opening_delay(), Duration::from_millis(500));
        assert_eq!(config.reply_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"reply_delay_ms": 250}"#).unwrap();
        assert_eq!(config.opening_delay_ms, 500);
        assert_eq!(config.reply_delay_ms, 250);
    }
}
