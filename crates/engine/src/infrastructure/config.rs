//! Engine configuration loaded from the environment.
//!
//! Supported environment variables:
//! - `PLOTLINE_EAGER_LOOKAHEAD`: keep generating ahead of the reader (default `true`)
//! - `PLOTLINE_LOOKAHEAD_BUFFER`: unread lines to keep buffered (default `10`)
//! - `PLOTLINE_LANGUAGE`: output language, `Original` disables translation
//! - `PLOTLINE_FALLBACK_HINT`: hint text used when hint generation fails
//! - `PLOTLINE_PROJECT_PATH`: project JSON loaded by the playtest binary

use std::path::PathBuf;
use std::str::FromStr;

use crate::infrastructure::ports::ORIGINAL_LANGUAGE;

pub const DEFAULT_LOOKAHEAD_BUFFER: usize = 10;
pub const DEFAULT_FALLBACK_HINT: &str = "Take a look around. What do you do next?";

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorConfig {
    pub eager_lookahead: bool,
    /// Look-ahead stops once this many lines sit unread past the cursor.
    pub lookahead_buffer: usize,
    /// Used when the project does not pick a language itself.
    pub language: String,
    pub fallback_hint: String,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            eager_lookahead: true,
            lookahead_buffer: DEFAULT_LOOKAHEAD_BUFFER,
            language: ORIGINAL_LANGUAGE.to_string(),
            fallback_hint: DEFAULT_FALLBACK_HINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub director: DirectorConfig,
    pub project_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Read configuration from `PLOTLINE_*` variables.
    ///
    /// Missing variables use defaults; unparseable ones are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = DirectorConfig::default();

        let director = DirectorConfig {
            eager_lookahead: env_or(&lookup, "PLOTLINE_EAGER_LOOKAHEAD", defaults.eager_lookahead),
            lookahead_buffer: env_or(&lookup, "PLOTLINE_LOOKAHEAD_BUFFER", defaults.lookahead_buffer),
            language: non_empty(&lookup, "PLOTLINE_LANGUAGE").unwrap_or(defaults.language),
            fallback_hint: non_empty(&lookup, "PLOTLINE_FALLBACK_HINT")
                .unwrap_or(defaults.fallback_hint),
        };

        Self {
            director,
            project_path: non_empty(&lookup, "PLOTLINE_PROJECT_PATH").map(PathBuf::from),
        }
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn env_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    let Some(raw) = non_empty(lookup, key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) => {
            tracing::info!(key, value = ?value, "Applied environment override");
            value
        }
        Err(_) => {
            tracing::warn!(key, value = %raw, default = ?default, "Invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config, EngineConfig::default());
        assert!(config.director.eager_lookahead);
        assert_eq!(config.director.lookahead_buffer, 10);
        assert_eq!(config.director.language, "Original");
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("PLOTLINE_EAGER_LOOKAHEAD", "false"),
            ("PLOTLINE_LOOKAHEAD_BUFFER", "4"),
            ("PLOTLINE_LANGUAGE", "fr"),
            ("PLOTLINE_PROJECT_PATH", "story.json"),
        ]);
        assert!(!config.director.eager_lookahead);
        assert_eq!(config.director.lookahead_buffer, 4);
        assert_eq!(config.director.language, "fr");
        assert_eq!(config.project_path, Some(PathBuf::from("story.json")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("PLOTLINE_EAGER_LOOKAHEAD", "sometimes"),
            ("PLOTLINE_LOOKAHEAD_BUFFER", "-3"),
            ("PLOTLINE_LANGUAGE", "   "),
        ]);
        assert_eq!(config.director, DirectorConfig::default());
    }
}
