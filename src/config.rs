use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;
use value_debouncer::Delay;

use crate::{entity::EqualityMode, render::Format};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub delay: Delay,
    pub equality: EqualityMode,
    pub format: Format,
    pub flush_on_eof: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: Delay::DEFAULT,
            equality: EqualityMode::default(),
            format: Format::default(),
            flush_on_eof: false,
        }
    }
}

/// Settings as written in a config file or passed on the command line.
/// Every field is optional; missing ones fall back to [`Config::default`].
#[derive(Default, Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    #[serde(default)]
    pub delay_ms: Option<i64>,
    #[serde(default)]
    pub equality: Option<EqualityMode>,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub flush_on_eof: Option<bool>,
}

impl UserConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Fields set in `overrides` win.
    pub fn merge(self, overrides: UserConfig) -> Self {
        Self {
            delay_ms: overrides.delay_ms.or(self.delay_ms),
            equality: overrides.equality.or(self.equality),
            format: overrides.format.or(self.format),
            flush_on_eof: overrides.flush_on_eof.or(self.flush_on_eof),
        }
    }
}

impl From<UserConfig> for Config {
    fn from(config: UserConfig) -> Self {
        let default = Config::default();
        Self {
            delay: config.delay_ms.map(Delay::from_millis).unwrap_or(default.delay),
            equality: config.equality.unwrap_or(default.equality),
            format: config.format.unwrap_or(default.format),
            flush_on_eof: config.flush_on_eof.unwrap_or(default.flush_on_eof),
        }
    }
}

pub static GLOBAL_CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));

pub fn initialize_config(config: UserConfig) -> Config {
    let mut global_config = GLOBAL_CONFIG.write();
    *global_config = Config::from(config);
    debug!("config {:?}", global_config);
    global_config.clone()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"delayMs": 120, "equality": "ignore-case", "flushOnEof": true}}"#
        )
        .unwrap();

        let user = UserConfig::load(file.path()).unwrap();
        assert_eq!(user.delay_ms, Some(120));
        assert_eq!(user.format, None);

        let config = Config::from(user);
        assert_eq!(config.delay, Delay::from_millis(120));
        assert_eq!(config.equality, EqualityMode::IgnoreCase);
        assert_eq!(config.format, Format::Plain);
        assert!(config.flush_on_eof);
    }

    #[test]
    fn test_load_reports_path() {
        let err = UserConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = UserConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("parsing config file"));
    }

    #[test]
    fn test_overrides_win() {
        let file = UserConfig {
            delay_ms: Some(100),
            format: Some(Format::Json),
            ..Default::default()
        };
        let cli = UserConfig {
            delay_ms: Some(-5),
            flush_on_eof: Some(true),
            ..Default::default()
        };

        let config = Config::from(file.merge(cli));
        assert_eq!(config.delay, Delay::ZERO);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.equality, EqualityMode::Exact);
        assert!(config.flush_on_eof);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let user: UserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(Config::from(user), Config::default());
        assert_eq!(Config::default().delay.as_millis(), 300);
    }
}
