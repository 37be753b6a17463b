//! Process configuration read from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use thiserror::Error;
use watch_core::PollSettings;
use watch_engine::{Keywords, MonitorConfig, NotifySettings};
use watch_logging::LogSettings;

pub const DEFAULT_URL: &str = "https://esol.unina.it/#esami";
pub const DEFAULT_TARGET: &str = "placement test lingua inglese B2 LM ingegneria tutte";
pub const DEFAULT_KEYWORDS: &str = "placement,test,inglese,b2,ingegneria";
pub const DEFAULT_LOG_FILE: &str = "exam_watch.log";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub url: String,
    pub target_label: String,
    pub keywords: Keywords,
    pub poll: PollSettings,
    /// `None` when file logging is switched off with `WATCH_LOG_FILE=off`.
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("url", &self.url)
            .field("target_label", &self.target_label)
            .field("keywords", &self.keywords)
            .field("poll", &self.poll)
            .field("log_file", &self.log_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let chat_id = get("CHAT_ID").ok_or(ConfigError::Missing("CHAT_ID"))?;

        let keywords_raw = get("WATCH_KEYWORDS").unwrap_or_else(|| DEFAULT_KEYWORDS.to_string());
        let keywords = Keywords::parse_list(&keywords_raw);
        if keywords.is_empty() {
            return Err(invalid("WATCH_KEYWORDS", &keywords_raw, "no keywords given"));
        }

        let poll_secs: u64 = parse_or(&get, "WATCH_POLL_INTERVAL_SECS", 300)?;
        if poll_secs == 0 {
            return Err(invalid("WATCH_POLL_INTERVAL_SECS", "0", "must be positive"));
        }
        let status_every: u64 = parse_or(&get, "WATCH_STATUS_EVERY", 12)?;
        if status_every == 0 {
            return Err(invalid("WATCH_STATUS_EVERY", "0", "must be positive"));
        }
        let send_status_updates = match get("WATCH_STATUS_UPDATES") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| invalid("WATCH_STATUS_UPDATES", &raw, "expected true or false"))?,
            None => true,
        };

        let log_file = match get("WATCH_LOG_FILE") {
            Some(raw) if raw.eq_ignore_ascii_case("off") => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };
        let log_level: LevelFilter = parse_or(&get, "WATCH_LOG_LEVEL", LevelFilter::Info)?;

        Ok(Self {
            bot_token,
            chat_id,
            api_base: get("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            url: get("WATCH_URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            target_label: get("WATCH_TARGET").unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            keywords,
            poll: PollSettings {
                poll_interval: Duration::from_secs(poll_secs),
                status_every,
                send_status_updates,
                ..PollSettings::default()
            },
            log_file,
            log_level,
        })
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.log_level,
            file: self.log_file.clone(),
            ..LogSettings::default()
        }
    }

    pub fn notify_settings(&self) -> NotifySettings {
        NotifySettings {
            api_base: self.api_base.clone(),
            ..NotifySettings::new(self.bot_token.clone(), self.chat_id.clone())
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            url: self.url.clone(),
            keywords: self.keywords.clone(),
            poll: self.poll.clone(),
            target_label: self.target_label.clone(),
        }
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .parse()
            .map_err(|err: T::Err| invalid(name, &raw, &err.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const CREDENTIALS: [(&str, &str); 2] = [("BOT_TOKEN", "123:abc"), ("CHAT_ID", "42")];

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = Config::from_lookup(lookup(&CREDENTIALS)).unwrap();

        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(
            config.keywords.iter().collect::<Vec<_>>(),
            vec!["placement", "test", "inglese", "b2", "ingegneria"]
        );
        assert_eq!(config.poll, PollSettings::default());
        assert_eq!(config.log_file, Some(PathBuf::from(DEFAULT_LOG_FILE)));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.notify_settings().api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn missing_or_blank_credentials_are_fatal() {
        assert_eq!(
            Config::from_lookup(lookup(&[("CHAT_ID", "42")])).unwrap_err(),
            ConfigError::Missing("BOT_TOKEN")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc"), ("CHAT_ID", "  ")]))
                .unwrap_err(),
            ConfigError::Missing("CHAT_ID")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([
            ("WATCH_URL", "https://exams.example/list"),
            ("WATCH_KEYWORDS", "Inglese, B2"),
            ("WATCH_POLL_INTERVAL_SECS", "60"),
            ("WATCH_STATUS_EVERY", "3"),
            ("WATCH_STATUS_UPDATES", "no"),
            ("WATCH_LOG_FILE", "off"),
            ("WATCH_LOG_LEVEL", "debug"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.url, "https://exams.example/list");
        assert_eq!(config.keywords.iter().collect::<Vec<_>>(), vec!["inglese", "b2"]);
        assert_eq!(config.poll.poll_interval, Duration::from_secs(60));
        assert_eq!(config.poll.short_retry_delay, Duration::from_secs(30));
        assert_eq!(config.poll.status_every, 3);
        assert!(!config.poll.send_status_updates);
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (name, value) in [
            ("WATCH_POLL_INTERVAL_SECS", "five"),
            ("WATCH_POLL_INTERVAL_SECS", "0"),
            ("WATCH_STATUS_EVERY", "0"),
            ("WATCH_STATUS_UPDATES", "maybe"),
            ("WATCH_KEYWORDS", " , ,"),
        ] {
            let mut vars = CREDENTIALS.to_vec();
            vars.push((name, value));
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: got, .. } if got == name),
                "{name}={value:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn error_chain_names_the_offending_variable() {
        let mut vars = CREDENTIALS.to_vec();
        vars.push(("WATCH_POLL_INTERVAL_SECS", "five"));
        let err = anyhow::Error::from(Config::from_lookup(lookup(&vars)).unwrap_err())
            .context("invalid configuration");

        let rendered = format!("{err:#}");
        assert!(rendered.starts_with("invalid configuration: WATCH_POLL_INTERVAL_SECS"));
        assert!(!rendered.contains("BOT_TOKEN"));

        let missing = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap_err();
        assert_eq!(missing.to_string(), "CHAT_ID is not set");
    }

    #[test]
    fn debug_output_hides_the_token() {
        let config = Config::from_lookup(lookup(&CREDENTIALS)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("123:abc"));
    }
}
