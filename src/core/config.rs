//! Environment configuration
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Dispatch reporting switches (LOG_GUARD_REJECTIONS, REPLY_ON_ERROR)
//! - 1.1.0: Multiple development guilds, owner ids
//! - 1.0.0: Initial token/application id/mode loading

use std::fmt;

use serenity::model::id::{GuildId, UserId};

use crate::core::error::ConfigError;
use crate::dispatcher::DispatchOptions;

/// Selects guild-scoped (development) or global (production) command registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub application_id: u64,
    pub discord_token: String,
    pub mode: RunMode,
    pub dev_guild_ids: Vec<GuildId>,
    pub owner_ids: Vec<UserId>,
    pub log_level: String,
    pub log_guard_rejections: bool,
    pub reply_on_error: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let application_id = get("DISCORD_APPLICATION_ID")
            .ok_or(ConfigError::Missing("DISCORD_APPLICATION_ID"))
            .and_then(|raw| parse_snowflake("DISCORD_APPLICATION_ID", &raw))?;

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let mode = match get("BOT_MODE") {
            None => RunMode::Production,
            Some(raw) => parse_mode(&raw)?,
        };

        let dev_guild_ids = parse_id_list("DEV_GUILD_IDS", get("DEV_GUILD_IDS"))?
            .into_iter()
            .map(GuildId)
            .collect::<Vec<_>>();
        if mode == RunMode::Development && dev_guild_ids.is_empty() {
            return Err(ConfigError::EmptyDevGuilds);
        }

        let owner_ids = parse_id_list("BOT_OWNER_IDS", get("BOT_OWNER_IDS"))?
            .into_iter()
            .map(UserId)
            .collect();

        Ok(Self {
            application_id,
            discord_token,
            mode,
            dev_guild_ids,
            owner_ids,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_guard_rejections: parse_flag("LOG_GUARD_REJECTIONS", get("LOG_GUARD_REJECTIONS"), true)?,
            reply_on_error: parse_flag("REPLY_ON_ERROR", get("REPLY_ON_ERROR"), false)?,
        })
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            log_rejections: self.log_guard_rejections,
            reply_on_error: self.reply_on_error,
            ..DispatchOptions::default()
        }
    }
}

fn parse_snowflake(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a numeric Discord id".to_string(),
        }),
    }
}

fn parse_mode(raw: &str) -> Result<RunMode, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(RunMode::Development),
        "production" | "prod" => Ok(RunMode::Production),
        _ => Err(ConfigError::Invalid {
            var: "BOT_MODE",
            value: raw.to_string(),
            reason: "expected development or production".to_string(),
        }),
    }
}

fn parse_id_list(var: &'static str, raw: Option<String>) -> Result<Vec<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|id| parse_snowflake(var, id))
        .collect()
}

fn parse_flag(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [("DISCORD_APPLICATION_ID", "1234"), ("DISCORD_TOKEN", "token")];

    #[test]
    fn test_defaults_to_production() {
        let config = load(&BASE).unwrap();
        assert_eq!(config.mode, RunMode::Production);
        assert_eq!(config.application_id, 1234);
        assert_eq!(config.log_level, "info");
        assert!(config.dev_guild_ids.is_empty());
        assert!(config.log_guard_rejections);
        assert!(!config.reply_on_error);
    }

    #[test]
    fn test_missing_token_is_error() {
        let err = load(&[("DISCORD_APPLICATION_ID", "1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DISCORD_TOKEN")));

        let err = load(&[("DISCORD_TOKEN", "t"), ("DISCORD_APPLICATION_ID", "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DISCORD_APPLICATION_ID")));
    }

    #[test]
    fn test_development_requires_guilds() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BOT_MODE", "Development"));
        assert!(matches!(load(&pairs).unwrap_err(), ConfigError::EmptyDevGuilds));

        pairs.push(("DEV_GUILD_IDS", "111, 222"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.mode, RunMode::Development);
        assert_eq!(config.dev_guild_ids, vec![GuildId(111), GuildId(222)]);
    }

    #[test]
    fn test_malformed_guild_list_is_error() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BOT_MODE", "dev"));
        pairs.push(("DEV_GUILD_IDS", "111,abc"));
        match load(&pairs).unwrap_err() {
            ConfigError::Invalid { var, value, .. } => {
                assert_eq!(var, "DEV_GUILD_IDS");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_mode_is_error() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BOT_MODE", "staging"));
        assert!(matches!(
            load(&pairs).unwrap_err(),
            ConfigError::Invalid { var: "BOT_MODE", .. }
        ));
    }

    #[test]
    fn test_owner_ids_and_flags() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BOT_OWNER_IDS", "42,43"));
        pairs.push(("LOG_GUARD_REJECTIONS", "off"));
        pairs.push(("REPLY_ON_ERROR", "yes"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.owner_ids, vec![UserId(42), UserId(43)]);

        let options = config.dispatch_options();
        assert!(!options.log_rejections);
        assert!(options.reply_on_error);
    }
}
