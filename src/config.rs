use std::env;

use thiserror::Error;

use crate::sheets::SheetsConfig;
use crate::source::SnowflakeConfig;
use crate::window::WindowPolicy;

pub const SNOWFLAKE_ACCOUNT: &str = "SNOWFLAKE_ACCOUNT";
pub const SNOWFLAKE_USER: &str = "SNOWFLAKE_USER";
pub const SNOWFLAKE_PASSWORD: &str = "SNOWFLAKE_PASSWORD";
pub const SNOWFLAKE_WAREHOUSE: &str = "SNOWFLAKE_WAREHOUSE";
pub const SNOWFLAKE_DATABASE: &str = "SNOWFLAKE_DATABASE";
pub const SNOWFLAKE_SCHEMA: &str = "SNOWFLAKE_SCHEMA";
pub const GOOGLE_SHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const GOOGLE_CREDENTIALS_JSON: &str = "GOOGLE_CREDENTIALS_JSON";
pub const BUDGET_WINDOW_POLICY: &str = "BUDGET_WINDOW_POLICY";
pub const SYNC_TIME_ENTRIES: &str = "SYNC_TIME_ENTRIES";

const REQUIRED: [&str; 8] = [
    SNOWFLAKE_ACCOUNT,
    SNOWFLAKE_USER,
    SNOWFLAKE_PASSWORD,
    SNOWFLAKE_WAREHOUSE,
    SNOWFLAKE_DATABASE,
    SNOWFLAKE_SCHEMA,
    GOOGLE_SHEET_ID,
    GOOGLE_CREDENTIALS_JSON,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the run needs, assembled once at startup and injected into
/// each component from there. Historical script variants (window policy,
/// single vs dual dataset) are options here, not code paths.
#[derive(Debug, Clone)]
pub struct Config {
    pub snowflake: SnowflakeConfig,
    pub sheets: SheetsConfig,
    pub budget_window: WindowPolicy,
    pub sync_time_entries: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Every missing or blank required
    /// key is reported in one error rather than failing on first access.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let missing: Vec<String> = REQUIRED
            .iter()
            .copied()
            .filter(|&key| lookup(key).map_or(true, |v| v.trim().is_empty()))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        let get = |key: &str| lookup(key).unwrap_or_default();

        let budget_window = match lookup(BUDGET_WINDOW_POLICY) {
            None => WindowPolicy::Centered,
            Some(value) => value.parse().map_err(|err| ConfigError::InvalidValue {
                key: BUDGET_WINDOW_POLICY,
                value: value.clone(),
                reason: format!("{err}"),
            })?,
        };

        let sync_time_entries = match lookup(SYNC_TIME_ENTRIES) {
            None => true,
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: SYNC_TIME_ENTRIES,
                value: value.clone(),
                reason: "expected true/false".to_string(),
            })?,
        };

        Ok(Config {
            snowflake: SnowflakeConfig {
                account: get(SNOWFLAKE_ACCOUNT),
                user: get(SNOWFLAKE_USER),
                password: get(SNOWFLAKE_PASSWORD),
                warehouse: get(SNOWFLAKE_WAREHOUSE),
                database: get(SNOWFLAKE_DATABASE),
                schema: get(SNOWFLAKE_SCHEMA),
            },
            sheets: SheetsConfig {
                spreadsheet_id: get(GOOGLE_SHEET_ID),
                credentials_json: get(GOOGLE_CREDENTIALS_JSON),
            },
            budget_window,
            sync_time_entries,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (SNOWFLAKE_ACCOUNT, "abc123"),
            (SNOWFLAKE_USER, "reporter"),
            (SNOWFLAKE_PASSWORD, "hunter2"),
            (SNOWFLAKE_WAREHOUSE, "REPORTING_WH"),
            (SNOWFLAKE_DATABASE, "ANALYTICS"),
            (SNOWFLAKE_SCHEMA, "PUBLIC"),
            (GOOGLE_SHEET_ID, "sheet-id"),
            (GOOGLE_CREDENTIALS_JSON, "{}"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = load(&full_env()).unwrap();
        assert_eq!(cfg.snowflake.account, "abc123");
        assert_eq!(cfg.sheets.spreadsheet_id, "sheet-id");
        assert_eq!(cfg.budget_window, WindowPolicy::Centered);
        assert!(cfg.sync_time_entries);
    }

    #[test]
    fn every_missing_key_is_reported_at_once() {
        let mut env = full_env();
        env.remove(SNOWFLAKE_ACCOUNT);
        env.remove(GOOGLE_CREDENTIALS_JSON);
        env.insert(SNOWFLAKE_PASSWORD, "   ");

        let err = load(&env).unwrap_err();
        match err {
            ConfigError::MissingKeys(keys) => {
                assert_eq!(
                    keys,
                    vec![SNOWFLAKE_ACCOUNT, SNOWFLAKE_PASSWORD, GOOGLE_CREDENTIALS_JSON]
                );
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn window_policy_option_is_honored() {
        let mut env = full_env();
        env.insert(BUDGET_WINDOW_POLICY, "forward");
        assert_eq!(load(&env).unwrap().budget_window, WindowPolicy::Forward);
    }

    #[test]
    fn malformed_window_policy_is_rejected() {
        let mut env = full_env();
        env.insert(BUDGET_WINDOW_POLICY, "sideways");
        let err = load(&env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: BUDGET_WINDOW_POLICY,
                ..
            }
        ));
    }

    #[test]
    fn time_entries_can_be_disabled() {
        let mut env = full_env();
        env.insert(SYNC_TIME_ENTRIES, "false");
        assert!(!load(&env).unwrap().sync_time_entries);

        env.insert(SYNC_TIME_ENTRIES, "maybe");
        assert!(load(&env).is_err());
    }
}
