use anyhow::{anyhow, bail, Context, Result};
use chrono::DateTime;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::{Cell, QueryExecutor, ResultSet};

/// Warehouse connection parameters, environment-scoped (see `config`).
#[derive(Debug, Clone)]
pub struct SnowflakeConfig {
    pub account: String,
    pub user: String,
    pub password: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

/// Reduce a misconfigured account identifier to a bare account name: strip
/// surrounding whitespace, a leading scheme, and everything from the
/// `.snowflakecomputing.com` suffix on. A clean value passes through
/// untouched.
pub fn normalize_account(raw: &str) -> String {
    let mut account = raw.trim();
    account = account.strip_prefix("https://").unwrap_or(account);
    account = account.strip_prefix("http://").unwrap_or(account);
    if let Some(idx) = account.find(".snowflakecomputing.com") {
        account = &account[..idx];
    }
    account.to_string()
}

/// Snowflake client speaking the session REST protocol: one short-lived
/// session per query, released on every exit path.
#[derive(Debug)]
pub struct Snowflake {
    http: Client,
    base: Url,
    account: String,
    config: SnowflakeConfig,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T> {
        if !self.success {
            bail!(
                "{}",
                self.message
                    .unwrap_or_else(|| "unspecified snowflake error".to_string())
            );
        }
        self.data
            .ok_or_else(|| anyhow!("snowflake response carried no data"))
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    rowtype: Vec<ColumnInfo>,
    rowset: Vec<Vec<Option<Value>>>,
    #[serde(default)]
    chunks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Snowflake {
    pub fn new(config: SnowflakeConfig) -> Result<Self> {
        let account = normalize_account(&config.account);
        if account.is_empty() {
            bail!("snowflake account is empty after normalization");
        }
        let base = Url::parse(&format!("https://{account}.snowflakecomputing.com"))
            .with_context(|| format!("building snowflake base url for account {account:?}"))?;
        Ok(Self {
            http: Client::new(),
            base,
            account,
            config,
        })
    }

    async fn login(&self) -> Result<String> {
        let mut url = self
            .base
            .join("/session/v1/login-request")
            .context("building snowflake login url")?;
        url.query_pairs_mut()
            .append_pair("warehouse", &self.config.warehouse)
            .append_pair("databaseName", &self.config.database)
            .append_pair("schemaName", &self.config.schema);

        debug!(account = %self.account, "opening snowflake session");
        let body = json!({
            "data": {
                "ACCOUNT_NAME": self.account,
                "LOGIN_NAME": self.config.user,
                "PASSWORD": self.config.password,
                "CLIENT_APP_ID": env!("CARGO_PKG_NAME"),
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
            }
        });

        let envelope: Envelope<LoginData> = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .context("snowflake login request failed")?
            .error_for_status()
            .context("snowflake login rejected")?
            .json()
            .await
            .context("decoding snowflake login response")?;

        let data = envelope.into_data().context("snowflake login failed")?;
        Ok(data.token)
    }

    async fn run_query(&self, token: &str, sql: &str) -> Result<QueryData> {
        let mut url = self
            .base
            .join("/queries/v1/query-request")
            .context("building snowflake query url")?;
        url.query_pairs_mut()
            .append_pair("requestId", &Uuid::new_v4().to_string());

        let body = json!({
            "sqlText": sql,
            "sequenceId": 1,
            "isInternal": false,
        });

        let envelope: Envelope<QueryData> = self
            .http
            .post(url)
            .header(AUTHORIZATION, session_header(token))
            .json(&body)
            .send()
            .await
            .context("snowflake query request failed")?
            .error_for_status()
            .context("snowflake query rejected")?
            .json()
            .await
            .context("decoding snowflake query response")?;

        let data = envelope.into_data().context("snowflake query failed")?;
        if !data.chunks.is_empty() {
            bail!(
                "snowflake returned {} result chunks; chunked result sets are not supported",
                data.chunks.len()
            );
        }
        Ok(data)
    }

    /// Best-effort session release; a failed logout is logged, never raised,
    /// so it cannot mask a query error.
    async fn logout(&self, token: &str) {
        let url = match self.base.join("/session/logout-request") {
            Ok(url) => url,
            Err(_) => return,
        };
        match self
            .http
            .post(url)
            .header(AUTHORIZATION, session_header(token))
            .send()
            .await
        {
            Ok(_) => debug!("snowflake session closed"),
            Err(err) => debug!("snowflake logout failed: {err}"),
        }
    }
}

fn session_header(token: &str) -> String {
    format!("Snowflake Token=\"{token}\"")
}

impl QueryExecutor for Snowflake {
    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let token = self.login().await?;
        let outcome = self.run_query(&token, sql).await;
        self.logout(&token).await;
        let data = outcome?;

        let headers: Vec<String> = data.rowtype.iter().map(|c| c.name.clone()).collect();
        let rows: Vec<Vec<Cell>> = data
            .rowset
            .iter()
            .map(|row| {
                data.rowtype
                    .iter()
                    .zip(row)
                    .map(|(column, value)| normalize_value(column, value.as_ref()))
                    .collect()
            })
            .collect();
        info!(rows = rows.len(), columns = headers.len(), "snowflake query complete");
        ResultSet::new(headers, rows)
    }
}

/// Reduce one source-native value to a spreadsheet-safe cell. Nulls become
/// empty text, numeric types become floats, date/datetime types become
/// ISO-8601 text; everything else passes through unchanged.
pub fn normalize_value(column: &ColumnInfo, raw: Option<&Value>) -> Cell {
    let raw = match raw {
        None | Some(Value::Null) => return Cell::empty(),
        Some(value) => value,
    };
    match raw {
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Cell::Number(f),
            None => Cell::Text(n.to_string()),
        },
        Value::String(s) => normalize_text(column, s),
        other => Cell::Text(other.to_string()),
    }
}

fn normalize_text(column: &ColumnInfo, raw: &str) -> Cell {
    match column.data_type.to_ascii_lowercase().as_str() {
        "fixed" | "real" => match raw.parse::<f64>() {
            Ok(f) => Cell::Number(f),
            Err(_) => Cell::Text(raw.to_string()),
        },
        "boolean" => match raw {
            "1" => Cell::Bool(true),
            "0" => Cell::Bool(false),
            _ if raw.eq_ignore_ascii_case("true") => Cell::Bool(true),
            _ if raw.eq_ignore_ascii_case("false") => Cell::Bool(false),
            _ => Cell::Text(raw.to_string()),
        },
        // Wire format is days since the Unix epoch.
        "date" => match raw.parse::<i64>() {
            Ok(days) => match DateTime::from_timestamp(days * 86_400, 0) {
                Some(dt) => Cell::Text(dt.date_naive().to_string()),
                None => Cell::Text(raw.to_string()),
            },
            Err(_) => Cell::Text(raw.to_string()),
        },
        // Wire format is epoch seconds with an optional fractional part; the
        // tz variants append an offset after whitespace, which is ignored.
        "timestamp" | "timestamp_ntz" | "timestamp_ltz" | "timestamp_tz" => {
            match parse_epoch_timestamp(raw) {
                Some(text) => Cell::Text(text),
                None => Cell::Text(raw.to_string()),
            }
        }
        _ => Cell::Text(raw.to_string()),
    }
}

fn parse_epoch_timestamp(raw: &str) -> Option<String> {
    let token = raw.split_whitespace().next()?;
    let (secs_str, frac_str) = match token.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (token, ""),
    };
    let secs: i64 = secs_str.parse().ok()?;
    let nanos: u32 = if frac_str.is_empty() {
        0
    } else {
        let digits: String = frac_str.chars().filter(|c| c.is_ascii_digit()).collect();
        let padded = format!("{digits:0<9}");
        padded.get(..9)?.parse().ok()?
    };
    let dt = DateTime::from_timestamp(secs, nanos)?;
    let formatted = if nanos == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    };
    Some(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn column(data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: "COL".to_string(),
            data_type: data_type.to_string(),
        }
    }

    #[test]
    fn account_with_scheme_and_domain_is_reduced_to_bare_name() {
        assert_eq!(
            normalize_account(" https://abc123.snowflakecomputing.com "),
            "abc123"
        );
        assert_eq!(normalize_account("http://abc123"), "abc123");
    }

    #[test]
    fn clean_account_passes_through_unchanged() {
        assert_eq!(normalize_account("abc123"), "abc123");
        assert_eq!(normalize_account(normalize_account("abc123").as_str()), "abc123");
    }

    #[test]
    fn null_becomes_the_empty_cell() {
        assert_eq!(normalize_value(&column("text"), None), Cell::empty());
        assert_eq!(
            normalize_value(&column("fixed"), Some(&Value::Null)),
            Cell::empty()
        );
    }

    #[test]
    fn fixed_decimal_becomes_a_float() {
        let v = Value::String("12.50".to_string());
        assert_eq!(normalize_value(&column("fixed"), Some(&v)), Cell::Number(12.5));

        let whole = Value::String("42".to_string());
        assert_eq!(normalize_value(&column("fixed"), Some(&whole)), Cell::Number(42.0));
    }

    #[test]
    fn booleans_decode_from_wire_flags() {
        let t = Value::String("1".to_string());
        let f = Value::String("0".to_string());
        assert_eq!(normalize_value(&column("boolean"), Some(&t)), Cell::Bool(true));
        assert_eq!(normalize_value(&column("boolean"), Some(&f)), Cell::Bool(false));
    }

    #[test]
    fn epoch_day_dates_become_iso_text() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let days = (NaiveDate::from_ymd_opt(2025, 11, 24).unwrap() - epoch).num_days();
        let v = Value::String(days.to_string());
        assert_eq!(
            normalize_value(&column("date"), Some(&v)),
            Cell::Text("2025-11-24".to_string())
        );
    }

    #[test]
    fn epoch_second_timestamps_become_iso_text() {
        // 2025-11-24T12:30:00 UTC
        let v = Value::String("1763987400".to_string());
        assert_eq!(
            normalize_value(&column("timestamp_ntz"), Some(&v)),
            Cell::Text("2025-11-24T12:30:00".to_string())
        );

        let fractional = Value::String("1763987400.250000000".to_string());
        assert_eq!(
            normalize_value(&column("timestamp_ntz"), Some(&fractional)),
            Cell::Text("2025-11-24T12:30:00.250".to_string())
        );
    }

    #[test]
    fn plain_text_and_numbers_pass_through() {
        let s = Value::String("hello".to_string());
        assert_eq!(
            normalize_value(&column("text"), Some(&s)),
            Cell::Text("hello".to_string())
        );

        let n = Value::Number(serde_json::Number::from(7));
        assert_eq!(normalize_value(&column("text"), Some(&n)), Cell::Number(7.0));
    }

    #[test]
    fn unparseable_values_fall_back_to_text() {
        let v = Value::String("not-a-number".to_string());
        assert_eq!(
            normalize_value(&column("fixed"), Some(&v)),
            Cell::Text("not-a-number".to_string())
        );
    }

    #[test]
    fn client_rejects_blank_account() {
        let err = Snowflake::new(SnowflakeConfig {
            account: "  ".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
            warehouse: "w".to_string(),
            database: "d".to_string(),
            schema: "s".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("empty after normalization"));
    }
}
