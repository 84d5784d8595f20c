//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default pause between two sends (rate limit toward the transport).
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(2);

/// When the ledger is written to disk during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerPersistence {
    /// Once, after the dispatch loop.
    #[default]
    EndOfRun,
    /// After every successful send, and again after the loop.
    AfterEachSend,
}

impl FromStr for LedgerPersistence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "end" | "end_of_run" => Ok(Self::EndOfRun),
            "each" | "after_each_send" => Ok(Self::AfterEachSend),
            other => Err(format!("expected \"end\" or \"each\", got \"{other}\"")),
        }
    }
}

/// Google Sheets source settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub sheet_id: String,
    /// OAuth bearer token with the spreadsheets scope.
    pub access_token: SecretString,
    /// Tab holding the leads; the first row is the header.
    pub tab: String,
    pub request_timeout: Duration,
}

/// Outbound transport settings (the `openclaw` CLI).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub binary: String,
    pub channel: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            binary: "openclaw".to_string(),
            channel: "whatsapp".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub send_delay: Duration,
    pub persistence: LedgerPersistence,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            send_delay: DEFAULT_SEND_DELAY,
            persistence: LedgerPersistence::EndOfRun,
        }
    }
}

/// Full trigger configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub sheets: SheetsConfig,
    pub transport: TransportConfig,
    pub pipeline: PipelineConfig,
    pub ledger_path: PathBuf,
    /// When set, poll forever at this interval instead of running once.
    pub poll_interval: Option<Duration>,
}

impl TriggerConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let sheets = SheetsConfig {
            sheet_id: required("GOOGLE_SHEET_ID")?,
            access_token: SecretString::from(required("GOOGLE_SHEETS_ACCESS_TOKEN")?),
            tab: var("GOOGLE_SHEET_TAB").unwrap_or_else(|| "Sheet1".to_string()),
            request_timeout: Duration::from_secs(parse_or(
                var("GOOGLE_SHEETS_TIMEOUT_SECS"),
                "GOOGLE_SHEETS_TIMEOUT_SECS",
                30,
            )?),
        };

        let defaults = TransportConfig::default();
        let transport = TransportConfig {
            binary: var("OPENCLAW_BIN").unwrap_or(defaults.binary),
            channel: var("OPENCLAW_CHANNEL").unwrap_or(defaults.channel),
            timeout: Duration::from_secs(parse_or(
                var("OPENCLAW_TIMEOUT_SECS"),
                "OPENCLAW_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
        };

        let pipeline = PipelineConfig {
            send_delay: Duration::from_millis(parse_or(
                var("TRIGGER_SEND_DELAY_MS"),
                "TRIGGER_SEND_DELAY_MS",
                DEFAULT_SEND_DELAY.as_millis() as u64,
            )?),
            persistence: parse_or(
                var("TRIGGER_LEDGER_PERSIST"),
                "TRIGGER_LEDGER_PERSIST",
                LedgerPersistence::EndOfRun,
            )?,
        };

        let ledger_path = var("TRIGGER_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./processed-leads.json"));

        let poll_interval = var("TRIGGER_POLL_INTERVAL_SECS")
            .map(|raw| parse_value::<u64>(&raw, "TRIGGER_POLL_INTERVAL_SECS"))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            sheets,
            transport,
            pipeline,
            ledger_path,
            poll_interval,
        })
    }
}

fn parse_value<T>(raw: &str, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(&raw, key),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("GOOGLE_SHEET_ID", "sheet-123"),
        ("GOOGLE_SHEETS_ACCESS_TOKEN", "ya29.token"),
    ];

    #[test]
    fn defaults_apply() {
        let config = TriggerConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.sheets.sheet_id, "sheet-123");
        assert_eq!(config.sheets.access_token.expose_secret(), "ya29.token");
        assert_eq!(config.sheets.tab, "Sheet1");
        assert_eq!(config.transport.binary, "openclaw");
        assert_eq!(config.transport.channel, "whatsapp");
        assert_eq!(config.pipeline.send_delay, Duration::from_secs(2));
        assert_eq!(config.pipeline.persistence, LedgerPersistence::EndOfRun);
        assert_eq!(config.ledger_path, PathBuf::from("./processed-leads.json"));
        assert!(config.poll_interval.is_none());
    }

    #[test]
    fn overrides_apply() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("GOOGLE_SHEET_TAB", "Leads"),
            ("TRIGGER_SEND_DELAY_MS", "500"),
            ("TRIGGER_LEDGER_PERSIST", "each"),
            ("TRIGGER_POLL_INTERVAL_SECS", "300"),
            ("OPENCLAW_CHANNEL", "telegram"),
        ]);
        let config = TriggerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.sheets.tab, "Leads");
        assert_eq!(config.pipeline.send_delay, Duration::from_millis(500));
        assert_eq!(config.pipeline.persistence, LedgerPersistence::AfterEachSend);
        assert_eq!(config.poll_interval, Some(Duration::from_secs(300)));
        assert_eq!(config.transport.channel, "telegram");
    }

    #[test]
    fn missing_sheet_id_is_an_error() {
        let result = TriggerConfig::from_lookup(lookup(&[("GOOGLE_SHEETS_ACCESS_TOKEN", "t")]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(k)) if k == "GOOGLE_SHEET_ID"));
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let result = TriggerConfig::from_lookup(lookup(&[
            ("GOOGLE_SHEET_ID", "  "),
            ("GOOGLE_SHEETS_ACCESS_TOKEN", "t"),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TRIGGER_SEND_DELAY_MS", "soon"));
        let result = TriggerConfig::from_lookup(lookup(&pairs));
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "TRIGGER_SEND_DELAY_MS")
        );
    }

    #[test]
    fn zero_poll_interval_means_run_once() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TRIGGER_POLL_INTERVAL_SECS", "0"));
        let config = TriggerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.poll_interval.is_none());
    }

    #[test]
    fn persistence_parse() {
        assert_eq!("END".parse::<LedgerPersistence>().unwrap(), LedgerPersistence::EndOfRun);
        assert!("sometimes".parse::<LedgerPersistence>().is_err());
    }
}
