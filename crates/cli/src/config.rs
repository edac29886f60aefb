//! Runtime configuration read from the environment.

use tally_ledger::RulePolicy;
use tally_observability::LogFormat;

pub const ENV_POLICY: &str = "TALLY_POLICY";
pub const ENV_UNIT: &str = "TALLY_UNIT";
pub const ENV_LOG_FORMAT: &str = "TALLY_LOG_FORMAT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub policy: RulePolicy,
    pub unit: Option<String>,
    pub log_format: LogFormat,
    /// Values that were set but could not be parsed; defaults were used instead.
    ///
    /// Kept here because logging is not initialised yet when the environment is read.
    pub issues: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(raw) = lookup(ENV_POLICY) {
            match raw.parse() {
                Ok(policy) => config.policy = policy,
                Err(e) => config.issues.push(format!("{ENV_POLICY}: {e}")),
            }
        }

        config.unit = lookup(ENV_UNIT)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            match raw.parse() {
                Ok(format) => config.log_format = format,
                Err(e) => config.issues.push(format!("{ENV_LOG_FORMAT}: {e}")),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.policy, RulePolicy::Permissive);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            (ENV_POLICY, "strict"),
            (ENV_UNIT, " liters "),
            (ENV_LOG_FORMAT, "pretty"),
        ]));
        assert_eq!(config.policy, RulePolicy::Strict);
        assert_eq!(config.unit.as_deref(), Some("liters"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.issues.is_empty());
    }

    #[test]
    fn bad_values_fall_back_and_are_recorded() {
        let config = Config::from_lookup(lookup(&[
            (ENV_POLICY, "lenient"),
            (ENV_UNIT, "   "),
            (ENV_LOG_FORMAT, "xml"),
        ]));
        assert_eq!(config.policy, RulePolicy::Permissive);
        assert_eq!(config.unit, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.issues.len(), 2);
        assert!(config.issues[0].starts_with(ENV_POLICY));
    }
}
