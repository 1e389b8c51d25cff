use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub batch_concurrency: usize,
    pub batch_deadline: Option<Duration>,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            batch_deadline: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let batch_concurrency = get_env_parse_or("GRADING_BATCH_CONCURRENCY", DEFAULT_BATCH_CONCURRENCY)?;
        if batch_concurrency == 0 {
            return Err(Error::Config(
                "Invalid value for GRADING_BATCH_CONCURRENCY: must be at least 1".to_string(),
            ));
        }

        let batch_deadline = get_env_parse_opt::<u64>("GRADING_BATCH_DEADLINE_MS")?
            .map(Duration::from_millis);

        let log_format = match env::var("LOG_FORMAT").ok().as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {} (expected pretty or json)",
                    other
                )))
            }
        };

        Ok(Self {
            batch_concurrency,
            batch_deadline,
            log_format,
        })
    }
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(None),
    }
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse_opt(name)?.unwrap_or(default))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

/// Returns the global configuration, falling back to defaults when `init_config` was never called.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.batch_concurrency, DEFAULT_BATCH_CONCURRENCY);
        assert!(config.batch_deadline.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_and_rejects_environment_values() {
        env::set_var("GRADING_BATCH_CONCURRENCY", "3");
        env::set_var("GRADING_BATCH_DEADLINE_MS", "1500");
        env::set_var("LOG_FORMAT", "json");
        let config = Config::from_env().expect("config");
        assert_eq!(config.batch_concurrency, 3);
        assert_eq!(config.batch_deadline, Some(Duration::from_millis(1500)));
        assert_eq!(config.log_format, LogFormat::Json);

        env::set_var("GRADING_BATCH_CONCURRENCY", "zero");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("GRADING_BATCH_CONCURRENCY"));

        env::set_var("GRADING_BATCH_CONCURRENCY", "0");
        assert!(Config::from_env().is_err());

        env::remove_var("GRADING_BATCH_CONCURRENCY");
        env::remove_var("GRADING_BATCH_DEADLINE_MS");
        env::remove_var("LOG_FORMAT");
    }
}
