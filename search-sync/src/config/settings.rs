//! Settings snapshot read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use search_sync_pipeline::{HostModules, OrchestratorConfig, MAX_CONCURRENT_JOBS};
use search_sync_query::{FilterSettings, RateLimitConfig, TrackingMethod};

use crate::logging::LogFormat;
use crate::AppError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default prefix of every index name.
const DEFAULT_INDEX_PREFIX: &str = "content";

/// Immutable settings handed to constructors.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch_url: String,
    pub index_prefix: String,
    pub orchestrator: OrchestratorConfig,
    pub discover_children: bool,
    pub filter: FilterSettings,
    pub rate_limit: RateLimitConfig,
    pub host_modules: HostModules,
    pub log_format: LogFormat,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_INDEX_PREFIX`: prefix of index names (default: content)
    /// - `REINDEX_MAX_CONCURRENT`: jobs in flight, 1 to 3 (default: 3)
    /// - `REINDEX_JOB_TIMEOUT_SECS`: per-job timeout (default: 120)
    /// - `REINDEX_DISCOVER_CHILDREN`: queue child items as follow-ups (default: true)
    /// - `FRONTEND_FETCH_ENABLED`: global frontend-fetch switch (default: false)
    /// - `FRONTEND_FETCH_EXCLUDED_TYPES`: comma list of types never fetched
    /// - `RATE_LIMIT_ENABLED`, `RATE_LIMIT_CAPACITY`, `RATE_LIMIT_REFILL_PER_SECOND`,
    ///   `RATE_LIMIT_BURST`, `RATE_LIMIT_TRACKING` (`ip|session|user`),
    ///   `RATE_LIMIT_PURGE_EVERY` (requests between idle sweeps, 0 disables)
    /// - `COMMERCE_ENABLED`, `DIGITAL_PRODUCTS_ENABLED`: host modules (default: false)
    /// - `LOG_FORMAT`: `pretty` or `json`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let orchestrator_defaults = OrchestratorConfig::default();
        let max_concurrent: usize = parse_or(
            &var,
            "REINDEX_MAX_CONCURRENT",
            orchestrator_defaults.max_concurrent,
        )?;
        if !(1..=MAX_CONCURRENT_JOBS).contains(&max_concurrent) {
            return Err(AppError::config(format!(
                "REINDEX_MAX_CONCURRENT must be between 1 and {MAX_CONCURRENT_JOBS}"
            )));
        }
        let job_timeout_secs: u64 = parse_or(
            &var,
            "REINDEX_JOB_TIMEOUT_SECS",
            orchestrator_defaults.job_timeout.as_secs(),
        )?;

        let excluded_types: Vec<String> = var("FRONTEND_FETCH_EXCLUDED_TYPES")
            .map(|v| {
                v.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let filter = FilterSettings::default()
            .with_frontend_fetch(flag_or(&var, "FRONTEND_FETCH_ENABLED", false)?)
            .with_excluded_types(excluded_types);

        let limit_defaults = RateLimitConfig::default();
        let tracking_method = match var("RATE_LIMIT_TRACKING") {
            Some(v) => TrackingMethod::parse(&v).ok_or_else(|| {
                AppError::config(format!("RATE_LIMIT_TRACKING must be ip, session or user, got {v:?}"))
            })?,
            None => limit_defaults.tracking_method,
        };
        let rate_limit = RateLimitConfig {
            enabled: flag_or(&var, "RATE_LIMIT_ENABLED", limit_defaults.enabled)?,
            capacity: parse_or(&var, "RATE_LIMIT_CAPACITY", limit_defaults.capacity)?,
            burst_size: parse_or(&var, "RATE_LIMIT_BURST", limit_defaults.burst_size)?,
            refill_rate_per_second: parse_or(
                &var,
                "RATE_LIMIT_REFILL_PER_SECOND",
                limit_defaults.refill_rate_per_second,
            )?,
            tracking_method,
            purge_every: parse_or(&var, "RATE_LIMIT_PURGE_EVERY", limit_defaults.purge_every)?,
            ..limit_defaults
        };
        if rate_limit.refill_rate_per_second.is_nan() || rate_limit.refill_rate_per_second < 0.0 {
            return Err(AppError::config("RATE_LIMIT_REFILL_PER_SECOND must not be negative"));
        }

        let log_format = match var("LOG_FORMAT") {
            Some(v) => LogFormat::parse(&v).ok_or_else(|| {
                AppError::config(format!("LOG_FORMAT must be pretty or json, got {v:?}"))
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            opensearch_url: var("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index_prefix: var("SEARCH_INDEX_PREFIX")
                .unwrap_or_else(|| DEFAULT_INDEX_PREFIX.to_string()),
            orchestrator: OrchestratorConfig {
                max_concurrent,
                job_timeout: Duration::from_secs(job_timeout_secs),
                ..orchestrator_defaults
            },
            discover_children: flag_or(&var, "REINDEX_DISCOVER_CHILDREN", true)?,
            filter,
            rate_limit,
            host_modules: HostModules {
                commerce: flag_or(&var, "COMMERCE_ENABLED", false)?,
                digital_products: flag_or(&var, "DIGITAL_PRODUCTS_ENABLED", false)?,
            },
            log_format,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{key} has an invalid value {value:?}"))),
        None => Ok(default),
    }
}

fn flag_or<F>(var: &F, key: &str, default: bool) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a boolean, got {value:?}"))),
        },
        None => Ok(default),
    }
}
