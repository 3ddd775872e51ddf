use crate::app_url::normalize_base_url;
use crate::error::DashboardError;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DASHBOARD_URL_KEY: &str = "DASHBOARD_URL";
pub const REQUEST_TIMEOUT_KEY: &str = "DASHBOARD_REQUEST_TIMEOUT_SECS";
pub const RECORDS_LOOKBACK_KEY: &str = "DASHBOARD_RECORDS_LOOKBACK_DAYS";

pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECORDS_LOOKBACK_DAYS: u32 = 90;
pub const MAX_RECORDS_LOOKBACK_DAYS: u32 = 36_500;

const SETTINGS_PREFIX: &str = "DASHBOARD_";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub records_lookback_days: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DASHBOARD_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            records_lookback_days: DEFAULT_RECORDS_LOOKBACK_DAYS,
        }
    }
}

impl DashboardSettings {
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self, DashboardError> {
        let base_url = match optional_setting(settings, DASHBOARD_URL_KEY) {
            Some(raw) => normalize_base_url(Some(raw)).ok_or_else(|| {
                DashboardError::Config(format!(
                    "Setting {} must be an http(s) URL or host name (value: {})",
                    DASHBOARD_URL_KEY, raw
                ))
            })?,
            None => DEFAULT_DASHBOARD_URL.to_string(),
        };
        let timeout_secs =
            setting_u64_or(settings, REQUEST_TIMEOUT_KEY, DEFAULT_REQUEST_TIMEOUT_SECS, 1)?;
        let records_lookback_days = setting_u64_or(
            settings,
            RECORDS_LOOKBACK_KEY,
            u64::from(DEFAULT_RECORDS_LOOKBACK_DAYS),
            1,
        )?;
        let records_lookback_days = u32::try_from(records_lookback_days)
            .ok()
            .filter(|days| *days <= MAX_RECORDS_LOOKBACK_DAYS)
            .ok_or_else(|| {
                DashboardError::Config(format!(
                    "Setting {} must be <= {} (value: {})",
                    RECORDS_LOOKBACK_KEY, MAX_RECORDS_LOOKBACK_DAYS, records_lookback_days
                ))
            })?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            records_lookback_days,
        })
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self, DashboardError> {
        self.base_url = normalize_base_url(Some(raw)).ok_or_else(|| {
            DashboardError::Config(format!(
                "--url must be an http(s) URL or host name (value: {})",
                raw
            ))
        })?;
        Ok(self)
    }
}

/// Collects every `DASHBOARD_*` variable from the process environment.
pub fn settings_from_env() -> HashMap<String, String> {
    env::vars()
        .filter(|(key, _)| key.starts_with(SETTINGS_PREFIX))
        .collect()
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn setting_u64_or(
    settings: &HashMap<String, String>,
    key: &str,
    default: u64,
    min: u64,
) -> Result<u64, DashboardError> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw.parse::<f64>().map_err(|_| {
        DashboardError::Config(format!("Setting {} must be a number (value: {})", key, raw))
    })?;
    if !value.is_finite() {
        return Err(DashboardError::Config(format!(
            "Setting {} must be finite (value: {})",
            key, raw
        )));
    }
    if value.fract() != 0.0 {
        return Err(DashboardError::Config(format!(
            "Setting {} must be an integer (value: {})",
            key, raw
        )));
    }
    if value < min as f64 {
        return Err(DashboardError::Config(format!(
            "Setting {} must be >= {} (value: {})",
            key, min, raw
        )));
    }
    Ok(value as u64)
}
