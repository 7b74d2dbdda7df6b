#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::pagination::MAXIMUM_RESULTS_PER_PAGE;
use crate::core::reaper::ReapOptions;
use crate::utils::error::{ReaperError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_url, Validate,
};
use chrono::Duration;
use std::fmt;

pub const MAXIMUM_AGE_HOURS: f64 = 1_000_000.0;

/// Fully resolved settings for one reap run.
#[derive(Clone)]
pub struct ReaperSettings {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub skip_ssl_validation: bool,
    pub service_name: String,
    pub expiry_interval: Duration,
    pub reap: bool,
    pub recursive: bool,
    pub page_size: usize,
}

impl ReaperSettings {
    pub fn reap_options(&self) -> ReapOptions {
        ReapOptions {
            service_name: self.service_name.clone(),
            expiry_interval: self.expiry_interval,
            reap: self.reap,
            recursive: self.recursive,
        }
    }
}

impl fmt::Debug for ReaperSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaperSettings")
            .field("api_url", &self.api_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("skip_ssl_validation", &self.skip_ssl_validation)
            .field("service_name", &self.service_name)
            .field("expiry_interval", &self.expiry_interval)
            .field("reap", &self.reap)
            .field("recursive", &self.recursive)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl Validate for ReaperSettings {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        validate_non_empty_string("username", &self.username)?;
        validate_non_empty_string("password", &self.password)?;
        validate_non_empty_string("service_name", &self.service_name)?;
        validate_range("page_size", self.page_size, 1, MAXIMUM_RESULTS_PER_PAGE)?;
        if self.expiry_interval < Duration::zero() {
            return Err(ReaperError::InvalidConfigValueError {
                field: "expiry_interval".to_string(),
                value: self.expiry_interval.to_string(),
                reason: "Interval cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Adds `https://` when no scheme is given and trims trailing slashes.
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Converts an age in (possibly fractional) hours to whole seconds.
pub fn expiry_interval_from_hours(hours: f64) -> Result<Duration> {
    validate_range("age_hours", hours, 0.0, MAXIMUM_AGE_HOURS)?;
    // Bounded above, so the cast cannot saturate.
    Ok(Duration::seconds((hours * 3600.0) as i64))
}
