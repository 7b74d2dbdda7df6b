use crate::config::toml_config::TomlConfig;
use crate::config::{expiry_interval_from_hours, normalize_api_url, ReaperSettings};
use crate::core::pagination::MAXIMUM_RESULTS_PER_PAGE;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "instance-reaper")]
#[command(about = "Delete instances of the given service's free plans older than the given age")]
pub struct CliConfig {
    /// API endpoint, e.g. api.example.com (https:// is assumed when no scheme is given)
    pub api_url: Option<String>,

    /// Label of the service whose free plan instances are reaped
    pub service_name: Option<String>,

    /// Age in hours after which an instance is reaped
    #[arg(allow_negative_numbers = true)]
    pub age_hours: Option<f64>,

    #[arg(short = 'u', long, help = "Username")]
    pub username: Option<String>,

    #[arg(short = 'p', long, help = "Password")]
    pub password: Option<String>,

    #[arg(long, help = "Skip verification of the API endpoint. Not recommended!")]
    pub skip_ssl_validation: bool,

    #[arg(long, help = "Reap service instances. Otherwise perform a dry run only.")]
    pub reap: bool,

    #[arg(
        long,
        help = "Also delete any service bindings, service keys, and routes associated with reaped service instances."
    )]
    pub recursive: bool,

    #[arg(long, help = "Results requested per page (1-50)")]
    pub page_size: Option<usize>,

    #[arg(short, long, help = "TOML settings file; command-line values take precedence")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// Merges the command line over the optional settings file.
    pub fn into_settings(self) -> Result<ReaperSettings> {
        let file = match &self.config {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        self.merge(file)
    }

    fn merge(self, file: TomlConfig) -> Result<ReaperSettings> {
        let api_url = validate_required_field("api_url", self.api_url.or(file.api.url))?;
        let username = validate_required_field("username", self.username.or(file.api.username))?;
        let password = validate_required_field("password", self.password.or(file.api.password))?;
        let service_name =
            validate_required_field("service_name", self.service_name.or(file.reap.service))?;
        let age_hours = validate_required_field("age_hours", self.age_hours.or(file.reap.age_hours))?;

        Ok(ReaperSettings {
            api_url: normalize_api_url(&api_url),
            username,
            password,
            skip_ssl_validation: self.skip_ssl_validation
                || file.api.skip_ssl_validation.unwrap_or(false),
            service_name,
            expiry_interval: expiry_interval_from_hours(age_hours)?,
            reap: self.reap || file.reap.reap.unwrap_or(false),
            recursive: self.recursive || file.reap.recursive.unwrap_or(false),
            page_size: self
                .page_size
                .or(file.reap.page_size)
                .unwrap_or(MAXIMUM_RESULTS_PER_PAGE),
        })
    }
}
