use crate::adapters::cloud_controller::CloudControllerClient;
use crate::adapters::http::ReqwestTransport;
use crate::adapters::login::fetch_oauth_token;
use crate::config::ReaperSettings;
use crate::core::reaper::{ReapSummary, Reaper};
use crate::domain::ports::{Clock, ReportSink};
use crate::utils::error::Result;
use chrono::Duration;
use std::sync::Arc;

/// One complete run: authenticate, then reap with the configured settings.
pub async fn run(
    settings: &ReaperSettings,
    clock: Arc<dyn Clock>,
    report: Arc<dyn ReportSink>,
) -> Result<ReapSummary> {
    if !settings.reap {
        report.line("DRY RUN ONLY!");
    }
    report.line(&format!(
        "Reaping instances of free plans of '{}' older than {} in {} as {}...",
        settings.service_name,
        format_interval(settings.expiry_interval),
        settings.api_url,
        settings.username
    ));

    let transport = Arc::new(ReqwestTransport::new(settings.skip_ssl_validation)?);
    let access_token = fetch_oauth_token(
        transport.client(),
        &settings.api_url,
        &settings.username,
        &settings.password,
    )
    .await?;

    let cf = Arc::new(CloudControllerClient::new(
        transport,
        settings.api_url.as_str(),
        access_token,
        settings.page_size,
    ));

    Reaper::new(cf, clock, report)
        .with_buffer(settings.page_size)
        .reap(settings.reap_options())
        .await
}

/// Renders an interval as e.g. `1 day 2 hours 30 minutes`.
pub fn format_interval(interval: Duration) -> String {
    let total = interval.num_seconds().max(0);
    let units = [
        ("day", total / 86_400),
        ("hour", total % 86_400 / 3_600),
        ("minute", total % 3_600 / 60),
        ("second", total % 60),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(_, value)| *value > 0)
        .map(|(unit, value)| {
            if *value == 1 {
                format!("1 {}", unit)
            } else {
                format!("{} {}s", value, unit)
            }
        })
        .collect();

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}
