use clap::Parser;
use instance_reaper::adapters::report::ConsoleReport;
use instance_reaper::domain::ports::SystemClock;
use instance_reaper::utils::{logger, validation::Validate};
use instance_reaper::{app, CliConfig, ReaperError, ReaperSettings};
use std::process::ExitCode;
use std::sync::Arc;

fn settings_from(config: CliConfig) -> Result<ReaperSettings, ReaperError> {
    let settings = config.into_settings()?;
    settings.validate()?;
    Ok(settings)
}

fn failure_message(error: &ReaperError) -> String {
    match error {
        ReaperError::Authentication { .. } => format!("Authentication failed: {}", error),
        _ => format!("Failed: {}", error),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_json);
    tracing::info!("Starting instance-reaper");

    let settings = match settings_from(config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            return ExitCode::from(e.exit_code());
        }
    };
    tracing::debug!("Settings: {:?}", settings);

    match app::run(&settings, Arc::new(SystemClock), Arc::new(ConsoleReport)).await {
        Ok(summary) => {
            tracing::info!(
                expired = summary.expired,
                deleted = summary.deleted,
                "✅ Reap completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Reap failed: {}", e);
            eprintln!("{}", failure_message(&e));
            eprintln!("💡 {}", e.recovery_suggestion());
            ExitCode::from(e.exit_code())
        }
    }
}
