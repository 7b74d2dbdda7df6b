pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::ReaperSettings;

pub use core::{
    pagination::PageFetcher,
    reaper::{ReapOptions, ReapSummary, Reaper},
};
pub use utils::error::{PipelineError, ReaperError, Result, Stage};
