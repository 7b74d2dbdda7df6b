pub mod expiry;
pub mod pagination;
pub mod reaper;

pub use crate::domain::model::{Metadata, Page, Service, ServiceInstance, ServicePlan};
pub use crate::domain::ports::{AuthenticatedTransport, CloudController, Clock, ReportSink};
pub use crate::utils::error::Result;
