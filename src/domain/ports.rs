use crate::domain::model::{Service, ServiceInstance, ServicePlan};
use crate::utils::error::{ReaperError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone)]
pub enum Body {
    Bytes(Vec<u8>),
    /// The body could not be read; carries the read failure.
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Body>,
}

/// Bearer-token authenticated HTTP calls. Implementations must be safe for
/// concurrent use by independent requests.
#[async_trait]
pub trait AuthenticatedTransport: Send + Sync {
    async fn get(&self, url: &str, access_token: &str) -> Result<TransportResponse>;
    async fn delete(&self, url: &str, access_token: &str) -> Result<u16>;
}

/// Items of a collection arriving page by page, plus a single-slot channel
/// carrying the fetch error that ended the stream early, if any.
///
/// Both channels close once the producing task finishes.
#[derive(Debug)]
pub struct FetchStream<T> {
    pub items: mpsc::Receiver<T>,
    pub error: oneshot::Receiver<ReaperError>,
}

/// Typed access to the control-plane API.
#[async_trait]
pub trait CloudController: Send + Sync {
    async fn list_services_by_name(&self, name: &str) -> Result<Vec<Service>>;
    async fn list_plans(&self, service_id: &str) -> Result<Vec<ServicePlan>>;
    fn stream_instances(&self, plan_id: &str) -> FetchStream<ServiceInstance>;
    async fn delete_instance(&self, instance_id: &str, recursive: bool) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Append-only text output for the reap report.
pub trait ReportSink: Send + Sync {
    fn line(&self, line: &str);
}
