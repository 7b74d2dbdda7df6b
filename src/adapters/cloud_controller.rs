use crate::core::pagination::PageFetcher;
use crate::domain::model::{Service, ServiceInstance, ServicePlan};
use crate::domain::ports::{AuthenticatedTransport, CloudController, FetchStream};
use crate::utils::error::Result;
use std::sync::Arc;
use url::form_urlencoded;

/// Client for the v2 control-plane endpoints the reaper needs.
pub struct CloudControllerClient<T: AuthenticatedTransport> {
    fetcher: PageFetcher<T>,
}

impl<T: AuthenticatedTransport + 'static> CloudControllerClient<T> {
    pub fn new(
        transport: Arc<T>,
        api_url: impl Into<String>,
        access_token: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            fetcher: PageFetcher::new(transport, api_url, access_token, page_size),
        }
    }

    fn page_size(&self) -> usize {
        self.fetcher.page_size()
    }
}

#[async_trait::async_trait]
impl<T: AuthenticatedTransport + 'static> CloudController for CloudControllerClient<T> {
    async fn list_services_by_name(&self, name: &str) -> Result<Vec<Service>> {
        let query: String =
            form_urlencoded::byte_serialize(format!("label:{}", name).as_bytes()).collect();
        let endpoint = format!(
            "/v2/services?q={}&results-per-page={}",
            query,
            self.page_size()
        );
        self.fetcher.fetch_all(&endpoint).await
    }

    async fn list_plans(&self, service_id: &str) -> Result<Vec<ServicePlan>> {
        let endpoint = format!(
            "/v2/services/{}/service_plans?results-per-page={}",
            service_id,
            self.page_size()
        );
        self.fetcher.fetch_all(&endpoint).await
    }

    fn stream_instances(&self, plan_id: &str) -> FetchStream<ServiceInstance> {
        let endpoint = format!(
            "/v2/service_plans/{}/service_instances?results-per-page={}",
            plan_id,
            self.page_size()
        );
        self.fetcher.fetch_streaming(&endpoint)
    }

    async fn delete_instance(&self, instance_id: &str, recursive: bool) -> Result<()> {
        let endpoint = format!(
            "/v2/service_instances/{}?accepts_incomplete=true&async=true&recursive={}",
            instance_id, recursive
        );
        self.fetcher.delete(&endpoint).await
    }
}
