use crate::domain::ports::{AuthenticatedTransport, Body, TransportResponse};
use crate::utils::error::Result;
use reqwest::header::ACCEPT;
use reqwest::Client;

/// `reqwest`-backed transport. The client is shared by every concurrent fetch.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(skip_ssl_validation: bool) -> Result<Self> {
        if skip_ssl_validation {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()?;
        Ok(Self { client })
    }

    /// The underlying client, for unauthenticated calls such as login.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl AuthenticatedTransport for ReqwestTransport {
    async fn get(&self, url: &str, access_token: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::debug!("GET {} -> {}", url, status);

        let body = match response.bytes().await {
            Ok(bytes) => Body::Bytes(bytes.to_vec()),
            Err(e) => Body::Unreadable(e.to_string()),
        };

        Ok(TransportResponse {
            status,
            body: Some(body),
        })
    }

    async fn delete(&self, url: &str, access_token: &str) -> Result<u16> {
        let response = self
            .client
            .delete(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::debug!("DELETE {} -> {}", url, status);
        Ok(status)
    }
}
