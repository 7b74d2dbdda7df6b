use crate::domain::model::Page;
use crate::domain::ports::{AuthenticatedTransport, Body, FetchStream};
use crate::utils::error::{ReaperError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Largest `results-per-page` requested from the API. Also the default
/// capacity of every channel in the reap pipeline.
pub const MAXIMUM_RESULTS_PER_PAGE: usize = 50;

/// Follows `next_url` pointers through a paginated collection.
pub struct PageFetcher<T: AuthenticatedTransport> {
    transport: Arc<T>,
    api_url: String,
    access_token: String,
    page_size: usize,
}

impl<T: AuthenticatedTransport> Clone for PageFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            api_url: self.api_url.clone(),
            access_token: self.access_token.clone(),
            page_size: self.page_size,
        }
    }
}

impl<T: AuthenticatedTransport + 'static> PageFetcher<T> {
    pub fn new(
        transport: Arc<T>,
        api_url: impl Into<String>,
        access_token: impl Into<String>,
        page_size: usize,
    ) -> Self {
        let api_url: String = api_url.into();
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            page_size: page_size.clamp(1, MAXIMUM_RESULTS_PER_PAGE),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Resolves an endpoint path or a full URL returned as a page token.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.api_url, endpoint)
        }
    }

    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R> {
        let url = self.url_for(endpoint);
        tracing::debug!("GET {}", url);

        let response = self
            .transport
            .get(&url, &self.access_token)
            .await
            .map_err(|e| ReaperError::Transport {
                method: "GET",
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        if response.status != 200 {
            return Err(ReaperError::Status {
                method: "GET",
                endpoint: endpoint.to_string(),
                status: response.status,
            });
        }

        let body = match response.body {
            None => {
                return Err(ReaperError::MissingBody {
                    endpoint: endpoint.to_string(),
                })
            }
            Some(Body::Unreadable(message)) => {
                return Err(ReaperError::UnreadableBody {
                    endpoint: endpoint.to_string(),
                    message,
                })
            }
            Some(Body::Bytes(bytes)) => bytes,
        };

        serde_json::from_slice(&body).map_err(|source| ReaperError::MalformedPayload {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Accepts 204 (deleted) and 202 (deletion accepted, still in progress).
    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        let url = self.url_for(endpoint);
        tracing::debug!("DELETE {}", url);

        let status = self
            .transport
            .delete(&url, &self.access_token)
            .await
            .map_err(|e| ReaperError::Transport {
                method: "DELETE",
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        match status {
            202 | 204 => Ok(()),
            status => Err(ReaperError::Status {
                method: "DELETE",
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    /// Fetches every page before returning the items in page order.
    pub async fn fetch_all<R: DeserializeOwned>(&self, initial_endpoint: &str) -> Result<Vec<R>> {
        let mut items = Vec::new();
        let mut next = Some(initial_endpoint.to_string());
        let mut pages = 0usize;

        while let Some(endpoint) = next {
            let page: Page<R> = self.get(&endpoint).await?;
            let (page_items, next_token) = page.into_parts();
            pages += 1;
            tracing::debug!("Page {} of {} held {} items", pages, initial_endpoint, page_items.len());
            items.extend(page_items);
            next = next_token;
        }

        Ok(items)
    }

    /// Streams items as each page arrives, from a spawned task.
    ///
    /// The item channel holds one page, so the producer can start the next
    /// request while the consumer works through the current page. A fetch
    /// failure is delivered on the stream's error channel and ends the stream.
    pub fn fetch_streaming<R>(&self, initial_endpoint: &str) -> FetchStream<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let (items_tx, items_rx) = mpsc::channel(self.page_size);
        let (error_tx, error_rx) = oneshot::channel();
        let fetcher = self.clone();
        let initial_endpoint = initial_endpoint.to_string();

        tokio::spawn(async move {
            let mut next = Some(initial_endpoint);

            while let Some(endpoint) = next {
                // Abandon the request as soon as the consumer goes away.
                let fetched = tokio::select! {
                    biased;
                    _ = items_tx.closed() => {
                        tracing::debug!("Consumer of {} went away, stopping", endpoint);
                        return;
                    }
                    fetched = fetcher.get::<Page<R>>(&endpoint) => fetched,
                };

                let page = match fetched {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::debug!("Stream from {} ended with error: {}", endpoint, e);
                        let _ = error_tx.send(e);
                        return;
                    }
                };

                let (page_items, next_token) = page.into_parts();
                for item in page_items {
                    if items_tx.send(item).await.is_err() {
                        tracing::debug!("Consumer of {} went away, stopping", endpoint);
                        return;
                    }
                }
                next = next_token;
            }
        });

        FetchStream {
            items: items_rx,
            error: error_rx,
        }
    }
}
