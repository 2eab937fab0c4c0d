use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::constants::EVENTS_PATH;
use crate::utils::normalize_adaptor_url;
use crate::DeliveryError;
use crate::Event;
use crate::Result;

/// Downstream consumer of event batches
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Adaptor: Send + Sync + 'static {
    async fn deliver(
        &self,
        events: &[Event],
    ) -> Result<()>;
}

/// Posts batches as a JSON array to `{url}/events`
#[derive(Debug, Clone)]
pub struct HttpAdaptor {
    client: reqwest::Client,
    events_url: String,
}

impl HttpAdaptor {
    pub fn new(
        url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base = normalize_adaptor_url(url, false)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Http)?;

        Ok(Self {
            client,
            events_url: format!("{base}/{EVENTS_PATH}"),
        })
    }

    pub fn events_url(&self) -> &str {
        &self.events_url
    }
}

#[async_trait::async_trait]
impl Adaptor for HttpAdaptor {
    async fn deliver(
        &self,
        events: &[Event],
    ) -> Result<()> {
        let body = serde_json::to_vec(events).map_err(DeliveryError::Encode)?;
        debug!(url = %self.events_url, events = events.len(), bytes = body.len(), "posting batch");

        let response = self
            .client
            .post(&self.events_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(DeliveryError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(())
    }
}
