//! Outbound client for the relay stage.

use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::http::request::X_REQUEST_ID;
use crate::pipeline::{HopError, ImageReference, Stage};
use crate::relay::RELAY_PATH;
use crate::resilience::{with_deadline, HopTimeouts};

/// Pooled client posting image references to the relay.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    endpoint: Url,
    timeouts: HopTimeouts,
}

impl RelayClient {
    /// Build a client for the relay rooted at `base_url`.
    pub fn new(base_url: &str, timeouts: HopTimeouts) -> Result<Self, HopError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(RELAY_PATH))
            .map_err(|e| HopError::Request {
                target: Stage::Relay,
                reason: e.to_string(),
            })?;

        // Internal hop: never routed through a system proxy.
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .no_proxy()
            .build()
            .map_err(|e| HopError::Request {
                target: Stage::Relay,
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeouts,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `reference` as the plain-text body and collect the JPEG reply.
    pub async fn forward(
        &self,
        reference: &ImageReference,
        request_id: &str,
    ) -> Result<Bytes, HopError> {
        with_deadline(Stage::Relay, self.timeouts.total, async {
            let response = self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .header(X_REQUEST_ID, request_id)
                .body(reference.as_str().to_owned())
                .send()
                .await
                .map_err(|e| self.map_error(e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(HopError::Status {
                    target: Stage::Relay,
                    status,
                });
            }

            response.bytes().await.map_err(|e| self.map_error(e))
        })
        .await
    }

    fn map_error(&self, e: reqwest::Error) -> HopError {
        if e.is_timeout() {
            let timeout = if e.is_connect() {
                self.timeouts.connect
            } else {
                self.timeouts.total
            };
            HopError::Timeout {
                target: Stage::Relay,
                timeout,
            }
        } else {
            HopError::Unreachable {
                target: Stage::Relay,
                reason: e.to_string(),
            }
        }
    }
}
