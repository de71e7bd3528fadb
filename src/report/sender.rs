use super::types::Report;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report destination not configured")]
    MissingDestination,

    #[error("Invalid report destination: {0}")]
    InvalidDestination(String),

    #[error("Failed to send report: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Report rejected with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Response of an accepted delivery
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

#[derive(Debug)]
pub enum SendOutcome {
    Delivered(Delivery),
    Failed(ReportError),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered(_))
    }
}

/// Outbound JSON POST
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<Delivery, ReportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<Delivery, ReportError> {
        let resp = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Delivery {
            status: status.as_u16(),
            body,
        })
    }
}

/// Delivers the run report. One attempt per call; failures are logged and returned, never raised.
pub struct ReportSender<T = HttpTransport> {
    transport: T,
}

impl ReportSender<HttpTransport> {
    pub fn http() -> Self {
        Self::new(HttpTransport::new())
    }
}

impl<T: ReportTransport> ReportSender<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn send(&self, report: &Report, endpoint: Option<&str>) -> SendOutcome {
        match self.try_send(report, endpoint).await {
            Ok(delivery) => {
                log::info!("Report delivered: {} {}", delivery.status, delivery.body);
                SendOutcome::Delivered(delivery)
            }
            Err(err) => {
                log::error!("{}", err);
                SendOutcome::Failed(err)
            }
        }
    }

    async fn try_send(&self, report: &Report, endpoint: Option<&str>) -> Result<Delivery, ReportError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ReportError::MissingDestination)?;

        let url = Url::parse(endpoint)
            .map_err(|e| ReportError::InvalidDestination(format!("{} ({})", endpoint, e)))?;

        let body = serde_json::to_vec(&[report.to_wire()])?;
        log::debug!("Posting report to {}", url);

        self.transport.post_json(&url, body).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory transport that records every call
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub calls: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
        pub reject_with: Option<u16>,
    }

    impl RecordingTransport {
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn last_body(&self) -> Option<serde_json::Value> {
            self.calls.lock().unwrap().last().map(|(_, body)| body.clone())
        }
    }

    #[async_trait]
    impl ReportTransport for RecordingTransport {
        async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<Delivery, ReportError> {
            let body = serde_json::from_slice(&body)?;
            self.calls.lock().unwrap().push((url.to_string(), body));
            match self.reject_with {
                Some(status) => Err(ReportError::Status {
                    status,
                    body: "rejected".to_string(),
                }),
                None => Ok(Delivery {
                    status: 200,
                    body: "ok".to_string(),
                }),
            }
        }
    }
}
