use std::sync::Arc;
use std::time::Duration;

use crate::config::OpampConfig;
use crate::suppress::InstrumentationSuppression;

pub const CONTENT_TYPE: &str = "application/x-protobuf";
pub const DEVICE_ID_HEADER: &str = "X-Beacon-Device-Id";

#[derive(Debug)]
pub enum TransportError {
    Timeout,
    Connect(String),
    Rejected(u16),
    Body(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect(e) => write!(f, "connect: {e}"),
            Self::Rejected(code) => write!(f, "rejected with status {code}"),
            Self::Body(e) => write!(f, "reading response body: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Connect(e.to_string())
        }
    }
}

/// One request/response exchange with the control server per call.
///
/// Failures never escalate beyond the returned error; callers treat them as
/// "no response this cycle" and carry on.
pub struct HttpTransport {
    url: String,
    device_id: String,
    timeout: Duration,
    http: reqwest::Client,
    suppression: Arc<dyn InstrumentationSuppression>,
}

impl HttpTransport {
    pub fn new(config: &OpampConfig, suppression: Arc<dyn InstrumentationSuppression>) -> Self {
        Self {
            url: config.server_url(),
            device_id: config.device_id.clone(),
            timeout: config.request_timeout,
            http: reqwest::Client::new(),
            suppression,
        }
    }

    pub async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        // Held across the whole exchange so the host's instrumentation
        // ignores this request.
        let _scope = self.suppression.enter();

        let resp = self
            .http
            .post(&self.url)
            .header("Content-Type", CONTENT_TYPE)
            .header(DEVICE_ID_HEADER, &self.device_id)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(TransportError::Rejected(status));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
