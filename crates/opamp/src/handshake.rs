//! First exchange with the control server, with bounded retries.
//!
//! Retry exhaustion is a degraded outcome, not an error: the host simply
//! gets no resource attributes, and the heartbeat loop still starts so the
//! agent keeps reporting health. Delay and attempt count are fixed (no
//! backoff) to match the server's expectations.

use beacon_common::health::HealthStatus;
use beacon_common::proto::AgentToServer;

use crate::client::ClientShared;
use crate::messages;
use crate::remote_config;
use crate::transport::TransportError;

enum AttemptError {
    Transport(TransportError),
    EmptyResponse,
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::EmptyResponse => write!(f, "empty response from control server"),
        }
    }
}

pub(crate) async fn run(shared: &ClientShared) {
    let attempts = shared.config.handshake_attempts.max(1);
    for attempt in 1..=attempts {
        match attempt_once(shared).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(attempt, max_attempts = attempts, error = %e, "handshake attempt failed");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(shared.config.handshake_retry_delay).await;
        }
    }
    tracing::error!("handshake retries exhausted, continuing without resource attributes");
}

async fn attempt_once(shared: &ClientShared) -> Result<(), AttemptError> {
    let description = {
        let session = shared.session.lock().await;
        messages::agent_description(session.instance_uid(), &shared.config.sdk_language)
    };
    let first = AgentToServer {
        agent_description: Some(description),
        health: Some(messages::health(
            HealthStatus::Starting,
            Some("agent is starting"),
        )),
        ..Default::default()
    };

    let resp = shared.send(first).await.map_err(AttemptError::Transport)?;
    if resp.is_empty() {
        return Err(AttemptError::EmptyResponse);
    }

    {
        let mut session = shared.session.lock().await;
        session.update_remote_config(&resp);
        session.resource_attributes = remote_config::extract_resource_attributes(&resp);
    }

    tracing::info!("control channel established, reporting healthy");
    let healthy = AgentToServer {
        health: Some(messages::health(HealthStatus::Healthy, None)),
        ..Default::default()
    };
    // One shot; a lost healthy report is recovered by the next heartbeat.
    if let Err(e) = shared.send(healthy).await {
        tracing::warn!(error = %e, "failed to report healthy");
    }
    Ok(())
}
