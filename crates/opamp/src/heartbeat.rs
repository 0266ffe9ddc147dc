//! Periodic keep-alive loop running on the client worker.

use beacon_common::health::HealthStatus;
use beacon_common::proto::{server_to_agent_flags, AgentToServer, ServerToAgent};
use tokio::sync::watch;

use crate::client::ClientShared;
use crate::messages;

pub(crate) async fn run(shared: &ClientShared, mut running: watch::Receiver<bool>) {
    while *running.borrow_and_update() {
        cycle(shared).await;
        // Interruptible wait: shutdown flips the running flag and the select
        // wakes immediately, even when the flip happened mid-cycle.
        tokio::select! {
            _ = tokio::time::sleep(shared.config.heartbeat_interval) => {}
            _ = running.changed() => {}
        }
    }
    tracing::debug!("heartbeat loop exited");
}

/// One heartbeat exchange. Transport failures mean "no response this cycle";
/// the loop never terminates or escalates because of them.
async fn cycle(shared: &ClientShared) {
    tracing::debug!("sending heartbeat");
    let resp = match shared.send(AgentToServer::default()).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, "heartbeat failed");
            return;
        }
    };
    apply_response(shared, &resp).await;

    if resp.flags & server_to_agent_flags::REPORT_FULL_STATE != 0 {
        tracing::info!("server requested a full state report");
        let description = {
            let session = shared.session.lock().await;
            messages::agent_description(session.instance_uid(), &shared.config.sdk_language)
        };
        let full = AgentToServer {
            agent_description: Some(description),
            health: Some(messages::health(HealthStatus::Healthy, None)),
            ..Default::default()
        };
        match shared.send(full).await {
            Ok(resp) => apply_response(shared, &resp).await,
            Err(e) => tracing::warn!(error = %e, "full state report failed"),
        }
    }
}

async fn apply_response(shared: &ClientShared, resp: &ServerToAgent) {
    let new_hash = {
        let mut session = shared.session.lock().await;
        if session.update_remote_config(resp) {
            session.remote_config_hash().map(<[u8]>::to_vec)
        } else {
            None
        }
    };
    if let Some(hash) = new_hash {
        tracing::info!("remote config updated");
        shared.remote_config_changed(&hash);
    }
}
