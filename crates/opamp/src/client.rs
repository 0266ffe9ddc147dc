//! Client lifecycle: construction, worker start, handshake signaling and
//! graceful shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use beacon_common::health::HealthStatus;
use beacon_common::proto::{AgentDisconnect, AgentToServer, ServerToAgent};
use prost::Message;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::OpampConfig;
use crate::messages;
use crate::session::SessionState;
use crate::suppress::{InstrumentationSuppression, NoopSuppression};
use crate::transport::{HttpTransport, TransportError};

/// Invoked with the new config hash whenever the server pushes a remote
/// config the agent has not yet acknowledged. Applying the config is the
/// host's business; the client only tracks and echoes the hash.
pub type RemoteConfigCallback = Box<dyn Fn(&[u8]) + Send + Sync>;

/// Outcome of the host's runtime-version precheck.
pub enum RuntimeSupport {
    Supported,
    /// Terminal short-circuit: one disconnect is sent, no worker is started.
    Unsupported { detail: String },
}

pub(crate) struct ClientShared {
    pub(crate) config: OpampConfig,
    pub(crate) session: Mutex<SessionState>,
    pub(crate) running_tx: watch::Sender<bool>,
    transport: HttpTransport,
    handshake_tx: Arc<watch::Sender<bool>>,
    on_remote_config: Option<RemoteConfigCallback>,
}

impl ClientShared {
    /// Stamp, encode, exchange, decode. The session lock is released before
    /// the network round trip so a concurrent shutdown is never blocked on
    /// an in-flight request.
    pub(crate) async fn send(&self, base: AgentToServer) -> Result<ServerToAgent, TransportError> {
        let encoded = {
            let mut session = self.session.lock().await;
            session.stamp(base).encode_to_vec()
        };
        let body = self.transport.send(encoded).await?;
        Ok(messages::decode_response(&body))
    }

    pub(crate) fn signal_handshake(&self) {
        let _ = self.handshake_tx.send(true);
    }

    pub(crate) fn remote_config_changed(&self, hash: &[u8]) {
        if let Some(callback) = &self.on_remote_config {
            callback(hash);
        }
    }

    pub(crate) async fn send_disconnect(
        &self,
        status: HealthStatus,
        last_error: &str,
        with_description: bool,
    ) {
        let mut msg = AgentToServer {
            health: Some(messages::health(status, Some(last_error))),
            agent_disconnect: Some(AgentDisconnect {}),
            ..Default::default()
        };
        if with_description {
            let session = self.session.lock().await;
            msg.agent_description = Some(messages::agent_description(
                session.instance_uid(),
                &self.config.sdk_language,
            ));
        }
        if let Err(e) = self.send(msg).await {
            tracing::warn!(error = %e, status = status.as_str(), "failed to deliver disconnect");
        }
    }
}

/// Control-channel client owned by the host process.
///
/// One worker task runs the handshake and then the heartbeat loop,
/// sequentially. The host blocks only on [`OpampClient::wait_for_handshake`]
/// (bounded) and on the join inside [`OpampClient::shutdown`].
pub struct OpampClient {
    /// None when connection parameters are unusable; every operation then
    /// short-circuits without network I/O.
    inner: Option<Arc<ClientShared>>,
    handshake_tx: Arc<watch::Sender<bool>>,
    handshake_rx: watch::Receiver<bool>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl OpampClient {
    pub fn new(config: OpampConfig) -> Self {
        Self::build(Some(config), Arc::new(NoopSuppression), None)
    }

    pub fn with_collaborators(
        config: OpampConfig,
        suppression: Arc<dyn InstrumentationSuppression>,
        on_remote_config: Option<RemoteConfigCallback>,
    ) -> Self {
        Self::build(Some(config), suppression, on_remote_config)
    }

    /// Resolve connection parameters from the environment. A missing
    /// parameter does not fail construction; the client comes up disabled
    /// and still unblocks the host on start.
    pub fn from_env(
        suppression: Arc<dyn InstrumentationSuppression>,
        on_remote_config: Option<RemoteConfigCallback>,
    ) -> Self {
        let config = match OpampConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::error!(error = %e, "control channel disabled");
                None
            }
        };
        Self::build(config, suppression, on_remote_config)
    }

    fn build(
        config: Option<OpampConfig>,
        suppression: Arc<dyn InstrumentationSuppression>,
        on_remote_config: Option<RemoteConfigCallback>,
    ) -> Self {
        let (handshake_tx, handshake_rx) = watch::channel(false);
        let handshake_tx = Arc::new(handshake_tx);

        let inner = config.map(|config| {
            let (running_tx, _) = watch::channel(true);
            Arc::new(ClientShared {
                transport: HttpTransport::new(&config, suppression.clone()),
                session: Mutex::new(SessionState::new()),
                running_tx,
                handshake_tx: handshake_tx.clone(),
                on_remote_config,
                config,
            })
        });

        Self {
            inner,
            handshake_tx,
            handshake_rx,
            worker: std::sync::Mutex::new(None),
        }
    }

    /// Begin the session. Spawns the worker unless the runtime precheck
    /// failed or connection parameters are missing; both short-circuits
    /// still fire the handshake-complete signal so the host never stalls.
    pub async fn start(&self, runtime: RuntimeSupport) {
        let Some(shared) = self.inner.clone() else {
            let _ = self.handshake_tx.send(true);
            return;
        };

        if let RuntimeSupport::Unsupported { detail } = runtime {
            tracing::warn!(detail = %detail, "unsupported runtime, sending disconnect");
            // The session ends here; clearing the flag first makes a later
            // shutdown a no-op instead of a second disconnect.
            shared.running_tx.send_replace(false);
            shared
                .send_disconnect(HealthStatus::UnsupportedRuntimeVersion, &detail, true)
                .await;
            shared.signal_handshake();
            return;
        }

        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            return;
        }
        let running = shared.running_tx.subscribe();
        *guard = Some(tokio::spawn(worker_entry(shared, running)));
    }

    /// Block until the handshake phase resolves, or until the timeout.
    /// Returns true when the signal fired; attributes may still be empty if
    /// the retries were exhausted.
    pub async fn wait_for_handshake(&self, timeout: Duration) -> bool {
        let mut rx = self.handshake_rx.clone();
        tokio::time::timeout(timeout, async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .is_ok()
    }

    /// Snapshot of the attributes extracted from the server's first config
    /// push. Empty until the handshake succeeds, and stays empty when it
    /// never does.
    pub async fn resource_attributes(&self) -> HashMap<String, String> {
        match &self.inner {
            Some(shared) => shared.session.lock().await.resource_attributes.clone(),
            None => HashMap::new(),
        }
    }

    /// Stop the worker and send the final disconnect. Idempotent; only the
    /// first call does anything. The worker is joined before the disconnect
    /// goes out so it is guaranteed to be the last message of the session.
    pub async fn shutdown(&self) {
        let Some(shared) = &self.inner else {
            return;
        };
        if !shared.running_tx.send_replace(false) {
            return;
        }

        let handle = {
            let mut guard = match self.worker.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        // No worker means no session was ever opened with the server, so
        // there is nothing to disconnect.
        let Some(handle) = handle else {
            return;
        };
        let _ = handle.await;

        tracing::info!("sending disconnect to control server");
        shared
            .send_disconnect(HealthStatus::Terminated, "host process is exiting", false)
            .await;
    }
}

async fn worker_entry(shared: Arc<ClientShared>, running: watch::Receiver<bool>) {
    let body = {
        let shared = shared.clone();
        tokio::spawn(async move {
            crate::handshake::run(&shared).await;
            shared.signal_handshake();
            crate::heartbeat::run(&shared, running).await;
        })
    };

    // A panicked worker is a programming defect, not a transport error:
    // report it as an agent failure and make sure the host is unblocked.
    if let Err(e) = body.await {
        tracing::error!(error = %e, "opamp worker aborted");
        shared
            .send_disconnect(HealthStatus::AgentFailure, &e.to_string(), false)
            .await;
        shared.signal_handshake();
    }
}
