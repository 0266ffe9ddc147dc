use std::collections::HashMap;

use beacon_common::proto::{AgentToServer, RemoteConfigStatus, ServerToAgent};
use uuid::Uuid;

/// Mutable per-session state shared between the worker and shutdown.
///
/// Guarded by the client's session mutex; the lock is never held across
/// network I/O. The identity and counter live exactly as long as the session,
/// nothing here survives a process restart.
pub struct SessionState {
    instance_uid: Uuid,
    sequence_num: u64,
    remote_config_status: Option<RemoteConfigStatus>,
    pub resource_attributes: HashMap<String, String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            instance_uid: Uuid::now_v7(),
            sequence_num: 0,
            remote_config_status: None,
            resource_attributes: HashMap::new(),
        }
    }

    pub fn instance_uid(&self) -> Uuid {
        self.instance_uid
    }

    /// Stamp an outgoing message with the session identity, the next
    /// sequence number and the remote config echo. Every message passes
    /// through here exactly once, so the counter increases by exactly 1 per
    /// send and is never reused.
    pub fn stamp(&mut self, mut msg: AgentToServer) -> AgentToServer {
        msg.instance_uid = self.instance_uid.as_bytes().to_vec();
        msg.sequence_num = self.sequence_num;
        if let Some(status) = &self.remote_config_status {
            msg.remote_config_status = Some(status.clone());
        }
        self.sequence_num += 1;
        msg
    }

    /// Record the config hash from a server response. Returns true when the
    /// response carried a remote config, which is the signal consumed by the
    /// config-application collaborator.
    pub fn update_remote_config(&mut self, resp: &ServerToAgent) -> bool {
        match &resp.remote_config {
            Some(remote_config) => {
                self.remote_config_status = Some(RemoteConfigStatus {
                    last_remote_config_hash: remote_config.config_hash.clone(),
                });
                true
            }
            None => false,
        }
    }

    pub fn remote_config_hash(&self) -> Option<&[u8]> {
        self.remote_config_status
            .as_ref()
            .map(|s| s.last_remote_config_hash.as_slice())
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_common::proto::AgentRemoteConfig;

    #[test]
    fn stamp_increments_sequence_and_keeps_identity() {
        let mut session = SessionState::new();
        let first = session.stamp(AgentToServer::default());
        let second = session.stamp(AgentToServer::default());

        assert_eq!(first.sequence_num, 0);
        assert_eq!(second.sequence_num, 1);
        assert_eq!(first.instance_uid.len(), 16);
        assert_eq!(first.instance_uid, second.instance_uid);
    }

    #[test]
    fn no_echo_before_any_remote_config() {
        let mut session = SessionState::new();
        let msg = session.stamp(AgentToServer::default());
        assert!(msg.remote_config_status.is_none());
    }

    #[test]
    fn hash_is_echoed_until_replaced() {
        let mut session = SessionState::new();

        let resp = ServerToAgent {
            remote_config: Some(AgentRemoteConfig {
                config: None,
                config_hash: b"h1".to_vec(),
            }),
            ..Default::default()
        };
        assert!(session.update_remote_config(&resp));

        let msg = session.stamp(AgentToServer::default());
        assert_eq!(
            msg.remote_config_status.unwrap().last_remote_config_hash,
            b"h1".to_vec()
        );

        let newer = ServerToAgent {
            remote_config: Some(AgentRemoteConfig {
                config: None,
                config_hash: b"h2".to_vec(),
            }),
            ..Default::default()
        };
        assert!(session.update_remote_config(&newer));
        assert_eq!(session.remote_config_hash(), Some(&b"h2"[..]));
    }

    #[test]
    fn response_without_config_does_not_notify() {
        let mut session = SessionState::new();
        assert!(!session.update_remote_config(&ServerToAgent::default()));
        assert!(session.remote_config_hash().is_none());
    }
}
