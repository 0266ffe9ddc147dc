//! Builders for the agent side of the wire protocol.

use beacon_common::health::HealthStatus;
use beacon_common::proto::{
    AgentDescription, AnyValue, ComponentHealth, KeyValue, ServerToAgent,
};
use prost::Message;
use uuid::Uuid;

pub const SERVICE_INSTANCE_ID: &str = "service.instance.id";
pub const PROCESS_PID: &str = "process.pid";
pub const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";

/// Identity attributes sent on handshake and on a full-state report.
pub fn agent_description(instance_uid: Uuid, sdk_language: &str) -> AgentDescription {
    AgentDescription {
        identifying_attributes: vec![
            KeyValue::new(SERVICE_INSTANCE_ID, AnyValue::string(instance_uid.to_string())),
            KeyValue::new(PROCESS_PID, AnyValue::int(std::process::id() as i64)),
            KeyValue::new(TELEMETRY_SDK_LANGUAGE, AnyValue::string(sdk_language)),
        ],
        non_identifying_attributes: Vec::new(),
    }
}

pub fn health(status: HealthStatus, last_error: Option<&str>) -> ComponentHealth {
    ComponentHealth {
        healthy: status.is_healthy(),
        last_error: last_error.unwrap_or_default().to_string(),
        status: status.as_str().to_string(),
    }
}

/// Decode a server response, tolerating garbage. The protocol treats an
/// undecodable body the same as no response at all, so this logs and returns
/// the empty message instead of failing.
pub fn decode_response(bytes: &[u8]) -> ServerToAgent {
    match ServerToAgent::decode(bytes) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable response from control server");
            ServerToAgent::default()
        }
    }
}
