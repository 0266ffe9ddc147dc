//! Subset of the OpAMP wire schema exchanged with the control server.
//!
//! Messages are written directly with prost derives, keeping the upstream
//! field tags so the encoding stays compatible with any conformant server.
//! Only the fields this agent actually sends or reads are present; unknown
//! fields in server responses are skipped by prost during decode.

use std::collections::HashMap;

/// Envelope for everything the agent sends.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentToServer {
    /// 16-byte instance identifier, identical for every message of a session.
    #[prost(bytes = "vec", tag = "1")]
    pub instance_uid: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub sequence_num: u64,
    /// Sent on handshake and on a server-requested full-state report.
    #[prost(message, optional, tag = "3")]
    pub agent_description: Option<AgentDescription>,
    #[prost(message, optional, tag = "5")]
    pub health: Option<ComponentHealth>,
    /// Echo of the last remote config hash the agent has seen.
    #[prost(message, optional, tag = "7")]
    pub remote_config_status: Option<RemoteConfigStatus>,
    /// Marks the final message of a session.
    #[prost(message, optional, tag = "9")]
    pub agent_disconnect: Option<AgentDisconnect>,
}

/// Envelope for everything the server sends back.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerToAgent {
    #[prost(bytes = "vec", tag = "1")]
    pub instance_uid: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub remote_config: Option<AgentRemoteConfig>,
    /// Bitmask, see [`server_to_agent_flags`].
    #[prost(uint64, tag = "9")]
    pub flags: u64,
}

impl ServerToAgent {
    /// A default-valued response carries no information; transport failures
    /// and undecodable bodies are both represented this way.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub mod server_to_agent_flags {
    /// Server requests a full agent-description + health re-report.
    pub const REPORT_FULL_STATE: u64 = 0x0000_0001;
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentDescription {
    #[prost(message, repeated, tag = "1")]
    pub identifying_attributes: Vec<KeyValue>,
    #[prost(message, repeated, tag = "2")]
    pub non_identifying_attributes: Vec<KeyValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ComponentHealth {
    #[prost(bool, tag = "1")]
    pub healthy: bool,
    #[prost(string, tag = "3")]
    pub last_error: String,
    #[prost(string, tag = "4")]
    pub status: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentDisconnect {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RemoteConfigStatus {
    #[prost(bytes = "vec", tag = "1")]
    pub last_remote_config_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentRemoteConfig {
    #[prost(message, optional, tag = "1")]
    pub config: Option<AgentConfigMap>,
    #[prost(bytes = "vec", tag = "2")]
    pub config_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentConfigMap {
    #[prost(map = "string, message", tag = "1")]
    pub config_map: HashMap<String, AgentConfigFile>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AgentConfigFile {
    #[prost(bytes = "vec", tag = "1")]
    pub body: Vec<u8>,
    #[prost(string, tag = "2")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct KeyValue {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<AnyValue>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AnyValue {
    #[prost(oneof = "any_value::Value", tags = "1, 2, 3, 4")]
    pub value: Option<any_value::Value>,
}

pub mod any_value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "1")]
        StringValue(String),
        #[prost(bool, tag = "2")]
        BoolValue(bool),
        #[prost(int64, tag = "3")]
        IntValue(i64),
        #[prost(double, tag = "4")]
        DoubleValue(f64),
    }
}

impl AnyValue {
    pub fn string(v: impl Into<String>) -> Self {
        Self {
            value: Some(any_value::Value::StringValue(v.into())),
        }
    }

    pub fn int(v: i64) -> Self {
        Self {
            value: Some(any_value::Value::IntValue(v)),
        }
    }
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: AnyValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
        }
    }
}
