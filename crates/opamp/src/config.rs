use std::time::Duration;

pub const SERVER_HOST_ENV: &str = "BEACON_OPAMP_SERVER_HOST";
pub const DEVICE_ID_ENV: &str = "BEACON_INSTRUMENTATION_DEVICE_ID";

#[derive(Debug)]
pub enum ConfigError {
    MissingServerHost,
    MissingDeviceId,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingServerHost => {
                write!(f, "{SERVER_HOST_ENV} environment variable not set")
            }
            Self::MissingDeviceId => {
                write!(f, "{DEVICE_ID_ENV} environment variable not set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Connection parameters for the control channel.
///
/// `server_host` and `device_id` are mandatory; the remaining tunables carry
/// protocol defaults and exist mainly so tests can run with short intervals.
#[derive(Debug, Clone)]
pub struct OpampConfig {
    pub server_host: String,
    pub device_id: String,
    /// Language tag reported as `telemetry.sdk.language`.
    pub sdk_language: String,
    pub request_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub handshake_attempts: u32,
    pub handshake_retry_delay: Duration,
}

impl OpampConfig {
    pub fn new(server_host: impl Into<String>, device_id: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_values(Some(server_host.into()), Some(device_id.into()))
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var(SERVER_HOST_ENV).ok(),
            std::env::var(DEVICE_ID_ENV).ok(),
        )
    }

    fn from_values(server_host: Option<String>, device_id: Option<String>) -> Result<Self, ConfigError> {
        let server_host = server_host
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingServerHost)?;
        let device_id = device_id
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingDeviceId)?;

        Ok(Self {
            server_host,
            device_id,
            sdk_language: "rust".into(),
            request_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(30),
            handshake_attempts: 5,
            handshake_retry_delay: Duration::from_secs(2),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}/v1/opamp", self.server_host)
    }
}
