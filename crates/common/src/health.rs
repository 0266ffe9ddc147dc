/// Agent lifecycle states reported to the control server.
///
/// The wire label travels in `ComponentHealth.status`; the boolean
/// `ComponentHealth.healthy` flag is derived from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Initial state, set until the handshake succeeds.
    Starting,
    /// Normal operating state after a successful handshake.
    Healthy,
    /// The monitored runtime is below the minimum supported version.
    UnsupportedRuntimeVersion,
    /// Set exactly once, as part of graceful shutdown.
    Terminated,
    /// An internal defect aborted the client worker.
    AgentFailure,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "Starting",
            Self::Healthy => "Healthy",
            Self::UnsupportedRuntimeVersion => "UnsupportedRuntimeVersion",
            Self::Terminated => "Terminated",
            Self::AgentFailure => "AgentFailure",
        }
    }

    /// Only `Healthy` maps to `healthy = true` on the wire.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
