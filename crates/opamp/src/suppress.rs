use std::any::Any;

/// Seam to the host's telemetry-suppression mechanism.
///
/// The client's own HTTP exchanges must not be captured by whatever
/// instrumentation the host installs, otherwise the agent recursively
/// instruments itself. The returned guard is held for the duration of one
/// exchange and dropped when it completes.
pub trait InstrumentationSuppression: Send + Sync {
    fn enter(&self) -> Box<dyn Any + Send>;
}

/// Default when the host installs no instrumentation of its own.
pub struct NoopSuppression;

impl InstrumentationSuppression for NoopSuppression {
    fn enter(&self) -> Box<dyn Any + Send> {
        Box::new(())
    }
}
