/// Configures per-request HTTP behavior.
///
/// The client never retries; a timeout here bounds the single round trip.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds. `None` leaves the request unbounded.
    pub timeout_ms: Option<u64>,
}

impl ClientOptions {
    /// Options with a request timeout.
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
        }
    }
}
