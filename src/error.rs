use thiserror::Error;

/// Message shown when no usable response came back from the scanning service.
pub const TRANSPORT_FAILURE: &str = "Failed to connect to scanning service";

/// Message shown when the service answered 2xx with a body that is not a scan result.
pub const MALFORMED_RESULT: &str = "Scanning service returned an unreadable result";

/// Message used when the backend rejects a scan without saying why.
pub const BACKEND_FALLBACK: &str = "Scan failed";

/// Everything that can stop a scan request. None of these are fatal to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Target failed validation; nothing was sent.
    #[error("Please enter a valid target IP or hostname")]
    InvalidTarget,

    /// A scan is already in flight; nothing was sent.
    #[error("A scan is already in progress")]
    Busy,

    #[error("Unknown scan mode: {0}")]
    UnknownMode(String),

    /// Backend answered with a non-2xx status.
    #[error("{0}")]
    Backend(String),

    /// Backend answered 2xx but the body did not parse.
    #[error("{}", MALFORMED_RESULT)]
    Malformed,

    /// No usable response was obtained.
    #[error("{}", TRANSPORT_FAILURE)]
    Transport,
}
