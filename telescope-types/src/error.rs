use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error kind, stable across the HTTP and tool surfaces.
///
/// Kept separate from [`Error`] so that callers can `match` on the kind
/// without pattern-matching the full variant (which may carry a source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConnected,
    AlreadyConnected,
    Disconnected,
    RangeError,
    NotFound,
    DriverError,
    TimeoutError,
    SessionClosed,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotConnected => "not_connected",
            ErrorKind::AlreadyConnected => "already_connected",
            ErrorKind::Disconnected => "disconnected",
            ErrorKind::RangeError => "range_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::DriverError => "driver_error",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::SessionClosed => "session_closed",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{device} is not connected")]
    NotConnected { device: String },

    #[error("{device} is already connected")]
    AlreadyConnected { device: String },

    #[error("{device} disconnected: {source}")]
    Disconnected {
        device: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{what} out of range: {detail}")]
    RangeError { what: String, detail: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("driver error on {device}: {source}")]
    DriverError {
        device: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{what} timed out after {elapsed_ms} ms")]
    TimeoutError { what: String, elapsed_ms: u64 },

    #[error("session {session_id} is closed")]
    SessionClosed { session_id: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConnected { .. } => ErrorKind::NotConnected,
            Error::AlreadyConnected { .. } => ErrorKind::AlreadyConnected,
            Error::Disconnected { .. } => ErrorKind::Disconnected,
            Error::RangeError { .. } => ErrorKind::RangeError,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::DriverError { .. } => ErrorKind::DriverError,
            Error::TimeoutError { .. } => ErrorKind::TimeoutError,
            Error::SessionClosed { .. } => ErrorKind::SessionClosed,
            Error::Internal(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn not_connected(device: impl Into<String>) -> Self {
        Error::NotConnected { device: device.into() }
    }

    pub fn already_connected(device: impl Into<String>) -> Self {
        Error::AlreadyConnected { device: device.into() }
    }

    pub fn disconnected(device: impl Into<String>, source: anyhow::Error) -> Self {
        Error::Disconnected { device: device.into(), source }
    }

    pub fn range(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::RangeError { what: what.into(), detail: detail.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    pub fn driver(device: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Error::DriverError { device: device.into(), source: source.into() }
    }

    pub fn timeout(what: impl Into<String>, elapsed_ms: u64) -> Self {
        Error::TimeoutError { what: what.into(), elapsed_ms }
    }

    pub fn session_closed(session_id: impl Into<String>) -> Self {
        Error::SessionClosed { session_id: session_id.into() }
    }
}
