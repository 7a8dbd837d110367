use std::fmt;

use thiserror::Error;

/// Why a connection attempt failed.
///
/// Only [`Unreachable`](Self::Unreachable) is worth retrying; the TLS
/// variants describe a misconfiguration that a retry will not fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Nothing accepted the TCP connection (refused, DNS, routing).
    Unreachable,
    /// The port accepted TCP but the TLS handshake failed.
    TlsHandshake,
    /// The port answered plain HTTP while TLS was requested.
    PlaintextOnTlsPort,
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => f.write_str("unreachable"),
            Self::TlsHandshake => f.write_str("TLS handshake failed"),
            Self::PlaintextOnTlsPort => f.write_str("plain HTTP listener on a TLS port"),
        }
    }
}

/// Top-level error type for the `bmclink-api` crate.
///
/// Transport failures are classified into a small taxonomy so callers never
/// need to inspect `reqwest` internals. Anything the classifier does not
/// recognise is carried unchanged in [`Transport`](Self::Transport).
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// Host unreachable, connection refused, or TLS failure.
    #[error("Failed to connect to {host} ({kind}): {reason}")]
    Connection {
        host: String,
        reason: String,
        kind: ConnectionKind,
    },

    /// Request deadline exceeded.
    #[error("Request to {host} timed out after {timeout_secs}s")]
    Timeout { host: String, timeout_secs: u64 },

    /// HTTP client construction failed (bad CA bundle, TLS backend).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// The BMC answered with a status the caller cannot use.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// A retryable failure persisted through the whole retry budget.
    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Unclassified HTTP client error, propagated as-is.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The innermost error, looking through retry wrappers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { kind, .. } => *kind == ConnectionKind::Unreachable,
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Returns `true` for any connection-level failure, TLS included.
    pub fn is_connection(&self) -> bool {
        matches!(self.root_cause(), Self::Connection { .. })
    }

    /// Returns `true` if the request (or every retry of it) timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), Self::Timeout { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self.root_cause() {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Statuses the transport retries: request timeout, rate limiting, and the
/// gateway/server family.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}
