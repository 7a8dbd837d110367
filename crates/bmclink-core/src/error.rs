// ── Core error types ──
//
// Errors surfaced by the client, the registry and adapters. Transport
// failures keep their classification: `CoreError::Api` wraps
// `bmclink_api::Error` unchanged so callers can still ask whether a call
// timed out or never connected.

use thiserror::Error;

/// Virtual media failures adapters report through the client.
#[derive(Debug, Error)]
pub enum VirtualMediaError {
    #[error("Virtual media not found: {0}")]
    NotFound(String),

    #[error("Virtual media server unreachable: {0}")]
    Connection(String),

    #[error("Virtual media requires a license: {0}")]
    License(String),

    #[error("Virtual media device busy: {0}")]
    Busy(String),
}

/// Task / job failures adapters report through the client.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Job {job_id} did not finish within {timeout_secs}s")]
    Timeout { job_id: String, timeout_secs: u64 },

    #[error("Job {job_id} failed: {message}")]
    Failed { job_id: String, message: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport (classification preserved) ─────────────────────────
    #[error(transparent)]
    Api(#[from] bmclink_api::Error),

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Vendor resolution ────────────────────────────────────────────
    #[error("Unsupported vendor: {message}")]
    UnsupportedVendor { message: String },

    /// The bound adapter opted out of this operation.
    #[error("{operation} is not implemented for vendor '{vendor}'")]
    NotImplemented {
        vendor: String,
        operation: &'static str,
    },

    // ── Caller / payload errors ──────────────────────────────────────
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid adapter payload: {message}")]
    InvalidPayload { message: String },

    // ── Domain errors raised by adapters ─────────────────────────────
    #[error(transparent)]
    VirtualMedia(#[from] VirtualMediaError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Adapter error: {message}")]
    Adapter { message: String },
}

impl CoreError {
    /// A "not implemented" error whose vendor is filled in by the client.
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented {
            vendor: String::new(),
            operation,
        }
    }

    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter {
            message: message.into(),
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    pub fn is_unsupported_vendor(&self) -> bool {
        matches!(self, Self::UnsupportedVendor { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_connection())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_timeout())
    }

    /// Attach the vendor key to a bare "not implemented" error.
    pub(crate) fn with_vendor(self, vendor: &str) -> Self {
        match self {
            Self::NotImplemented {
                vendor: ref v,
                operation,
            } if v.is_empty() => Self::NotImplemented {
                vendor: vendor.to_owned(),
                operation,
            },
            other => other,
        }
    }
}
