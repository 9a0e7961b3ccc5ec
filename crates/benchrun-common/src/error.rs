//! Error types for benchrun controllers
//!
//! Errors carry enough context (run name, resource kind) to be actionable
//! from a log line alone. Readiness that has not yet converged is never an
//! error: it is expressed as a requeue directive by the engine.

use thiserror::Error;

/// Main error type for benchrun operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error (network, timeout, write conflict, ...)
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A run spec failed its upfront validation
    #[error("validation error for {run}: {message}")]
    Validation {
        /// Name of the run with the invalid spec
        run: String,
        /// Description of what's invalid
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred (e.g. "engine", "access")
        context: String,
    },
}

impl Error {
    /// Create a validation error with run context
    pub fn validation_for(run: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            run: run.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation and serialization errors are deterministic and will fail the
    /// same way on every pass. Kubernetes errors are retried except for 4xx
    /// responses, with 409 (write conflict) as the one retryable client error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => match source {
                kube::Error::Api(ae) if ae.code == 409 => true,
                kube::Error::Api(ae) => !(400..500).contains(&ae.code),
                _ => true,
            },
            Error::Validation { .. } => false,
            Error::Serialization { .. } => false,
            Error::Internal { .. } => true,
        }
    }
}
