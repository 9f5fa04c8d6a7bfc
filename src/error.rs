//! Errors reported by fault construction and fault integrators.
use fenris_friction::FrictionError;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Broad classification of a [`FaultError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    InvariantViolation,
    UnknownRequest,
}

/// The kind of field an [`FaultError::UnknownRequest`] refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RequestKind {
    VertexField,
    CellField,
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexField => write!(f, "vertex field"),
            Self::CellField => write!(f, "cell field"),
        }
    }
}

#[derive(Debug)]
pub enum FaultError {
    /// The mesh, the fault vertex set or the fault parameters are not usable.
    ///
    /// `context` names the offending fault, point or field.
    Configuration { context: String, message: String },
    /// Data that the computation relies on is degenerate or missing.
    InvariantViolation { message: String },
    /// A field was requested by a name the fault does not provide.
    UnknownRequest {
        kind: RequestKind,
        name: String,
        fault: String,
    },
}

impl FaultError {
    pub fn configuration(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvariantViolation { .. } => ErrorCategory::InvariantViolation,
            Self::UnknownRequest { .. } => ErrorCategory::UnknownRequest,
        }
    }

    /// Whether the error should abort the run.
    ///
    /// Unknown field requests only fail the requesting call.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownRequest { .. })
    }
}

impl Display for FaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { context, message } => {
                write!(f, "configuration error ({}): {}", context, message)
            }
            Self::InvariantViolation { message } => write!(f, "invariant violation: {}", message),
            Self::UnknownRequest { kind, name, fault } => {
                write!(f, "request for unknown {} '{}' for fault '{}'", kind, name, fault)
            }
        }
    }
}

impl Error for FaultError {}

impl From<FrictionError> for FaultError {
    fn from(error: FrictionError) -> Self {
        Self::configuration("friction", error.to_string())
    }
}
