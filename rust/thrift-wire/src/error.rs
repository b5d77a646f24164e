use std::fmt;

use thrift_schema::SchemaError;
use thrift_schema::wire::ProtocolErrorKind;

use crate::ApplicationException;

/// Failures of the byte-moving layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    NotOpen,
    /// A read needed more bytes than the transport holds.
    UnexpectedEof { wanted: usize, available: usize },
    /// The transport refused a write that would grow the pending frame past its limit.
    WriteLimit { limit: usize },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotOpen => write!(f, "transport is not open"),
            TransportError::UnexpectedEof { wanted, available } => write!(
                f,
                "unexpected end of input: wanted {wanted} bytes, {available} available"
            ),
            TransportError::WriteLimit { limit } => {
                write!(f, "write exceeds the {limit} byte frame limit")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// A protocol-level violation: malformed bytes or data the schema rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub message: String,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::InvalidData, message)
    }

    /// Raised when a required field is absent, whether built locally or decoded.
    pub fn required_field_unset(field: &str) -> Self {
        Self::new(
            ProtocolErrorKind::Unknown,
            format!("Required field {field} is unset!"),
        )
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol error ({}): {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for ProtocolError {}

#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    Transport(TransportError),
    Protocol(ProtocolError),
    /// A generic application exception received from, or raised for, the peer.
    Application(ApplicationException),
    Schema(SchemaError),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Transport(e) => write!(f, "transport error: {e}"),
            WireError::Protocol(e) => write!(f, "{e}"),
            WireError::Application(e) => write!(f, "application exception: {e}"),
            WireError::Schema(e) => write!(f, "schema error: {e}"),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Transport(e) => Some(e),
            WireError::Protocol(e) => Some(e),
            WireError::Application(e) => Some(e),
            WireError::Schema(e) => Some(e),
        }
    }
}

impl From<TransportError> for WireError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<ProtocolError> for WireError {
    fn from(value: ProtocolError) -> Self {
        Self::Protocol(value)
    }
}

impl From<ApplicationException> for WireError {
    fn from(value: ApplicationException) -> Self {
        Self::Application(value)
    }
}

impl From<SchemaError> for WireError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}
