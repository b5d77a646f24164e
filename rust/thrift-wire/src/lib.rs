#![deny(unsafe_code)]

//! Runtime counterpart of the generated JavaScript: transports, the strict
//! binary protocol, the generic application exception, and a schema-driven
//! codec plus client/processor that behave exactly like generated code.

mod application;
mod binary;
pub mod dynamic;
mod error;
pub mod protocol;
mod transport;

pub use application::ApplicationException;
pub use binary::BinaryProtocol;
pub use error::{ProtocolError, TransportError, WireError};
pub use protocol::{InputProtocol, OutputProtocol};
pub use transport::{MemoryTransport, Transport};
