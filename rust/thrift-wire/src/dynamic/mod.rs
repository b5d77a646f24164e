//! Schema-driven (reflective) codec and RPC plumbing.
//!
//! Executes the same state machines the generator emits, against a
//! [`thrift_schema::Program`] instead of generated classes.

mod codec;
mod rpc;
mod value;

pub use codec::SchemaCodec;
pub use rpc::{Client, Handler, HandlerError, Processor, RpcReply};
pub use value::{StructValue, Value};
