#![deny(unsafe_code)]

//! The type graph consumed by Thrift code generators.
//!
//! An upstream parser builds a [`Program`] (structs, exceptions, enums,
//! constants and services, plus the programs it includes) and hands it over
//! read-only. Everything downstream looks at types through [`category`],
//! which resolves typedefs first, so no backend ever has to branch on
//! "is this a typedef".
//!
//! ```text
//! .thrift  →  parser  →  Program (this crate)  →  thrift-codegen  →  *_types.js, Service.js
//!                                             ↘  thrift-wire     →  schema-driven codec
//! ```
//!
//! The [`wire`] module carries the tag vocabulary shared by every backend and
//! by the runtime: a field written as `I32` by one language must be read as
//! `I32` by all of them.

mod error;
mod program;
mod types;
pub mod wire;

pub use error::SchemaError;
pub use program::{
    Const, ConstValue, Enum, EnumValue, Field, Function, Program, Requiredness, Service, Struct,
};
pub use types::{
    BaseType, Type, TypeKind, TypeRef, category, element_type, key_type, true_type, wire_type,
};
