#![deny(unsafe_code)]

//! JavaScript code generation for Thrift IDL.
//!
//! # What Comes Out
//!
//! Given a [`Program`](thrift_schema::Program), this crate produces the
//! modules a JavaScript Thrift runtime expects:
//!
//! - **`<program>_types.js`**: enums, constants, structs and exceptions, each
//!   struct with a field-by-field reader and writer
//! - **`<Service>.js`**: argument and result helper structs, a client and, for
//!   node, a processor that dispatches to a user handler
//! - **`.d.ts`** declarations for all of the above, when asked for
//! - **`thrift.js.episode`**, a module index other runs can import from
//!
//! # Usage
//!
//! ```ignore
//! use thrift_codegen::{JsOptions, generate};
//!
//! let program: thrift_schema::Program = serde_json::from_str(&ast)?;
//! let options = JsOptions::node().es6().ts();
//!
//! for file in generate(&program, &options)? {
//!     std::fs::write(out_dir.join(&file.name), file.contents)?;
//! }
//! ```
//!
//! # The Pipeline
//!
//! ```text
//! Program  →  type classifier  →  field codecs  →  struct codecs  →  *_types.js
//!                                                ↘  args/result   →  client, processor  →  Service.js
//! ```
//!
//! Every codec decision goes through [`thrift_schema::category`], so
//! typedefs never reach the emitters. Services reuse the struct pipeline
//! wholesale: each method turns into an `_args` and a `_result` struct, and
//! the RPC layer is thin control flow around their readers and writers.
//!
//! # Dialects
//!
//! Node and browser output differ in module plumbing and in how replies
//! reach the caller; es5 and es6 differ in classes and promises. The
//! differences are confined to [`Syntax`], built once per run from
//! [`JsOptions`]. Nothing about the wire format depends on the dialect.

pub mod code_writer;
mod error;
mod options;
mod render;
pub mod targets;

pub use error::GenError;
pub use options::JsOptions;
pub use targets::js::{EPISODE_FILE_NAME, GeneratedFile, Syntax, generate};
