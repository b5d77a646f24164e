use std::fmt;

use thrift_schema::wire::{ApplicationExceptionKind, TType};

use crate::WireError;
use crate::protocol::{InputProtocol, OutputProtocol};

/// The generic exception exchanged when a call fails for a reason other than
/// a declared exception.
///
/// On the wire it is an ordinary struct: field 1 `message`, field 2 `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationException {
    pub kind: ApplicationExceptionKind,
    pub message: String,
}

impl ApplicationException {
    pub fn new(kind: ApplicationExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_method(name: &str) -> Self {
        Self::new(
            ApplicationExceptionKind::UnknownMethod,
            format!("Unknown function {name}"),
        )
    }

    pub fn read(input: &mut dyn InputProtocol) -> Result<Self, WireError> {
        let mut out = Self::new(ApplicationExceptionKind::Unknown, "");
        input.read_struct_begin()?;
        loop {
            let header = input.read_field_begin()?;
            if header.ttype == TType::Stop {
                break;
            }
            match (header.id, header.ttype) {
                (1, TType::String) => out.message = input.read_string()?,
                (2, TType::I32) => {
                    out.kind = ApplicationExceptionKind::from_i32(input.read_i32()?)
                }
                _ => input.skip(header.ttype)?,
            }
            input.read_field_end()?;
        }
        input.read_struct_end()?;
        Ok(out)
    }

    pub fn write(&self, output: &mut dyn OutputProtocol) -> Result<(), WireError> {
        output.write_struct_begin("TApplicationException")?;
        if !self.message.is_empty() {
            output.write_field_begin("message", TType::String, 1)?;
            output.write_string(&self.message)?;
            output.write_field_end()?;
        }
        output.write_field_begin("type", TType::I32, 2)?;
        output.write_i32(self.kind as i32)?;
        output.write_field_end()?;
        output.write_field_stop()?;
        output.write_struct_end()
    }
}

impl fmt::Display for ApplicationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind.name())
    }
}

impl std::error::Error for ApplicationException {}
