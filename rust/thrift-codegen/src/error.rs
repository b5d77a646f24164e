use std::fmt;

use thrift_schema::SchemaError;

/// Conditions that abort generation. No output is produced once one is hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    Schema(SchemaError),
    /// A field, element or key typed `void`.
    VoidField { field: String, serialize: bool },
    /// A struct literal names a field the struct does not declare.
    NoSuchField { struct_name: String, field: String },
    /// A constant literal whose shape does not fit its declared type.
    ConstShape { expected: String, context: String },
    InvalidOptions(String),
    Fmt,
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Schema(e) => write!(f, "{e}"),
            GenError::VoidField { field, serialize } => {
                let what = if *serialize { "SERIALIZE" } else { "DESERIALIZE" };
                write!(f, "CANNOT GENERATE {what} CODE FOR void TYPE: {field}")
            }
            GenError::NoSuchField { struct_name, field } => {
                write!(f, "type error: {struct_name} has no field {field}")
            }
            GenError::ConstShape { expected, context } => {
                write!(f, "type error: expected a {expected} literal for {context}")
            }
            GenError::InvalidOptions(msg) => f.write_str(msg),
            GenError::Fmt => f.write_str("failed to write generated code"),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenError::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for GenError {
    fn from(e: SchemaError) -> Self {
        GenError::Schema(e)
    }
}

impl From<fmt::Error> for GenError {
    fn from(_: fmt::Error) -> Self {
        GenError::Fmt
    }
}
