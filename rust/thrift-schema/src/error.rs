use std::fmt;

/// Errors raised when a type graph violates an invariant the parser was
/// supposed to guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// `void` used anywhere other than a function return type.
    VoidType { context: String },
    /// A struct, exception or enum reference names nothing in scope.
    UnresolvedType { name: String },
    /// A service `extends` clause names nothing in scope.
    UnresolvedService { name: String },
    /// A service transitively extends itself.
    InheritanceCycle { service: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::VoidType { context } => {
                write!(f, "void is only valid as a function return type ({context})")
            }
            SchemaError::UnresolvedType { name } => write!(f, "unresolved type reference `{name}`"),
            SchemaError::UnresolvedService { name } => {
                write!(f, "unresolved service reference `{name}`")
            }
            SchemaError::InheritanceCycle { service } => {
                write!(f, "service `{service}` extends itself")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
