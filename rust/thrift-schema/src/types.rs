use serde::{Deserialize, Serialize};

use crate::SchemaError;
use crate::wire::TType;

/// A type node as produced by the parser.
///
/// Typedefs are kept in the graph so diagnostics can name them, but every
/// consumer goes through [`true_type`] or [`category`] before dispatching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    /// Same wire encoding as `String`, different representation in the target.
    Binary,
    Enum(TypeRef),
    Struct(TypeRef),
    Exception(TypeRef),
    Typedef {
        name: String,
        target: Box<Type>,
    },
    List {
        element: Box<Type>,
    },
    Set {
        element: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List {
            element: Box::new(element),
        }
    }

    pub fn set(element: Type) -> Self {
        Type::Set {
            element: Box::new(element),
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn typedef(name: impl Into<String>, target: Type) -> Self {
        Type::Typedef {
            name: name.into(),
            target: Box::new(target),
        }
    }

    pub fn struct_ref(name: impl Into<String>) -> Self {
        Type::Struct(TypeRef::local(name))
    }

    pub fn exception_ref(name: impl Into<String>) -> Self {
        Type::Exception(TypeRef::local(name))
    }

    pub fn enum_ref(name: impl Into<String>) -> Self {
        Type::Enum(TypeRef::local(name))
    }

    pub fn is_void(&self) -> bool {
        matches!(true_type(self), Type::Void)
    }

    /// Name used in diagnostics. Typedefs report their alias.
    pub fn display_name(&self) -> String {
        match self {
            Type::Void => "void".into(),
            Type::Bool => "bool".into(),
            Type::I8 => "i8".into(),
            Type::I16 => "i16".into(),
            Type::I32 => "i32".into(),
            Type::I64 => "i64".into(),
            Type::Double => "double".into(),
            Type::String => "string".into(),
            Type::Binary => "binary".into(),
            Type::Enum(r) | Type::Struct(r) | Type::Exception(r) => r.name.clone(),
            Type::Typedef { name, .. } => name.clone(),
            Type::List { element } => format!("list<{}>", element.display_name()),
            Type::Set { element } => format!("set<{}>", element.display_name()),
            Type::Map { key, value } => {
                format!("map<{},{}>", key.display_name(), value.display_name())
            }
        }
    }
}

/// Reference to a named enum, struct or exception.
///
/// `program` names the home program when it differs from the program being
/// generated; `None` means "declared locally".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl TypeRef {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: None,
        }
    }

    pub fn in_program(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: Some(program.into()),
        }
    }
}

/// The base (non-composite) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
}

impl BaseType {
    /// Binary is a string variant on the wire.
    pub fn is_binary(self) -> bool {
        matches!(self, BaseType::Binary)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, BaseType::String | BaseType::Binary)
    }
}

/// Classification of a resolved type for code generation.
#[derive(Debug, Clone, Copy)]
pub enum TypeKind<'a> {
    Base(BaseType),
    Enum(&'a TypeRef),
    Struct(&'a TypeRef),
    Exception(&'a TypeRef),
    List { element: &'a Type },
    Set { element: &'a Type },
    Map { key: &'a Type, value: &'a Type },
}

impl TypeKind<'_> {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TypeKind::List { .. } | TypeKind::Set { .. } | TypeKind::Map { .. }
        )
    }

    pub fn is_struct_like(&self) -> bool {
        matches!(self, TypeKind::Struct(_) | TypeKind::Exception(_))
    }
}

/// Follow typedef chains down to a non-typedef type.
///
/// The graph is a tree of owned boxes, so a typedef cycle cannot be built.
pub fn true_type(ty: &Type) -> &Type {
    let mut current = ty;
    while let Type::Typedef { target, .. } = current {
        current = target;
    }
    current
}

/// Classify a type, resolving typedefs first.
pub fn category(ty: &Type) -> TypeKind<'_> {
    match true_type(ty) {
        Type::Void => TypeKind::Base(BaseType::Void),
        Type::Bool => TypeKind::Base(BaseType::Bool),
        Type::I8 => TypeKind::Base(BaseType::I8),
        Type::I16 => TypeKind::Base(BaseType::I16),
        Type::I32 => TypeKind::Base(BaseType::I32),
        Type::I64 => TypeKind::Base(BaseType::I64),
        Type::Double => TypeKind::Base(BaseType::Double),
        Type::String => TypeKind::Base(BaseType::String),
        Type::Binary => TypeKind::Base(BaseType::Binary),
        Type::Enum(r) => TypeKind::Enum(r),
        Type::Struct(r) => TypeKind::Struct(r),
        Type::Exception(r) => TypeKind::Exception(r),
        Type::List { element } => TypeKind::List { element },
        Type::Set { element } => TypeKind::Set { element },
        Type::Map { key, value } => TypeKind::Map { key, value },
        Type::Typedef { .. } => unreachable!("true_type never returns a typedef"),
    }
}

/// Contained type of a container: the element for list/set, the value for map.
///
/// Returns `None` for non-containers.
pub fn element_type(ty: &Type) -> Option<&Type> {
    match category(ty) {
        TypeKind::List { element } | TypeKind::Set { element } => Some(element),
        TypeKind::Map { value, .. } => Some(value),
        _ => None,
    }
}

/// Key type of a map, `None` for anything else.
pub fn key_type(ty: &Type) -> Option<&Type> {
    match category(ty) {
        TypeKind::Map { key, .. } => Some(key),
        _ => None,
    }
}

/// Wire tag for a type. `void` has no tag and is rejected.
pub fn wire_type(ty: &Type) -> Result<TType, SchemaError> {
    Ok(match category(ty) {
        TypeKind::Base(BaseType::Void) => {
            return Err(SchemaError::VoidType {
                context: ty.display_name(),
            });
        }
        TypeKind::Base(BaseType::Bool) => TType::Bool,
        TypeKind::Base(BaseType::I8) => TType::Byte,
        TypeKind::Base(BaseType::I16) => TType::I16,
        TypeKind::Base(BaseType::I32) => TType::I32,
        TypeKind::Base(BaseType::I64) => TType::I64,
        TypeKind::Base(BaseType::Double) => TType::Double,
        TypeKind::Base(BaseType::String | BaseType::Binary) => TType::String,
        TypeKind::Enum(_) => TType::I32,
        TypeKind::Struct(_) | TypeKind::Exception(_) => TType::Struct,
        TypeKind::List { .. } => TType::List,
        TypeKind::Set { .. } => TType::Set,
        TypeKind::Map { .. } => TType::Map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedef_chains_resolve() {
        let ty = Type::typedef("Outer", Type::typedef("Inner", Type::I64));
        assert_eq!(true_type(&ty), &Type::I64);
        assert!(matches!(category(&ty), TypeKind::Base(BaseType::I64)));
    }

    #[test]
    fn map_element_is_value_type() {
        let ty = Type::map(Type::String, Type::list(Type::I32));
        assert_eq!(element_type(&ty), Some(&Type::list(Type::I32)));
        assert_eq!(key_type(&ty), Some(&Type::String));
        assert_eq!(element_type(&Type::I32), None);
    }

    #[test]
    fn enums_travel_as_i32() {
        assert_eq!(wire_type(&Type::enum_ref("Color")).unwrap(), TType::I32);
        assert_eq!(wire_type(&Type::Binary).unwrap(), TType::String);
        assert_eq!(wire_type(&Type::I8).unwrap(), TType::Byte);
    }

    #[test]
    fn void_has_no_wire_type() {
        let err = wire_type(&Type::typedef("Nothing", Type::Void)).unwrap_err();
        assert!(matches!(err, SchemaError::VoidType { .. }));
    }
}
