use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{SchemaError, Type, TypeRef};

/// Requiredness of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requiredness {
    Required,
    Optional,
    /// Neither keyword given: written when set, never enforced.
    #[default]
    Default,
}

/// A literal constant as parsed from IDL.
///
/// `Map` is used both for true maps and for struct literals; the type it is
/// rendered against decides which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    Integer(i64),
    Double(f64),
    String(String),
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
}

impl ConstValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            ConstValue::Integer(_) => "integer",
            ConstValue::Double(_) => "double",
            ConstValue::String(_) => "string",
            ConstValue::List(_) => "list",
            ConstValue::Map(_) => "map",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i16,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub req: Requiredness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConstValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Field {
    pub fn new(id: i16, name: impl Into<String>, ty: Type) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            req: Requiredness::Default,
            default: None,
            doc: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.req = Requiredness::Required;
        self
    }

    pub fn optional(mut self) -> Self {
        self.req = Requiredness::Optional;
        self
    }

    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn is_required(&self) -> bool {
        self.req == Requiredness::Required
    }
}

/// A struct or, with `exception` set, an exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Struct {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            exception: false,
            doc: None,
        }
    }

    pub fn exception(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            exception: true,
            ..Self::new(name, fields)
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_id(&self, id: i16) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Const {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub value: ConstValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    #[serde(default)]
    pub args: Vec<Field>,
    /// Declared throws clauses, each an exception-typed field.
    #[serde(default)]
    pub throws: Vec<Field>,
    #[serde(default)]
    pub oneway: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: Type, args: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            return_type,
            args,
            throws: Vec::new(),
            oneway: false,
            doc: None,
        }
    }

    pub fn throws(mut self, throws: Vec<Field>) -> Self {
        self.throws = throws;
        self
    }

    pub fn oneway(mut self) -> Self {
        self.oneway = true;
        self
    }

    pub fn args_struct_name(&self, service: &str) -> String {
        format!("{service}_{}_args", self.name)
    }

    pub fn result_struct_name(&self, service: &str) -> String {
        format!("{service}_{}_result", self.name)
    }

    /// The argument list as a struct named `name`.
    pub fn args_struct(&self, name: impl Into<String>) -> Struct {
        Struct::new(name, self.args.clone())
    }

    /// The reply slots as a struct named `name`: `success` (id 0, absent for
    /// void functions) followed by every declared exception.
    pub fn result_struct(&self, name: impl Into<String>) -> Struct {
        let mut fields = Vec::with_capacity(self.throws.len() + 1);
        if !self.return_type.is_void() {
            fields.push(Field::new(0, "success", self.return_type.clone()));
        }
        fields.extend(self.throws.iter().cloned());
        Struct::new(name, fields)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>, functions: Vec<Function>) -> Self {
        Self {
            name: name.into(),
            functions,
            extends: None,
            doc: None,
        }
    }

    pub fn extending(mut self, parent: TypeRef) -> Self {
        self.extends = Some(parent);
        self
    }
}

/// A compilation unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    /// Language → namespace, e.g. `"js" → "Shared.Api"`.
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
    #[serde(default)]
    pub includes: Vec<Program>,
    /// Set when includes are generated alongside this program.
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub enums: Vec<Enum>,
    #[serde(default)]
    pub consts: Vec<Const>,
    /// Structs and exceptions in declaration order.
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn namespace(&self, lang: &str) -> Option<&str> {
        self.namespaces
            .get(lang)
            .map(String::as_str)
            .filter(|ns| !ns.is_empty())
    }

    /// The program a reference lives in: `self` for local references,
    /// otherwise the include of that name (searched transitively).
    pub fn home_program(&self, r: &TypeRef) -> Option<&Program> {
        match &r.program {
            None => Some(self),
            Some(name) if *name == self.name => Some(self),
            Some(name) => self.find_program(name),
        }
    }

    /// This program or a transitive include with the given name.
    pub fn find_program(&self, name: &str) -> Option<&Program> {
        if self.name == name {
            return Some(self);
        }
        self.includes.iter().find_map(|inc| inc.find_program(name))
    }

    pub fn find_struct(&self, r: &TypeRef) -> Result<&Struct, SchemaError> {
        self.home_program(r)
            .and_then(|p| p.structs.iter().find(|s| s.name == r.name))
            .ok_or_else(|| SchemaError::UnresolvedType {
                name: r.name.clone(),
            })
    }

    pub fn find_enum(&self, r: &TypeRef) -> Result<&Enum, SchemaError> {
        self.home_program(r)
            .and_then(|p| p.enums.iter().find(|e| e.name == r.name))
            .ok_or_else(|| SchemaError::UnresolvedType {
                name: r.name.clone(),
            })
    }

    /// Resolve a service reference, returning it with its home program.
    pub fn find_service(&self, r: &TypeRef) -> Result<(&Program, &Service), SchemaError> {
        self.home_program(r)
            .and_then(|p| {
                p.services
                    .iter()
                    .find(|s| s.name == r.name)
                    .map(|s| (p, s))
            })
            .ok_or_else(|| SchemaError::UnresolvedService {
                name: r.name.clone(),
            })
    }

    /// Ancestors of `service`, nearest parent first.
    pub fn ancestors<'a>(
        &'a self,
        service: &'a Service,
    ) -> Result<Vec<(&'a Program, &'a Service)>, SchemaError> {
        let mut chain: Vec<(&Program, &Service)> = Vec::new();
        let mut scope: &Program = self;
        let mut current = service;
        while let Some(parent) = &current.extends {
            let (home, next) = scope.find_service(parent)?;
            let seen = std::ptr::eq(next, service)
                || chain.iter().any(|(_, s)| std::ptr::eq(*s, next));
            if seen {
                return Err(SchemaError::InheritanceCycle {
                    service: service.name.clone(),
                });
            }
            chain.push((home, next));
            scope = home;
            current = next;
        }
        Ok(chain)
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &Struct> {
        self.structs.iter().filter(|s| s.exception)
    }

    pub fn plain_structs(&self) -> impl Iterator<Item = &Struct> {
        self.structs.iter().filter(|s| !s.exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> Program {
        let mut p = Program::new("shared");
        p.structs.push(Struct::new(
            "SharedStruct",
            vec![Field::new(1, "key", Type::I32)],
        ));
        p.services.push(Service::new("SharedService", vec![]));
        p
    }

    #[test]
    fn references_resolve_through_includes() {
        let mut p = Program::new("tutorial");
        p.includes.push(shared());
        let r = TypeRef::in_program("SharedStruct", "shared");
        assert_eq!(p.find_struct(&r).unwrap().name, "SharedStruct");
        assert_eq!(p.home_program(&r).unwrap().name, "shared");
        assert!(p.find_struct(&TypeRef::local("SharedStruct")).is_err());
    }

    #[test]
    fn ancestors_follow_extends() {
        let mut p = Program::new("tutorial");
        p.includes.push(shared());
        p.services.push(
            Service::new("Calculator", vec![])
                .extending(TypeRef::in_program("SharedService", "shared")),
        );
        let calc = &p.services[0];
        let chain = p.ancestors(calc).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].1.name, "SharedService");
        assert_eq!(chain[0].0.name, "shared");
    }

    #[test]
    fn result_struct_puts_success_first() {
        let f = Function::new("calculate", Type::I32, vec![Field::new(1, "logid", Type::I32)])
            .throws(vec![Field::new(1, "ouch", Type::exception_ref("InvalidOperation"))]);
        let result = f.result_struct(f.result_struct_name("Calculator"));
        assert_eq!(result.name, "Calculator_calculate_result");
        let ids: Vec<(i16, &str)> = result
            .fields
            .iter()
            .map(|f| (f.id, f.name.as_str()))
            .collect();
        assert_eq!(ids, vec![(0, "success"), (1, "ouch")]);

        let ping = Function::new("ping", Type::Void, vec![]);
        assert!(ping.result_struct("Calculator_ping_result").fields.is_empty());
        assert_eq!(ping.args_struct_name("Calculator"), "Calculator_ping_args");
    }

    #[test]
    fn inheritance_cycles_are_rejected() {
        let mut p = Program::new("loop");
        p.services
            .push(Service::new("A", vec![]).extending(TypeRef::local("B")));
        p.services
            .push(Service::new("B", vec![]).extending(TypeRef::local("A")));
        let err = p.ancestors(&p.services[0]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InheritanceCycle {
                service: "A".into()
            }
        );
    }
}
