use thrift_schema::wire::TType;
use thrift_schema::{
    BaseType, ConstValue, Program, SchemaError, Struct, Type, TypeKind, TypeRef, category,
    wire_type,
};
use tracing::{trace, warn};

use super::{StructValue, Value};
use crate::protocol::{InputProtocol, OutputProtocol};
use crate::{ProtocolError, WireError};

/// Reads, writes and constructs struct values by walking the schema.
///
/// Local type references resolve against `program`; references into
/// included programs resolve against the include that declares them.
#[derive(Debug, Clone, Copy)]
pub struct SchemaCodec<'a> {
    program: &'a Program,
}

impl<'a> SchemaCodec<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    /// Resolve a struct reference, returning a codec scoped to its home program.
    pub fn resolve(&self, r: &TypeRef) -> Result<(SchemaCodec<'a>, &'a Struct), WireError> {
        let home = self
            .program
            .home_program(r)
            .ok_or_else(|| SchemaError::UnresolvedType {
                name: r.name.clone(),
            })?;
        let def = home.find_struct(&TypeRef::local(&r.name))?;
        Ok((SchemaCodec::new(home), def))
    }

    /// Value of a named constant of this program.
    pub fn constant(&self, name: &str) -> Result<Value, WireError> {
        let c = self
            .program
            .consts
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::UnresolvedType { name: name.into() })?;
        self.const_value(&c.ty, &c.value)
    }

    /// Decode one struct frame.
    ///
    /// Starts from the defaults, so fields absent on the wire keep them.
    /// Unknown ids and known ids carrying the wrong tag are skipped.
    pub fn read_struct(
        &self,
        input: &mut dyn InputProtocol,
        def: &Struct,
    ) -> Result<StructValue, WireError> {
        let mut value = self.construct(def, None)?;
        input.read_struct_begin()?;
        loop {
            let header = input.read_field_begin()?;
            if header.ttype == TType::Stop {
                break;
            }
            match def.field_by_id(header.id) {
                Some(field) => {
                    let expected = wire_type(&field.ty)?;
                    if header.ttype == expected {
                        let v = self.read_value(input, &field.ty)?;
                        value.fields.insert(field.name.clone(), v);
                    } else {
                        warn!(
                            struct_name = %def.name,
                            field = %field.name,
                            expected = expected.name(),
                            actual = header.ttype.name(),
                            "wire type disagrees with schema, skipping field"
                        );
                        input.skip(header.ttype)?;
                    }
                }
                None => {
                    trace!(struct_name = %def.name, id = header.id, "skipping unknown field");
                    input.skip(header.ttype)?;
                }
            }
            input.read_field_end()?;
        }
        input.read_struct_end()?;
        if let Some(missing) = def
            .fields
            .iter()
            .filter(|f| f.is_required())
            .find(|f| value.get(&f.name).is_none())
        {
            return Err(ProtocolError::required_field_unset(&missing.name).into());
        }
        Ok(value)
    }

    pub fn read_value(&self, input: &mut dyn InputProtocol, ty: &Type) -> Result<Value, WireError> {
        Ok(match category(ty) {
            TypeKind::Base(BaseType::Void) => {
                return Err(SchemaError::VoidType {
                    context: ty.display_name(),
                }
                .into());
            }
            TypeKind::Base(BaseType::Bool) => Value::Bool(input.read_bool()?),
            TypeKind::Base(BaseType::I8) => Value::Byte(input.read_byte()?),
            TypeKind::Base(BaseType::I16) => Value::I16(input.read_i16()?),
            TypeKind::Base(BaseType::I32) | TypeKind::Enum(_) => Value::I32(input.read_i32()?),
            TypeKind::Base(BaseType::I64) => Value::I64(input.read_i64()?),
            TypeKind::Base(BaseType::Double) => Value::Double(input.read_double()?),
            TypeKind::Base(BaseType::String) => Value::String(input.read_string()?),
            TypeKind::Base(BaseType::Binary) => Value::Binary(input.read_binary()?),
            TypeKind::Struct(r) | TypeKind::Exception(r) => {
                let (codec, def) = self.resolve(r)?;
                Value::Struct(codec.read_struct(input, def)?)
            }
            TypeKind::List { element } => {
                let header = input.read_list_begin()?;
                let mut items = Vec::with_capacity(header.size.min(1024));
                for _ in 0..header.size {
                    items.push(self.read_value(input, element)?);
                }
                input.read_list_end()?;
                Value::List(items)
            }
            TypeKind::Set { element } => {
                let header = input.read_set_begin()?;
                let mut items = Vec::with_capacity(header.size.min(1024));
                for _ in 0..header.size {
                    items.push(self.read_value(input, element)?);
                }
                input.read_set_end()?;
                Value::Set(items)
            }
            TypeKind::Map { key, value } => {
                let header = input.read_map_begin()?;
                let mut entries = Vec::with_capacity(header.size.min(1024));
                for _ in 0..header.size {
                    let k = self.read_value(input, key)?;
                    let v = self.read_value(input, value)?;
                    entries.push((k, v));
                }
                input.read_map_end()?;
                Value::Map(entries)
            }
        })
    }

    /// Encode one struct frame. Only fields holding a value are written;
    /// the stop marker is always written.
    pub fn write_struct(
        &self,
        output: &mut dyn OutputProtocol,
        def: &Struct,
        value: &StructValue,
    ) -> Result<(), WireError> {
        output.write_struct_begin(&def.name)?;
        for field in &def.fields {
            if let Some(v) = value.get(&field.name) {
                output.write_field_begin(&field.name, wire_type(&field.ty)?, field.id)?;
                self.write_value(output, &field.ty, v)?;
                output.write_field_end()?;
            }
        }
        output.write_field_stop()?;
        output.write_struct_end()
    }

    pub fn write_value(
        &self,
        output: &mut dyn OutputProtocol,
        ty: &Type,
        value: &Value,
    ) -> Result<(), WireError> {
        match (category(ty), value) {
            (TypeKind::Base(BaseType::Bool), Value::Bool(v)) => output.write_bool(*v),
            (TypeKind::Base(BaseType::I8), Value::Byte(v)) => output.write_byte(*v),
            (TypeKind::Base(BaseType::I16), Value::I16(v)) => output.write_i16(*v),
            (TypeKind::Base(BaseType::I32) | TypeKind::Enum(_), Value::I32(v)) => {
                output.write_i32(*v)
            }
            (TypeKind::Base(BaseType::I64), Value::I64(v)) => output.write_i64(*v),
            (TypeKind::Base(BaseType::Double), Value::Double(v)) => output.write_double(*v),
            (TypeKind::Base(BaseType::String), Value::String(v)) => output.write_string(v),
            (TypeKind::Base(BaseType::Binary), Value::Binary(v)) => output.write_binary(v),
            (TypeKind::Struct(r) | TypeKind::Exception(r), Value::Struct(v)) => {
                let (codec, def) = self.resolve(r)?;
                codec.write_struct(output, def, v)
            }
            (TypeKind::List { element }, Value::List(items)) => {
                output.write_list_begin(wire_type(element)?, items.len())?;
                for item in items {
                    self.write_value(output, element, item)?;
                }
                output.write_list_end()
            }
            (TypeKind::Set { element }, Value::Set(items)) => {
                output.write_set_begin(wire_type(element)?, items.len())?;
                for item in items {
                    self.write_value(output, element, item)?;
                }
                output.write_set_end()
            }
            (TypeKind::Map { key, value: vty }, Value::Map(entries)) => {
                output.write_map_begin(wire_type(key)?, wire_type(vty)?, entries.len())?;
                for (k, v) in entries {
                    self.write_value(output, key, k)?;
                    self.write_value(output, vty, v)?;
                }
                output.write_map_end()
            }
            (TypeKind::Base(BaseType::Void), _) => Err(SchemaError::VoidType {
                context: ty.display_name(),
            }
            .into()),
            (_, other) => Err(mismatch(ty, other)),
        }
    }

    /// Build an instance from an optional field bag.
    ///
    /// Defaults are applied first. With a bag, present fields are copied
    /// (nested structs re-constructed, containers copied element-wise) and a
    /// missing required field is an error. A bag that is itself an instance
    /// of one of the struct's exception types is taken wholesale into that slot.
    pub fn construct(
        &self,
        def: &Struct,
        args: Option<&StructValue>,
    ) -> Result<StructValue, WireError> {
        let mut out = StructValue::new(&def.name);
        for field in &def.fields {
            if let Some(default) = &field.default {
                let v = self.const_value(&field.ty, default)?;
                out.fields.insert(field.name.clone(), v);
            }
        }

        let Some(args) = args else {
            return Ok(out);
        };

        for field in &def.fields {
            if let TypeKind::Exception(r) = category(&field.ty)
                && !args.name.is_empty()
                && args.name == r.name
            {
                out.fields
                    .insert(field.name.clone(), Value::Struct(args.clone()));
                return Ok(out);
            }
        }

        for field in &def.fields {
            match args.get(&field.name) {
                Some(v) => {
                    let copied = self.copy_value(&field.ty, v)?;
                    out.fields.insert(field.name.clone(), copied);
                }
                None if field.is_required() => {
                    return Err(ProtocolError::required_field_unset(&field.name).into());
                }
                None => {}
            }
        }
        Ok(out)
    }

    fn copy_value(&self, ty: &Type, value: &Value) -> Result<Value, WireError> {
        Ok(match (category(ty), value) {
            (TypeKind::Struct(r), Value::Struct(v)) => {
                let (codec, def) = self.resolve(r)?;
                Value::Struct(codec.construct(def, Some(v))?)
            }
            (TypeKind::List { element }, Value::List(items)) => Value::List(
                items
                    .iter()
                    .map(|item| self.copy_value(element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (TypeKind::Set { element }, Value::Set(items)) => Value::Set(
                items
                    .iter()
                    .map(|item| self.copy_value(element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (TypeKind::Map { value: vty, .. }, Value::Map(entries)) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.copy_value(vty, v)?)))
                    .collect::<Result<_, WireError>>()?,
            ),
            _ => value.clone(),
        })
    }

    /// Materialize a literal constant against its type.
    pub fn const_value(&self, ty: &Type, value: &ConstValue) -> Result<Value, WireError> {
        Ok(match (category(ty), value) {
            (TypeKind::Base(BaseType::Bool), ConstValue::Integer(i)) => Value::Bool(*i > 0),
            (TypeKind::Base(BaseType::I8), ConstValue::Integer(i)) => {
                Value::Byte(narrow(ty, *i)?)
            }
            (TypeKind::Base(BaseType::I16), ConstValue::Integer(i)) => {
                Value::I16(narrow(ty, *i)?)
            }
            (TypeKind::Base(BaseType::I32) | TypeKind::Enum(_), ConstValue::Integer(i)) => {
                Value::I32(narrow(ty, *i)?)
            }
            (TypeKind::Base(BaseType::I64), ConstValue::Integer(i)) => Value::I64(*i),
            (TypeKind::Base(BaseType::Double), ConstValue::Integer(i)) => Value::Double(*i as f64),
            (TypeKind::Base(BaseType::Double), ConstValue::Double(d)) => Value::Double(*d),
            (TypeKind::Base(BaseType::String), ConstValue::String(s)) => Value::String(s.clone()),
            (TypeKind::Base(BaseType::Binary), ConstValue::String(s)) => {
                Value::Binary(s.as_bytes().to_vec())
            }
            (TypeKind::Struct(r) | TypeKind::Exception(r), ConstValue::Map(entries)) => {
                let (codec, def) = self.resolve(r)?;
                let mut bag = StructValue::bag();
                for (k, v) in entries {
                    let key = k.as_str().ok_or_else(|| {
                        ProtocolError::invalid_data(format!(
                            "struct literal keys must be strings in {}",
                            def.name
                        ))
                    })?;
                    let field = def.field(key).ok_or_else(|| {
                        ProtocolError::invalid_data(format!(
                            "type error: {} has no field {}",
                            def.name, key
                        ))
                    })?;
                    bag.fields
                        .insert(key.to_owned(), codec.const_value(&field.ty, v)?);
                }
                Value::Struct(codec.construct(def, Some(&bag))?)
            }
            (TypeKind::List { element }, ConstValue::List(items)) => Value::List(
                items
                    .iter()
                    .map(|item| self.const_value(element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (TypeKind::Set { element }, ConstValue::List(items)) => Value::Set(
                items
                    .iter()
                    .map(|item| self.const_value(element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (TypeKind::Map { key, value: vty }, ConstValue::Map(entries)) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((self.const_value(key, k)?, self.const_value(vty, v)?)))
                    .collect::<Result<_, WireError>>()?,
            ),
            (_, other) => {
                return Err(ProtocolError::invalid_data(format!(
                    "{} literal does not fit type {}",
                    other.shape_name(),
                    ty.display_name()
                ))
                .into());
            }
        })
    }
}

fn narrow<T: TryFrom<i64>>(ty: &Type, v: i64) -> Result<T, WireError> {
    T::try_from(v).map_err(|_| {
        ProtocolError::invalid_data(format!("{v} is out of range for {}", ty.display_name())).into()
    })
}

fn mismatch(ty: &Type, value: &Value) -> WireError {
    ProtocolError::invalid_data(format!(
        "expected a {} value, found {}",
        ty.display_name(),
        value.kind_name()
    ))
    .into()
}
