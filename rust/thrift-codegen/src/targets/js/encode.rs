//! Field writers.

use thrift_schema::{BaseType, Type, TypeKind, category, wire_type};

use super::{JsGenerator, Out};
use crate::{GenError, cw_writeln};

/// Protocol method suffix for a scalar: `writeI32`, `readBinary`, ...
pub(super) fn primitive(kind: TypeKind<'_>) -> Option<&'static str> {
    Some(match kind {
        TypeKind::Base(BaseType::Bool) => "Bool",
        TypeKind::Base(BaseType::I8) => "Byte",
        TypeKind::Base(BaseType::I16) => "I16",
        TypeKind::Base(BaseType::I32) | TypeKind::Enum(_) => "I32",
        TypeKind::Base(BaseType::I64) => "I64",
        TypeKind::Base(BaseType::Double) => "Double",
        TypeKind::Base(BaseType::String) => "String",
        TypeKind::Base(BaseType::Binary) => "Binary",
        _ => return None,
    })
}

/// `Thrift.Type.I32` and friends.
pub(super) fn type_tag(ty: &Type) -> Result<String, GenError> {
    Ok(format!("Thrift.Type.{}", wire_type(ty)?.name()))
}

impl JsGenerator<'_> {
    /// Write the value held in `name`.
    pub(super) fn write_field(&self, w: &mut Out, ty: &Type, name: &str) -> Result<(), GenError> {
        if ty.is_void() {
            return Err(GenError::VoidField {
                field: name.to_string(),
                serialize: true,
            });
        }
        tracing::trace!(field = name, ty = %ty.display_name(), "write");

        let kind = category(ty);
        match kind {
            TypeKind::Struct(_) | TypeKind::Exception(_) => {
                cw_writeln!(w, "{name}[Symbol.for(\"write\")](output);")?;
            }
            TypeKind::Map { key, value } => {
                cw_writeln!(
                    w,
                    "output.writeMapBegin({}, {}, Thrift.objectLength({name}));",
                    type_tag(key)?,
                    type_tag(value)?
                )?;
                let kiter = self.tmp("kiter");
                let viter = self.tmp("viter");
                let l = self.syntax.let_kw();
                cw_writeln!(w, "for ({l}{kiter} in {name}) {{")?;
                {
                    let _loop = w.indent();
                    cw_writeln!(w, "if ({name}.hasOwnProperty({kiter})) {{")?;
                    {
                        let _own = w.indent();
                        cw_writeln!(w, "{l}{viter} = {name}[{kiter}];")?;
                        self.write_field(w, key, &kiter)?;
                        self.write_field(w, value, &viter)?;
                    }
                    w.writeln("}")?;
                }
                w.writeln("}")?;
                w.writeln("output.writeMapEnd();")?;
            }
            TypeKind::List { element } | TypeKind::Set { element } => {
                let marker = if matches!(kind, TypeKind::Set { .. }) { "Set" } else { "List" };
                cw_writeln!(
                    w,
                    "output.write{marker}Begin({}, {name}.length);",
                    type_tag(element)?
                )?;
                let iter = self.tmp("iter");
                let l = self.syntax.let_kw();
                cw_writeln!(w, "for ({l}{iter} in {name}) {{")?;
                {
                    let _loop = w.indent();
                    cw_writeln!(w, "if ({name}.hasOwnProperty({iter})) {{")?;
                    {
                        let _own = w.indent();
                        cw_writeln!(w, "{iter} = {name}[{iter}];")?;
                        self.write_field(w, element, &iter)?;
                    }
                    w.writeln("}")?;
                }
                w.writeln("}")?;
                cw_writeln!(w, "output.write{marker}End();")?;
            }
            scalar => {
                let method = primitive(scalar).ok_or_else(|| GenError::VoidField {
                    field: name.to_string(),
                    serialize: true,
                })?;
                cw_writeln!(w, "output.write{method}({name});")?;
            }
        }
        Ok(())
    }
}
