//! Field readers.

use thrift_schema::{Type, TypeKind, category};

use super::encode::primitive;
use super::{JsGenerator, Out};
use crate::{GenError, cw_writeln};

impl JsGenerator<'_> {
    /// Read one value into `name`.
    pub(super) fn read_field(&self, w: &mut Out, ty: &Type, name: &str) -> Result<(), GenError> {
        if ty.is_void() {
            return Err(GenError::VoidField {
                field: name.to_string(),
                serialize: false,
            });
        }
        tracing::trace!(field = name, ty = %ty.display_name(), "read");

        let kind = category(ty);
        match kind {
            TypeKind::Struct(r) | TypeKind::Exception(r) => {
                cw_writeln!(w, "{name} = new {}();", self.qualified(r)?)?;
                cw_writeln!(w, "{name}[Symbol.for(\"read\")](input);")?;
            }
            TypeKind::Map { .. } | TypeKind::List { .. } | TypeKind::Set { .. } => {
                self.read_container(w, kind, name)?;
            }
            scalar => {
                let method = primitive(scalar).ok_or_else(|| GenError::VoidField {
                    field: name.to_string(),
                    serialize: false,
                })?;
                // The browser protocols hand back `{ value }` wrappers.
                let unwrap = if self.syntax.node() { "" } else { ".value" };
                cw_writeln!(w, "{name} = input.read{method}(){unwrap};")?;
            }
        }
        Ok(())
    }

    fn read_container(&self, w: &mut Out, kind: TypeKind<'_>, name: &str) -> Result<(), GenError> {
        let size = self.tmp("_size");
        let header = self.tmp("_rtmp3");
        let c = self.syntax.const_kw();
        let l = self.syntax.let_kw();

        let marker = match kind {
            TypeKind::Map { .. } => {
                cw_writeln!(w, "{name} = {{}};")?;
                "Map"
            }
            TypeKind::Set { .. } => {
                cw_writeln!(w, "{name} = [];")?;
                "Set"
            }
            _ => {
                cw_writeln!(w, "{name} = [];")?;
                "List"
            }
        };
        cw_writeln!(w, "{c}{header} = input.read{marker}Begin();")?;
        cw_writeln!(w, "{c}{size} = {header}.size || 0;")?;

        let i = self.tmp("_i");
        cw_writeln!(w, "for ({l}{i} = 0; {i} < {size}; ++{i}) {{")?;
        {
            let _loop = w.indent();
            match kind {
                TypeKind::Map { key, value } => {
                    if !self.syntax.node() {
                        // The JSON protocol keeps map entries on a read stack.
                        cw_writeln!(w, "if ({i} > 0 ) {{")?;
                        w.writeln(
                            "  if (input.rstack.length > input.rpos[input.rpos.length -1] + 1) {",
                        )?;
                        w.writeln("    input.rstack.pop();")?;
                        w.writeln("  }")?;
                        w.writeln("}")?;
                    }
                    let k = self.tmp("key");
                    let v = self.tmp("val");
                    cw_writeln!(w, "{l}{k} = null;")?;
                    cw_writeln!(w, "{l}{v} = null;")?;
                    self.read_field(w, key, &k)?;
                    self.read_field(w, value, &v)?;
                    cw_writeln!(w, "{name}[{k}] = {v};")?;
                }
                TypeKind::List { element } | TypeKind::Set { element } => {
                    let elem = self.tmp("elem");
                    cw_writeln!(w, "{l}{elem} = null;")?;
                    self.read_field(w, element, &elem)?;
                    cw_writeln!(w, "{name}.push({elem});")?;
                }
                _ => {}
            }
        }
        w.writeln("}")?;
        cw_writeln!(w, "input.read{marker}End();")?;
        Ok(())
    }
}
