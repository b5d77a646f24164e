//! Struct and exception classes: constructor, reader and writer.

use thrift_schema::{Struct, Type, TypeKind, category, element_type};

use super::encode::type_tag;
use super::{JsGenerator, Out};
use crate::{GenError, cw_writeln};

/// One link of the copy chain handed to `Thrift.copyList`/`copyMap`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ElementCopy {
    Map,
    List,
    Struct(String),
    Plain,
}

impl ElementCopy {
    fn render(&self) -> &str {
        match self {
            ElementCopy::Map => "Thrift.copyMap",
            ElementCopy::List => "Thrift.copyList",
            ElementCopy::Struct(name) => name,
            ElementCopy::Plain => "null",
        }
    }
}

impl JsGenerator<'_> {
    /// Describes how to copy each nesting level below a container, ending
    /// with the innermost element.
    fn copy_chain(&self, container: &Type) -> Result<Vec<ElementCopy>, GenError> {
        let mut chain = Vec::new();
        let mut current = element_type(container);
        while let Some(ty) = current {
            match category(ty) {
                TypeKind::Map { .. } => chain.push(ElementCopy::Map),
                TypeKind::List { .. } | TypeKind::Set { .. } => chain.push(ElementCopy::List),
                TypeKind::Struct(r) => {
                    chain.push(ElementCopy::Struct(self.qualified(r)?));
                    break;
                }
                _ => {
                    chain.push(ElementCopy::Plain);
                    break;
                }
            }
            current = element_type(ty);
        }
        Ok(chain)
    }

    /// `Name = function(args) { ... }` or `Name = class { ... }`, plus the
    /// reader and writer.
    ///
    /// `exported` adds the `module.exports` binding under node; service
    /// helper structs stay private to their module.
    pub(super) fn struct_definition(
        &self,
        w: &mut Out,
        def: &Struct,
        exported: bool,
    ) -> Result<(), GenError> {
        tracing::debug!(name = %def.name, fields = def.fields.len(), "struct");
        let syntax = self.syntax;
        let ns = self.js_namespace(self.program);
        let qualified = format!("{ns}{}", def.name);
        let node_exception = syntax.node() && def.exception;

        let binding = if syntax.node() {
            let prefix = if self.has_js_namespace(self.program) {
                ns.clone()
            } else {
                syntax.const_kw().to_string()
            };
            let export = if exported {
                format!(" = module.exports.{}", def.name)
            } else {
                String::new()
            };
            format!("{prefix}{}{export}", def.name)
        } else {
            qualified.clone()
        };

        let class_body = if syntax.es6() {
            if node_exception {
                cw_writeln!(w, "{binding} = class extends Thrift.TException {{")?;
            } else {
                cw_writeln!(w, "{binding} = class {{")?;
            }
            let guard = w.indent();
            w.writeln("constructor(args) {")?;
            Some(guard)
        } else {
            cw_writeln!(w, "{binding} = function(args) {{")?;
            None
        };

        {
            let _ctor = w.indent();
            if node_exception {
                if syntax.es6() {
                    w.writeln("super(args);")?;
                } else {
                    cw_writeln!(w, "Thrift.TException.call(this, \"{qualified}\");")?;
                }
                cw_writeln!(w, "this.name = \"{qualified}\";")?;
            }
            self.field_defaults(w, def)?;
            if !def.fields.is_empty() {
                self.construct_from_args(w, def)?;
            }
        }

        if syntax.es6() {
            w.writeln("}")?;
            w.blank_line()?;
        } else {
            w.writeln("};")?;
            if def.exception {
                cw_writeln!(w, "Thrift.inherits({qualified}, Thrift.TException);")?;
                cw_writeln!(w, "{qualified}.prototype.name = '{}';", def.name)?;
            } else {
                cw_writeln!(w, "{qualified}.prototype = {{}};")?;
            }
        }

        self.struct_reader(w, def, &qualified)?;
        self.struct_writer(w, def, &qualified)?;

        if let Some(guard) = class_body {
            drop(guard);
            w.writeln("};")?;
        }
        Ok(())
    }

    fn field_defaults(&self, w: &mut Out, def: &Struct) -> Result<(), GenError> {
        for field in &def.fields {
            let kind = category(&field.ty);
            match &field.default {
                Some(value) if !kind.is_struct_like() => {
                    let rendered = self.render_value(&field.ty, value, w.indent_level())?;
                    cw_writeln!(w, "this.{} = {rendered};", field.name)?;
                }
                _ => cw_writeln!(w, "this.{} = null;", field.name)?,
            }
        }
        Ok(())
    }

    fn construct_from_args(&self, w: &mut Out, def: &Struct) -> Result<(), GenError> {
        // Struct defaults are built per instance so no two share state.
        for field in &def.fields {
            if let Some(value) = &field.default
                && category(&field.ty).is_struct_like()
            {
                let rendered = self.render_value(&field.ty, value, w.indent_level())?;
                cw_writeln!(w, "this.{} = {rendered};", field.name)?;
            }
        }

        // An already-thrown nested exception is taken over whole.
        for field in &def.fields {
            if let TypeKind::Exception(r) = category(&field.ty) {
                cw_writeln!(w, "if (args instanceof {}) {{", self.qualified(r)?)?;
                {
                    let _doubled = w.indent_by(w.indent_level());
                    cw_writeln!(w, "this.{} = args;", field.name)?;
                    w.writeln("return;")?;
                }
                w.writeln("}")?;
            }
        }

        w.writeln("if (args) {")?;
        {
            let _args = w.indent();
            for field in &def.fields {
                let f = &field.name;
                cw_writeln!(w, "if (args.{f} !== undefined && args.{f} !== null) {{")?;
                {
                    let _present = w.indent();
                    let kind = category(&field.ty);
                    match kind {
                        TypeKind::Struct(r) => {
                            cw_writeln!(w, "this.{f} = new {}(args.{f});", self.qualified(r)?)?;
                        }
                        TypeKind::Map { .. } | TypeKind::List { .. } | TypeKind::Set { .. } => {
                            let copy = if matches!(kind, TypeKind::Map { .. }) {
                                ElementCopy::Map
                            } else {
                                ElementCopy::List
                            };
                            let chain = self.copy_chain(&field.ty)?;
                            let chain: Vec<&str> = chain.iter().map(ElementCopy::render).collect();
                            cw_writeln!(
                                w,
                                "this.{f} = {}(args.{f}, [{}]);",
                                copy.render(),
                                chain.join(", ")
                            )?;
                        }
                        _ => cw_writeln!(w, "this.{f} = args.{f};")?,
                    }
                }
                if field.is_required() {
                    w.writeln("} else {")?;
                    cw_writeln!(
                        w,
                        "  throw new Thrift.TProtocolException(Thrift.TProtocolExceptionType.UNKNOWN, 'Required field {f} is unset!');"
                    )?;
                }
                w.writeln("}")?;
            }
        }
        w.writeln("}")?;
        Ok(())
    }

    fn struct_reader(&self, w: &mut Out, def: &Struct, qualified: &str) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        if syntax.es6() {
            w.writeln("[Symbol.for(\"read\")] (input) {")?;
        } else {
            cw_writeln!(
                w,
                "{qualified}.prototype[Symbol.for(\"read\")] = function(input) {{"
            )?;
        }
        {
            let _body = w.indent();
            w.writeln("input.readStructBegin();")?;
            w.writeln("while (true) {")?;
            {
                let _loop = w.indent();
                cw_writeln!(w, "{c}ret = input.readFieldBegin();")?;
                cw_writeln!(w, "{c}ftype = ret.ftype;")?;
                if !def.fields.is_empty() {
                    cw_writeln!(w, "{c}fid = ret.fid;")?;
                }
                w.writeln("if (ftype == Thrift.Type.STOP) {")?;
                w.writeln("  break;")?;
                w.writeln("}")?;

                if def.fields.is_empty() {
                    w.writeln("input.skip(ftype);")?;
                } else {
                    w.writeln("switch (fid) {")?;
                    {
                        let _cases = w.indent();
                        for field in &def.fields {
                            cw_writeln!(w, "case {}:", field.id)?;
                            cw_writeln!(w, "if (ftype == {}) {{", type_tag(&field.ty)?)?;
                            {
                                let _matched = w.indent();
                                self.read_field(w, &field.ty, &format!("this.{}", field.name))?;
                            }
                            w.writeln("} else {")?;
                            w.writeln("  input.skip(ftype);")?;
                            w.writeln("}")?;
                            w.writeln("break;")?;
                        }
                        if def.fields.len() == 1 {
                            w.writeln("case 0:")?;
                            w.writeln("  input.skip(ftype);")?;
                            w.writeln("  break;")?;
                        }
                        w.writeln("default:")?;
                        w.writeln("  input.skip(ftype);")?;
                    }
                    w.writeln("}")?;
                }
                w.writeln("input.readFieldEnd();")?;
            }
            w.writeln("}")?;
            w.writeln("input.readStructEnd();")?;
            w.writeln("return;")?;
        }
        w.writeln(syntax.method_end())?;
        w.blank_line()?;
        Ok(())
    }

    fn struct_writer(&self, w: &mut Out, def: &Struct, qualified: &str) -> Result<(), GenError> {
        let syntax = self.syntax;
        if syntax.es6() {
            w.writeln("[Symbol.for(\"write\")] (output) {")?;
        } else {
            cw_writeln!(
                w,
                "{qualified}.prototype[Symbol.for(\"write\")] = function(output) {{"
            )?;
        }
        {
            let _body = w.indent();
            cw_writeln!(w, "output.writeStructBegin('{}');", def.name)?;
            for field in &def.fields {
                let f = &field.name;
                cw_writeln!(w, "if (this.{f} !== null && this.{f} !== undefined) {{")?;
                {
                    let _present = w.indent();
                    cw_writeln!(
                        w,
                        "output.writeFieldBegin('{f}', {}, {});",
                        type_tag(&field.ty)?,
                        field.id
                    )?;
                    self.write_field(w, &field.ty, &format!("this.{f}"))?;
                    w.writeln("output.writeFieldEnd();")?;
                }
                w.writeln("}")?;
            }
            w.writeln("output.writeFieldStop();")?;
            w.writeln("output.writeStructEnd();")?;
            w.writeln("return;")?;
        }
        w.writeln(syntax.method_end())?;
        w.blank_line()?;
        Ok(())
    }
}
