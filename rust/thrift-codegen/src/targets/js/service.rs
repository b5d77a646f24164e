//! `<Service>.js`: argument and result helpers, the client and, under
//! node, the processor.

use thrift_schema::{Field, Function, Program, Service, TypeKind, TypeRef, category};

use super::syntax::banner;
use super::{JsGenerator, writer};
use crate::{GenError, cw_writeln};

/// The service a derived service extends, as the generated code names it.
pub(super) struct Parent<'a> {
    pub name: &'a str,
    pub program: &'a Program,
}

impl<'a> JsGenerator<'a> {
    pub(super) fn parent_of(&self, service: &Service) -> Result<Option<Parent<'a>>, GenError> {
        let Some(r) = &service.extends else {
            return Ok(None);
        };
        let (program, parent) = self.program.find_service(r)?;
        Ok(Some(Parent {
            name: &parent.name,
            program,
        }))
    }

    /// `Svc_fn_args`, prefixed by this program's namespace.
    pub(super) fn args_name(&self, service: &Service, f: &Function) -> String {
        format!(
            "{}{}",
            self.js_namespace(self.program),
            f.args_struct_name(&service.name)
        )
    }

    pub(super) fn result_name(&self, service: &Service, f: &Function) -> String {
        format!(
            "{}{}",
            self.js_namespace(self.program),
            f.result_struct_name(&service.name)
        )
    }
}

/// Declared throws whose type is an exception, in declaration order.
pub(super) fn exception_fields(f: &Function) -> impl Iterator<Item = (&Field, &TypeRef)> {
    f.throws.iter().filter_map(|x| match category(&x.ty) {
        TypeKind::Exception(r) => Some((x, r)),
        _ => None,
    })
}

pub(super) fn arg_list(f: &Function) -> String {
    f.args
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a, b, callback`, or just `callback` without arguments.
pub(super) fn arg_list_with_callback(f: &Function) -> String {
    if f.args.is_empty() {
        "callback".into()
    } else {
        format!("{}, callback", arg_list(f))
    }
}

pub(super) fn service_file(g: &JsGenerator<'_>, service: &Service) -> Result<String, GenError> {
    tracing::debug!(service = %service.name, functions = service.functions.len(), "service module");
    let syntax = g.syntax;
    let c = syntax.const_kw();
    let mut w = writer();

    w.write_lines(&banner(&g.options.compiler_version))?;
    if syntax.strict() {
        w.writeln("\"use strict\";")?;
        w.blank_line()?;
    }
    w.write_lines(&syntax.runtime_imports())?;
    w.blank_line()?;
    w.write_lines(&g.include_imports())?;
    w.blank_line()?;

    if syntax.node() {
        if let Some(parent) = g.parent_of(service)? {
            let p = parent.name;
            cw_writeln!(w, "{c}{p} = require('./{p}');")?;
            cw_writeln!(w, "{c}{p}Client = {p}.Client;")?;
            cw_writeln!(w, "{c}{p}Processor = {p}.Processor;")?;
        }
        cw_writeln!(w, "{c}ttypes = require('./{}_types');", g.program.name)?;
    }

    w.writeln("//HELPER FUNCTIONS AND STRUCTURES")?;
    w.blank_line()?;
    for f in &service.functions {
        let args = f.args_struct(f.args_struct_name(&service.name));
        g.struct_definition(&mut w, &args, false)?;
        let result = f.result_struct(f.result_struct_name(&service.name));
        g.struct_definition(&mut w, &result, false)?;
    }

    g.client(&mut w, service)?;
    if syntax.node() {
        g.processor(&mut w, service)?;
    }
    Ok(w.into_inner())
}
