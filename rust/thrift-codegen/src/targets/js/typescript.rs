//! `.d.ts` declarations mirroring the generated modules.

use thrift_schema::{
    BaseType, Const, Enum, Field, Function, Requiredness, Service, Struct, Type, TypeKind, category,
};

use super::service::exception_fields;
use super::syntax::banner;
use super::{JsGenerator, Out, writer};
use crate::code_writer::IndentGuard;
use crate::{GenError, cw_writeln};

impl JsGenerator<'_> {
    /// The TypeScript spelling of a field or return type.
    fn ts_type(&self, ty: &Type) -> Result<String, GenError> {
        Ok(match category(ty) {
            TypeKind::Base(base) => match base {
                BaseType::String => "string",
                BaseType::Binary => "Buffer",
                BaseType::Bool => "boolean",
                BaseType::I8 => "any",
                BaseType::I16 | BaseType::I32 | BaseType::Double => "number",
                BaseType::I64 => "Int64",
                BaseType::Void => "void",
            }
            .to_string(),
            TypeKind::Enum(r) | TypeKind::Struct(r) | TypeKind::Exception(r) => {
                let home = self.home(self.program, r)?;
                let mut name = self.js_namespace(home);
                if home.name != self.program.name && self.syntax.node() {
                    name.push_str(&self.alias(home));
                    name.push('.');
                }
                name.push_str(&r.name);
                name
            }
            TypeKind::List { element } | TypeKind::Set { element } => {
                format!("{}[]", self.ts_type(element)?)
            }
            TypeKind::Map { key, value } => {
                let k = self.ts_type(key)?;
                let v = self.ts_type(value)?;
                if k == "number" || k == "string" {
                    format!("{{ [k: {k}]: {v}; }}")
                } else if matches!(category(key), TypeKind::Enum(_)) {
                    // Index signatures cannot be enum-typed.
                    format!("{{ [k: number /*{k}*/]: {v}; }}")
                } else {
                    "any".to_string()
                }
            }
        })
    }

    /// `import` lines for includes, node only.
    fn ts_include_imports(&self) -> String {
        if !self.syntax.node() {
            return String::new();
        }
        let mut out = String::new();
        for include in &self.program.includes {
            out.push_str(&format!(
                "import {} = require('{}');\n",
                self.alias(include),
                self.import_path(include)
            ));
        }
        if !self.program.includes.is_empty() {
            out.push('\n');
        }
        out
    }

    /// The ambient module declarations are wrapped in, if any.
    fn ts_module(&self) -> Option<&str> {
        if self.has_js_namespace(self.program) {
            self.program.namespace("js")
        } else {
            None
        }
    }

    /// Top-level declarations need `declare`; inside a module they don't.
    fn ts_declare(&self) -> &'static str {
        match (self.ts_module(), self.syntax.node()) {
            (Some(_), _) => "",
            (None, true) => "declare ",
            (None, false) => "export declare ",
        }
    }
}

fn optional_marker(field: &Field) -> &'static str {
    if field.req == Requiredness::Optional || field.default.is_some() {
        "?"
    } else {
        ""
    }
}

/// A blank line, then the doc comment if there is one.
fn doc(w: &mut Out, doc: Option<&str>) -> Result<(), GenError> {
    w.blank_line()?;
    if let Some(doc) = doc {
        w.writeln("/**")?;
        for line in doc.lines() {
            cw_writeln!(w, " * {line}")?;
        }
        w.writeln(" */")?;
    }
    Ok(())
}

/// Opens `declare module <ns> {` and returns the guard for its body.
fn open_module(w: &mut Out, module: Option<&str>) -> Result<Option<IndentGuard>, GenError> {
    match module {
        Some(m) => {
            w.write(&format!("declare module {m} {{"))?;
            Ok(Some(w.indent()))
        }
        None => Ok(None),
    }
}

pub(super) fn types_declarations(g: &JsGenerator<'_>) -> Result<String, GenError> {
    let syntax = g.syntax;
    let mut w = writer();

    w.write_lines(&banner(&g.options.compiler_version))?;
    w.write_lines(syntax.ts_runtime_imports())?;
    w.write_lines(&g.ts_include_imports())?;
    w.blank_line()?;

    let module = open_module(&mut w, g.ts_module())?;
    for e in &g.program.enums {
        enum_declaration(g, &mut w, e)?;
    }
    for constant in &g.program.consts {
        const_declaration(g, &mut w, constant)?;
    }
    for def in &g.program.structs {
        class_declaration(g, &mut w, def)?;
    }
    if let Some(guard) = module {
        drop(guard);
        w.writeln("}")?;
    }

    tracing::debug!(program = %g.program.name, "types declarations");
    Ok(w.into_inner())
}

fn enum_declaration(g: &JsGenerator<'_>, w: &mut Out, e: &Enum) -> Result<(), GenError> {
    doc(w, e.doc.as_deref())?;
    cw_writeln!(w, "{}enum {} {{", g.ts_declare(), e.name)?;
    {
        let _values = w.indent();
        for v in &e.values {
            cw_writeln!(w, "{} = {},", v.name, v.value)?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

fn const_declaration(g: &JsGenerator<'_>, w: &mut Out, constant: &Const) -> Result<(), GenError> {
    doc(w, constant.doc.as_deref())?;
    cw_writeln!(
        w,
        "{}{}{}: {};",
        g.ts_declare(),
        g.syntax.const_kw(),
        constant.name,
        g.ts_type(&constant.ty)?
    )?;
    Ok(())
}

fn class_declaration(g: &JsGenerator<'_>, w: &mut Out, def: &Struct) -> Result<(), GenError> {
    doc(w, def.doc.as_deref())?;
    let base = if def.exception {
        " extends Thrift.TException"
    } else {
        ""
    };
    cw_writeln!(w, "{}class {}{base} {{", g.ts_declare(), def.name)?;
    {
        let _members = w.indent();
        let access = if g.syntax.node() { "public " } else { "" };
        for field in &def.fields {
            // Error.message is not optional, so exceptions keep it required.
            let optional = if def.exception && field.name == "message" {
                ""
            } else {
                optional_marker(field)
            };
            cw_writeln!(
                w,
                "{access}{}{optional}: {};",
                field.name,
                g.ts_type(&field.ty)?
            )?;
        }
        if !def.fields.is_empty() {
            w.blank_line()?;
            let mut bag = String::new();
            for field in &def.fields {
                bag.push_str(&format!(
                    "{}{}: {}; ",
                    field.name,
                    optional_marker(field),
                    g.ts_type(&field.ty)?
                ));
            }
            cw_writeln!(w, "constructor(args?: {{ {bag}}});")?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

pub(super) fn service_declarations(
    g: &JsGenerator<'_>,
    service: &Service,
) -> Result<String, GenError> {
    let syntax = g.syntax;
    let program = &g.program.name;
    let parent = g.parent_of(service)?;
    let mut w = writer();

    if let Some(p) = &parent {
        cw_writeln!(w, "/// <reference path=\"{}.d.ts\" />", p.name)?;
    }
    w.write_lines(&banner(&g.options.compiler_version))?;
    w.blank_line()?;
    w.write_lines(syntax.ts_runtime_imports())?;
    w.write_lines(&g.ts_include_imports())?;
    w.blank_line()?;

    if syntax.node() {
        cw_writeln!(w, "import ttypes = require('./{program}_types');")?;
        let ns = g.js_namespace(g.program);
        let names = g
            .program
            .enums
            .iter()
            .map(|e| &e.name)
            .chain(g.program.consts.iter().map(|c| &c.name))
            .chain(g.program.exceptions().map(|s| &s.name))
            .chain(g.program.plain_structs().map(|s| &s.name));
        for name in names {
            cw_writeln!(w, "import {name} = ttypes.{ns}{name}")?;
        }
        if let Some(p) = &parent {
            cw_writeln!(w, "import {0} = require('./{0}');", p.name)?;
        }
    } else {
        cw_writeln!(w, "import {{ {program} }} from \"./{program}_types\";")?;
        w.blank_line()?;
    }

    let mut guards = Vec::new();
    if syntax.node() {
        guards.extend(open_module(&mut w, g.ts_module())?);
    } else if g.ts_module().is_some() {
        cw_writeln!(w, "declare module \"./{program}_types\" {{")?;
        guards.push(w.indent());
        cw_writeln!(w, "module {program} {{")?;
        guards.push(w.indent());
    }

    client_declaration(g, &mut w, service, parent.as_ref().map(|p| p.name))?;
    if syntax.node() {
        processor_declaration(&mut w, service, parent.as_ref().map(|p| p.name))?;
    }

    while let Some(guard) = guards.pop() {
        drop(guard);
        w.writeln("}")?;
    }

    tracing::debug!(service = %service.name, "service declarations");
    Ok(w.into_inner())
}

fn client_declaration(
    g: &JsGenerator<'_>,
    w: &mut Out,
    service: &Service,
    parent: Option<&str>,
) -> Result<(), GenError> {
    let syntax = g.syntax;
    doc(w, service.doc.as_deref())?;
    let (class, extends) = if syntax.node() {
        ("Client".to_string(), parent.map(|p| format!("extends {p}.Client ")))
    } else {
        (
            format!("{}Client", service.name),
            parent.map(|p| format!("extends {p}Client ")),
        )
    };
    cw_writeln!(
        w,
        "{}class {class} {}{{",
        g.ts_declare(),
        extends.unwrap_or_default()
    )?;
    {
        let _members = w.indent();
        if syntax.node() {
            if parent.is_none() {
                w.writeln("private output: thrift.TTransport;")?;
                w.writeln("private pClass: thrift.TProtocol;")?;
                w.writeln("private _seqid: number;")?;
                w.blank_line()?;
            }
            w.writeln(
                "constructor(output: thrift.TTransport, pClass: { new(trans: thrift.TTransport): thrift.TProtocol });",
            )?;
        } else {
            w.writeln("input: Thrift.TJSONProtocol;")?;
            w.writeln("output: Thrift.TJSONProtocol;")?;
            w.writeln("seqid: number;")?;
            w.blank_line()?;
            w.writeln("constructor(input: Thrift.TJSONProtocol, output?: Thrift.TJSONProtocol);")?;
        }
        for f in &service.functions {
            doc(w, f.doc.as_deref())?;
            w.writeln(&signature(g, f, false)?)?;
            doc(w, f.doc.as_deref())?;
            w.writeln(&signature(g, f, true)?)?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

fn processor_declaration(
    w: &mut Out,
    service: &Service,
    parent: Option<&str>,
) -> Result<(), GenError> {
    w.blank_line()?;
    match parent {
        Some(p) => cw_writeln!(w, "declare class Processor extends {p}.Processor {{")?,
        None => w.writeln("declare class Processor {")?,
    }
    {
        let _members = w.indent();
        if parent.is_none() {
            w.writeln("private _handler: object;")?;
            w.blank_line()?;
        }
        w.writeln("constructor(handler: object);")?;
        w.writeln("process(input: thrift.TProtocol, output: thrift.TProtocol): void;")?;
        for f in &service.functions {
            cw_writeln!(
                w,
                "process_{}(seqid: number, input: thrift.TProtocol, output: thrift.TProtocol): void;",
                f.name
            )?;
        }
    }
    w.writeln("}")?;
    Ok(())
}

/// `name(a: T, b?: U): R;`, or with a trailing callback.
///
/// Once one parameter is optional every later one is too.
fn signature(g: &JsGenerator<'_>, f: &Function, with_callback: bool) -> Result<String, GenError> {
    let returns = g.ts_type(&f.return_type)?;
    let mut params = Vec::with_capacity(f.args.len() + 1);
    let mut optional_seen = false;
    for arg in &f.args {
        let optional = if optional_seen { "?" } else { optional_marker(arg) };
        optional_seen |= !optional.is_empty();
        params.push(format!("{}{optional}: {}", arg.name, g.ts_type(&arg.ty)?));
    }

    if !with_callback {
        let returns = if g.syntax.es6() {
            format!("Promise<{returns}>")
        } else {
            returns
        };
        return Ok(format!("{}({}): {returns};", f.name, params.join(", ")));
    }

    let callback = if g.syntax.node() {
        let errors = exception_fields(f)
            .map(|(_, r)| g.qualified(r))
            .collect::<Result<Vec<_>, _>>()?;
        let error = if errors.is_empty() {
            "void".to_string()
        } else {
            errors.join(" | ")
        };
        format!("callback: (error: {error}, response: {returns})=>void")
    } else {
        format!("callback: (data: {returns})=>void")
    };
    params.push(callback);
    Ok(format!("{}({}): void;", f.name, params.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsOptions;
    use thrift_schema::{ConstValue, EnumValue, Program, TypeRef};

    fn program() -> Program {
        let mut shared = Program::new("shared");
        shared.structs.push(Struct::new(
            "SharedStruct",
            vec![Field::new(1, "key", Type::I32)],
        ));
        shared.services.push(Service::new("SharedService", vec![]));

        let mut p = Program::new("tutorial");
        p.includes.push(shared);
        p.enums.push(Enum {
            name: "Operation".into(),
            values: vec![
                EnumValue { name: "ADD".into(), value: 1 },
                EnumValue { name: "SUBTRACT".into(), value: 2 },
            ],
            doc: Some("You can define enums.".into()),
        });
        p.consts.push(Const {
            name: "INT32CONSTANT".into(),
            ty: Type::I32,
            value: ConstValue::Integer(9853),
            doc: None,
        });
        p.structs.push(Struct::new(
            "Work",
            vec![
                Field::new(1, "num1", Type::I32).with_default(ConstValue::Integer(0)),
                Field::new(2, "op", Type::enum_ref("Operation")),
                Field::new(3, "comment", Type::String).optional(),
                Field::new(4, "tags", Type::map(Type::enum_ref("Operation"), Type::list(Type::Binary))),
                Field::new(5, "shared", Type::Struct(TypeRef::in_program("SharedStruct", "shared"))),
            ],
        ));
        p.structs.push(Struct::exception(
            "InvalidOperation",
            vec![
                Field::new(1, "whatOp", Type::I32),
                Field::new(2, "message", Type::String).optional(),
            ],
        ));
        p.structs.push(Struct::new("Empty", vec![]));
        p.services.push(
            Service::new(
                "Calculator",
                vec![
                    Function::new("ping", Type::Void, vec![]),
                    Function::new(
                        "calculate",
                        Type::I64,
                        vec![
                            Field::new(1, "logid", Type::I32).optional(),
                            Field::new(2, "w", Type::struct_ref("Work")),
                        ],
                    )
                    .throws(vec![Field::new(1, "ouch", Type::exception_ref("InvalidOperation"))]),
                ],
            )
            .extending(TypeRef::in_program("SharedService", "shared")),
        );
        p
    }

    fn types(options: &JsOptions, p: &Program) -> String {
        types_declarations(&JsGenerator::new(p, options)).unwrap()
    }

    fn service(options: &JsOptions, p: &Program) -> String {
        service_declarations(&JsGenerator::new(p, options), &p.services[0]).unwrap()
    }

    #[test]
    fn node_types_header_imports_includes() {
        let out = types(&JsOptions::node().ts(), &program());
        assert!(out.contains(
            "//\nimport thrift = require('thrift');\nimport Thrift = thrift.Thrift;\nimport Q = thrift.Q;\nimport Int64 = require('node-int64');\nimport shared_ttypes = require('./shared_types.js');\n\n\n"
        ));
    }

    #[test]
    fn enums_and_constants_are_declared() {
        let out = types(&JsOptions::node().ts(), &program());
        assert!(out.contains(
            "\n/**\n * You can define enums.\n */\ndeclare enum Operation {\n  ADD = 1,\n  SUBTRACT = 2,\n}\n"
        ));
        assert!(out.contains("\ndeclare var INT32CONSTANT: number;\n"));
        let es6 = types(&JsOptions::node().es6().ts(), &program());
        assert!(es6.contains("\ndeclare const INT32CONSTANT: number;\n"));
    }

    #[test]
    fn classes_mark_optional_and_defaulted_fields() {
        let out = types(&JsOptions::node().ts(), &program());
        assert!(out.contains(
            "declare class Work {\n  public num1?: number;\n  public op: Operation;\n  public comment?: string;\n  public tags: { [k: number /*Operation*/]: Buffer[]; };\n  public shared: shared_ttypes.SharedStruct;\n\n  constructor(args?: { num1?: number; op: Operation; comment?: string; tags: { [k: number /*Operation*/]: Buffer[]; }; shared: shared_ttypes.SharedStruct; });\n}\n"
        ));
        assert!(out.contains("declare class Empty {\n}\n"));
    }

    #[test]
    fn exception_message_stays_required() {
        let out = types(&JsOptions::node().ts(), &program());
        assert!(out.contains(
            "declare class InvalidOperation extends Thrift.TException {\n  public whatOp: number;\n  public message: string;\n\n  constructor(args?: { whatOp: number; message?: string; });\n}\n"
        ));
    }

    #[test]
    fn browser_declarations_live_in_the_namespace_module() {
        let mut p = program();
        p.namespaces.insert("js".into(), "Tutorial".into());
        let out = types(&JsOptions::browser().ts(), &p);
        assert!(out.contains(
            "//\nimport Int64 = require('node-int64');\n\ndeclare module Tutorial {\n  /**\n   * You can define enums.\n   */\n  enum Operation {\n"
        ));
        assert!(out.contains("  class Work {\n    num1?: number;\n"));
        assert!(out.contains("    shared: SharedStruct;\n"));
        assert!(out.ends_with("  }\n}\n"));
    }

    #[test]
    fn browser_without_namespace_exports_declarations() {
        let out = types(&JsOptions::browser().ts(), &program());
        assert!(out.contains("\nexport declare enum Operation {\n"));
        assert!(out.contains("\nexport declare class Work {\n"));
    }

    #[test]
    fn node_client_signatures_offer_both_styles() {
        let out = service(&JsOptions::node().ts(), &program());
        assert!(out.starts_with("/// <reference path=\"SharedService.d.ts\" />\n//\n// Autogenerated"));
        assert!(out.contains(
            "import ttypes = require('./tutorial_types');\nimport Operation = ttypes.Operation\nimport INT32CONSTANT = ttypes.INT32CONSTANT\nimport InvalidOperation = ttypes.InvalidOperation\nimport Work = ttypes.Work\nimport Empty = ttypes.Empty\nimport SharedService = require('./SharedService');\n"
        ));
        assert!(out.contains(
            "\ndeclare class Client extends SharedService.Client {\n  constructor(output: thrift.TTransport, pClass: { new(trans: thrift.TTransport): thrift.TProtocol });\n\n  ping(): void;\n\n  ping(callback: (error: void, response: void)=>void): void;\n"
        ));
        assert!(out.contains(
            "  calculate(logid?: number, w?: Work): Int64;\n\n  calculate(logid?: number, w?: Work, callback: (error: ttypes.InvalidOperation, response: Int64)=>void): void;\n}\n"
        ));
    }

    #[test]
    fn node_processor_declares_every_method() {
        let out = service(&JsOptions::node().es6().ts(), &program());
        assert!(out.contains("  ping(): Promise<void>;\n"));
        assert!(out.contains(
            "\ndeclare class Processor extends SharedService.Processor {\n  constructor(handler: object);\n  process(input: thrift.TProtocol, output: thrift.TProtocol): void;\n  process_ping(seqid: number, input: thrift.TProtocol, output: thrift.TProtocol): void;\n  process_calculate(seqid: number, input: thrift.TProtocol, output: thrift.TProtocol): void;\n}\n"
        ));
    }

    #[test]
    fn root_services_declare_their_private_state() {
        let mut p = program();
        p.services[0].extends = None;
        let out = service(&JsOptions::node().ts(), &p);
        assert!(out.contains(
            "declare class Client {\n  private output: thrift.TTransport;\n  private pClass: thrift.TProtocol;\n  private _seqid: number;\n\n  constructor("
        ));
        assert!(out.contains("declare class Processor {\n  private _handler: object;\n\n  constructor(handler: object);\n"));
    }

    #[test]
    fn browser_client_is_named_after_the_service() {
        let mut p = program();
        p.namespaces.insert("js".into(), "Tutorial".into());
        let out = service(&JsOptions::browser().ts(), &p);
        assert!(out.contains("import { tutorial } from \"./tutorial_types\";\n\n"));
        assert!(out.contains(
            "declare module \"./tutorial_types\" {\n  module tutorial {\n\n    class CalculatorClient extends SharedServiceClient {\n      input: Thrift.TJSONProtocol;\n"
        ));
        assert!(out.contains("      calculate(logid?: number, w?: Tutorial.Work, callback: (data: Int64)=>void): void;\n"));
        assert!(!out.contains("Processor"));
        assert!(out.ends_with("    }\n  }\n}\n"));
    }
}
