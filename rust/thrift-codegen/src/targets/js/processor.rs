//! Node processors: dispatch on the method name, decode the args, call the
//! handler and write back exactly one reply.

use thrift_schema::{Function, Service};

use super::service::exception_fields;
use super::{JsGenerator, Out};
use crate::{GenError, cw_writeln};

impl JsGenerator<'_> {
    pub(super) fn processor(&self, w: &mut Out, service: &Service) -> Result<(), GenError> {
        let syntax = self.syntax;
        let s = &service.name;
        let ns = self.js_namespace(self.program);
        let processor_var = format!("{ns}{s}Processor");
        let binding = if self.has_js_namespace(self.program) {
            processor_var.clone()
        } else {
            format!("{}{processor_var}", syntax.const_kw())
        };
        let parent = self.parent_of(service)?;

        let class_body = if syntax.es6() {
            match &parent {
                Some(p) => cw_writeln!(
                    w,
                    "{binding} = class {s}Processor extends {}Processor {{",
                    p.name
                )?,
                None => cw_writeln!(w, "{binding} = class {s}Processor {{")?,
            }
            let guard = w.indent();
            w.writeln("constructor(handler) {")?;
            Some(guard)
        } else {
            cw_writeln!(w, "{binding} = function(handler) {{")?;
            None
        };
        {
            let _ctor = w.indent();
            if syntax.es6() && parent.is_some() {
                w.writeln("super(handler);")?;
            }
            w.writeln("this._handler = handler;")?;
        }
        w.writeln(syntax.method_end())?;
        if !syntax.es6()
            && let Some(p) = &parent
        {
            cw_writeln!(w, "Thrift.inherits({processor_var}, {}Processor);", p.name)?;
        }

        self.process_dispatch(w, &processor_var)?;
        for f in &service.functions {
            tracing::trace!(service = %s, function = %f.name, "processor method");
            self.process_function(w, service, &processor_var, f)?;
        }

        if let Some(guard) = class_body {
            drop(guard);
            w.writeln("};")?;
        }
        cw_writeln!(w, "exports.Processor = {processor_var};")?;
        Ok(())
    }

    fn process_dispatch(&self, w: &mut Out, processor_var: &str) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        if syntax.es6() {
            w.writeln("process (input, output) {")?;
        } else {
            cw_writeln!(
                w,
                "{processor_var}.prototype.process = function(input, output) {{"
            )?;
        }
        {
            let _body = w.indent();
            cw_writeln!(w, "{c}r = input.readMessageBegin();")?;
            w.writeln("if (this['process_' + r.fname]) {")?;
            w.writeln("  return this['process_' + r.fname].call(this, r.rseqid, input, output);")?;
            w.writeln("} else {")?;
            w.writeln("  input.skip(Thrift.Type.STRUCT);")?;
            w.writeln("  input.readMessageEnd();")?;
            cw_writeln!(
                w,
                "  {c}x = new Thrift.TApplicationException(Thrift.TApplicationExceptionType.UNKNOWN_METHOD, 'Unknown function ' + r.fname);"
            )?;
            w.writeln("  output.writeMessageBegin(r.fname, Thrift.MessageType.EXCEPTION, r.rseqid);")?;
            w.writeln("  x[Symbol.for(\"write\")](output);")?;
            w.writeln("  output.writeMessageEnd();")?;
            w.writeln("  output.flush();")?;
            w.writeln("}")?;
        }
        w.writeln(syntax.method_end())?;
        Ok(())
    }

    fn process_function(
        &self,
        w: &mut Out,
        service: &Service,
        processor_var: &str,
        f: &Function,
    ) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let name = &f.name;

        if syntax.es6() {
            cw_writeln!(w, "process_{name} (seqid, input, output) {{")?;
        } else {
            cw_writeln!(
                w,
                "{processor_var}.prototype.process_{name} = function(seqid, input, output) {{"
            )?;
        }

        {
            let _body = w.indent();
            cw_writeln!(w, "{c}args = new {}();", self.args_name(service, f))?;
            w.writeln("args[Symbol.for(\"read\")](input);")?;
            w.writeln("input.readMessageEnd();")?;

            let call_args: Vec<String> = f.args.iter().map(|a| format!("args.{}", a.name)).collect();
            if f.oneway {
                cw_writeln!(w, "this._handler.{name}({});", call_args.join(", "))?;
            } else {
                cw_writeln!(w, "if (this._handler.{name}.length === {}) {{", f.args.len())?;
                {
                    let _promise = w.indent();
                    self.promise_style(w, service, f, &call_args)?;
                }
                w.writeln("} else {")?;
                {
                    let _callback = w.indent();
                    self.callback_style(w, service, f, &call_args)?;
                }
                w.writeln("}")?;
            }
        }

        w.writeln(syntax.method_end())?;
        Ok(())
    }

    /// The handler returned a value or a promise.
    fn promise_style(
        &self,
        w: &mut Out,
        service: &Service,
        f: &Function,
        call_args: &[String],
    ) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let l = syntax.let_kw();
        let name = &f.name;
        let result_name = self.result_name(service, f);

        if syntax.es6() {
            cw_writeln!(
                w,
                "new Promise((resolve) => resolve(this._handler.{name}.bind(this._handler)("
            )?;
        } else {
            let sep = if call_args.is_empty() { "" } else { "," };
            cw_writeln!(w, "Q.fcall(this._handler.{name}.bind(this._handler){sep}")?;
        }
        {
            let _args = w.indent();
            let last = call_args.len().saturating_sub(1);
            for (i, a) in call_args.iter().enumerate() {
                let sep = if i == last { "" } else { "," };
                cw_writeln!(w, "{a}{sep}")?;
            }
        }
        w.writeln(if syntax.es6() {
            "))).then(result => {"
        } else {
            ").then(function(result) {"
        })?;
        {
            let _then = w.indent();
            cw_writeln!(w, "{c}result_obj = new {result_name}({{success: result}});")?;
            cw_writeln!(w, "output.writeMessageBegin(\"{name}\", Thrift.MessageType.REPLY, seqid);")?;
            w.writeln("result_obj[Symbol.for(\"write\")](output);")?;
            w.writeln("output.writeMessageEnd();")?;
            w.writeln("output.flush();")?;
        }
        w.writeln(if syntax.es6() {
            "}).catch(err => {"
        } else {
            "}).catch(function (err) {"
        })?;
        {
            let _catch = w.indent();
            cw_writeln!(w, "{l}result;")?;
            let declared = self.declared_check(f)?;
            let unknown = if let Some(check) = &declared {
                cw_writeln!(w, "if ({check}) {{")?;
                {
                    let _declared = w.indent();
                    cw_writeln!(w, "result = new {result_name}(err);")?;
                    cw_writeln!(
                        w,
                        "output.writeMessageBegin(\"{name}\", Thrift.MessageType.REPLY, seqid);"
                    )?;
                }
                w.writeln("} else {")?;
                Some(w.indent())
            } else {
                None
            };
            w.writeln(
                "result = new Thrift.TApplicationException(Thrift.TApplicationExceptionType.UNKNOWN, err.message);",
            )?;
            cw_writeln!(
                w,
                "output.writeMessageBegin(\"{name}\", Thrift.MessageType.EXCEPTION, seqid);"
            )?;
            if let Some(guard) = unknown {
                drop(guard);
                w.writeln("}")?;
            }
            w.writeln("result[Symbol.for(\"write\")](output);")?;
            w.writeln("output.writeMessageEnd();")?;
            w.writeln("output.flush();")?;
        }
        w.writeln("});")?;
        Ok(())
    }

    /// The handler takes a trailing node-style callback.
    fn callback_style(
        &self,
        w: &mut Out,
        service: &Service,
        f: &Function,
        call_args: &[String],
    ) -> Result<(), GenError> {
        let syntax = self.syntax;
        let l = syntax.let_kw();
        let name = &f.name;
        let result_name = self.result_name(service, f);

        let callback = if syntax.es6() {
            "(err, result) => {"
        } else {
            "function (err, result) {"
        };
        let leading: String = call_args.iter().map(|a| format!("{a}, ")).collect();
        cw_writeln!(w, "this._handler.{name}({leading}{callback}")?;
        {
            let _callback = w.indent();
            cw_writeln!(w, "{l}result_obj;")?;
            let replied = match self.declared_check(f)? {
                Some(check) => format!("(err === null || typeof err === 'undefined') || {check}"),
                None => "(err === null || typeof err === 'undefined')".to_string(),
            };
            cw_writeln!(w, "if ({replied}) {{")?;
            {
                let _reply = w.indent();
                cw_writeln!(
                    w,
                    "result_obj = new {result_name}((err !== null && typeof err !== 'undefined') ? err : {{success: result}});"
                )?;
                cw_writeln!(w, "output.writeMessageBegin(\"{name}\", Thrift.MessageType.REPLY, seqid);")?;
            }
            w.writeln("} else {")?;
            {
                let _unknown = w.indent();
                w.writeln(
                    "result_obj = new Thrift.TApplicationException(Thrift.TApplicationExceptionType.UNKNOWN, err.message);",
                )?;
                cw_writeln!(
                    w,
                    "output.writeMessageBegin(\"{name}\", Thrift.MessageType.EXCEPTION, seqid);"
                )?;
            }
            w.writeln("}")?;
            w.writeln("result_obj[Symbol.for(\"write\")](output);")?;
            w.writeln("output.writeMessageEnd();")?;
            w.writeln("output.flush();")?;
        }
        w.writeln("});")?;
        Ok(())
    }

    /// `err instanceof X || err instanceof Y` over the declared exceptions.
    fn declared_check(&self, f: &Function) -> Result<Option<String>, GenError> {
        let checks = exception_fields(f)
            .map(|(_, r)| self.qualified(r).map(|q| format!("err instanceof {q}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((!checks.is_empty()).then(|| checks.join(" || ")))
    }
}
