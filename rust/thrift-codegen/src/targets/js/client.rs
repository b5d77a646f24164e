//! Client stubs: `fn` = `send_fn` then, unless oneway, `recv_fn`.
//!
//! Node clients are asynchronous. Each call registers a callback in
//! `_reqs` under its seqid, and the connection hands the reply to
//! `recv_fn` (or the callback goes away if the send fails). Browser clients
//! read the reply synchronously after flushing unless given a callback.

use thrift_schema::wire::MessageType;
use thrift_schema::{Function, Service};

use super::names::unused_name;
use super::service::{arg_list, arg_list_with_callback};
use super::{JsGenerator, Out};
use crate::{GenError, cw_writeln};

impl JsGenerator<'_> {
    pub(super) fn client(&self, w: &mut Out, service: &Service) -> Result<(), GenError> {
        let syntax = self.syntax;
        let s = &service.name;
        let ns = self.js_namespace(self.program);
        let client_var = format!("{ns}{s}Client");
        let parent = self.parent_of(service)?;

        let binding = if syntax.node() && !self.has_js_namespace(self.program) {
            format!("{}{client_var}", syntax.const_kw())
        } else {
            client_var.clone()
        };
        let ctor_params = if syntax.node() {
            "output, pClass"
        } else {
            "input, output"
        };

        let class_body = if syntax.es6() {
            match &parent {
                Some(p) => cw_writeln!(
                    w,
                    "{binding} = class {s}Client extends {}{}Client {{",
                    self.js_namespace(p.program),
                    p.name
                )?,
                None => cw_writeln!(w, "{binding} = class {s}Client {{")?,
            }
            let guard = w.indent();
            cw_writeln!(w, "constructor({ctor_params}) {{")?;
            Some(guard)
        } else {
            cw_writeln!(w, "{binding} = function({ctor_params}) {{")?;
            None
        };

        {
            let _ctor = w.indent();
            if syntax.node() {
                if syntax.es6() && parent.is_some() {
                    w.writeln("super(output, pClass);")?;
                }
                w.writeln("this.output = output;")?;
                w.writeln("this.pClass = pClass;")?;
                w.writeln("this._seqid = 0;")?;
                w.writeln("this._reqs = {};")?;
            } else {
                w.writeln("this.input = input;")?;
                w.writeln("this.output = (!output) ? input : output;")?;
                w.writeln("this.seqid = 0;")?;
            }
        }

        if syntax.es6() {
            w.writeln("}")?;
        } else {
            w.writeln("};")?;
            match &parent {
                Some(p) => cw_writeln!(
                    w,
                    "Thrift.inherits({client_var}, {}{}Client);",
                    self.js_namespace(p.program),
                    p.name
                )?,
                None => cw_writeln!(w, "{client_var}.prototype = {{}};")?,
            }
        }

        if syntax.node() {
            if syntax.es6() {
                w.writeln("seqid () { return this._seqid; }")?;
                w.writeln("new_seqid () { return this._seqid += 1; }")?;
            } else {
                cw_writeln!(
                    w,
                    "{client_var}.prototype.seqid = function() {{ return this._seqid; }};"
                )?;
                cw_writeln!(
                    w,
                    "{client_var}.prototype.new_seqid = function() {{ return this._seqid += 1; }};"
                )?;
            }
        }

        for f in &service.functions {
            tracing::trace!(service = %s, function = %f.name, "client method");
            self.client_call(w, &client_var, f)?;
            self.client_send(w, service, &client_var, f)?;
            if !f.oneway {
                self.client_recv(w, service, &client_var, f)?;
            }
        }

        if let Some(guard) = class_body {
            drop(guard);
            w.writeln("};")?;
        }
        if syntax.node() {
            cw_writeln!(w, "exports.Client = {client_var};")?;
        }
        Ok(())
    }

    fn client_call(&self, w: &mut Out, client_var: &str, f: &Function) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let name = &f.name;
        let args = arg_list(f);

        w.blank_line()?;
        if syntax.es6() {
            cw_writeln!(w, "{name} ({args}) {{")?;
        } else {
            cw_writeln!(
                w,
                "{client_var}.prototype.{name} = function({}) {{",
                arg_list_with_callback(f)
            )?;
        }

        {
            let _body = w.indent();
            match (syntax.node(), syntax.es6()) {
                (true, true) => {
                    w.writeln("this._seqid = this.new_seqid();")?;
                    cw_writeln!(w, "{c}self = this;")?;
                    w.writeln("return new Promise((resolve, reject) => {")?;
                    {
                        let _promise = w.indent();
                        w.writeln("self._reqs[self.seqid()] = (error, result) => {")?;
                        w.writeln("  return error ? reject(error) : resolve(result);")?;
                        w.writeln("};")?;
                        cw_writeln!(w, "self.send_{name}({args});")?;
                    }
                    w.writeln("});")?;
                }
                (true, false) => {
                    w.writeln("this._seqid = this.new_seqid();")?;
                    w.writeln("if (callback === undefined) {")?;
                    {
                        let _promise = w.indent();
                        cw_writeln!(w, "{c}_defer = Q.defer();")?;
                        w.writeln("this._reqs[this.seqid()] = function(error, result) {")?;
                        {
                            let _settle = w.indent();
                            w.writeln("if (error) {")?;
                            w.writeln("  _defer.reject(error);")?;
                            w.writeln("} else {")?;
                            w.writeln("  _defer.resolve(result);")?;
                            w.writeln("}")?;
                        }
                        w.writeln("};")?;
                        cw_writeln!(w, "this.send_{name}({args});")?;
                        w.writeln("return _defer.promise;")?;
                    }
                    w.writeln("} else {")?;
                    {
                        let _callback = w.indent();
                        w.writeln("this._reqs[this.seqid()] = callback;")?;
                        cw_writeln!(w, "this.send_{name}({args});")?;
                    }
                    w.writeln("}")?;
                }
                (false, true) => {
                    let sep = if f.args.is_empty() { "" } else { ", " };
                    cw_writeln!(w, "{c}self = this;")?;
                    w.writeln("return new Promise((resolve, reject) => {")?;
                    {
                        let _promise = w.indent();
                        cw_writeln!(w, "self.send_{name}({args}{sep}(error, result) => {{")?;
                        w.writeln("  return error ? reject(error) : resolve(result);")?;
                        w.writeln("});")?;
                    }
                    w.writeln("});")?;
                }
                (false, false) => {
                    cw_writeln!(w, "this.send_{name}({}); ", arg_list_with_callback(f))?;
                    if !f.oneway {
                        w.writeln("if (!callback) {")?;
                        if f.return_type.is_void() {
                            cw_writeln!(w, "this.recv_{name}();")?;
                        } else {
                            cw_writeln!(w, "  return this.recv_{name}();")?;
                        }
                        w.writeln("}")?;
                    }
                }
            }
        }

        w.writeln(syntax.method_end())?;
        w.blank_line()?;
        Ok(())
    }

    fn client_send(
        &self,
        w: &mut Out,
        service: &Service,
        client_var: &str,
        f: &Function,
    ) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let name = &f.name;
        let params = if syntax.node() {
            arg_list(f)
        } else {
            arg_list_with_callback(f)
        };

        if syntax.es6() {
            cw_writeln!(w, "send_{name} ({params}) {{")?;
        } else {
            cw_writeln!(
                w,
                "{client_var}.prototype.send_{name} = function({params}) {{"
            )?;
        }

        {
            let _body = w.indent();
            let output = if syntax.node() {
                cw_writeln!(w, "{c}output = new this.pClass(this.output);")?;
                "output"
            } else {
                "this.output"
            };

            let args_name = self.args_name(service, f);
            if f.args.is_empty() {
                cw_writeln!(w, "{c}args = new {args_name}();")?;
            } else {
                let bag = unused_name(&f.args, "params");
                cw_writeln!(w, "{c}{bag} = {{")?;
                {
                    let _entries = w.indent();
                    let last = f.args.len() - 1;
                    for (i, a) in f.args.iter().enumerate() {
                        let sep = if i == last { "" } else { "," };
                        cw_writeln!(w, "{0}: {0}{sep}", a.name)?;
                    }
                }
                w.writeln("};")?;
                cw_writeln!(w, "{c}args = new {args_name}({bag});")?;
            }

            let kind = if f.oneway {
                MessageType::Oneway
            } else {
                MessageType::Call
            };
            let seqid = if syntax.node() {
                "this.seqid()"
            } else {
                "this.seqid"
            };

            w.writeln("try {")?;
            {
                let _try = w.indent();
                cw_writeln!(
                    w,
                    "{output}.writeMessageBegin('{name}', Thrift.MessageType.{}, {seqid});",
                    kind.name()
                )?;
                cw_writeln!(w, "args[Symbol.for(\"write\")]({output});")?;
                cw_writeln!(w, "{output}.writeMessageEnd();")?;
                self.client_flush(w, f)?;
            }
            w.writeln("}")?;

            w.writeln("catch (e) {")?;
            {
                let _catch = w.indent();
                let transport = if syntax.node() {
                    w.writeln("delete this._reqs[this.seqid()];")?;
                    output.to_string()
                } else {
                    format!("{output}.getTransport()")
                };
                cw_writeln!(w, "if (typeof {transport}.reset === 'function') {{")?;
                cw_writeln!(w, "  {transport}.reset();")?;
                w.writeln("}")?;
                w.writeln("throw e;")?;
            }
            w.writeln("}")?;
        }

        w.writeln(syntax.method_end())?;
        Ok(())
    }

    fn client_flush(&self, w: &mut Out, f: &Function) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let l = syntax.let_kw();
        let name = &f.name;

        if syntax.node() {
            if f.oneway {
                w.writeln("this.output.flush();")?;
                cw_writeln!(w, "{c}callback = this._reqs[this.seqid()] || function() {{}};")?;
                w.writeln("delete this._reqs[this.seqid()];")?;
                w.writeln("callback(null);")?;
            } else {
                w.writeln("return this.output.flush();")?;
            }
        } else if syntax.es6() {
            cw_writeln!(w, "{c}self = this;")?;
            if f.oneway {
                w.writeln("this.output.getTransport().flush(true, null);")?;
                w.writeln("callback();")?;
            } else {
                w.writeln("this.output.getTransport().flush(true, () => {")?;
                {
                    let _flushed = w.indent();
                    cw_writeln!(w, "{l}error = null, result = null;")?;
                    w.writeln("try {")?;
                    cw_writeln!(w, "  result = self.recv_{name}();")?;
                    w.writeln("} catch (e) {")?;
                    w.writeln("  error = e;")?;
                    w.writeln("}")?;
                    w.writeln("callback(error, result);")?;
                }
                w.writeln("});")?;
            }
        } else {
            w.writeln("if (callback) {")?;
            {
                let _callback = w.indent();
                if f.oneway {
                    w.writeln("this.output.getTransport().flush(true, null);")?;
                    w.writeln("callback();")?;
                } else {
                    cw_writeln!(w, "{c}self = this;")?;
                    w.writeln("this.output.getTransport().flush(true, function() {")?;
                    {
                        let _flushed = w.indent();
                        cw_writeln!(w, "{l}result = null;")?;
                        w.writeln("try {")?;
                        cw_writeln!(w, "  result = self.recv_{name}();")?;
                        w.writeln("} catch (e) {")?;
                        w.writeln("  result = e;")?;
                        w.writeln("}")?;
                        w.writeln("callback(result);")?;
                    }
                    w.writeln("});")?;
                }
            }
            w.writeln("} else {")?;
            w.writeln("  return this.output.getTransport().flush();")?;
            w.writeln("}")?;
        }
        Ok(())
    }

    fn client_recv(
        &self,
        w: &mut Out,
        service: &Service,
        client_var: &str,
        f: &Function,
    ) -> Result<(), GenError> {
        let syntax = self.syntax;
        let c = syntax.const_kw();
        let name = &f.name;

        w.blank_line()?;
        match (syntax.node(), syntax.es6()) {
            (true, true) => cw_writeln!(w, "recv_{name} (input, mtype, rseqid) {{")?,
            (true, false) => cw_writeln!(
                w,
                "{client_var}.prototype.recv_{name} = function(input,mtype,rseqid) {{"
            )?,
            (false, true) => cw_writeln!(w, "recv_{name} () {{")?,
            (false, false) => cw_writeln!(
                w,
                "{client_var}.prototype.recv_{name} = function() {{"
            )?,
        }

        {
            let _body = w.indent();
            let input = if syntax.node() {
                cw_writeln!(w, "{c}callback = this._reqs[rseqid] || function() {{}};")?;
                w.writeln("delete this._reqs[rseqid];")?;
                "input"
            } else {
                cw_writeln!(w, "{c}ret = this.input.readMessageBegin();")?;
                cw_writeln!(w, "{c}mtype = ret.mtype;")?;
                "this.input"
            };

            w.writeln("if (mtype == Thrift.MessageType.EXCEPTION) {")?;
            {
                let _exception = w.indent();
                cw_writeln!(w, "{c}x = new Thrift.TApplicationException();")?;
                cw_writeln!(w, "x[Symbol.for(\"read\")]({input});")?;
                cw_writeln!(w, "{input}.readMessageEnd();")?;
                w.writeln(&syntax.recv_fail("x"))?;
            }
            w.writeln("}")?;

            cw_writeln!(w, "{c}result = new {}();", self.result_name(service, f))?;
            cw_writeln!(w, "result[Symbol.for(\"read\")]({input});")?;
            cw_writeln!(w, "{input}.readMessageEnd();")?;
            w.blank_line()?;

            for x in &f.throws {
                cw_writeln!(w, "if (null !== result.{}) {{", x.name)?;
                cw_writeln!(w, "  {}", syntax.recv_fail(&format!("result.{}", x.name)))?;
                w.writeln("}")?;
            }

            if f.return_type.is_void() {
                w.writeln(if syntax.node() {
                    "callback(null);"
                } else {
                    "return;"
                })?;
            } else {
                w.writeln("if (null !== result.success) {")?;
                cw_writeln!(w, "  {}", syntax.recv_success("result.success"))?;
                w.writeln("}")?;
                w.writeln(&syntax.recv_fail(&format!("'{name} failed: unknown result'")))?;
            }
        }

        w.writeln(syntax.method_end())?;
        Ok(())
    }
}
