use std::collections::HashMap;

use thrift_schema::wire::{ApplicationExceptionKind, MessageType, TType};
use thrift_schema::{Function, Program, Service, Struct, TypeKind, TypeRef, category};
use tracing::{debug, warn};

use super::{SchemaCodec, StructValue, Value};
use crate::protocol::{InputProtocol, MessageHeader, OutputProtocol};
use crate::{ApplicationException, ProtocolError, WireError};

/// One callable method, resolved once when a client or processor is built.
#[derive(Debug)]
struct Method<'a> {
    /// Home program of the declaring service.
    scope: &'a Program,
    function: &'a Function,
    args: Struct,
    result: Struct,
}

impl Method<'_> {
    fn codec(&self) -> SchemaCodec<'_> {
        SchemaCodec::new(self.scope)
    }

    /// Name of the result slot holding exceptions of type `name`.
    fn declared_slot(&self, name: &str) -> Option<&str> {
        self.function.throws.iter().find_map(|f| match category(&f.ty) {
            TypeKind::Exception(r) if r.name == name => Some(f.name.as_str()),
            _ => None,
        })
    }
}

/// Every method of `service` plus, transitively, its ancestors'.
/// A method declared closer to `service` shadows an inherited one.
fn method_table<'a>(
    program: &'a Program,
    service: &str,
) -> Result<HashMap<String, Method<'a>>, WireError> {
    let (home, svc) = program.find_service(&TypeRef::local(service))?;
    let mut layers: Vec<(&'a Program, &'a Service)> = vec![(home, svc)];
    layers.extend(home.ancestors(svc)?);

    let mut table = HashMap::new();
    for (scope, declaring) in layers {
        for function in &declaring.functions {
            table.entry(function.name.clone()).or_insert_with(|| Method {
                scope,
                function,
                args: function.args_struct(function.args_struct_name(&declaring.name)),
                result: function.result_struct(function.result_struct_name(&declaring.name)),
            });
        }
    }
    Ok(table)
}

/// Failure raised by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerError {
    /// One of the method's declared exceptions.
    Declared(StructValue),
    /// Anything else; reported to the caller as an `UNKNOWN` application exception.
    Other(String),
}

/// Server-side implementation of a service.
///
/// Arguments arrive positionally in declaration order; `None` marks an
/// argument absent from the request.
pub trait Handler {
    fn handle(
        &mut self,
        method: &str,
        args: Vec<Option<Value>>,
    ) -> Result<Option<Value>, HandlerError>;
}

/// Receives one request, dispatches it to the handler, writes the reply.
pub struct Processor<'a, H> {
    service: String,
    methods: HashMap<String, Method<'a>>,
    handler: H,
}

impl<'a, H: Handler> Processor<'a, H> {
    pub fn new(program: &'a Program, service: &str, handler: H) -> Result<Self, WireError> {
        let methods = method_table(program, service)?;
        debug!(service, methods = methods.len(), "processor ready");
        Ok(Self {
            service: service.to_owned(),
            methods,
            handler,
        })
    }

    pub fn handles(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn process(
        &mut self,
        input: &mut dyn InputProtocol,
        output: &mut dyn OutputProtocol,
    ) -> Result<(), WireError> {
        let header = input.read_message_begin()?;
        let Some(method) = self.methods.get(&header.name) else {
            debug!(service = %self.service, method = %header.name, "unknown method");
            input.skip(TType::Struct)?;
            input.read_message_end()?;
            let x = ApplicationException::unknown_method(&header.name);
            return write_exception(output, &header, &x);
        };
        debug!(service = %self.service, method = %header.name, seqid = header.seqid, "dispatch");

        let codec = method.codec();
        let args = codec.read_struct(input, &method.args)?;
        input.read_message_end()?;

        let positional = method
            .function
            .args
            .iter()
            .map(|f| args.get(&f.name).cloned())
            .collect();
        let outcome = self.handler.handle(&header.name, positional);

        if method.function.oneway {
            if let Err(e) = outcome {
                debug!(method = %header.name, error = ?e, "oneway handler failed, no reply sent");
            }
            return Ok(());
        }

        let reply = match outcome {
            Ok(ret) => {
                let bag = match ret {
                    Some(v) if !method.function.return_type.is_void() => {
                        StructValue::bag().with("success", v)
                    }
                    _ => StructValue::bag(),
                };
                codec.construct(&method.result, Some(&bag))
            }
            Err(HandlerError::Declared(exception)) => {
                if method.declared_slot(&exception.name).is_some() {
                    codec.construct(&method.result, Some(&exception))
                } else {
                    Err(ApplicationException::new(
                        ApplicationExceptionKind::Unknown,
                        format!("undeclared exception {}", exception.name),
                    )
                    .into())
                }
            }
            Err(HandlerError::Other(message)) => Err(ApplicationException::new(
                ApplicationExceptionKind::Unknown,
                message,
            )
            .into()),
        };

        match reply {
            Ok(result) => {
                output.write_message_begin(&MessageHeader::new(
                    &header.name,
                    MessageType::Reply,
                    header.seqid,
                ))?;
                codec.write_struct(output, &method.result, &result)?;
                output.write_message_end()?;
                output.flush()
            }
            Err(WireError::Application(x)) => write_exception(output, &header, &x),
            Err(other) => {
                let x = ApplicationException::new(ApplicationExceptionKind::Unknown, other.to_string());
                write_exception(output, &header, &x)
            }
        }
    }
}

fn write_exception(
    output: &mut dyn OutputProtocol,
    request: &MessageHeader,
    x: &ApplicationException,
) -> Result<(), WireError> {
    output.write_message_begin(&MessageHeader::new(
        &request.name,
        MessageType::Exception,
        request.seqid,
    ))?;
    x.write(output)?;
    output.write_message_end()?;
    output.flush()
}

/// Outcome of one call, decided once when the reply is decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Success(Value),
    /// A void method returned normally, or a oneway call was sent.
    Void,
    /// The handler raised one of the declared exceptions.
    Declared {
        slot: String,
        exception: StructValue,
    },
    /// The peer answered with a generic application exception.
    Application(ApplicationException),
}

#[derive(Debug, Clone)]
struct PendingCall {
    method: String,
}

/// Client side: sends requests and matches replies to them by sequence id.
pub struct Client<'a, I, O> {
    service: String,
    methods: HashMap<String, Method<'a>>,
    input: I,
    output: O,
    seqid: i32,
    pending: HashMap<i32, PendingCall>,
}

impl<'a, I: InputProtocol, O: OutputProtocol> Client<'a, I, O> {
    pub fn new(program: &'a Program, service: &str, input: I, output: O) -> Result<Self, WireError> {
        Ok(Self {
            service: service.to_owned(),
            methods: method_table(program, service)?,
            input,
            output,
            seqid: 0,
            pending: HashMap::new(),
        })
    }

    /// The most recently issued sequence id.
    pub fn seqid(&self) -> i32 {
        self.seqid
    }

    /// Calls sent whose reply has not been received yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Send, then receive unless the method is oneway.
    pub fn call(&mut self, method: &str, args: Vec<Value>) -> Result<RpcReply, WireError> {
        let seqid = self.send(method, args)?;
        let oneway = self
            .methods
            .get(method)
            .is_some_and(|m| m.function.oneway);
        if oneway {
            return Ok(RpcReply::Void);
        }
        let (rseqid, reply) = self.recv_one()?;
        if rseqid != seqid {
            return Err(ApplicationException::new(
                ApplicationExceptionKind::BadSequenceId,
                format!("expected reply to {seqid}, got {rseqid}"),
            )
            .into());
        }
        Ok(reply)
    }

    /// Write one request and flush it. Returns the sequence id used.
    ///
    /// A failed write resets the output transport and forgets the call.
    pub fn send(&mut self, method: &str, args: Vec<Value>) -> Result<i32, WireError> {
        let Some(entry) = self.methods.get(method) else {
            return Err(ApplicationException::unknown_method(method).into());
        };
        if args.len() > entry.function.args.len() {
            return Err(ProtocolError::invalid_data(format!(
                "{method} takes {} arguments, {} given",
                entry.function.args.len(),
                args.len()
            ))
            .into());
        }
        let mut params = StructValue::bag();
        for (field, value) in entry.function.args.iter().zip(args) {
            params.set(field.name.clone(), value);
        }
        let codec = entry.codec();
        let request = codec.construct(&entry.args, Some(&params))?;
        let kind = if entry.function.oneway {
            MessageType::Oneway
        } else {
            MessageType::Call
        };

        self.seqid = self.seqid.wrapping_add(1);
        let seqid = self.seqid;
        self.pending.insert(
            seqid,
            PendingCall {
                method: method.to_owned(),
            },
        );

        let written = (|| {
            self.output
                .write_message_begin(&MessageHeader::new(method, kind, seqid))?;
            codec.write_struct(&mut self.output, &entry.args, &request)?;
            self.output.write_message_end()?;
            self.output.flush()
        })();

        if let Err(e) = written {
            warn!(service = %self.service, method, error = %e, "send failed, resetting transport");
            self.pending.remove(&seqid);
            self.output.reset();
            return Err(e);
        }
        if entry.function.oneway {
            self.pending.remove(&seqid);
        }
        Ok(seqid)
    }

    /// Read one reply and settle the pending call it answers.
    pub fn recv(&mut self) -> Result<RpcReply, WireError> {
        self.recv_one().map(|(_, reply)| reply)
    }

    fn recv_one(&mut self) -> Result<(i32, RpcReply), WireError> {
        let header = self.input.read_message_begin()?;
        let Some(call) = self.pending.remove(&header.seqid) else {
            self.input.skip(TType::Struct)?;
            self.input.read_message_end()?;
            return Err(ApplicationException::new(
                ApplicationExceptionKind::BadSequenceId,
                format!("no pending call for seqid {}", header.seqid),
            )
            .into());
        };
        if header.name != call.method {
            self.input.skip(TType::Struct)?;
            self.input.read_message_end()?;
            return Err(ApplicationException::new(
                ApplicationExceptionKind::WrongMethodName,
                format!("{} answered with {}", call.method, header.name),
            )
            .into());
        }

        if header.kind == MessageType::Exception {
            let x = ApplicationException::read(&mut self.input)?;
            self.input.read_message_end()?;
            return Ok((header.seqid, RpcReply::Application(x)));
        }

        let Some(entry) = self.methods.get(&call.method) else {
            return Err(ApplicationException::unknown_method(&call.method).into());
        };
        let result = entry.codec().read_struct(&mut self.input, &entry.result)?;
        self.input.read_message_end()?;

        for slot in &entry.function.throws {
            if let Some(Value::Struct(exception)) = result.get(&slot.name) {
                return Ok((
                    header.seqid,
                    RpcReply::Declared {
                        slot: slot.name.clone(),
                        exception: exception.clone(),
                    },
                ));
            }
        }
        if entry.function.return_type.is_void() {
            return Ok((header.seqid, RpcReply::Void));
        }
        match result.get("success") {
            Some(v) => Ok((header.seqid, RpcReply::Success(v.clone()))),
            None => Err(ApplicationException::new(
                ApplicationExceptionKind::MissingResult,
                format!("{} failed: unknown result", call.method),
            )
            .into()),
        }
    }
}
