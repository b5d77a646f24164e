use thrift_schema::wire::{MessageType, ProtocolErrorKind, TType};

use crate::{ProtocolError, WireError};

/// Maximum nesting `skip` will follow before giving up.
pub const MAX_SKIP_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub kind: MessageType,
    pub seqid: i32,
}

impl MessageHeader {
    pub fn new(name: impl Into<String>, kind: MessageType, seqid: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            seqid,
        }
    }
}

/// Header of one struct field. `id` is meaningless when `ttype` is `Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub ttype: TType,
    pub id: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key: TType,
    pub value: TType,
    pub size: usize,
}

/// Header of a list or set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    pub element: TType,
    pub size: usize,
}

/// Reader half of a protocol.
pub trait InputProtocol {
    fn read_message_begin(&mut self) -> Result<MessageHeader, WireError>;
    fn read_message_end(&mut self) -> Result<(), WireError>;
    fn read_struct_begin(&mut self) -> Result<(), WireError>;
    fn read_struct_end(&mut self) -> Result<(), WireError>;
    fn read_field_begin(&mut self) -> Result<FieldHeader, WireError>;
    fn read_field_end(&mut self) -> Result<(), WireError>;
    fn read_map_begin(&mut self) -> Result<MapHeader, WireError>;
    fn read_map_end(&mut self) -> Result<(), WireError>;
    fn read_list_begin(&mut self) -> Result<ListHeader, WireError>;
    fn read_list_end(&mut self) -> Result<(), WireError>;
    fn read_set_begin(&mut self) -> Result<ListHeader, WireError>;
    fn read_set_end(&mut self) -> Result<(), WireError>;

    fn read_bool(&mut self) -> Result<bool, WireError>;
    fn read_byte(&mut self) -> Result<i8, WireError>;
    fn read_i16(&mut self) -> Result<i16, WireError>;
    fn read_i32(&mut self) -> Result<i32, WireError>;
    fn read_i64(&mut self) -> Result<i64, WireError>;
    fn read_double(&mut self) -> Result<f64, WireError>;
    fn read_string(&mut self) -> Result<String, WireError>;
    fn read_binary(&mut self) -> Result<Vec<u8>, WireError>;

    /// Consume exactly one value of the given tag.
    fn skip(&mut self, ttype: TType) -> Result<(), WireError> {
        self.skip_nested(ttype, 0)
    }

    #[doc(hidden)]
    fn skip_nested(&mut self, ttype: TType, depth: usize) -> Result<(), WireError> {
        if depth > MAX_SKIP_DEPTH {
            return Err(ProtocolError::new(
                ProtocolErrorKind::DepthLimit,
                format!("skip nested deeper than {MAX_SKIP_DEPTH} levels"),
            )
            .into());
        }
        match ttype {
            TType::Bool => self.read_bool().map(drop),
            TType::Byte => self.read_byte().map(drop),
            TType::I16 => self.read_i16().map(drop),
            TType::I32 => self.read_i32().map(drop),
            TType::I64 => self.read_i64().map(drop),
            TType::Double => self.read_double().map(drop),
            TType::String => self.read_binary().map(drop),
            TType::Struct => {
                self.read_struct_begin()?;
                loop {
                    let header = self.read_field_begin()?;
                    if header.ttype == TType::Stop {
                        break;
                    }
                    self.skip_nested(header.ttype, depth + 1)?;
                    self.read_field_end()?;
                }
                self.read_struct_end()
            }
            TType::Map => {
                let header = self.read_map_begin()?;
                for _ in 0..header.size {
                    self.skip_nested(header.key, depth + 1)?;
                    self.skip_nested(header.value, depth + 1)?;
                }
                self.read_map_end()
            }
            TType::Set => {
                let header = self.read_set_begin()?;
                for _ in 0..header.size {
                    self.skip_nested(header.element, depth + 1)?;
                }
                self.read_set_end()
            }
            TType::List => {
                let header = self.read_list_begin()?;
                for _ in 0..header.size {
                    self.skip_nested(header.element, depth + 1)?;
                }
                self.read_list_end()
            }
            TType::Stop | TType::Void => Err(ProtocolError::invalid_data(format!(
                "cannot skip a value tagged {}",
                ttype.name()
            ))
            .into()),
        }
    }
}

/// Writer half of a protocol.
pub trait OutputProtocol {
    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<(), WireError>;
    fn write_message_end(&mut self) -> Result<(), WireError>;
    fn write_struct_begin(&mut self, name: &str) -> Result<(), WireError>;
    fn write_struct_end(&mut self) -> Result<(), WireError>;
    fn write_field_begin(&mut self, name: &str, ttype: TType, id: i16) -> Result<(), WireError>;
    fn write_field_end(&mut self) -> Result<(), WireError>;
    fn write_field_stop(&mut self) -> Result<(), WireError>;
    fn write_map_begin(&mut self, key: TType, value: TType, size: usize) -> Result<(), WireError>;
    fn write_map_end(&mut self) -> Result<(), WireError>;
    fn write_list_begin(&mut self, element: TType, size: usize) -> Result<(), WireError>;
    fn write_list_end(&mut self) -> Result<(), WireError>;
    fn write_set_begin(&mut self, element: TType, size: usize) -> Result<(), WireError>;
    fn write_set_end(&mut self) -> Result<(), WireError>;

    fn write_bool(&mut self, v: bool) -> Result<(), WireError>;
    fn write_byte(&mut self, v: i8) -> Result<(), WireError>;
    fn write_i16(&mut self, v: i16) -> Result<(), WireError>;
    fn write_i32(&mut self, v: i32) -> Result<(), WireError>;
    fn write_i64(&mut self, v: i64) -> Result<(), WireError>;
    fn write_double(&mut self, v: f64) -> Result<(), WireError>;
    fn write_string(&mut self, v: &str) -> Result<(), WireError>;
    fn write_binary(&mut self, v: &[u8]) -> Result<(), WireError>;

    /// Commit the pending frame on the underlying transport.
    fn flush(&mut self) -> Result<(), WireError>;
    /// Drop the pending frame on the underlying transport.
    fn reset(&mut self);
}
