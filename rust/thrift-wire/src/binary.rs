//! Strict binary protocol.
//!
//! Big-endian fixed-width integers, `i32` length prefixes, and a versioned
//! message header (`0x8001_0000 | kind`).

use bytes::{Buf, BufMut, BytesMut};
use thrift_schema::wire::{MessageType, ProtocolErrorKind, TType};

use crate::protocol::{FieldHeader, InputProtocol, ListHeader, MapHeader, MessageHeader, OutputProtocol};
use crate::{ProtocolError, Transport, TransportError, WireError};

const VERSION_1: u32 = 0x8001_0000;
const VERSION_MASK: u32 = 0xffff_0000;
const READ_CHUNK: usize = 64 * 1024;

pub struct BinaryProtocol<T> {
    transport: T,
    scratch: BytesMut,
    string_limit: Option<usize>,
    container_limit: Option<usize>,
}

impl<T: Transport> BinaryProtocol<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            scratch: BytesMut::with_capacity(16),
            string_limit: None,
            container_limit: None,
        }
    }

    /// Reject strings and binaries longer than `limit` bytes.
    pub fn with_string_limit(mut self, limit: usize) -> Self {
        self.string_limit = Some(limit);
        self
    }

    /// Reject containers declaring more than `limit` elements.
    pub fn with_container_limit(mut self, limit: usize) -> Self {
        self.container_limit = Some(limit);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut buf = [0u8; N];
        self.transport.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_tag(&mut self) -> Result<TType, WireError> {
        let [raw] = self.read_array::<1>()?;
        TType::from_u8(raw).ok_or_else(|| {
            ProtocolError::invalid_data(format!("unknown type tag {raw}")).into()
        })
    }

    fn read_size(&mut self, limit: Option<usize>, what: &str) -> Result<usize, WireError> {
        let size = self.read_i32()?;
        let size = usize::try_from(size).map_err(|_| {
            ProtocolError::new(
                ProtocolErrorKind::NegativeSize,
                format!("negative {what} size: {size}"),
            )
        })?;
        if let Some(limit) = limit
            && size > limit
        {
            return Err(ProtocolError::new(
                ProtocolErrorKind::SizeLimit,
                format!("{what} size {size} exceeds limit {limit}"),
            )
            .into());
        }
        Ok(size)
    }

    fn write_size(&mut self, size: usize, what: &str) -> Result<(), WireError> {
        let size = i32::try_from(size).map_err(|_| {
            ProtocolError::new(
                ProtocolErrorKind::SizeLimit,
                format!("{what} size {size} does not fit the wire format"),
            )
        })?;
        self.write_i32(size)
    }

    fn emit(&mut self, fill: impl FnOnce(&mut BytesMut)) -> Result<(), WireError> {
        self.scratch.clear();
        fill(&mut self.scratch);
        self.transport.write(&self.scratch)?;
        Ok(())
    }
}

impl<T: Transport> InputProtocol for BinaryProtocol<T> {
    fn read_message_begin(&mut self) -> Result<MessageHeader, WireError> {
        let word = self.read_i32()? as u32;
        if word & 0x8000_0000 == 0 {
            return Err(ProtocolError::new(
                ProtocolErrorKind::BadVersion,
                "missing version in message header",
            )
            .into());
        }
        if word & VERSION_MASK != VERSION_1 {
            return Err(ProtocolError::new(
                ProtocolErrorKind::BadVersion,
                format!("bad version in message header: {:#x}", word & VERSION_MASK),
            )
            .into());
        }
        let raw_kind = (word & 0xff) as u8;
        let kind = MessageType::from_u8(raw_kind).ok_or_else(|| {
            ProtocolError::invalid_data(format!("unknown message type {raw_kind}"))
        })?;
        let name = self.read_string()?;
        let seqid = self.read_i32()?;
        Ok(MessageHeader { name, kind, seqid })
    }

    fn read_message_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_struct_begin(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_struct_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> Result<FieldHeader, WireError> {
        let ttype = self.read_tag()?;
        if ttype == TType::Stop {
            return Ok(FieldHeader { ttype, id: 0 });
        }
        let id = self.read_i16()?;
        Ok(FieldHeader { ttype, id })
    }

    fn read_field_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> Result<MapHeader, WireError> {
        let key = self.read_tag()?;
        let value = self.read_tag()?;
        let size = self.read_size(self.container_limit, "map")?;
        Ok(MapHeader { key, value, size })
    }

    fn read_map_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> Result<ListHeader, WireError> {
        let element = self.read_tag()?;
        let size = self.read_size(self.container_limit, "list")?;
        Ok(ListHeader { element, size })
    }

    fn read_list_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> Result<ListHeader, WireError> {
        let element = self.read_tag()?;
        let size = self.read_size(self.container_limit, "set")?;
        Ok(ListHeader { element, size })
    }

    fn read_set_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_byte()? == 1)
    }

    fn read_byte(&mut self) -> Result<i8, WireError> {
        let [b] = self.read_array::<1>()?;
        Ok(b as i8)
    }

    fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok((&self.read_array::<2>()?[..]).get_i16())
    }

    fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok((&self.read_array::<4>()?[..]).get_i32())
    }

    fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok((&self.read_array::<8>()?[..]).get_i64())
    }

    fn read_double(&mut self) -> Result<f64, WireError> {
        Ok((&self.read_array::<8>()?[..]).get_f64())
    }

    fn read_string(&mut self) -> Result<String, WireError> {
        let bytes = self.read_binary()?;
        String::from_utf8(bytes)
            .map_err(|_| ProtocolError::invalid_data("string is not valid UTF-8").into())
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_size(self.string_limit, "string")?;
        // Grow with the bytes that actually arrive, not with the declared length.
        let mut buf = Vec::with_capacity(len.min(READ_CHUNK));
        while buf.len() < len {
            let start = buf.len();
            buf.resize(start + READ_CHUNK.min(len - start), 0);
            self.transport
                .read_exact(&mut buf[start..])
                .map_err(|err| match err {
                    TransportError::UnexpectedEof { .. } => WireError::from(
                        ProtocolError::invalid_data(format!(
                            "string declares {len} bytes but input ended after {start}"
                        )),
                    ),
                    other => other.into(),
                })?;
        }
        Ok(buf)
    }
}

impl<T: Transport> OutputProtocol for BinaryProtocol<T> {
    fn write_message_begin(&mut self, header: &MessageHeader) -> Result<(), WireError> {
        self.write_i32((VERSION_1 | header.kind as u32) as i32)?;
        self.write_string(&header.name)?;
        self.write_i32(header.seqid)
    }

    fn write_message_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_struct_begin(&mut self, _name: &str) -> Result<(), WireError> {
        Ok(())
    }

    fn write_struct_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_field_begin(&mut self, _name: &str, ttype: TType, id: i16) -> Result<(), WireError> {
        self.emit(|b| {
            b.put_u8(ttype as u8);
            b.put_i16(id);
        })
    }

    fn write_field_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_field_stop(&mut self) -> Result<(), WireError> {
        self.emit(|b| b.put_u8(TType::Stop as u8))
    }

    fn write_map_begin(&mut self, key: TType, value: TType, size: usize) -> Result<(), WireError> {
        self.emit(|b| {
            b.put_u8(key as u8);
            b.put_u8(value as u8);
        })?;
        self.write_size(size, "map")
    }

    fn write_map_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_list_begin(&mut self, element: TType, size: usize) -> Result<(), WireError> {
        self.emit(|b| b.put_u8(element as u8))?;
        self.write_size(size, "list")
    }

    fn write_list_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_set_begin(&mut self, element: TType, size: usize) -> Result<(), WireError> {
        self.emit(|b| b.put_u8(element as u8))?;
        self.write_size(size, "set")
    }

    fn write_set_end(&mut self) -> Result<(), WireError> {
        Ok(())
    }

    fn write_bool(&mut self, v: bool) -> Result<(), WireError> {
        self.write_byte(i8::from(v))
    }

    fn write_byte(&mut self, v: i8) -> Result<(), WireError> {
        self.emit(|b| b.put_i8(v))
    }

    fn write_i16(&mut self, v: i16) -> Result<(), WireError> {
        self.emit(|b| b.put_i16(v))
    }

    fn write_i32(&mut self, v: i32) -> Result<(), WireError> {
        self.emit(|b| b.put_i32(v))
    }

    fn write_i64(&mut self, v: i64) -> Result<(), WireError> {
        self.emit(|b| b.put_i64(v))
    }

    fn write_double(&mut self, v: f64) -> Result<(), WireError> {
        self.emit(|b| b.put_f64(v))
    }

    fn write_string(&mut self, v: &str) -> Result<(), WireError> {
        self.write_binary(v.as_bytes())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<(), WireError> {
        self.write_size(v.len(), "string")?;
        self.transport.write(v)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WireError> {
        self.transport.flush()?;
        Ok(())
    }

    fn reset(&mut self) {
        self.transport.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryTransport;

    fn written(f: impl FnOnce(&mut BinaryProtocol<MemoryTransport>)) -> Vec<u8> {
        let mut p = BinaryProtocol::new(MemoryTransport::new());
        f(&mut p);
        p.flush().unwrap();
        p.transport_mut().take_flushed().to_vec()
    }

    fn reader(bytes: Vec<u8>) -> BinaryProtocol<MemoryTransport> {
        BinaryProtocol::new(MemoryTransport::with_input(bytes))
    }

    #[test]
    fn message_header_is_versioned() {
        let bytes = written(|p| {
            p.write_message_begin(&MessageHeader::new("ping", MessageType::Call, 7))
                .unwrap()
        });
        assert_eq!(&bytes[..4], &[0x80, 0x01, 0x00, 0x01]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 4]);
        assert_eq!(&bytes[8..12], b"ping");
        assert_eq!(&bytes[12..], &[0, 0, 0, 7]);

        let header = reader(bytes).read_message_begin().unwrap();
        assert_eq!(header, MessageHeader::new("ping", MessageType::Call, 7));
    }

    #[test]
    fn unversioned_headers_are_rejected() {
        let mut p = reader(vec![0, 0, 0, 4, b'p', b'i', b'n', b'g', 1, 0, 0, 0, 0]);
        let err = p.read_message_begin().unwrap_err();
        assert!(matches!(
            err,
            WireError::Protocol(ProtocolError {
                kind: ProtocolErrorKind::BadVersion,
                ..
            })
        ));
    }

    #[test]
    fn field_stop_is_a_single_zero_byte() {
        let bytes = written(|p| {
            p.write_field_begin("x", TType::I32, 3).unwrap();
            p.write_i32(-2).unwrap();
            p.write_field_stop().unwrap();
        });
        assert_eq!(bytes, vec![8, 0, 3, 0xff, 0xff, 0xff, 0xfe, 0]);

        let mut p = reader(bytes);
        assert_eq!(
            p.read_field_begin().unwrap(),
            FieldHeader {
                ttype: TType::I32,
                id: 3
            }
        );
        assert_eq!(p.read_i32().unwrap(), -2);
        assert_eq!(p.read_field_begin().unwrap().ttype, TType::Stop);
    }

    #[test]
    fn negative_sizes_are_protocol_errors() {
        let mut p = reader(vec![TType::I32 as u8, 0xff, 0xff, 0xff, 0xff]);
        let err = p.read_list_begin().unwrap_err();
        assert!(matches!(
            err,
            WireError::Protocol(ProtocolError {
                kind: ProtocolErrorKind::NegativeSize,
                ..
            })
        ));
    }

    #[test]
    fn string_limit_is_enforced() {
        let bytes = written(|p| p.write_string("hello").unwrap());
        let mut p = reader(bytes).with_string_limit(4);
        let err = p.read_string().unwrap_err();
        assert!(matches!(
            err,
            WireError::Protocol(ProtocolError {
                kind: ProtocolErrorKind::SizeLimit,
                ..
            })
        ));
    }

    #[test]
    fn oversized_length_prefix_fails_without_the_bytes() {
        let mut bytes = i32::MAX.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let mut p = reader(bytes);
        let err = p.read_binary().unwrap_err();
        assert!(matches!(
            err,
            WireError::Protocol(ProtocolError {
                kind: ProtocolErrorKind::InvalidData,
                ..
            })
        ));
    }

    #[test]
    fn long_strings_span_several_chunks() {
        let long = "x".repeat(READ_CHUNK * 2 + 5);
        let bytes = written(|p| p.write_string(&long).unwrap());
        let mut p = reader(bytes);
        assert_eq!(p.read_string().unwrap(), long);
        assert_eq!(p.transport().remaining_input(), 0);
    }

    #[test]
    fn skip_consumes_exactly_one_value() {
        let bytes = written(|p| {
            p.write_map_begin(TType::String, TType::List, 1).unwrap();
            p.write_string("k").unwrap();
            p.write_list_begin(TType::I64, 2).unwrap();
            p.write_i64(1).unwrap();
            p.write_i64(2).unwrap();
            p.write_i32(42).unwrap();
        });
        let mut p = reader(bytes);
        p.skip(TType::Map).unwrap();
        assert_eq!(p.read_i32().unwrap(), 42);
        assert_eq!(p.transport().remaining_input(), 0);
    }

    #[test]
    fn skip_depth_is_bounded() {
        let bytes = written(|p| {
            for _ in 0..(crate::protocol::MAX_SKIP_DEPTH + 2) {
                p.write_list_begin(TType::List, 1).unwrap();
            }
            p.write_list_begin(TType::I32, 0).unwrap();
        });
        let err = reader(bytes).skip(TType::List).unwrap_err();
        assert!(matches!(
            err,
            WireError::Protocol(ProtocolError {
                kind: ProtocolErrorKind::DepthLimit,
                ..
            })
        ));
    }
}
