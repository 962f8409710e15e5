//! PackStream decoder.
//!
//! A single-pass cursor: reads one marker, dispatches on its class, and
//! leaves the cursor at the first byte after the value, so callers can
//! observe both the decoded value and the remaining input.

use bytes::Buf;
use std::collections::HashMap;

use super::marker::{self, MarkerClass};
use super::value::{Structure, Value};
use super::PackStreamError;

/// Decoder over a borrowed byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// The unread tail of the input.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn read(&mut self) -> Result<Value, PackStreamError> {
        let byte = self.take_u8()?;
        match marker::classify(byte) {
            MarkerClass::Null => Ok(Value::Null),
            MarkerClass::Boolean(b) => Ok(Value::Boolean(b)),
            MarkerClass::TinyInt(i) => Ok(Value::Integer(i)),
            MarkerClass::Int(width) => self.read_sized_int(width),
            MarkerClass::Float => {
                let raw = self.take(8)?;
                Ok(Value::Float(f64::from_bits(u64::from_be_bytes(
                    raw.try_into().expect("8-byte slice"),
                ))))
            }
            MarkerClass::Bytes(width) => {
                let len = self.take_size(width)?;
                Ok(Value::Bytes(self.take(len)?.to_vec()))
            }
            MarkerClass::TinyString(len) => self.read_string(len),
            MarkerClass::String(width) => {
                let len = self.take_size(width)?;
                self.read_string(len)
            }
            MarkerClass::TinyList(len) => self.read_list(len),
            MarkerClass::List(width) => {
                let len = self.take_size(width)?;
                self.read_list(len)
            }
            MarkerClass::TinyMap(len) => self.read_map(len),
            MarkerClass::Map(width) => {
                let len = self.take_size(width)?;
                self.read_map(len)
            }
            MarkerClass::TinyStruct(len) => self.read_structure(len),
            MarkerClass::Struct(width) => {
                let len = self.take_size(width)?;
                self.read_structure(len)
            }
            MarkerClass::Unknown => Err(PackStreamError::UnknownMarker(byte)),
        }
    }

    fn read_sized_int(&mut self, width: usize) -> Result<Value, PackStreamError> {
        let raw = self.take(width)?;
        let value = match width {
            1 => raw[0] as i8 as i64,
            2 => i16::from_be_bytes(raw.try_into().expect("2-byte slice")) as i64,
            4 => i32::from_be_bytes(raw.try_into().expect("4-byte slice")) as i64,
            _ => i64::from_be_bytes(raw.try_into().expect("8-byte slice")),
        };
        Ok(Value::Integer(value))
    }

    fn read_string(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let raw = self.take(len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?;
        Ok(Value::String(s.to_owned()))
    }

    fn read_list(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.read()?);
        }
        Ok(Value::List(items))
    }

    fn read_map(&mut self, len: usize) -> Result<Value, PackStreamError> {
        let mut map = HashMap::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.read()? {
                Value::String(s) => s,
                other => return Err(PackStreamError::NonStringMapKey(other.type_name())),
            };
            let value = self.read()?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }

    fn read_structure(&mut self, field_count: usize) -> Result<Value, PackStreamError> {
        let signature = self.take_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(64));
        for _ in 0..field_count {
            fields.push(self.read()?);
        }
        Ok(Value::Structure(Structure::new(signature, fields)))
    }

    fn take_u8(&mut self) -> Result<u8, PackStreamError> {
        let raw = self.take(1)?;
        Ok(raw[0])
    }

    fn take_size(&mut self, width: usize) -> Result<usize, PackStreamError> {
        let mut raw = self.take(width)?;
        Ok(match width {
            1 => raw.get_u8() as usize,
            2 => raw.get_u16() as usize,
            _ => raw.get_u32() as usize,
        })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        if self.remaining() < len {
            return Err(PackStreamError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

/// Decode one value from the front of `data`.
pub fn decode(data: &[u8]) -> Result<Value, PackStreamError> {
    Decoder::new(data).read()
}

/// Decode one value and return it with the unread remainder.
pub fn decode_prefix(data: &[u8]) -> Result<(Value, &[u8]), PackStreamError> {
    let mut dec = Decoder::new(data);
    let value = dec.read()?;
    Ok((value, dec.rest()))
}
