//! PackStream encoder.
//!
//! Emits a marker byte (plus any size bytes) followed by the payload.
//! Multi-byte integers are big-endian throughout; integers always use
//! the smallest encoding that fits.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use super::marker;
use super::value::{Structure, Value};
use super::PackStreamError;

/// Encoder writing PackStream values into a growable buffer.
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> BytesMut {
        self.buf
    }

    /// Encode one value.
    pub fn write(&mut self, value: &Value) -> Result<(), PackStreamError> {
        match value {
            Value::Null => {
                self.buf.put_u8(marker::NULL);
                Ok(())
            }
            Value::Boolean(b) => {
                self.buf
                    .put_u8(if *b { marker::TRUE } else { marker::FALSE });
                Ok(())
            }
            Value::Integer(i) => {
                self.write_int(*i);
                Ok(())
            }
            Value::Float(f) => {
                self.buf.put_u8(marker::FLOAT_64);
                self.buf.put_f64(*f);
                Ok(())
            }
            Value::Bytes(b) => self.write_bytes(b),
            Value::String(s) => self.write_string(s),
            Value::List(l) => self.write_list(l),
            Value::Map(m) => self.write_map(m),
            Value::Structure(s) => self.write_structure(s),
        }
    }

    /// Smallest-fit integer encoding: tiny, then INT_8/16/32/64.
    pub fn write_int(&mut self, value: i64) {
        if marker::fits_tiny_int(value) {
            self.buf.put_u8(value as u8);
        } else if i8::try_from(value).is_ok() {
            self.buf.put_u8(marker::INT_8);
            self.buf.put_i8(value as i8);
        } else if i16::try_from(value).is_ok() {
            self.buf.put_u8(marker::INT_16);
            self.buf.put_i16(value as i16);
        } else if i32::try_from(value).is_ok() {
            self.buf.put_u8(marker::INT_32);
            self.buf.put_i32(value as i32);
        } else {
            self.buf.put_u8(marker::INT_64);
            self.buf.put_i64(value);
        }
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        let len = value.len();
        if len <= u8::MAX as usize {
            self.buf.put_u8(marker::BYTES_8);
            self.buf.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buf.put_u8(marker::BYTES_16);
            self.buf.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buf.put_u8(marker::BYTES_32);
            self.buf.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge("bytes", len));
        }
        self.buf.put_slice(value);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        self.write_size_marker(
            bytes.len(),
            marker::TINY_STRING,
            marker::STRING_8,
            marker::STRING_16,
            marker::STRING_32,
            "string",
        )?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    pub fn write_list(&mut self, values: &[Value]) -> Result<(), PackStreamError> {
        self.write_size_marker(
            values.len(),
            marker::TINY_LIST,
            marker::LIST_8,
            marker::LIST_16,
            marker::LIST_32,
            "list",
        )?;
        for value in values {
            self.write(value)?;
        }
        Ok(())
    }

    /// Map keys are strings by construction; `HashMap` also guarantees
    /// uniqueness, so no key validation is needed here.
    pub fn write_map(&mut self, map: &HashMap<String, Value>) -> Result<(), PackStreamError> {
        self.write_size_marker(
            map.len(),
            marker::TINY_MAP,
            marker::MAP_8,
            marker::MAP_16,
            marker::MAP_32,
            "map",
        )?;
        for (key, value) in map {
            self.write_string(key)?;
            self.write(value)?;
        }
        Ok(())
    }

    pub fn write_structure(&mut self, s: &Structure) -> Result<(), PackStreamError> {
        let len = s.fields.len();
        if len <= marker::TINY_MAX {
            self.buf.put_u8(marker::TINY_STRUCT + len as u8);
        } else if len <= u8::MAX as usize {
            self.buf.put_u8(marker::STRUCT_8);
            self.buf.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buf.put_u8(marker::STRUCT_16);
            self.buf.put_u16(len as u16);
        } else {
            return Err(PackStreamError::ValueTooLarge("structure", len));
        }
        self.buf.put_u8(s.signature);
        for field in &s.fields {
            self.write(field)?;
        }
        Ok(())
    }

    fn write_size_marker(
        &mut self,
        len: usize,
        tiny: u8,
        m8: u8,
        m16: u8,
        m32: u8,
        what: &'static str,
    ) -> Result<(), PackStreamError> {
        if len <= marker::TINY_MAX {
            self.buf.put_u8(tiny + len as u8);
        } else if len <= u8::MAX as usize {
            self.buf.put_u8(m8);
            self.buf.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buf.put_u8(m16);
            self.buf.put_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.buf.put_u8(m32);
            self.buf.put_u32(len as u32);
        } else {
            return Err(PackStreamError::ValueTooLarge(what, len));
        }
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a single value to bytes.
pub fn encode(value: &Value) -> Result<BytesMut, PackStreamError> {
    let mut enc = Encoder::new();
    enc.write(value)?;
    Ok(enc.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(value: &Value) -> Vec<u8> {
        encode(value).unwrap().to_vec()
    }

    #[test]
    fn null_and_bool() {
        assert_eq!(bytes_of(&Value::Null), [0xC0]);
        assert_eq!(bytes_of(&Value::Boolean(true)), [0xC3]);
        assert_eq!(bytes_of(&Value::Boolean(false)), [0xC2]);
    }

    #[test]
    fn tiny_ints_are_one_byte() {
        assert_eq!(bytes_of(&Value::Integer(0)), [0x00]);
        assert_eq!(bytes_of(&Value::Integer(127)), [0x7F]);
        assert_eq!(bytes_of(&Value::Integer(-1)), [0xFF]);
        assert_eq!(bytes_of(&Value::Integer(-16)), [0xF0]);
    }

    #[test]
    fn int_width_boundaries() {
        assert_eq!(bytes_of(&Value::Integer(-17)), [0xC8, 0xEF]);
        assert_eq!(bytes_of(&Value::Integer(-128)), [0xC8, 0x80]);
        assert_eq!(bytes_of(&Value::Integer(128)), [0xC9, 0x00, 0x80]);
        assert_eq!(bytes_of(&Value::Integer(-129)), [0xC9, 0xFF, 0x7F]);
        assert_eq!(bytes_of(&Value::Integer(32767)), [0xC9, 0x7F, 0xFF]);
        assert_eq!(
            bytes_of(&Value::Integer(32768)),
            [0xCA, 0x00, 0x00, 0x80, 0x00]
        );
        assert_eq!(
            bytes_of(&Value::Integer(2_147_483_647)),
            [0xCA, 0x7F, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            bytes_of(&Value::Integer(2_147_483_648)),
            [0xCB, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00]
        );
        assert_eq!(bytes_of(&Value::Integer(i64::MAX))[0], 0xCB);
        assert_eq!(bytes_of(&Value::Integer(i64::MIN))[0], 0xCB);
    }

    #[test]
    fn float_is_big_endian_ieee754() {
        let bytes = bytes_of(&Value::Float(1.0));
        assert_eq!(bytes, [0xC1, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn string_size_classes() {
        assert_eq!(bytes_of(&Value::from("")), [0x80]);

        let b = bytes_of(&Value::from("hello"));
        assert_eq!(b[0], 0x85);
        assert_eq!(&b[1..], b"hello");

        let s15 = "a".repeat(15);
        assert_eq!(bytes_of(&Value::from(s15.as_str()))[0], 0x8F);

        let s16 = "a".repeat(16);
        let b = bytes_of(&Value::from(s16.as_str()));
        assert_eq!(&b[0..2], &[0xD0, 16]);

        let s255 = "a".repeat(255);
        assert_eq!(&bytes_of(&Value::from(s255.as_str()))[0..2], &[0xD0, 255]);

        let s256 = "a".repeat(256);
        assert_eq!(
            &bytes_of(&Value::from(s256.as_str()))[0..3],
            &[0xD1, 0x01, 0x00]
        );

        let s65536 = "a".repeat(65536);
        assert_eq!(
            &bytes_of(&Value::from(s65536.as_str()))[0..5],
            &[0xD2, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn list_size_classes() {
        assert_eq!(bytes_of(&Value::List(vec![])), [0x90]);

        let l3 = Value::List(vec![1.into(), 2.into(), 3.into()]);
        assert_eq!(bytes_of(&l3), [0x93, 1, 2, 3]);

        let l16 = Value::List(vec![Value::Null; 16]);
        assert_eq!(&bytes_of(&l16)[0..2], &[0xD4, 16]);

        let l256 = Value::List(vec![Value::Null; 256]);
        assert_eq!(&bytes_of(&l256)[0..3], &[0xD5, 0x01, 0x00]);
    }

    #[test]
    fn map_size_classes() {
        assert_eq!(bytes_of(&Value::Map(HashMap::new())), [0xA0]);

        let mut m = HashMap::new();
        m.insert("a".to_owned(), Value::Integer(1));
        assert_eq!(bytes_of(&Value::Map(m)), [0xA1, 0x81, b'a', 0x01]);

        let mut m16 = HashMap::new();
        for i in 0..16 {
            m16.insert(format!("k{i:02}"), Value::Integer(i));
        }
        assert_eq!(&bytes_of(&Value::Map(m16))[0..2], &[0xD8, 16]);
    }

    #[test]
    fn bytes_size_classes() {
        assert_eq!(bytes_of(&Value::Bytes(vec![1, 2, 3])), [0xCC, 3, 1, 2, 3]);
        let b256 = Value::Bytes(vec![0; 256]);
        assert_eq!(&bytes_of(&b256)[0..3], &[0xCD, 0x01, 0x00]);
    }

    #[test]
    fn structure_header() {
        let s = Structure::new(0x4E, vec![Value::Integer(1)]);
        assert_eq!(bytes_of(&Value::Structure(s)), [0xB1, 0x4E, 0x01]);
    }

    #[test]
    fn large_structure_uses_sized_header() {
        let s = Structure::new(0x01, vec![Value::Null; 20]);
        let b = bytes_of(&Value::Structure(s));
        assert_eq!(&b[0..3], &[0xDC, 20, 0x01]);
    }
}
