//! PackStream marker bytes.
//!
//! Every PackStream value starts with a marker byte. Tiny values (small
//! ints, short strings, small collections) fold their size into the
//! marker itself; everything else is followed by an 8/16/32-bit size.

/// Null marker.
pub const NULL: u8 = 0xC0;

/// 64-bit IEEE 754 float marker.
pub const FLOAT_64: u8 = 0xC1;

/// Boolean markers.
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

/// Sized integer markers.
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

/// Byte array markers.
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

/// String markers. Strings of 0..=15 bytes use `0x80 + len`.
pub const TINY_STRING: u8 = 0x80;
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

/// List markers. Lists of 0..=15 items use `0x90 + len`.
pub const TINY_LIST: u8 = 0x90;
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

/// Map markers. Maps of 0..=15 entries use `0xA0 + len`.
pub const TINY_MAP: u8 = 0xA0;
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

/// Structure markers. Structures of 0..=15 fields use `0xB0 + len`.
pub const TINY_STRUCT: u8 = 0xB0;
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

/// Maximum payload length foldable into a tiny marker.
pub const TINY_MAX: usize = 15;

/// Inclusive tiny-int range. Values in `-16..=127` are a bare byte.
pub const TINY_INT_MIN: i64 = -16;
pub const TINY_INT_MAX: i64 = 127;

/// What a marker byte introduces, with any inline size decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    Null,
    Boolean(bool),
    /// Tiny int carried entirely by the marker byte.
    TinyInt(i64),
    /// Sized int; payload width in bytes.
    Int(usize),
    Float,
    /// Byte array; size-prefix width in bytes.
    Bytes(usize),
    /// String with the length folded into the marker.
    TinyString(usize),
    /// String; size-prefix width in bytes.
    String(usize),
    TinyList(usize),
    List(usize),
    TinyMap(usize),
    Map(usize),
    TinyStruct(usize),
    Struct(usize),
    Unknown,
}

/// Classify a marker byte.
pub fn classify(marker: u8) -> MarkerClass {
    match marker {
        NULL => MarkerClass::Null,
        TRUE => MarkerClass::Boolean(true),
        FALSE => MarkerClass::Boolean(false),
        FLOAT_64 => MarkerClass::Float,
        INT_8 => MarkerClass::Int(1),
        INT_16 => MarkerClass::Int(2),
        INT_32 => MarkerClass::Int(4),
        INT_64 => MarkerClass::Int(8),
        BYTES_8 => MarkerClass::Bytes(1),
        BYTES_16 => MarkerClass::Bytes(2),
        BYTES_32 => MarkerClass::Bytes(4),
        STRING_8 => MarkerClass::String(1),
        STRING_16 => MarkerClass::String(2),
        STRING_32 => MarkerClass::String(4),
        LIST_8 => MarkerClass::List(1),
        LIST_16 => MarkerClass::List(2),
        LIST_32 => MarkerClass::List(4),
        MAP_8 => MarkerClass::Map(1),
        MAP_16 => MarkerClass::Map(2),
        MAP_32 => MarkerClass::Map(4),
        STRUCT_8 => MarkerClass::Struct(1),
        STRUCT_16 => MarkerClass::Struct(2),
        0x80..=0x8F => MarkerClass::TinyString((marker - TINY_STRING) as usize),
        0x90..=0x9F => MarkerClass::TinyList((marker - TINY_LIST) as usize),
        0xA0..=0xAF => MarkerClass::TinyMap((marker - TINY_MAP) as usize),
        0xB0..=0xBF => MarkerClass::TinyStruct((marker - TINY_STRUCT) as usize),
        // Positive tiny ints are 0x00..=0x7F, negative 0xF0..=0xFF.
        0x00..=0x7F => MarkerClass::TinyInt(marker as i64),
        0xF0..=0xFF => MarkerClass::TinyInt(marker as i8 as i64),
        _ => MarkerClass::Unknown,
    }
}

/// Whether `value` fits in a bare tiny-int byte.
#[inline]
pub fn fits_tiny_int(value: i64) -> bool {
    (TINY_INT_MIN..=TINY_INT_MAX).contains(&value)
}
