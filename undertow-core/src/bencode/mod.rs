//! Bencode value model and canonical codec.
//!
//! Bencode is the binary serialization format used by `.torrent` files:
//! four primitive shapes (integer, byte string, list, dictionary) with
//! length-prefixed strings and no whitespace. The encoder here always emits
//! the canonical form (ascending byte-wise dictionary keys, minimal integer
//! notation), and the decoder rejects non-canonical input, so decoded values
//! re-encode to the exact bytes they came from. Info-hash stability depends
//! on this.

mod decode;
mod encode;

use std::collections::BTreeMap;

pub use decode::{decode, decode_prefix};
pub use encode::encode;

/// A single decoded bencode value.
///
/// Dictionaries use `BTreeMap` keyed by raw bytes, so ascending key order is
/// structural and the encoder cannot produce a non-canonical dictionary.
/// Byte strings are kept as raw bytes; torrent `pieces` blobs are not valid
/// UTF-8 and must never be forced through `String`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer, `i...e`.
    Integer(i64),
    /// Length-prefixed byte string, `<len>:<bytes>`.
    Bytes(Vec<u8>),
    /// Ordered sequence of values, `l...e`.
    List(Vec<Value>),
    /// Byte-string-keyed mapping, `d...e`, keys strictly ascending.
    Dictionary(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    /// Convenience constructor for a byte-string value.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Returns the integer payload, or `None` for other variants.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the byte-string payload, or `None` for other variants.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the list payload, or `None` for other variants.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the dictionary payload, or `None` for other variants.
    pub fn as_dictionary(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        match self {
            Value::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Errors produced while decoding bencode input.
///
/// Every variant carries the byte offset where decoding stopped, so callers
/// can report the exact position of malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BencodeError {
    /// Input ended before the value was complete.
    #[error("truncated input at offset {offset}")]
    Truncated {
        /// Offset at which more bytes were expected
        offset: usize,
    },

    /// A byte that cannot start or continue any value at this position.
    #[error("unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte {
        /// Offset of the offending byte
        offset: usize,
        /// The byte that was read
        byte: u8,
    },

    /// Malformed integer literal (empty digits, leading zero, `-0`).
    #[error("invalid integer at offset {offset}: {reason}")]
    InvalidInteger {
        /// Offset of the integer literal
        offset: usize,
        /// What the grammar forbids here
        reason: &'static str,
    },

    /// Malformed byte-string length prefix.
    #[error("invalid string length at offset {offset}")]
    InvalidLength {
        /// Offset of the length prefix
        offset: usize,
    },

    /// Integer literal does not fit in the supported 64-bit width.
    #[error("integer overflow at offset {offset}")]
    IntegerOverflow {
        /// Offset of the integer literal
        offset: usize,
    },

    /// Dictionary key not strictly greater than the preceding key.
    ///
    /// Covers both duplicate keys and keys out of byte-wise order; either way
    /// the input is non-canonical and its re-encoding would not reproduce the
    /// original bytes, so it is rejected rather than silently accepted.
    #[error("dictionary key out of order at offset {offset}")]
    UnsortedKey {
        /// Offset of the offending key
        offset: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Integer(7).as_bytes(), None);
        assert_eq!(Value::bytes(*b"abc").as_bytes(), Some(b"abc".as_slice()));
        assert_eq!(Value::List(vec![]).as_list(), Some([].as_slice()));
        assert!(Value::Dictionary(BTreeMap::new()).as_dictionary().is_some());
        assert!(Value::List(vec![]).as_dictionary().is_none());
    }

    #[test]
    fn test_dictionary_keys_iterate_in_byte_order() {
        let mut entries = BTreeMap::new();
        entries.insert(b"zz".to_vec(), Value::Integer(1));
        entries.insert(b"a".to_vec(), Value::Integer(2));
        entries.insert(b"m".to_vec(), Value::Integer(3));

        let keys: Vec<&[u8]> = entries.keys().map(|k| k.as_slice()).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"m".as_slice(), b"zz".as_slice()]);
    }
}
