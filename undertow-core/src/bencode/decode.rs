//! Bencode decoder.
//!
//! Byte-cursor parser over a borrowed slice. Strict about canonical form:
//! non-minimal integers, zero-padded lengths, and out-of-order dictionary
//! keys are all rejected, so any value that decodes successfully re-encodes
//! to the identical byte sequence.

use std::collections::BTreeMap;

use super::{BencodeError, Value};

/// Decodes exactly one bencode value starting at offset 0.
///
/// Trailing bytes after the value are not an error by themselves; callers
/// that need to know how much input was consumed should use
/// [`decode_prefix`].
///
/// # Errors
///
/// - `BencodeError` - The input is truncated, malformed, or non-canonical
pub fn decode(input: &[u8]) -> Result<Value, BencodeError> {
    decode_prefix(input).map(|(value, _)| value)
}

/// Decodes one bencode value and reports how many bytes it occupied.
///
/// # Errors
///
/// - `BencodeError` - The input is truncated, malformed, or non-canonical
pub fn decode_prefix(input: &[u8]) -> Result<(Value, usize), BencodeError> {
    let mut decoder = Decoder { input, pos: 0 };
    let value = decoder.parse_value()?;
    Ok((value, decoder.pos))
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Decoder<'_> {
    fn peek(&self) -> Result<u8, BencodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::Truncated { offset: self.pos })
    }

    fn bump(&mut self) -> Result<u8, BencodeError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn parse_value(&mut self) -> Result<Value, BencodeError> {
        match self.peek()? {
            b'i' => self.parse_integer(),
            b'l' => self.parse_list(),
            b'd' => self.parse_dictionary(),
            b'0'..=b'9' => self.parse_bytes().map(Value::Bytes),
            byte => Err(BencodeError::UnexpectedByte {
                offset: self.pos,
                byte,
            }),
        }
    }

    /// `i` + optional `-` + digits + `e`. Minimal notation only: no leading
    /// zero except the literal `0`, and no `-0`.
    fn parse_integer(&mut self) -> Result<Value, BencodeError> {
        let start = self.pos;
        self.bump()?; // 'i'

        let negative = if self.peek()? == b'-' {
            self.pos += 1;
            true
        } else {
            false
        };

        let digits_start = self.pos;
        let mut magnitude: i64 = 0;
        while let Ok(byte @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|n| n.checked_add(i64::from(byte - b'0')))
                .ok_or(BencodeError::IntegerOverflow { offset: start })?;
        }

        let digit_count = self.pos - digits_start;
        if digit_count == 0 {
            return Err(BencodeError::InvalidInteger {
                offset: start,
                reason: "no digits",
            });
        }
        if digit_count > 1 && self.input[digits_start] == b'0' {
            return Err(BencodeError::InvalidInteger {
                offset: start,
                reason: "leading zero",
            });
        }
        if negative && magnitude == 0 {
            return Err(BencodeError::InvalidInteger {
                offset: start,
                reason: "negative zero",
            });
        }

        if self.bump()? != b'e' {
            return Err(BencodeError::InvalidInteger {
                offset: start,
                reason: "unterminated integer",
            });
        }

        // Magnitude is accumulated as a non-negative i64, which leaves
        // i64::MIN unrepresentable. That value does not occur in torrents.
        let value = if negative { -magnitude } else { magnitude };
        Ok(Value::Integer(value))
    }

    /// ASCII decimal length + `:` + that many raw bytes.
    fn parse_bytes(&mut self) -> Result<Vec<u8>, BencodeError> {
        let start = self.pos;

        let mut length: usize = 0;
        let mut digit_count = 0usize;
        while let Ok(byte @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            digit_count += 1;
            length = length
                .checked_mul(10)
                .and_then(|n| n.checked_add(usize::from(byte - b'0')))
                .ok_or(BencodeError::InvalidLength { offset: start })?;
        }

        if digit_count == 0 || (digit_count > 1 && self.input[start] == b'0') {
            return Err(BencodeError::InvalidLength { offset: start });
        }
        if self.bump()? != b':' {
            return Err(BencodeError::InvalidLength { offset: start });
        }

        let end = self
            .pos
            .checked_add(length)
            .filter(|&end| end <= self.input.len())
            .ok_or(BencodeError::Truncated {
                offset: self.input.len(),
            })?;
        let bytes = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn parse_list(&mut self) -> Result<Value, BencodeError> {
        self.bump()?; // 'l'
        let mut items = Vec::new();
        loop {
            if self.peek()? == b'e' {
                self.pos += 1;
                return Ok(Value::List(items));
            }
            items.push(self.parse_value()?);
        }
    }

    /// `d` + (key, value) pairs + `e`, keys strictly ascending byte-wise.
    fn parse_dictionary(&mut self) -> Result<Value, BencodeError> {
        self.bump()?; // 'd'
        let mut entries = BTreeMap::new();
        let mut previous_key: Option<Vec<u8>> = None;
        loop {
            if self.peek()? == b'e' {
                self.pos += 1;
                return Ok(Value::Dictionary(entries));
            }

            let key_offset = self.pos;
            if !self.peek()?.is_ascii_digit() {
                return Err(BencodeError::UnexpectedByte {
                    offset: key_offset,
                    byte: self.peek()?,
                });
            }
            let key = self.parse_bytes()?;
            if let Some(previous) = &previous_key
                && key.as_slice() <= previous.as_slice()
            {
                return Err(BencodeError::UnsortedKey { offset: key_offset });
            }

            let value = self.parse_value()?;
            previous_key = Some(key.clone());
            entries.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
        assert_eq!(decode(b"i-7e").unwrap(), Value::Integer(-7));
        assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_decode_integer_rejects_non_minimal_forms() {
        assert!(matches!(
            decode(b"i042e"),
            Err(BencodeError::InvalidInteger { reason: "leading zero", .. })
        ));
        assert!(matches!(
            decode(b"i-0e"),
            Err(BencodeError::InvalidInteger { reason: "negative zero", .. })
        ));
        assert!(matches!(
            decode(b"ie"),
            Err(BencodeError::InvalidInteger { reason: "no digits", .. })
        ));
        assert!(matches!(
            decode(b"i12x"),
            Err(BencodeError::InvalidInteger { reason: "unterminated integer", .. })
        ));
    }

    #[test]
    fn test_decode_integer_overflow() {
        // One past i64::MAX.
        let result = decode(b"i9223372036854775808e");
        assert!(matches!(result, Err(BencodeError::IntegerOverflow { offset: 0 })));
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(decode(b"4:spam").unwrap(), Value::bytes(*b"spam"));
        assert_eq!(decode(b"0:").unwrap(), Value::bytes(*b""));
    }

    #[test]
    fn test_decode_bytes_not_utf8() {
        let value = decode(b"3:\xff\xfe\xfd").unwrap();
        assert_eq!(value.as_bytes(), Some([0xff, 0xfe, 0xfd].as_slice()));
    }

    #[test]
    fn test_decode_bytes_rejects_bad_lengths() {
        assert!(matches!(decode(b"4spam"), Err(BencodeError::InvalidLength { .. })));
        assert!(matches!(decode(b"04:spam"), Err(BencodeError::InvalidLength { .. })));
        assert!(matches!(decode(b"9:abc"), Err(BencodeError::Truncated { .. })));
    }

    #[test]
    fn test_decode_list() {
        let value = decode(b"l4:spami42ee").unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::bytes(*b"spam"), Value::Integer(42)])
        );
    }

    #[test]
    fn test_decode_unterminated_list() {
        assert!(matches!(decode(b"l4:spam"), Err(BencodeError::Truncated { .. })));
    }

    #[test]
    fn test_decode_dictionary() {
        let value = decode(b"d3:bar4:spam3:fooi42ee").unwrap();
        let entries = value.as_dictionary().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[b"bar".as_slice()], Value::bytes(*b"spam"));
        assert_eq!(entries[b"foo".as_slice()], Value::Integer(42));
    }

    #[test]
    fn test_decode_dictionary_rejects_unsorted_keys() {
        // "foo" before "bar" is out of byte order.
        let result = decode(b"d3:fooi42e3:bar4:spame");
        assert!(matches!(result, Err(BencodeError::UnsortedKey { .. })));
    }

    #[test]
    fn test_decode_dictionary_rejects_duplicate_keys() {
        let result = decode(b"d3:fooi1e3:fooi2ee");
        assert!(matches!(result, Err(BencodeError::UnsortedKey { .. })));
    }

    #[test]
    fn test_decode_dictionary_rejects_non_string_key() {
        let result = decode(b"di1ei2ee");
        assert!(matches!(result, Err(BencodeError::UnexpectedByte { .. })));
    }

    #[test]
    fn test_decode_unterminated_dictionary() {
        assert!(matches!(decode(b"d3:fooi42e"), Err(BencodeError::Truncated { .. })));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(decode(b""), Err(BencodeError::Truncated { offset: 0 })));
    }

    #[test]
    fn test_decode_unexpected_leading_byte() {
        assert!(matches!(
            decode(b"x"),
            Err(BencodeError::UnexpectedByte { offset: 0, byte: b'x' })
        ));
    }

    #[test]
    fn test_decode_prefix_reports_consumed_length() {
        let (value, consumed) = decode_prefix(b"i42etrailing").unwrap();
        assert_eq!(value, Value::Integer(42));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_decode_allows_trailing_bytes() {
        // Trailing garbage after a complete value is the caller's concern.
        assert_eq!(decode(b"4:spamxyz").unwrap(), Value::bytes(*b"spam"));
    }

    #[test]
    fn test_decode_nested_structures() {
        let input = b"d4:dictd3:keyi1ee4:listl3:one3:twoee";
        let value = decode(input).unwrap();
        let entries = value.as_dictionary().unwrap();
        let inner = entries[b"dict".as_slice()].as_dictionary().unwrap();
        assert_eq!(inner[b"key".as_slice()], Value::Integer(1));
        let list = entries[b"list".as_slice()].as_list().unwrap();
        assert_eq!(list.len(), 2);
    }
}
