// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Byte-level helpers shared by the chain and construction modules.
//!
//! RLP lists are always built through [`rlp_list`] and taken apart through
//! [`RlpReader`], so every wire struct has one explicit field order.

use alloy::hex;
use alloy::rlp::{Decodable, Encodable, Header};

/// Encode `fields` as one RLP list, in the given order.
pub fn rlp_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|f| f.length()).sum();
    let mut out = Vec::with_capacity(payload_length + 9);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

/// Sequential reader over the payload of a single RLP list.
pub struct RlpReader<'a> {
    payload: &'a [u8],
}

impl<'a> RlpReader<'a> {
    /// Open the list in `buf`. The list must span the whole buffer.
    pub fn new(mut buf: &'a [u8]) -> Result<Self, alloy::rlp::Error> {
        let header = Header::decode(&mut buf)?;
        if !header.list {
            return Err(alloy::rlp::Error::UnexpectedString);
        }
        if buf.len() != header.payload_length {
            return Err(alloy::rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: buf.len(),
            });
        }
        Ok(Self { payload: buf })
    }

    pub fn next<T: Decodable>(&mut self) -> Result<T, alloy::rlp::Error> {
        T::decode(&mut self.payload)
    }

    /// Decode a byte-string field, returning `None` when it is empty.
    pub fn next_optional<T: Decodable>(&mut self) -> Result<Option<T>, alloy::rlp::Error> {
        if self.payload.first() == Some(&alloy::rlp::EMPTY_STRING_CODE) {
            self.payload = &self.payload[1..];
            return Ok(None);
        }
        self.next().map(Some)
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Fail unless every field was consumed.
    pub fn finish(self) -> Result<(), alloy::rlp::Error> {
        if self.payload.is_empty() {
            Ok(())
        } else {
            Err(alloy::rlp::Error::Custom("trailing fields in list"))
        }
    }
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode_prefixed(bytes)
}

/// Decode hex with or without a `0x` prefix.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.trim_start_matches("0x"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, U256};

    #[test]
    fn empty_list_is_c0() {
        assert_eq!(rlp_list(&[]), vec![0xc0]);
    }

    #[test]
    fn reader_walks_fields_in_order() {
        let to = Address::repeat_byte(0x11);
        let encoded = rlp_list(&[&5u64, &to, &U256::from(1_000u64), &Bytes::new()]);

        let mut reader = RlpReader::new(&encoded).unwrap();
        assert_eq!(reader.next::<u64>().unwrap(), 5);
        assert_eq!(reader.next_optional::<Address>().unwrap(), Some(to));
        assert_eq!(reader.next::<U256>().unwrap(), U256::from(1_000u64));
        assert_eq!(reader.next::<Bytes>().unwrap(), Bytes::new());
        reader.finish().unwrap();
    }

    #[test]
    fn empty_optional_field_reads_as_none() {
        let encoded = rlp_list(&[&Bytes::new(), &1u64]);
        let mut reader = RlpReader::new(&encoded).unwrap();
        assert_eq!(reader.next_optional::<Address>().unwrap(), None);
        assert_eq!(reader.next::<u64>().unwrap(), 1);
        assert!(reader.is_empty());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut encoded = rlp_list(&[&1u64]);
        encoded.push(0x01);
        assert!(RlpReader::new(&encoded).is_err());
    }

    #[test]
    fn hex_accepts_optional_prefix() {
        assert_eq!(from_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(from_hex("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(to_hex([0x0a, 0x0b]), "0x0a0b");
    }
}
