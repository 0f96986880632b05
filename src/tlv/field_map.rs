//! The TLV store: a flat map from tag to raw value bytes, plus the typed
//! getters/setters that the declarative record binding in §4.2 is built on.
//!
//! A container never holds two entries for the same tag — later occurrences
//! of a tag during decode overwrite earlier ones — and nested ("constructed")
//! templates are stored as their raw encoded bytes under the parent's map,
//! decoded into a child `FieldMap` on demand via [`FieldMapExt::get_template`].

use std::collections::HashMap;

use crate::ber;
use crate::tlv::errors::DecodeError;

/// A TLV container: tag -> raw value bytes.
pub type FieldMap = HashMap<u16, Vec<u8>>;

/// Decode a byte string into a flat `FieldMap`.
///
/// Padding bytes of `0x00` are skipped wherever a tag is expected. A single
/// trailing `0xFF` with nothing left to decode after it is treated the same
/// way: many cards pad APDU response bodies with one filler byte.
pub fn decode(data: &[u8]) -> Result<FieldMap, DecodeError> {
    let mut map = FieldMap::new();
    let mut offset = 0;
    while offset < data.len() {
        if data[offset] == 0x00 {
            offset += 1;
            continue;
        }
        if data[offset] == 0xFF && offset == data.len() - 1 {
            offset += 1;
            break;
        }

        let (tag, tag_len) = ber::decode_tag(&data[offset..])?;
        offset += tag_len;

        let (length, length_len) = ber::decode_length(&data[offset..])?;
        offset += length_len;

        let length = length as usize;
        if data.len() < offset + length {
            return Err(DecodeError::Truncated {
                tag,
                needed: length,
                got: data.len() - offset,
            });
        }

        map.insert(tag, data[offset..offset + length].to_vec());
        offset += length;
    }
    Ok(map)
}

/// Encode a `FieldMap` back to bytes. Entries are emitted in ascending tag
/// order for determinism; receivers must not rely on this ordering.
pub fn encode(map: &FieldMap) -> Vec<u8> {
    let mut tags: Vec<&u16> = map.keys().collect();
    tags.sort_unstable();

    let mut out = Vec::new();
    for tag in tags {
        let value = &map[tag];
        out.extend(ber::encode_tag(*tag));
        out.extend(ber::encode_length(value.len() as u64));
        out.extend_from_slice(value);
    }
    out
}

/// Returns the first of `containers` that holds `tag`, if any.
pub fn pick<'a>(tag: u16, containers: &[&'a FieldMap]) -> Option<&'a FieldMap> {
    containers.iter().copied().find(|c| c.contains_key(&tag))
}

/// Typed accessors implementing the decode/encode rules of §4.2's binding
/// table, plus the primitive get/set operations the generated record
/// implementations are built from.
pub trait FieldMapExt {
    fn get_bytes(&self, tag: u16) -> Option<&[u8]>;
    fn set_bytes(&mut self, tag: u16, value: Vec<u8>);

    fn get_hex_string(&self, tag: u16) -> Option<String>;
    fn set_hex_string(&mut self, tag: u16, value: &str) -> Result<(), DecodeError>;

    fn get_string(&self, tag: u16) -> Option<Result<String, DecodeError>>;
    fn set_string(&mut self, tag: u16, value: &str);

    fn get_uint(&self, tag: u16) -> Option<Result<u64, DecodeError>>;
    fn set_uint(&mut self, tag: u16, value: u64);

    fn get_int(&self, tag: u16) -> Option<Result<i64, DecodeError>>;
    fn set_int(&mut self, tag: u16, value: i64);

    fn get_bool(&self, tag: u16) -> Option<Result<bool, DecodeError>>;
    fn set_bool(&mut self, tag: u16, value: bool);

    fn get_template(&self, tag: u16) -> Option<Result<FieldMap, DecodeError>>;
    fn set_template(&mut self, tag: u16, value: &FieldMap);

    /// Merge every entry of `other` into `self`, overwriting on tag clash.
    /// This is how a record's residual ("other") field gets folded back in
    /// before the named fields overwrite their own tags during marshal.
    fn merge_from(&mut self, other: &FieldMap);

    /// Everything in `self` not claimed by any tag in `claimed`.
    fn residual(&self, claimed: &[u16]) -> FieldMap;
}

impl FieldMapExt for FieldMap {
    fn get_bytes(&self, tag: u16) -> Option<&[u8]> {
        self.get(&tag).map(Vec::as_slice)
    }

    fn set_bytes(&mut self, tag: u16, value: Vec<u8>) {
        self.insert(tag, value);
    }

    fn get_hex_string(&self, tag: u16) -> Option<String> {
        self.get(&tag).map(|v| hex::encode(v))
    }

    fn set_hex_string(&mut self, tag: u16, value: &str) -> Result<(), DecodeError> {
        let bytes = hex::decode(value).map_err(|_| DecodeError::WrongType(tag, "hex string"))?;
        self.insert(tag, bytes);
        Ok(())
    }

    fn get_string(&self, tag: u16) -> Option<Result<String, DecodeError>> {
        self.get(&tag).map(|v| {
            String::from_utf8(v.clone()).map_err(|_| DecodeError::WrongType(tag, "utf-8 string"))
        })
    }

    fn set_string(&mut self, tag: u16, value: &str) {
        self.insert(tag, value.as_bytes().to_vec());
    }

    fn get_uint(&self, tag: u16) -> Option<Result<u64, DecodeError>> {
        self.get(&tag)
            .map(|v| ber::decode_uint(v).map_err(DecodeError::from))
    }

    fn set_uint(&mut self, tag: u16, value: u64) {
        self.insert(tag, ber::encode_uint(value));
    }

    fn get_int(&self, tag: u16) -> Option<Result<i64, DecodeError>> {
        self.get(&tag)
            .map(|v| ber::decode_integer(v).map_err(DecodeError::from))
    }

    fn set_int(&mut self, tag: u16, value: i64) {
        self.insert(tag, ber::encode_integer(value));
    }

    fn get_bool(&self, tag: u16) -> Option<Result<bool, DecodeError>> {
        self.get(&tag)
            .map(|v| ber::decode_uint(v).map(|n| n != 0).map_err(DecodeError::from))
    }

    fn set_bool(&mut self, tag: u16, value: bool) {
        self.insert(tag, vec![if value { 0x01 } else { 0x00 }]);
    }

    fn get_template(&self, tag: u16) -> Option<Result<FieldMap, DecodeError>> {
        self.get(&tag).map(|v| decode(v))
    }

    fn set_template(&mut self, tag: u16, value: &FieldMap) {
        self.insert(tag, encode(value));
    }

    fn merge_from(&mut self, other: &FieldMap) {
        for (k, v) in other {
            self.insert(*k, v.clone());
        }
    }

    fn residual(&self, claimed: &[u16]) -> FieldMap {
        self.iter()
            .filter(|(tag, _)| !claimed.contains(tag))
            .map(|(tag, value)| (*tag, value.clone()))
            .collect()
    }
}

/// A record that can be built from, and flattened back to, a [`FieldMap`].
///
/// Implementations are hand-written per type rather than derived: each
/// `unmarshal` locates its declared tags and stashes everything else in a
/// residual field, and each `marshal` starts from that residual and lets the
/// named fields overwrite their own tags on top of it.
pub trait TlvRecord: Sized {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError>;
    fn marshal(&self) -> FieldMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_vector_from_spec() {
        let raw = hex::decode(
            "9f2701009f360200419f2608c74d18b08248fefc9f10120110201009248400000000000000000029ff",
        )
        .unwrap();

        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.get_bytes(0x9f27), Some(&[0x00][..]));
        assert_eq!(decoded.get_bytes(0x9f36), Some(&[0x00, 0x41][..]));
        assert_eq!(
            decoded.get_bytes(0x9f26),
            Some(&[0xc7, 0x4d, 0x18, 0xb0, 0x82, 0x48, 0xfe, 0xfc][..])
        );
        assert_eq!(decoded.get_bytes(0x9f10).unwrap().len(), 0x12);

        let re_encoded = encode(&decoded);
        let decoded_again = decode(&re_encoded).unwrap();
        assert_eq!(decoded, decoded_again);
    }

    #[test]
    fn tag_zero_padding_is_skipped() {
        // tag 0 byte, then a real tag/length/value pair.
        let raw = [0x00, 0x82, 0x02, 0xAB, 0xCD];
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get_bytes(0x82), Some(&[0xAB, 0xCD][..]));
    }

    #[test]
    fn truncated_value_is_an_error() {
        let raw = [0x82, 0x05, 0xAB];
        let err = decode(&raw).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                tag: 0x82,
                needed: 5,
                got: 1
            }
        );
    }

    #[test]
    fn hex_string_round_trip() {
        let mut map = FieldMap::new();
        map.set_hex_string(0x5A, "4111111111111111").unwrap();
        assert_eq!(map.get_hex_string(0x5A).unwrap(), "4111111111111111");
    }

    #[test]
    fn pick_returns_first_container_with_tag() {
        let mut a = FieldMap::new();
        let mut b = FieldMap::new();
        b.set_bytes(0x95, vec![0; 5]);
        assert!(pick(0x95, &[&a, &b]).is_some());
        a.set_bytes(0x95, vec![1; 5]);
        let found = pick(0x95, &[&a, &b]).unwrap();
        assert_eq!(found.get_bytes(0x95), Some(&[1u8; 5][..]));
    }
}
