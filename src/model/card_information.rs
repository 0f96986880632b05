//! The fields assembled by reading every record named in the Application
//! File List, per EMV 4.4 Book 3 section 10.2. Each AFL record's bytes are
//! a flat TLV container at the top level (no enclosing template), so
//! records are decoded independently and merged into one `FieldMap` before
//! binding — later records win on tag clash, matching how a real card lays
//! distinct tags across distinct records.

use crate::tlv::{DecodeError, FieldMap, FieldMapExt, TagList, TlvRecord};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardInformation {
    pub pan: Option<String>,
    pub sequence_number: Option<Vec<u8>>,
    pub expiry_date: Option<String>,
    pub holder_name: Option<String>,
    pub track2: Option<String>,
    pub risk_management_data: Option<Vec<u8>>,
    pub scheme_public_key_index: Option<u8>,
    pub issuer_public_key_certificate: Option<Vec<u8>>,
    pub issuer_public_key_remainder: Option<Vec<u8>>,
    pub issuer_public_key_exponent: Option<Vec<u8>>,
    pub icc_public_key_certificate: Option<Vec<u8>>,
    pub icc_public_key_remainder: Option<Vec<u8>>,
    pub icc_public_key_exponent: Option<Vec<u8>>,
    pub signed_static_application_data: Option<Vec<u8>>,
    pub sda_tags: Option<TagList>,
    pub raw: FieldMap,
}

const CARD_INFORMATION_CLAIMED: &[u16] = &[
    0x5a, 0x5f34, 0x5f24, 0x5f20, 0x57, 0x8c, 0x8f, 0x90, 0x92, 0x9f32, 0x9f46, 0x9f48, 0x9f47,
    0x93, 0x9f4a,
];

impl TlvRecord for CardInformation {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError> {
        let sda_tags = match map.get_bytes(0x9f4a) {
            Some(bytes) => Some(TagList::try_from(bytes)?),
            None => None,
        };
        Ok(CardInformation {
            pan: map.get_hex_string(0x5a),
            sequence_number: map.get_bytes(0x5f34).map(|b| b.to_vec()),
            expiry_date: map.get_hex_string(0x5f24),
            holder_name: map.get_string(0x5f20).transpose()?,
            track2: map.get_hex_string(0x57),
            risk_management_data: map.get_bytes(0x8c).map(|b| b.to_vec()),
            scheme_public_key_index: map.get_bytes(0x8f).and_then(|b| b.first().copied()),
            issuer_public_key_certificate: map.get_bytes(0x90).map(|b| b.to_vec()),
            issuer_public_key_remainder: map.get_bytes(0x92).map(|b| b.to_vec()),
            issuer_public_key_exponent: map.get_bytes(0x9f32).map(|b| b.to_vec()),
            icc_public_key_certificate: map.get_bytes(0x9f46).map(|b| b.to_vec()),
            icc_public_key_remainder: map.get_bytes(0x9f48).map(|b| b.to_vec()),
            icc_public_key_exponent: map.get_bytes(0x9f47).map(|b| b.to_vec()),
            signed_static_application_data: map.get_bytes(0x93).map(|b| b.to_vec()),
            sda_tags,
            raw: map.residual(CARD_INFORMATION_CLAIMED),
        })
    }

    fn marshal(&self) -> FieldMap {
        let mut map = self.raw.clone();
        if let Some(pan) = &self.pan {
            let _ = map.set_hex_string(0x5a, pan);
        }
        if let Some(seq) = &self.sequence_number {
            map.set_bytes(0x5f34, seq.clone());
        }
        if let Some(expiry) = &self.expiry_date {
            let _ = map.set_hex_string(0x5f24, expiry);
        }
        if let Some(name) = &self.holder_name {
            map.set_string(0x5f20, name);
        }
        if let Some(track2) = &self.track2 {
            let _ = map.set_hex_string(0x57, track2);
        }
        if let Some(crm) = &self.risk_management_data {
            map.set_bytes(0x8c, crm.clone());
        }
        if let Some(idx) = self.scheme_public_key_index {
            map.set_bytes(0x8f, vec![idx]);
        }
        if let Some(cert) = &self.issuer_public_key_certificate {
            map.set_bytes(0x90, cert.clone());
        }
        if let Some(rem) = &self.issuer_public_key_remainder {
            map.set_bytes(0x92, rem.clone());
        }
        if let Some(exp) = &self.issuer_public_key_exponent {
            map.set_bytes(0x9f32, exp.clone());
        }
        if let Some(cert) = &self.icc_public_key_certificate {
            map.set_bytes(0x9f46, cert.clone());
        }
        if let Some(rem) = &self.icc_public_key_remainder {
            map.set_bytes(0x9f48, rem.clone());
        }
        if let Some(exp) = &self.icc_public_key_exponent {
            map.set_bytes(0x9f47, exp.clone());
        }
        if let Some(sad) = &self.signed_static_application_data {
            map.set_bytes(0x93, sad.clone());
        }
        if let Some(tags) = &self.sda_tags {
            map.set_bytes(0x9f4a, tags.encode());
        }
        map
    }
}

impl CardInformation {
    /// Merge another record's fields in, later record wins on tag clash —
    /// how successive AFL record reads accumulate into one card picture.
    pub fn merge_record(&mut self, record: &FieldMap) -> Result<(), DecodeError> {
        let mut combined = self.marshal();
        combined.merge_from(record);
        *self = CardInformation::unmarshal(&combined)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::decode;

    #[test]
    fn merges_pan_and_expiry_from_separate_records() {
        let mut info = CardInformation::default();
        let pan_record = decode(&hex::decode("5a084111111111111111").unwrap()).unwrap();
        info.merge_record(&pan_record).unwrap();
        assert_eq!(info.pan.as_deref(), Some("4111111111111111"));

        let expiry_record = decode(&hex::decode("5f24023112").unwrap()).unwrap();
        info.merge_record(&expiry_record).unwrap();
        assert_eq!(info.pan.as_deref(), Some("4111111111111111"));
        assert_eq!(info.expiry_date.as_deref(), Some("3112"));
    }

    #[test]
    fn unmarshal_decodes_sda_tag_list() {
        let raw = hex::decode("9f4a0182").unwrap();
        let map = decode(&raw).unwrap();
        let info = CardInformation::unmarshal(&map).unwrap();
        assert_eq!(info.sda_tags.unwrap().tags, vec![0x82]);
    }
}
