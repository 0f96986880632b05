//! Response to GET PROCESSING OPTIONS, in either of its two wire shapes:
//! tag 77 (a template, same binding as everywhere else) or tag 80 (a bare
//! byte string: AIP directly followed by the AFL).

use crate::tlv::{afl::ApplicationFileList, DecodeError, FieldMap, FieldMapExt, TlvRecord};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingOptions {
    pub application_interchange_profile: u16,
    pub application_file_list: ApplicationFileList,
    pub raw: FieldMap,
}

const PROCESSING_OPTIONS_CLAIMED: &[u16] = &[0x82, 0x94];

impl ProcessingOptions {
    /// Parse a GET PROCESSING OPTIONS response body, dispatching on whether
    /// it arrived as tag 77 (template) or tag 80 (primitive AIP||AFL).
    pub fn from_response(body: &[u8]) -> Result<Self, DecodeError> {
        let top = crate::tlv::decode(body)?;
        if let Some(template) = top.get_template(0x77) {
            return Self::unmarshal(&template?);
        }
        if let Some(primitive) = top.get_bytes(0x80) {
            return Self::from_primitive(primitive);
        }
        Err(DecodeError::NoSuchMember(0x77))
    }

    fn from_primitive(body: &[u8]) -> Result<Self, DecodeError> {
        if body.len() < 2 {
            return Err(DecodeError::Truncated {
                tag: 0x80,
                needed: 2,
                got: body.len(),
            });
        }
        let aip = u16::from_be_bytes([body[0], body[1]]);
        let afl = ApplicationFileList::try_from(&body[2..])?;
        Ok(ProcessingOptions {
            application_interchange_profile: aip,
            application_file_list: afl,
            raw: FieldMap::new(),
        })
    }
}

impl TlvRecord for ProcessingOptions {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError> {
        let aip = map
            .get_uint(0x82)
            .ok_or(DecodeError::NoSuchMember(0x82))?? as u16;
        let afl_bytes = map.get_bytes(0x94).ok_or(DecodeError::NoSuchMember(0x94))?;
        let application_file_list = ApplicationFileList::try_from(afl_bytes)?;
        Ok(ProcessingOptions {
            application_interchange_profile: aip,
            application_file_list,
            raw: map.residual(PROCESSING_OPTIONS_CLAIMED),
        })
    }

    fn marshal(&self) -> FieldMap {
        let mut map = self.raw.clone();
        map.set_uint(0x82, self.application_interchange_profile as u64);
        map.set_bytes(0x94, self.application_file_list.encode());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive_form() {
        let body = hex::decode("8006398008010100").unwrap();
        let parsed = ProcessingOptions::from_response(&body).unwrap();
        assert_eq!(parsed.application_interchange_profile, 0x3980);
        assert_eq!(parsed.application_file_list.files.len(), 1);
    }

    #[test]
    fn parses_template_form() {
        let body = hex::decode("770a82023980940401010100").unwrap();
        let parsed = ProcessingOptions::from_response(&body).unwrap();
        assert_eq!(parsed.application_interchange_profile, 0x3980);
        assert_eq!(parsed.application_file_list.files.len(), 1);
    }

    #[test]
    fn rejects_missing_tag() {
        let body = hex::decode("6f020500").unwrap();
        assert!(ProcessingOptions::from_response(&body).is_err());
    }
}
