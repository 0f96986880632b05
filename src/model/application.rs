//! Application discovery and selection records: PSE directory entries
//! (tag-61 `ApplicationTemplate`s) and AID-selected FCI (tag 6F).

use crate::tlv::{DecodeError, Dol, FieldMap, FieldMapExt, TlvRecord};

/// One entry in a Payment System Environment (PSE) directory listing, or
/// equivalently a tag-61 Application Template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInformation {
    pub name: Vec<u8>,
    pub label: String,
    pub priority: Option<u8>,
}

impl ApplicationInformation {
    /// Applications sort ascending by the low nibble of priority; the high
    /// bit (0x80) separately flags "confirmation required", which callers
    /// consult but which doesn't affect ordering.
    pub fn sort_key(&self) -> u8 {
        self.priority.unwrap_or(0) & 0x0F
    }

    pub fn requires_confirmation(&self) -> bool {
        self.priority.unwrap_or(0) & 0x80 != 0
    }
}

impl TlvRecord for ApplicationInformation {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError> {
        let name = map.get_bytes(0x4f).ok_or(DecodeError::NoSuchMember(0x4f))?.to_vec();
        let label = map
            .get_string(0x50)
            .ok_or(DecodeError::NoSuchMember(0x50))??;
        let priority = map.get_bytes(0x87).and_then(|b| b.first().copied());
        Ok(ApplicationInformation { name, label, priority })
    }

    fn marshal(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.set_bytes(0x4f, self.name.clone());
        map.set_string(0x50, &self.label);
        if let Some(priority) = self.priority {
            map.set_bytes(0x87, vec![priority]);
        }
        map
    }
}

/// A hint supplied by the host narrowing application discovery to AIDs with
/// a given prefix, rather than relying on the PSE/PPSE directory alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationHint {
    pub name: Vec<u8>,
    pub partial: bool,
}

/// FCI Proprietary Template (tag A5), nested inside an Application's FCI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProprietaryTemplate {
    pub sfi: Option<u8>,
    pub label: Option<String>,
    pub priority: Option<u8>,
    pub language_preference: Option<String>,
    pub processing_options_dol: Option<Dol>,
    pub discretionary_data: Option<FieldMap>,
    pub raw: FieldMap,
}

const PROPRIETARY_TEMPLATE_CLAIMED: &[u16] = &[0x88, 0x50, 0x87, 0x5f2d, 0x9f38, 0xbf0c];

impl TlvRecord for ProprietaryTemplate {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError> {
        let processing_options_dol = match map.get_bytes(0x9f38) {
            Some(bytes) => Some(Dol::try_from(bytes)?),
            None => None,
        };
        let discretionary_data = match map.get_template(0xbf0c) {
            Some(result) => Some(result?),
            None => None,
        };
        Ok(ProprietaryTemplate {
            sfi: map.get_bytes(0x88).and_then(|b| b.first().copied()),
            label: map.get_string(0x50).transpose()?,
            priority: map.get_bytes(0x87).and_then(|b| b.first().copied()),
            language_preference: map.get_string(0x5f2d).transpose()?,
            processing_options_dol,
            discretionary_data,
            raw: map.residual(PROPRIETARY_TEMPLATE_CLAIMED),
        })
    }

    fn marshal(&self) -> FieldMap {
        let mut map = self.raw.clone();
        if let Some(sfi) = self.sfi {
            map.set_bytes(0x88, vec![sfi]);
        }
        if let Some(label) = &self.label {
            map.set_string(0x50, label);
        }
        if let Some(priority) = self.priority {
            map.set_bytes(0x87, vec![priority]);
        }
        if let Some(lang) = &self.language_preference {
            map.set_string(0x5f2d, lang);
        }
        if let Some(dol) = &self.processing_options_dol {
            map.set_bytes(0x9f38, dol.encode());
        }
        if let Some(disc) = &self.discretionary_data {
            map.set_template(0xbf0c, disc);
        }
        map
    }
}

/// File Control Information returned by SELECT (tag 6F).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Application {
    pub dedicated_file_name: Vec<u8>,
    pub template: ProprietaryTemplate,
}

impl TlvRecord for Application {
    fn unmarshal(map: &FieldMap) -> Result<Self, DecodeError> {
        let dedicated_file_name = map
            .get_bytes(0x84)
            .ok_or(DecodeError::NoSuchMember(0x84))?
            .to_vec();
        let template = match map.get_template(0xa5) {
            Some(result) => ProprietaryTemplate::unmarshal(&result?)?,
            None => ProprietaryTemplate::default(),
        };
        Ok(Application {
            dedicated_file_name,
            template,
        })
    }

    fn marshal(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.set_bytes(0x84, self.dedicated_file_name.clone());
        map.set_template(0xa5, &self.template.marshal());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::decode;

    #[test]
    fn parses_application_template_with_discretionary_data() {
        let raw = hex::decode(
            "4f07a0000000041010500a56697361204465627974870101",
        )
        .unwrap();
        let map = decode(&raw).unwrap();
        let info = ApplicationInformation::unmarshal(&map).unwrap();
        assert_eq!(info.name, hex::decode("a0000000041010").unwrap());
        assert_eq!(info.label, "Visa Debyt");
        assert_eq!(info.priority, Some(1));
        assert_eq!(info.sort_key(), 1);
        assert!(!info.requires_confirmation());
    }

    #[test]
    fn priority_high_bit_requires_confirmation() {
        let mut map = FieldMap::new();
        map.set_bytes(0x4f, vec![0xa0]);
        map.set_string(0x50, "Test");
        map.set_bytes(0x87, vec![0x81]);
        let info = ApplicationInformation::unmarshal(&map).unwrap();
        assert_eq!(info.sort_key(), 1);
        assert!(info.requires_confirmation());
    }

    #[test]
    fn application_round_trips_through_marshal() {
        let app = Application {
            dedicated_file_name: vec![0xa0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10],
            template: ProprietaryTemplate {
                sfi: Some(1),
                label: Some("Visa Credit".to_string()),
                priority: Some(2),
                language_preference: Some("en".to_string()),
                processing_options_dol: Some(Dol::try_from(hex::decode("9f3802").unwrap().as_slice()).unwrap()),
                discretionary_data: None,
                raw: FieldMap::new(),
            },
        };
        let encoded = crate::tlv::encode(&app.marshal());
        let decoded = Application::unmarshal(&decode(&encoded).unwrap()).unwrap();
        assert_eq!(decoded, app);
    }
}
