//! Data Object Lists: an ordered list of (tag, length) pairs naming the
//! fields a card or terminal wants assembled into a flat byte string, without
//! carrying any values themselves. See EMV 4.4 Book 3 section 5.4.

use std::fmt;

use crate::ber;
use crate::tlv::errors::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DolEntry {
    pub tag: u16,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dol {
    pub entries: Vec<DolEntry>,
}

impl Dol {
    /// The total length of data this list asks to be assembled, in bytes.
    pub fn size(&self) -> usize {
        self.entries.iter().map(|e| e.length).sum()
    }
}

impl TryFrom<&[u8]> for Dol {
    type Error = DecodeError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let (tag, tag_len) = ber::decode_tag(&data[offset..])?;
            offset += tag_len;
            let (length, length_len) = ber::decode_length(&data[offset..])?;
            offset += length_len;
            entries.push(DolEntry {
                tag,
                length: length as usize,
            });
        }
        Ok(Dol { entries })
    }
}

impl Dol {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend(ber::encode_tag(entry.tag));
            out.extend(ber::encode_length(entry.length as u64));
        }
        out
    }
}

impl fmt::Display for Dol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dol [")?;
        for entry in &self.entries {
            writeln!(
                f,
                "    0x{:04x} (\"{}\"), {} bytes",
                entry.tag,
                crate::tlv::elements::tag_name(entry.tag),
                entry.length
            )?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pdol_style_list() {
        let raw = hex::decode("9f3802").unwrap();
        let dol = Dol::try_from(raw.as_slice()).unwrap();
        assert_eq!(
            dol.entries,
            vec![DolEntry {
                tag: 0x9f38,
                length: 2
            }]
        );
        assert_eq!(dol.size(), 2);
    }

    #[test]
    fn parses_multi_entry_cdol() {
        let raw = hex::decode("9f02069f03069f1a0295055f2a029a039c019f3704").unwrap();
        let dol = Dol::try_from(raw.as_slice()).unwrap();
        assert_eq!(dol.entries.len(), 8);
        assert_eq!(dol.size(), 6 + 6 + 2 + 5 + 2 + 3 + 1 + 4);
        assert_eq!(dol.encode(), raw);
    }

    #[test]
    fn empty_dol_is_empty() {
        let dol = Dol::try_from(&[][..]).unwrap();
        assert!(dol.entries.is_empty());
        assert_eq!(dol.size(), 0);
    }
}
