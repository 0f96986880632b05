//! APDU command framing per ISO/IEC 7816-4, short form only.

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Apdu {
    pub class: u8,
    pub instruction: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    /// Expected response length. 0 means no `Le` at all; this layer never
    /// produces extended-length encodings, so values above 256 are clamped
    /// the same way the card's own truncation to a single `Le` byte would.
    pub expected: u32,
}

impl Apdu {
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(5 + self.data.len());
        raw.extend_from_slice(&[self.class, self.instruction, self.p1, self.p2]);

        let nc = self.data.len();
        if nc > 0 {
            raw.push(nc as u8);
            raw.extend_from_slice(&self.data);
        }

        if self.expected > 0 {
            // 256 truncates to 0x00, which is exactly what a card expects
            // when asked for the maximum short-form response length.
            raw.push(self.expected as u8);
        }

        raw
    }

    pub fn select(name: &[u8], first: bool) -> Apdu {
        Apdu {
            class: 0x00,
            instruction: 0xa4,
            p1: 0x04,
            p2: if first { 0x00 } else { 0x02 },
            data: name.to_vec(),
            expected: 0x100,
        }
    }

    pub fn read_record(sfi: u8, record: u8) -> Apdu {
        Apdu {
            class: 0x00,
            instruction: 0xb2,
            p1: record,
            p2: (sfi << 3) | 0x04,
            data: Vec::new(),
            expected: 0x100,
        }
    }

    /// `pdol_values` is the raw concatenation of PDOL-requested field
    /// values, with no tag of its own yet; this wraps it in the Command
    /// Template (tag 83) the card expects.
    pub fn get_processing_options(pdol_values: Vec<u8>) -> Apdu {
        let mut data = crate::ber::encode_tag(0x83);
        data.extend(crate::ber::encode_length(pdol_values.len() as u64));
        data.extend(pdol_values);
        Apdu {
            class: 0x80,
            instruction: 0xa8,
            p1: 0x00,
            p2: 0x00,
            data,
            expected: 0x100,
        }
    }

    pub fn verify_pin(block: [u8; 8]) -> Apdu {
        Apdu {
            class: 0x00,
            instruction: 0x20,
            p1: 0x00,
            p2: 0x80,
            data: block.to_vec(),
            expected: 0,
        }
    }

    pub fn generate_ac(kind: u8, dol_payload: Vec<u8>) -> Apdu {
        Apdu {
            class: 0x80,
            instruction: 0xae,
            p1: kind,
            p2: 0x00,
            data: dol_payload,
            expected: 0x100,
        }
    }

    pub fn internal_authenticate(ddol_payload: Vec<u8>) -> Apdu {
        Apdu {
            class: 0x00,
            instruction: 0x88,
            p1: 0x00,
            p2: 0x00,
            data: ddol_payload,
            expected: 0x100,
        }
    }

    pub(crate) fn get_response(length: u8) -> Apdu {
        Apdu {
            class: 0x00,
            instruction: 0xc0,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
            expected: length as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_without_data() {
        let apdu = Apdu {
            class: 0x00,
            instruction: 0xb2,
            p1: 0x01,
            p2: 0x0c,
            data: Vec::new(),
            expected: 0x100,
        };
        assert_eq!(apdu.encode(), vec![0x00, 0xb2, 0x01, 0x0c, 0x00]);
    }

    #[test]
    fn encodes_with_data() {
        let apdu = Apdu {
            class: 0x00,
            instruction: 0xa4,
            p1: 0x04,
            p2: 0x00,
            data: vec![0xa0, 0x00, 0x00, 0x00, 0x03],
            expected: 0x100,
        };
        let encoded = apdu.encode();
        assert_eq!(encoded.len(), 5 + 5 + 1);
        assert_eq!(encoded[4], 5);
        assert_eq!(&encoded[5..10], &[0xa0, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(*encoded.last().unwrap(), 0x00);
    }

    #[test]
    fn select_sets_p2_for_next_occurrence() {
        assert_eq!(Apdu::select(b"1PAY.SYS.DDF01", true).p2, 0x00);
        assert_eq!(Apdu::select(b"1PAY.SYS.DDF01", false).p2, 0x02);
    }
}
