//! Terminal configuration and per-transaction inputs/outputs. These never
//! travel the wire directly; they're inputs to DOL building and outputs of
//! the orchestrator's cryptogram step.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptogramType {
    /// Application Authentication Cryptogram: the transaction is declined offline.
    Aac,
    /// Transaction Certificate: the transaction is approved offline.
    Tc,
    /// Authorisation Request Cryptogram: the transaction must go online.
    Arqc,
}

impl CryptogramType {
    /// Decode the top two bits of Cryptogram Information Data (tag 9F27).
    pub fn from_cid(cid: u8) -> Self {
        match cid >> 6 {
            0b00 => CryptogramType::Aac,
            0b01 => CryptogramType::Tc,
            _ => CryptogramType::Arqc,
        }
    }
}

/// Country/currency/capability configuration the terminal presents to the
/// card, largely echoed back into PDOL/CDOL builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub country_code: [u8; 2],
    pub currency_code: [u8; 2],
    pub currency_exponent: u8,
    pub terminal_type: u8,
    pub capabilities: [u8; 3],
    pub additional_capabilities: [u8; 5],
    pub merchant_category_code: [u8; 2],
}

impl Default for Terminal {
    fn default() -> Self {
        // A generic attended, offline-capable, magstripe-and-chip POS
        // terminal; hosts override whichever fields their deployment needs.
        Terminal {
            country_code: [0x08, 0x40], // 840 = USA
            currency_code: [0x08, 0x40],
            currency_exponent: 2,
            terminal_type: 0x22, // attended, offline with online capability, merchant
            capabilities: [0xE0, 0xE0, 0x00],
            additional_capabilities: [0x00, 0x00, 0x00, 0x00, 0x00],
            merchant_category_code: [0x00, 0x00],
        }
    }
}

/// Alias kept for parity with the distilled spec's naming; `Terminal`
/// carries exactly the fields `ContextConfig` describes.
pub type ContextConfig = Terminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub amount_authorized: u64,
    pub amount_other: u64,
    pub date: [u8; 3],
    pub transaction_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub approved: bool,
    pub should_go_online: bool,
    pub cryptogram_type: CryptogramType,
    pub cryptogram: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cid_top_bits_select_cryptogram_type() {
        assert_eq!(CryptogramType::from_cid(0x00), CryptogramType::Aac);
        assert_eq!(CryptogramType::from_cid(0x40), CryptogramType::Tc);
        assert_eq!(CryptogramType::from_cid(0x80), CryptogramType::Arqc);
        assert_eq!(CryptogramType::from_cid(0xC0), CryptogramType::Arqc);
    }
}
