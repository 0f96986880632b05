//! RSA public-key operations over a fixed 2048-bit width, built on
//! `crypto-bigint`'s const-generic integers.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Encoding, U2048};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub exponent: U2048,
    pub modulus: U2048,
}

impl PublicKey {
    pub fn new(exponent: U2048, modulus: U2048) -> Self {
        PublicKey { exponent, modulus }
    }

    /// `data ^ exponent mod modulus`, returned as the minimal-width,
    /// left-zero-padded byte string of the full modulus width. Callers that
    /// need to strip EMV's own recovery framing do so on these bytes
    /// themselves; no padding scheme is interpreted here.
    pub fn decrypt(&self, data: &U2048) -> U2048 {
        let params = DynResidueParams::new(&self.modulus);
        let base = DynResidue::new(data, params);
        base.pow(&self.exponent).retrieve()
    }

    /// Width of the modulus in bytes, ignoring leading zero bytes — the
    /// conventional RSA modulus size used to size recovered certificates.
    pub fn modulus_len(&self) -> usize {
        let bytes = self.modulus.to_be_bytes();
        bytes.iter().position(|&b| b != 0).map_or(0, |i| bytes.len() - i)
    }

    /// Decrypt `data` and return exactly `width` bytes (the trailing bytes
    /// of the full 2048-bit result), the shape EMV certificate recovery
    /// always consumes: a certificate the size of this key's own modulus.
    pub fn decrypt_fixed(&self, data: &[u8], width: usize) -> Option<Vec<u8>> {
        let input = bytes_to_u2048(data)?;
        let result = self.decrypt(&input).to_be_bytes();
        if width > result.len() {
            return None;
        }
        Some(result[result.len() - width..].to_vec())
    }
}

/// Interpret a big-endian byte string, right-aligned into the fixed 2048-bit
/// width, as a `U2048`.
pub fn bytes_to_u2048(data: &[u8]) -> Option<U2048> {
    if data.len() > 256 {
        return None;
    }
    let mut buf = [0u8; 256];
    buf[256 - data.len()..].copy_from_slice(data);
    Some(U2048::from_be_slice(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_is_identity_for_exponent_one() {
        let modulus = U2048::from_be_hex(&"FF".repeat(256));
        let key = PublicKey::new(U2048::from_u8(1), modulus);
        let data = bytes_to_u2048(&[0x42]).unwrap();
        assert_eq!(key.decrypt(&data), data);
    }

    #[test]
    fn bytes_to_u2048_rejects_oversized_input() {
        assert!(bytes_to_u2048(&[0u8; 257]).is_none());
    }
}
