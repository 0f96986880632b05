//! Certificate recovery chain: scheme key -> issuer key -> (for DDA) ICC
//! key, plus Static Data Authentication. The recovery steps and framing
//! checks follow EMV 4.4 Book 2.

use chrono::NaiveDate;
use sha1::{Digest, Sha1};

use crate::crypto::errors::VerifyError;
use crate::crypto::public_key::PublicKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredKey {
    pub expiry: NaiveDate,
    pub serial_number: [u8; 3],
    pub public_key: PublicKey,
}

/// Recover the issuer public key from the card's certificate, per EMV 4.4
/// Book 2 Annex A. `scheme_public_key` is resolved by the caller via a
/// [`crate::crypto::CertificateManager`]; `exponent` is the issuer exponent
/// as transmitted (tag 9F32), used as-is rather than recovered from the
/// certificate body.
pub fn recover_issuer_public_key(
    scheme_public_key: &PublicKey,
    certificate: &[u8],
    exponent: &[u8],
    remainder: &[u8],
) -> Result<RecoveredKey, VerifyError> {
    let n_s = scheme_public_key.modulus_len();

    if certificate.len() != n_s {
        return Err(VerifyError::CertificateLengthMismatch {
            mod_size: n_s,
            cert_size: certificate.len(),
        });
    }

    let recovered = scheme_public_key
        .decrypt_fixed(certificate, n_s)
        .ok_or(VerifyError::CertificateTooLarge(certificate.len()))?;

    recover_key_from_framed_bytes(&recovered, remainder, exponent, 0x02)
}

/// Recover the ICC public key from the issuer-signed certificate, for DDA.
/// Identical shape to issuer recovery, parameterised over the issuer key
/// instead of a scheme key.
pub fn recover_icc_public_key(
    issuer_key: &PublicKey,
    certificate: &[u8],
    exponent: &[u8],
    remainder: &[u8],
) -> Result<RecoveredKey, VerifyError> {
    let n_i = issuer_key.modulus_len();
    if certificate.len() != n_i {
        return Err(VerifyError::CertificateLengthMismatch {
            mod_size: n_i,
            cert_size: certificate.len(),
        });
    }
    let recovered = issuer_key
        .decrypt_fixed(certificate, n_i)
        .ok_or(VerifyError::CertificateTooLarge(certificate.len()))?;

    recover_key_from_framed_bytes(&recovered, remainder, exponent, 0x04)
}

/// Shared body of issuer/ICC certificate recovery: both produce a
/// `0x6A ... 0xBC`-framed blob whose trailing 21 bytes are a SHA-1 digest
/// proving the leading modulus data, remainder and exponent weren't
/// tampered with.
fn recover_key_from_framed_bytes(
    recovered: &[u8],
    remainder: &[u8],
    exponent: &[u8],
    expected_certificate_format: u8,
) -> Result<RecoveredKey, VerifyError> {
    let len = recovered.len();
    if len < 36 {
        return Err(VerifyError::BadFraming { field: "certificate" });
    }
    if recovered[0] != 0x6A || recovered[1] != expected_certificate_format || recovered[len - 1] != 0xBC
    {
        return Err(VerifyError::BadFraming { field: "certificate" });
    }

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..len - 22]);
    hasher.update(remainder);
    hasher.update(exponent);
    let digest = hasher.finalize();
    if digest.as_slice() != &recovered[len - 21..len - 1] {
        return Err(VerifyError::IssuerHashMismatch);
    }

    let modulus_leading = &recovered[15..len - 21];
    let mut modulus_bytes = modulus_leading.to_vec();
    modulus_bytes.extend_from_slice(remainder);

    let modulus = crate::crypto::public_key::bytes_to_u2048(&modulus_bytes)
        .ok_or(VerifyError::CertificateTooLarge(modulus_bytes.len()))?;
    let exponent_value = crate::crypto::public_key::bytes_to_u2048(exponent)
        .ok_or(VerifyError::CertificateTooLarge(exponent.len()))?;

    let serial_number = [recovered[11], recovered[12], recovered[13]];
    let expiry_month = recovered[9];
    let expiry_year = recovered[10];
    let expiry = NaiveDate::from_ymd_opt(2000 + expiry_year as i32, expiry_month.max(1) as u32, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());

    Ok(RecoveredKey {
        expiry,
        serial_number,
        public_key: PublicKey::new(exponent_value, modulus),
    })
}

/// Verify Signed Static Application Data (tag 93) against the issuer key.
/// `accumulated_sda_data` is the concatenation of every AFL-marked SDA
/// record's bytes; `sda_tag_values` is the concatenation, in list order, of
/// the raw value bytes for each tag named by the Static Data Authentication
/// Tag List (9F4A). Returns the two-byte Data Authentication Code on
/// success.
pub fn verify_sda(
    issuer_key: &PublicKey,
    signed_static_data: &[u8],
    accumulated_sda_data: &[u8],
    sda_tag_values: &[u8],
) -> Result<[u8; 2], VerifyError> {
    let n_i = issuer_key.modulus_len();
    if signed_static_data.len() != n_i {
        return Err(VerifyError::CertificateLengthMismatch {
            mod_size: n_i,
            cert_size: signed_static_data.len(),
        });
    }
    let recovered = issuer_key
        .decrypt_fixed(signed_static_data, n_i)
        .ok_or(VerifyError::CertificateTooLarge(signed_static_data.len()))?;

    let len = recovered.len();
    if len < 23 || recovered[0] != 0x6A || recovered[1] != 0x03 || recovered[len - 1] != 0xBC {
        return Err(VerifyError::BadFraming { field: "signed static application data" });
    }

    let mut hasher = Sha1::new();
    hasher.update(&recovered[1..len - 21]);
    hasher.update(accumulated_sda_data);
    hasher.update(sda_tag_values);
    let digest = hasher.finalize();
    if digest.as_slice() != &recovered[len - 21..len - 1] {
        return Err(VerifyError::SdaHashMismatch);
    }

    Ok([recovered[3], recovered[4]])
}

/// Verify the dynamic signature returned by INTERNAL AUTHENTICATE against
/// the recovered ICC public key. DDA/CDA cryptogram verification is out of
/// scope for this kernel; this always reports `NotImplemented` so callers
/// can set the appropriate TVR bit without mistaking it for a pass.
pub fn verify_dda(_icc_key: &PublicKey, _dynamic_signature: &[u8]) -> Result<(), VerifyError> {
    Err(VerifyError::BadFraming {
        field: "dynamic data authentication is not implemented",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ca_keys::{KeyId, SCHEME_KEYS};
    use crypto_bigint::U2048;

    fn build_framed(body_len: usize, format: u8, leading: &[u8], remainder: &[u8], exponent: &[u8]) -> Vec<u8> {
        let mut recovered = vec![0u8; body_len];
        recovered[0] = 0x6A;
        recovered[1] = format;
        recovered[body_len - 1] = 0xBC;
        recovered[15..15 + leading.len()].copy_from_slice(leading);

        let mut hasher = Sha1::new();
        hasher.update(&recovered[1..body_len - 22]);
        hasher.update(remainder);
        hasher.update(exponent);
        let digest = hasher.finalize();
        recovered[body_len - 21..body_len - 1].copy_from_slice(&digest);
        recovered
    }

    #[test]
    fn unknown_scheme_key_is_absent_from_table() {
        // Resolving an unrecognised RID/index is the caller's job (via
        // `CertificateManager`); this crate only ships the static table
        // lookup that backs the built-in manager.
        assert!(SCHEME_KEYS.get(&KeyId { rid: [0xAA; 5], index: 0xFE }).is_none());
    }

    #[test]
    fn recover_issuer_public_key_rejects_wrong_certificate_length() {
        let scheme_key = SCHEME_KEYS
            .get(&KeyId { rid: [0xA0, 0x00, 0x00, 0x00, 0x04], index: 0x05 })
            .expect("fixture scheme key present");
        let scheme_public_key = PublicKey::new(U2048::from_u32(scheme_key.exponent), scheme_key.modulus);
        let err = recover_issuer_public_key(&scheme_public_key, &[0u8; 4], &[3], &[]).unwrap_err();
        assert!(matches!(err, VerifyError::CertificateLengthMismatch { .. }));
    }

    #[test]
    fn framed_bytes_with_bad_trailer_are_rejected() {
        let mut recovered = vec![0u8; 64];
        recovered[0] = 0x6A;
        recovered[1] = 0x02;
        recovered[63] = 0x00; // wrong trailer, should be 0xBC
        let err = recover_key_from_framed_bytes(&recovered, &[], &[3], 0x02).unwrap_err();
        assert!(matches!(err, VerifyError::BadFraming { .. }));
    }

    #[test]
    fn framed_bytes_with_correct_hash_recover_a_key() {
        // body length 64 implies a modulus-leading segment of 64 - 36 = 28
        // bytes at offset 15, per the recovery formula.
        let leading = vec![0x11u8; 28];
        let remainder = vec![0x22u8; 4];
        let exponent = vec![0x03u8];
        let recovered = build_framed(64, 0x02, &leading, &remainder, &exponent);
        let key = recover_key_from_framed_bytes(&recovered, &remainder, &exponent, 0x02).unwrap();
        assert_eq!(key.public_key.modulus_len(), leading.len() + remainder.len());
    }

    #[test]
    fn sda_rejects_wrong_certificate_length() {
        let modulus = U2048::from_be_hex(&"01".repeat(256));
        let key = PublicKey::new(U2048::from_u32(3), modulus);
        let err = verify_sda(&key, &[0u8; 4], &[], &[]).unwrap_err();
        assert!(matches!(err, VerifyError::CertificateLengthMismatch { .. }));
    }
}
