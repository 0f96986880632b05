//! Lookup of payment-scheme public keys, abstracted behind a trait so the
//! orchestrator doesn't care whether keys come from disk, an HSM, or a test
//! fixture.

use std::fs;
use std::path::{Path, PathBuf};

use crypto_bigint::U2048;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

use crate::crypto::ca_keys::{KeyId, SCHEME_KEYS};
use crate::crypto::public_key::PublicKey;

/// Resolves a scheme's public key by RID and certificate index (tag 8F).
pub trait CertificateManager {
    fn get_scheme_public_key(&self, rid: &[u8], index: u8) -> anyhow::Result<PublicKey>;
}

/// Resolves scheme keys from the crate's built-in [`SCHEME_KEYS`] table
/// rather than the filesystem. Useful for tests and for hosts that don't
/// want to provision a key directory.
pub struct BuiltinCertificateManager;

impl CertificateManager for BuiltinCertificateManager {
    fn get_scheme_public_key(&self, rid: &[u8], index: u8) -> anyhow::Result<PublicKey> {
        let rid: [u8; 5] = rid
            .try_into()
            .map_err(|_| anyhow::anyhow!("RID must be 5 bytes, got {}", rid.len()))?;
        let key = SCHEME_KEYS
            .get(&KeyId { rid, index })
            .ok_or_else(|| anyhow::anyhow!("unknown scheme key with RID 0x{} and index {index:#04x}", hex::encode(rid)))?;
        Ok(PublicKey::new(U2048::from_u32(key.exponent), key.modulus))
    }
}

/// Reads scheme keys from `<base>/<hex(rid)>/<index>.pem`, PEM-encoded
/// PKIX `SubjectPublicKeyInfo` wrapping an RSA public key.
pub struct FileCertificateManager {
    base_path: PathBuf,
}

impl FileCertificateManager {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        FileCertificateManager {
            base_path: base_path.into(),
        }
    }

    fn key_path(&self, rid: &[u8], index: u8) -> PathBuf {
        self.base_path.join(hex::encode(rid)).join(format!("{index}.pem"))
    }
}

impl CertificateManager for FileCertificateManager {
    fn get_scheme_public_key(&self, rid: &[u8], index: u8) -> anyhow::Result<PublicKey> {
        let path: &Path = &self.key_path(rid, index);
        let pem = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading scheme key {}: {e}", path.display()))?;

        let rsa_key = RsaPublicKey::from_public_key_pem(&pem)
            .map_err(|e| anyhow::anyhow!("parsing scheme key {}: {e}", path.display()))?;

        let exponent = U2048::from_be_slice(&pad_to_256(&rsa_key.e().to_bytes_be()));
        let modulus = U2048::from_be_slice(&pad_to_256(&rsa_key.n().to_bytes_be()));
        Ok(PublicKey::new(exponent, modulus))
    }
}

fn pad_to_256(data: &[u8]) -> [u8; 256] {
    let mut buf = [0u8; 256];
    let start = 256usize.saturating_sub(data.len());
    buf[start..].copy_from_slice(&data[data.len().saturating_sub(256)..]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_path_follows_hex_rid_and_index_layout() {
        let manager = FileCertificateManager::new("/tmp/keys");
        let path = manager.key_path(&[0xA0, 0x00, 0x00, 0x00, 0x04], 5);
        assert_eq!(path, PathBuf::from("/tmp/keys/a000000004/5.pem"));
    }

    #[test]
    fn pad_to_256_right_aligns() {
        let padded = pad_to_256(&[0x01, 0x02]);
        assert_eq!(padded[254], 0x01);
        assert_eq!(padded[255], 0x02);
        assert!(padded[..254].iter().all(|&b| b == 0));
    }

    #[test]
    fn builtin_manager_resolves_known_key() {
        let manager = BuiltinCertificateManager;
        let key = manager
            .get_scheme_public_key(&[0xA0, 0x00, 0x00, 0x00, 0x04], 0x05)
            .unwrap();
        assert!(key.modulus_len() > 0);
    }

    #[test]
    fn builtin_manager_rejects_unknown_key() {
        let manager = BuiltinCertificateManager;
        assert!(manager.get_scheme_public_key(&[0xAA; 5], 0xFE).is_err());
    }
}
