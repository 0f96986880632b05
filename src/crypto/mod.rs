//! RSA certificate recovery and offline data authentication (SDA, and the
//! ICC-key recovery groundwork for DDA).

pub mod ca_keys;
pub mod cert_manager;
pub mod chain;
pub mod errors;
pub mod public_key;

pub use ca_keys::{KeyData, KeyId, SCHEME_KEYS};
pub use cert_manager::{BuiltinCertificateManager, CertificateManager, FileCertificateManager};
pub use chain::{recover_icc_public_key, recover_issuer_public_key, verify_dda, verify_sda, RecoveredKey};
pub use errors::VerifyError;
pub use public_key::{bytes_to_u2048, PublicKey};
