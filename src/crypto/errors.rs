use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VerifyError {
    UnknownCaKey { rid: [u8; 5], index: u8 },
    CertificateTooLarge(usize),
    /// The recovered modulus doesn't cover the scheme key's full width.
    CertificateLengthMismatch { mod_size: usize, cert_size: usize },
    /// A recovered certificate's leading/trailing framing bytes were wrong.
    BadFraming { field: &'static str },
    IssuerHashMismatch,
    SdaHashMismatch,
    MissingSdaTag(u16),
    UnmatchedPan,
    MissingTag(u16),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::UnknownCaKey { rid, index } => write!(
                f,
                "unknown scheme key with RID 0x{} and index {:#04x}",
                hex::encode(rid),
                index
            ),
            VerifyError::CertificateTooLarge(size) => {
                write!(f, "certificate was {size} bytes, max 248")
            }
            VerifyError::CertificateLengthMismatch {
                mod_size,
                cert_size,
            } => write!(
                f,
                "key is {mod_size} bytes, but recovered certificate data is {cert_size} bytes"
            ),
            VerifyError::BadFraming { field } => {
                write!(f, "recovered {field} has invalid 0x6A/0xBC framing")
            }
            VerifyError::IssuerHashMismatch => {
                write!(f, "issuer public key certificate hash check failed")
            }
            VerifyError::SdaHashMismatch => {
                write!(f, "signed static application data hash check failed")
            }
            VerifyError::MissingSdaTag(tag) => {
                write!(f, "static data authentication tag list named missing tag 0x{tag:04x}")
            }
            VerifyError::UnmatchedPan => write!(f, "PAN on card does not match certificate"),
            VerifyError::MissingTag(tag) => {
                write!(f, "card data missing required tag 0x{tag:04x}")
            }
        }
    }
}

impl std::error::Error for VerifyError {}
