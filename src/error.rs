//! The crate-wide error type. Hand-written `Display`/`Error` impls matching
//! the style already used by [`crate::tlv::DecodeError`] and
//! [`crate::crypto::VerifyError`] rather than pulling in `thiserror`; this
//! type exists to unify those layer-specific errors with transport and
//! orchestration failures behind one `?`-composable type.

use std::fmt;

use crate::crypto::VerifyError;
use crate::tlv::DecodeError;

#[derive(Debug)]
pub enum KernelError {
    /// Communication with the reader or card itself failed. Fatal for the
    /// session: there is no protocol-level recovery from a dead transport.
    CardTransport(String),
    /// The card answered with a status word the caller didn't expect.
    CardStatus {
        sw1: u8,
        sw2: u8,
        context: &'static str,
    },
    /// A BER-TLV or higher-level structure failed to parse.
    Malformed(DecodeError),
    /// A cryptographic verification step failed. Not fatal on its own —
    /// callers record this in TVR and continue the transaction.
    AuthFailure(VerifyError),
    /// A tag required for the current operation was absent.
    MissingData(u16),
    /// A supplied PIN wasn't 4 to 12 ASCII digits.
    BadPinLength(usize),
    /// Cardholder verification was attempted and failed.
    CvmFailed,
    /// DDA/CDA dynamic signature verification is not implemented.
    NotImplemented(&'static str),
    /// The orchestrator was driven out of its expected sequence.
    InvalidState(&'static str),
    /// No application matched during directory or AID selection.
    ApplicationNotFound,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::CardTransport(msg) => write!(f, "card transport error: {msg}"),
            KernelError::CardStatus { sw1, sw2, context } => write!(
                f,
                "unexpected status word {sw1:02x}{sw2:02x} during {context}"
            ),
            KernelError::Malformed(e) => write!(f, "malformed data: {e}"),
            KernelError::AuthFailure(e) => write!(f, "authentication failed: {e}"),
            KernelError::MissingData(tag) => write!(f, "required tag 0x{tag:04x} missing"),
            KernelError::BadPinLength(len) => {
                write!(f, "pin length {len} is not between 4 and 12 digits")
            }
            KernelError::CvmFailed => write!(f, "cardholder verification failed"),
            KernelError::NotImplemented(what) => write!(f, "{what} is not implemented"),
            KernelError::InvalidState(what) => write!(f, "invalid state: {what}"),
            KernelError::ApplicationNotFound => write!(f, "no matching application found"),
        }
    }
}

impl std::error::Error for KernelError {}

impl From<DecodeError> for KernelError {
    fn from(e: DecodeError) -> Self {
        KernelError::Malformed(e)
    }
}

impl From<VerifyError> for KernelError {
    fn from(e: VerifyError) -> Self {
        KernelError::AuthFailure(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_card_status_as_hex() {
        let err = KernelError::CardStatus {
            sw1: 0x6a,
            sw2: 0x82,
            context: "SELECT",
        };
        assert_eq!(err.to_string(), "unexpected status word 6a82 during SELECT");
    }
}
