use std::fmt;

use crate::ber::BerError;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    Ber(BerError),
    /// The buffer ended mid-value.
    Truncated { tag: u16, needed: usize, got: usize },
    /// A byte outside the allowed character set for the target string type.
    UnsupportedChar(StringType, u8),
    /// A BCD nibble wasn't a decimal digit (or, mid-string, the 0xF filler).
    BadBcd(u8),
    /// An Application File List wasn't a multiple of 4 bytes.
    MalformedAfl(usize),
    /// A record was requested by path but some path segment wasn't present.
    NoSuchMember(u16),
    /// A path segment existed but held the wrong kind of value.
    WrongType(u16, &'static str),
    /// A path of zero tags was given to `get_path`.
    NoPathRequested,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StringType {
    Alphabetic,
    Alphanumeric,
    AlphanumericSpecial,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Ber(e) => write!(f, "{e}"),
            DecodeError::Truncated { tag, needed, got } => write!(
                f,
                "value for tag 0x{tag:04x} truncated: needed {needed} bytes, got {got}"
            ),
            DecodeError::UnsupportedChar(kind, ch) => {
                write!(f, "unsupported character 0x{ch:02x} in {kind:?} string")
            }
            DecodeError::BadBcd(b) => write!(f, "bad BCD nibble 0x{b:1x}"),
            DecodeError::MalformedAfl(len) => {
                write!(f, "application file list length {len} is not a multiple of 4")
            }
            DecodeError::NoSuchMember(tag) => write!(f, "no member with tag 0x{tag:04x}"),
            DecodeError::WrongType(tag, wanted) => {
                write!(f, "tag 0x{tag:04x} is not a {wanted}")
            }
            DecodeError::NoPathRequested => write!(f, "empty path requested"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<BerError> for DecodeError {
    fn from(e: BerError) -> Self {
        DecodeError::Ber(e)
    }
}
