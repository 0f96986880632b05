//! An offline EMV chip-card terminal kernel: BER-TLV codec, APDU transport,
//! card operations, the EMV data model, RSA certificate recovery and
//! Static Data Authentication, and a transaction orchestrator sequencing
//! application discovery through cryptogram generation.
//!
//! `pcsc`, `PinAsker` capture, and `CertificateManager` key storage are the
//! host's to supply; the binary crate (`src/main.rs`) wires up reference
//! implementations of all three.

pub mod apdu;
pub mod ber;
pub mod context;
pub mod crypto;
pub mod dol_builder;
pub mod error;
pub mod model;
pub mod pin_asker;
pub mod rng;
pub mod tlv;

pub use context::{Context, SessionState};
pub use error::KernelError;
