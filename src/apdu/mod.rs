//! APDU framing, status-word chaining, and the card operations built on top.

pub mod card;
pub mod command;
pub mod transport;

pub use card::{
    generate_ac, get_processing_options, internal_authenticate, pin_block, read_record, select,
    verify_pin, SW_OK,
};
pub use command::Apdu;
pub use transport::{send, Transport};
