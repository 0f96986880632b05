//! EMV data model: application discovery/selection, processing options,
//! assembled card data, and terminal/transaction context.

pub mod application;
pub mod card_information;
pub mod consts;
pub mod processing_options;
pub mod terminal;

pub use application::{Application, ApplicationHint, ApplicationInformation, ProprietaryTemplate};
pub use card_information::CardInformation;
pub use processing_options::ProcessingOptions;
pub use terminal::{ContextConfig, CryptogramType, Terminal, Transaction, TransactionResult};
