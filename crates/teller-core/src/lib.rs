pub mod config;
pub mod error;
pub mod media;
pub mod types;

pub use config::TellerConfig;
pub use error::{Result, TellerError};
pub use media::{MediaCache, MediaEntry};
pub use types::{ContextItem, MediaRef, Message, MessageKind, RetrievedContext};
