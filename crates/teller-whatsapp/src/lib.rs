pub mod adapter;
pub mod diagnose;
pub mod webhook;

pub use adapter::WhatsAppChannel;
pub use diagnose::Diagnostics;
pub use webhook::{parse_message, verify_subscription, VerifyQuery};
