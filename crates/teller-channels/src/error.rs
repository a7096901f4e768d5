use thiserror::Error;

use teller_core::TellerError;

/// Errors that can occur within any channel adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The platform answered with a non-success status. `body` is its raw error text.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Media metadata was returned without a download URL.
    #[error("Media error: {0}")]
    Media(String),

    /// The channel-specific configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ChannelError> for TellerError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::ConfigError(msg) => TellerError::Config(msg),
            other => TellerError::upstream("Messaging", other.to_string()),
        }
    }
}

impl From<TellerError> for ChannelError {
    fn from(err: TellerError) -> Self {
        match err {
            TellerError::Config(msg) => ChannelError::ConfigError(msg),
            other => ChannelError::Transport(other.to_string()),
        }
    }
}
