use teller_core::TellerError;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("{service} request failed: {message}")]
    Http {
        service: &'static str,
        message: String,
    },

    #[error("{service} error: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} returned an unreadable response: {message}")]
    Parse {
        service: &'static str,
        message: String,
    },

    #[error(transparent)]
    Config(#[from] TellerError),
}

impl From<SpeechError> for TellerError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Config(inner) => inner,
            SpeechError::Api {
                service, message, ..
            }
            | SpeechError::Http { service, message }
            | SpeechError::Parse { service, message } => TellerError::upstream(service, message),
        }
    }
}
