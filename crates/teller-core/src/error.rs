use thiserror::Error;

#[derive(Debug, Error)]
pub enum TellerError {
    /// A required setting was absent when the operation first needed it.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied no usable input.
    #[error("{0}")]
    Validation(String),

    /// Non-success response or transport failure from an external provider.
    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TellerError {
    pub fn missing(setting: &str) -> Self {
        TellerError::Config(format!("missing required setting: {setting}"))
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        TellerError::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Short error code string returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            TellerError::Config(_) => "CONFIG_ERROR",
            TellerError::Validation(_) => "VALIDATION_ERROR",
            TellerError::Upstream { .. } => "UPSTREAM_ERROR",
            TellerError::NotFound(_) => "NOT_FOUND",
            TellerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status a synchronous endpoint reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            TellerError::Config(_) | TellerError::Internal(_) => 500,
            TellerError::Validation(_) => 400,
            TellerError::Upstream { .. } => 502,
            TellerError::NotFound(_) => 404,
        }
    }
}

pub type Result<T> = std::result::Result<T, TellerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_names_the_service() {
        let err = TellerError::upstream("Azure GPT", "quota exceeded");
        assert_eq!(err.to_string(), "Azure GPT error: quota exceeded");
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn missing_setting_is_a_config_error() {
        let err = TellerError::missing("AZURE_SEARCH_KEY");
        assert!(matches!(err, TellerError::Config(_)));
        assert!(err.to_string().contains("AZURE_SEARCH_KEY"));
        assert_eq!(err.status_code(), 500);
    }
}
