use serde::Serialize;
use serde_json::Value;

use crate::adapter::WhatsAppChannel;

/// Presence report for the WhatsApp settings, served by `GET /whatsapp/diagnose`.
#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub has_access_token: bool,
    pub has_phone_number_id: bool,
    pub has_verify_token: bool,
    pub has_public_base_url: bool,
    pub has_app_id: bool,
    pub has_app_secret: bool,
    pub has_recipient_waid: bool,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_debug: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_debug_error: Option<String>,
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl WhatsAppChannel {
    /// Report which settings are present. With `check_token` the access token
    /// is also inspected through the Graph API; a failure there is reported,
    /// not returned.
    pub async fn diagnose(&self, check_token: bool) -> Diagnostics {
        let config = self.config();
        let mut report = Diagnostics {
            has_access_token: is_set(&config.access_token),
            has_phone_number_id: is_set(&config.phone_number_id),
            has_verify_token: is_set(&config.verify_token),
            has_public_base_url: is_set(&config.public_base_url),
            has_app_id: is_set(&config.app_id),
            has_app_secret: is_set(&config.app_secret),
            has_recipient_waid: is_set(&config.recipient_waid),
            version: config.api_version.clone(),
            token_debug: None,
            token_debug_error: None,
        };

        if check_token {
            match self.debug_access_token().await {
                Ok(info) => report.token_debug = Some(info),
                Err(e) => report.token_debug_error = Some(e.to_string()),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_core::config::WhatsAppConfig;

    #[tokio::test]
    async fn reports_presence_without_network() {
        let channel = WhatsAppChannel::new(WhatsAppConfig {
            access_token: Some("t".into()),
            verify_token: Some("  ".into()),
            ..WhatsAppConfig::default()
        });
        let report = channel.diagnose(false).await;
        assert!(report.has_access_token);
        assert!(!report.has_verify_token);
        assert!(!report.has_phone_number_id);
        assert_eq!(report.version, "v20.0");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("token_debug").is_none());
        assert!(json.get("token_debug_error").is_none());
    }

    #[tokio::test]
    async fn token_check_failure_is_reported_inline() {
        let channel = WhatsAppChannel::new(WhatsAppConfig {
            access_token: Some("t".into()),
            ..WhatsAppConfig::default()
        });
        let report = channel.diagnose(true).await;
        let error = report.token_debug_error.expect("missing app id is reported");
        assert!(error.contains("APP_ID"));
        assert!(report.token_debug.is_none());
    }
}
