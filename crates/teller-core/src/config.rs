use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Uncased,
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TellerError};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_GRAPH_VERSION: &str = "v20.0";

pub const DEFAULT_PERSONA: &str = "You are a helpful Bank Islami customer service assistant. \
Provide accurate information about banking products and services. \
Keep replies concise and helpful. Reply in the same language as the user.";

/// Flat environment names used by existing deployments, mapped onto config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("AZURE_OPENAI_ENDPOINT", "azure.endpoint"),
    ("AZURE_OPENAI_API_KEY", "azure.api_key"),
    ("AZURE_OPENAI_API_VERSION", "azure.api_version"),
    ("AZURE_GPT_DEPLOYMENT", "completion.deployment"),
    ("AZURE_STT_DEPLOYMENT", "speech.stt_deployment"),
    ("AZURE_TTS_DEPLOYMENT", "speech.tts_deployment"),
    ("AZURE_TTS_VOICE", "speech.voice"),
    ("AZURE_TTS_FORMAT", "speech.format"),
    ("AZURE_STT_LANGUAGE", "speech.language"),
    ("AZURE_SEARCH_ENDPOINT", "search.endpoint"),
    ("AZURE_SEARCH_KEY", "search.api_key"),
    ("AZURE_SEARCH_INDEX", "search.index"),
    ("ACCESS_TOKEN", "whatsapp.access_token"),
    ("PHONE_NUMBER_ID", "whatsapp.phone_number_id"),
    ("VERIFY_TOKEN", "whatsapp.verify_token"),
    ("PUBLIC_BASE_URL", "whatsapp.public_base_url"),
    ("APP_ID", "whatsapp.app_id"),
    ("APP_SECRET", "whatsapp.app_secret"),
    ("RECIPIENT_WAID", "whatsapp.recipient_waid"),
    ("VERSION", "whatsapp.api_version"),
    ("VOICE_CONFIG_PATH", "assistant.voice_config_path"),
];

/// Merged after `LEGACY_ENV` so it wins over `VERSION`.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[("META_API_VERSION", "whatsapp.api_version")];

/// Top-level config (teller.toml + TELLER_* env + legacy flat env names).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TellerConfig {
    pub gateway: GatewayConfig,
    /// Azure OpenAI resource shared by completion, transcription and synthesis.
    pub azure: AzureConfig,
    pub completion: CompletionConfig,
    pub speech: SpeechConfig,
    pub search: SearchConfig,
    pub whatsapp: WhatsAppConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind: String,
    /// Interval of the background media sweep. 0 disables it.
    pub media_sweep_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            media_sweep_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }
}

impl AzureConfig {
    /// Resource endpoint without a trailing slash.
    pub fn endpoint(&self) -> Result<String> {
        require(&self.endpoint, "AZURE_OPENAI_ENDPOINT").map(|e| e.trim_end_matches('/').to_string())
    }

    pub fn api_key(&self) -> Result<String> {
        require(&self.api_key, "AZURE_OPENAI_API_KEY").map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub deployment: Option<String>,
    pub temperature: f64,
    pub top_p: f64,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            deployment: None,
            temperature: 0.3,
            top_p: 0.95,
            timeout_secs: 120,
        }
    }
}

impl CompletionConfig {
    pub fn deployment(&self) -> Result<String> {
        require(&self.deployment, "AZURE_GPT_DEPLOYMENT").map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub stt_deployment: String,
    pub tts_deployment: String,
    pub voice: String,
    /// TTS output format (`mp3`, `opus`, ...).
    pub format: String,
    /// Transcription language hint. `auto` leaves detection to the provider.
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt_deployment: "gpt-4o-mini-transcribe".to_string(),
            tts_deployment: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            format: "mp3".to_string(),
            language: "auto".to_string(),
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub index: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            index: None,
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }
}

impl SearchConfig {
    pub fn endpoint(&self) -> Result<String> {
        require(&self.endpoint, "AZURE_SEARCH_ENDPOINT").map(|e| e.trim_end_matches('/').to_string())
    }

    pub fn api_key(&self) -> Result<String> {
        require(&self.api_key, "AZURE_SEARCH_KEY").map(str::to_string)
    }

    pub fn index(&self) -> Result<String> {
        require(&self.index, "AZURE_SEARCH_INDEX").map(str::to_string)
    }
}

/// WhatsApp Cloud API settings.
///
/// Identifier fields accept numbers as well as strings: figment parses
/// `PHONE_NUMBER_ID=1234` from the environment as an integer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub access_token: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub phone_number_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub verify_token: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub public_base_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub app_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub app_secret: Option<String>,
    /// When set, webhook replies go here instead of the sender.
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_waid: Option<String>,
    pub api_version: String,
    pub graph_base_url: String,
    pub timeout_secs: u64,
    pub media_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            public_base_url: None,
            app_id: None,
            app_secret: None,
            recipient_waid: None,
            api_version: DEFAULT_GRAPH_VERSION.to_string(),
            graph_base_url: "https://graph.facebook.com".to_string(),
            timeout_secs: 30,
            media_timeout_secs: 120,
        }
    }
}

impl WhatsAppConfig {
    /// Versioned Graph API root, e.g. `https://graph.facebook.com/v20.0`.
    pub fn graph_base(&self) -> String {
        format!(
            "{}/{}",
            self.graph_base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    pub fn access_token(&self) -> Result<&str> {
        require(&self.access_token, "ACCESS_TOKEN")
    }

    pub fn phone_number_id(&self) -> Result<&str> {
        require(&self.phone_number_id, "PHONE_NUMBER_ID")
    }

    pub fn app_id(&self) -> Result<&str> {
        require(&self.app_id, "APP_ID")
    }

    pub fn app_secret(&self) -> Result<&str> {
        require(&self.app_secret, "APP_SECRET")
    }

    /// Public URL the platform pulls cached media from.
    pub fn media_url(&self, media_id: &str) -> Result<String> {
        let base = require(&self.public_base_url, "PUBLIC_BASE_URL")?;
        Ok(format!("{}/media/{}", base.trim_end_matches('/'), media_id))
    }

    /// Recipient override for sandboxed test numbers.
    pub fn recipient_override(&self) -> Option<&str> {
        present(&self.recipient_waid)
    }

    /// An unset or blank verify token never matches.
    pub fn verify_token_matches(&self, candidate: &str) -> bool {
        match present(&self.verify_token) {
            Some(expected) => expected == candidate,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// JSON file whose `system_prompt.content` overrides `persona`.
    pub voice_config_path: String,
    /// Route questions through the tool-calling exchange instead of pre-retrieval.
    pub tool_calling: bool,
    pub persona: String,
    pub greetings: Vec<String>,
    pub greeting_reply: String,
    pub refusal: String,
    pub fallback: String,
    pub apology: String,
    pub empty_input: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            voice_config_path: "bankislami_voice_config.json".to_string(),
            tool_calling: false,
            persona: DEFAULT_PERSONA.to_string(),
            greetings: ["hi", "hello", "hey", "salam", "assalamualaikum", "asalamualaikum"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
            greeting_reply:
                "Assalam-o-Alaikum! Welcome to Bank Islami. How can I help you today?".to_string(),
            refusal: "Please ask questions related to Bank Islami. Bank Islami se mutalaq sawal pouchain"
                .to_string(),
            fallback: "Sorry, I could not generate a response.".to_string(),
            apology:
                "I apologize, there was an issue processing your request. Please try again."
                    .to_string(),
            empty_input: "Please provide a message or question.".to_string(),
        }
    }
}

impl TellerConfig {
    /// Load config: defaults ← TOML file ← `TELLER_*` env ← legacy flat env names.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| TellerError::Config(e.to_string()))
    }

    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(TellerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TELLER_").split("__"))
            .merge(legacy_env(LEGACY_ENV))
            .merge(legacy_env(LEGACY_ENV_OVERRIDES))
    }
}

fn legacy_env(table: &'static [(&'static str, &'static str)]) -> Env {
    let names: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(move |key| {
        let target = table
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, target)| *target)
            .unwrap_or("legacy.unmapped");
        Uncased::from(target)
    })
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.teller/teller.toml", home)
}

/// Non-blank value of an optional setting.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| TellerError::missing(name))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Flag(b) => b.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_production_values() {
        let config = TellerConfig::default();
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.azure.api_version, "2024-12-01-preview");
        assert_eq!(config.speech.stt_deployment, "gpt-4o-mini-transcribe");
        assert_eq!(config.speech.tts_deployment, "gpt-4o-mini-tts");
        assert_eq!(config.speech.language, "auto");
        assert_eq!(config.whatsapp.graph_base(), "https://graph.facebook.com/v20.0");
        assert!(!config.assistant.tool_calling);
    }

    #[test]
    fn missing_settings_fail_at_call_time() {
        let config = TellerConfig::default();
        let err = config.azure.endpoint().unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT"));
        assert!(config.whatsapp.media_url("abc").is_err());
        assert!(config.search.index().is_err());
    }

    #[test]
    fn blank_setting_counts_as_missing() {
        let mut config = TellerConfig::default();
        config.whatsapp.access_token = Some("   ".to_string());
        assert!(config.whatsapp.access_token().is_err());
    }

    #[test]
    fn media_url_trims_trailing_slash() {
        let mut config = TellerConfig::default();
        config.whatsapp.public_base_url = Some("https://bot.example.com/".to_string());
        assert_eq!(
            config.whatsapp.media_url("ab12").unwrap(),
            "https://bot.example.com/media/ab12"
        );
    }

    #[test]
    fn verify_token_never_matches_when_unset() {
        let mut config = TellerConfig::default();
        assert!(!config.whatsapp.verify_token_matches(""));
        config.whatsapp.verify_token = Some("s3cret".to_string());
        assert!(config.whatsapp.verify_token_matches("s3cret"));
        assert!(!config.whatsapp.verify_token_matches("wrong"));
    }

    #[test]
    fn toml_file_and_prefixed_env_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "teller.toml",
                r#"
                [gateway]
                port = 9100

                [search]
                index = "bank-docs"
                "#,
            )?;
            jail.set_env("TELLER_COMPLETION__DEPLOYMENT", "gpt-4o");

            let config = TellerConfig::load(Some("teller.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9100);
            assert_eq!(config.gateway.bind, "0.0.0.0");
            assert_eq!(config.search.index.as_deref(), Some("bank-docs"));
            assert_eq!(config.completion.deployment.as_deref(), Some("gpt-4o"));
            Ok(())
        });
    }

    #[test]
    fn legacy_env_names_are_mapped() {
        Jail::expect_with(|jail| {
            jail.set_env("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com/");
            jail.set_env("AZURE_TTS_VOICE", "nova");
            jail.set_env("PHONE_NUMBER_ID", "106540352242922");
            jail.set_env("VERSION", "v19.0");
            jail.set_env("META_API_VERSION", "v21.0");

            let config = TellerConfig::load(Some("missing.toml")).map_err(|e| e.to_string())?;
            assert_eq!(
                config.azure.endpoint().map_err(|e| e.to_string())?,
                "https://res.openai.azure.com"
            );
            assert_eq!(config.speech.voice, "nova");
            assert_eq!(
                config.whatsapp.phone_number_id.as_deref(),
                Some("106540352242922")
            );
            assert_eq!(config.whatsapp.api_version, "v21.0");
            Ok(())
        });
    }
}
