//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.pagebot/config.json`) and environment.
//! Secrets (page access token, verify token, app secret) can be supplied through env vars so
//! the file can be committed without them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messenger page credentials and Send API endpoint.
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// External AI text and image services.
    #[serde(default)]
    pub delegates: DelegatesConfig,

    /// Intent matching and per-sender mode settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Fixed reply strings.
    #[serde(default)]
    pub replies: RepliesConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 5000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Messenger page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerConfig {
    /// Page access token for the Send API. Overridden by PAGE_ACCESS_TOKEN env when set.
    #[serde(default)]
    pub page_access_token: Option<String>,
    /// Token echoed by the webhook verification handshake. Overridden by VERIFY_TOKEN env.
    #[serde(default)]
    pub verify_token: Option<String>,
    /// App secret used to check X-Hub-Signature-256 on webhook POSTs. Overridden by APP_SECRET env.
    /// When unset, POST bodies are accepted without a signature check.
    #[serde(default)]
    pub app_secret: Option<String>,
    /// Send API endpoint.
    #[serde(default = "default_send_api_url")]
    pub send_api_url: String,
}

fn default_send_api_url() -> String {
    "https://graph.facebook.com/v16.0/me/messages".to_string()
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            page_access_token: None,
            verify_token: None,
            app_secret: None,
            send_api_url: default_send_api_url(),
        }
    }
}

/// External AI delegates (text answer service and image generator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatesConfig {
    /// Text service URL; the user text is appended as a query parameter.
    #[serde(default = "default_text_url")]
    pub text_url: String,
    /// Query parameter name carrying the user text.
    #[serde(default = "default_text_query_param")]
    pub text_query_param: String,
    /// Image service URL. Image requests fail (and the user gets an apology) while unset.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_image_aspect_ratio")]
    pub image_aspect_ratio: String,
    #[serde(default = "default_image_style")]
    pub image_style: String,
    /// Per-call timeout in seconds for both delegates (default 12).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_text_url() -> String {
    "https://sii3.top/api/openai.php".to_string()
}

fn default_text_query_param() -> String {
    "gpt-5-mini".to_string()
}

fn default_image_aspect_ratio() -> String {
    "1:1".to_string()
}

fn default_image_style() -> String {
    "realistic".to_string()
}

fn default_timeout_secs() -> u64 {
    12
}

impl Default for DelegatesConfig {
    fn default() -> Self {
        Self {
            text_url: default_text_url(),
            text_query_param: default_text_query_param(),
            image_url: None,
            image_aspect_ratio: default_image_aspect_ratio(),
            image_style: default_image_style(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Intent matching and conversation mode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationConfig {
    /// Quick-reply payload that starts the image flow.
    #[serde(default = "default_image_trigger_payload")]
    pub image_trigger_payload: String,
    /// Seconds after which an unanswered "awaiting image prompt" mode falls back to idle (0 = never).
    #[serde(default = "default_mode_ttl_secs")]
    pub mode_ttl_secs: u64,
    /// Names that identify the developer (matched case-insensitively, with and without spaces).
    #[serde(default = "default_developer_names")]
    pub developer_names: Vec<String>,
    /// "Who made you" style phrasings, matched as case-insensitive substrings.
    #[serde(default = "default_developer_phrases")]
    pub developer_phrases: Vec<String>,
}

fn default_image_trigger_payload() -> String {
    "GENERATE_IMAGE".to_string()
}

fn default_mode_ttl_secs() -> u64 {
    600
}

fn default_developer_names() -> Vec<String> {
    vec!["aymen bourai".to_string()]
}

fn default_developer_phrases() -> Vec<String> {
    [
        "من مطورك",
        "مين مطورك",
        "من طورك",
        "من صنعك",
        "من برمجك",
        "من انشأك",
        "من أنشأك",
        "who made you",
        "who created you",
        "who developed you",
        "who built you",
        "who is your developer",
        "who's your developer",
        "mn matwrk",
        "mn mtwrk",
        "mn sn3k",
        "chkon mtwrk",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            image_trigger_payload: default_image_trigger_payload(),
            mode_ttl_secs: default_mode_ttl_secs(),
            developer_names: default_developer_names(),
            developer_phrases: default_developer_phrases(),
        }
    }
}

/// Fixed reply strings sent by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesConfig {
    #[serde(default = "default_developer_reply")]
    pub developer: String,
    /// Sent for attachments, stickers and unknown quick replies.
    #[serde(default = "default_text_only_reply")]
    pub text_only: String,
    /// Sent when the image flow starts.
    #[serde(default = "default_image_prompt_reply")]
    pub image_prompt: String,
    #[serde(default = "default_image_failed_reply")]
    pub image_failed: String,
    /// Sent when the text delegate answered but nothing usable was left after trimming.
    #[serde(default = "default_no_reply")]
    pub no_reply: String,
    /// Sent when the text delegate failed (network, status, timeout).
    #[serde(default = "default_error_reply")]
    pub error: String,
}

fn default_developer_reply() -> String {
    concat!(
        "نعم aymen bourai هو مطوري. ",
        "شاب مبرمج بعمر 18 سنة، متخصص في تطوير البوتات والحلول السيبرانية، ",
        "يمتلك خبرة قوية في Python وHTML. يعمل بشكل مستقل ويتميز بدقة عالية وقدرة على ابتكار حلول ذكية وسريعة. ",
        "يحب بناء أنظمة فعّالة وأتمتة المهام بابتكار، ويحرص دائمًا على تطوير مهاراته ومواكبة تقنيات البرمجة الحديثة."
    )
    .to_string()
}

fn default_text_only_reply() -> String {
    "أتعامل حاليًا مع الرسائل النصية فقط.".to_string()
}

fn default_image_prompt_reply() -> String {
    "صف لي الصورة التي تريد إنشاءها.".to_string()
}

fn default_image_failed_reply() -> String {
    "عذراً، لم أتمكن من إنشاء الصورة الآن.".to_string()
}

fn default_no_reply() -> String {
    "عذراً، لا أستطيع الحصول على رد مناسب الآن.".to_string()
}

fn default_error_reply() -> String {
    "حدث خطأ أثناء معالجة الطلب.".to_string()
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            developer: default_developer_reply(),
            text_only: default_text_only_reply(),
            image_prompt: default_image_prompt_reply(),
            image_failed: default_image_failed_reply(),
            no_reply: default_no_reply(),
            error: default_error_reply(),
        }
    }
}

/// Env var value, trimmed; None when unset or blank.
fn env_secret(var: &str) -> Option<String> {
    std::env::var(var).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_secret(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the page access token: env PAGE_ACCESS_TOKEN overrides config.
pub fn resolve_page_access_token(config: &Config) -> Option<String> {
    env_secret("PAGE_ACCESS_TOKEN")
        .or_else(|| config_secret(config.messenger.page_access_token.as_ref()))
}

/// Resolve the webhook verify token: env VERIFY_TOKEN overrides config.
pub fn resolve_verify_token(config: &Config) -> Option<String> {
    env_secret("VERIFY_TOKEN").or_else(|| config_secret(config.messenger.verify_token.as_ref()))
}

/// Resolve the app secret used for payload signatures: env APP_SECRET overrides config.
pub fn resolve_app_secret(config: &Config) -> Option<String> {
    env_secret("APP_SECRET").or_else(|| config_secret(config.messenger.app_secret.as_ref()))
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PAGEBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".pagebot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or PAGEBOT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
