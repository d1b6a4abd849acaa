//! Telegram 渠道 - 通过 Bot API 将内容发送到频道
//!
//! - 有特色图片时调用 `sendPhoto`（图片 + caption）
//! - 否则调用 `sendMessage`（关闭链接预览）
//! - 两种请求都带一个指向原文的 inline 按钮

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use tracing::{error, info};

use crate::settings::{ScopedSettings, DEFAULT_DATE_FORMAT};
use crate::share::destination::{Destination, SendResult, ValidationWarning};
use crate::share::formatter::{MessageFormatter, DEFAULT_TEMPLATE};
use crate::share::payload::ContentPayload;
use crate::share::transport::Transport;

/// 渠道 id（同时是配置 scope）
pub const TELEGRAM_ID: &str = "telegram";

/// Bot API 地址
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// 按钮默认文字
pub const DEFAULT_BUTTON_TEXT: &str = "Read More";

static BOT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+:[A-Za-z0-9_-]+$").expect("Invalid bot token regex"));

static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?[A-Za-z0-9_-]+$").expect("Invalid channel id regex"));

/// 消息解析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
            ParseMode::Html => "HTML",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Markdown" => Some(ParseMode::Markdown),
            "MarkdownV2" => Some(ParseMode::MarkdownV2),
            "HTML" | "Html" | "html" => Some(ParseMode::Html),
            _ => None,
        }
    }
}

/// Bot API 响应
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Telegram 渠道配置快照
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub message_template: String,
    pub parse_mode: ParseMode,
    pub button_text: String,
    pub api_base: String,
    pub date_format: String,
}

impl TelegramConfig {
    /// 从渠道 scope 和 general scope 读取
    pub fn from_settings(settings: &ScopedSettings, general: &ScopedSettings) -> Self {
        Self {
            enabled: settings.get_bool("enabled", false),
            bot_token: settings.get_str("bot_token"),
            channel_id: settings.get_str("channel_id"),
            // 空模板回退到默认模板
            message_template: settings.get_string_or("message_template", DEFAULT_TEMPLATE),
            parse_mode: settings
                .get_str("parse_mode")
                .and_then(|m| ParseMode::parse(&m))
                .unwrap_or(ParseMode::Markdown),
            button_text: settings.get_string_or("button_text", DEFAULT_BUTTON_TEXT),
            api_base: settings
                .get_string_or("api_base", DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            date_format: general.get_string_or("date_format", DEFAULT_DATE_FORMAT),
        }
    }
}

/// Telegram 渠道
pub struct TelegramDestination {
    config: TelegramConfig,
    formatter: MessageFormatter,
    transport: Arc<dyn Transport>,
}

impl TelegramDestination {
    pub fn new(config: TelegramConfig, transport: Arc<dyn Transport>) -> Self {
        let formatter = MessageFormatter::new(config.message_template.clone())
            .with_date_format(config.date_format.clone());
        Self {
            config,
            formatter,
            transport,
        }
    }

    pub fn from_settings(
        settings: &ScopedSettings,
        general: &ScopedSettings,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::new(TelegramConfig::from_settings(settings, general), transport)
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    fn method_url(&self, bot_token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.config.api_base, bot_token, method)
    }

    fn reply_markup(&self, url: &str) -> Value {
        json!({
            "inline_keyboard": [[
                { "text": self.config.button_text, "url": url }
            ]]
        })
    }

    /// 构建请求：返回 (method, body)
    pub fn build_request(&self, payload: &ContentPayload) -> Result<(&'static str, Value)> {
        let channel_id = self
            .config
            .channel_id
            .as_deref()
            .ok_or_else(|| anyhow!("channel_id is not set"))?;
        let message = self.format_message(payload);
        let reply_markup = self.reply_markup(&payload.url);

        let request = match payload.image_url.as_deref() {
            Some(image_url) => (
                "sendPhoto",
                json!({
                    "chat_id": channel_id,
                    "photo": image_url,
                    "caption": message,
                    "parse_mode": self.config.parse_mode.as_str(),
                    "reply_markup": reply_markup,
                }),
            ),
            None => (
                "sendMessage",
                json!({
                    "chat_id": channel_id,
                    "text": message,
                    "parse_mode": self.config.parse_mode.as_str(),
                    "disable_web_page_preview": true,
                    "reply_markup": reply_markup,
                }),
            ),
        };
        Ok(request)
    }

    fn try_send(&self, payload: &ContentPayload) -> Result<()> {
        let bot_token = self
            .config
            .bot_token
            .as_deref()
            .ok_or_else(|| anyhow!("bot_token is not set"))?;
        let (method, body) = self.build_request(payload)?;

        let response = self
            .transport
            .post(&self.method_url(bot_token, method), &body)
            .map_err(|e| anyhow!("Error calling {}: {}", method, e))?;

        let api: ApiResponse = serde_json::from_str(&response.body).map_err(|e| {
            anyhow!(
                "Telegram API returned an unreadable response (HTTP {}): {}",
                response.status,
                e
            )
        })?;

        if !api.ok {
            return Err(anyhow!(
                "Telegram API error on {} ({}): {}",
                method,
                api.error_code.unwrap_or(response.status as i64),
                api.description.unwrap_or_else(|| "unknown error".to_string())
            ));
        }

        info!(
            destination = TELEGRAM_ID,
            method,
            channel = ?self.config.channel_id,
            "Content shared successfully"
        );
        Ok(())
    }
}

impl Destination for TelegramDestination {
    fn id(&self) -> &str {
        TELEGRAM_ID
    }

    fn name(&self) -> &str {
        "Telegram"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn is_configured(&self) -> bool {
        self.is_enabled() && self.config.bot_token.is_some() && self.config.channel_id.is_some()
    }

    fn format_message(&self, payload: &ContentPayload) -> String {
        self.formatter.format(payload)
    }

    fn send(&self, payload: &ContentPayload) -> SendResult {
        if !self.is_configured() {
            error!(destination = TELEGRAM_ID, "Platform not properly configured");
            return SendResult::Failed("not configured".to_string());
        }

        match self.try_send(payload) {
            Ok(()) => SendResult::Sent,
            Err(e) => {
                error!(
                    destination = TELEGRAM_ID,
                    url = %payload.url,
                    error = %e,
                    "Error sharing content"
                );
                SendResult::Failed(e.to_string())
            }
        }
    }

    fn validate_settings(&self, settings: &ScopedSettings) -> Vec<ValidationWarning> {
        validate_telegram_settings(settings)
    }
}

/// 校验 Telegram 配置格式（只校验已填写的字段）
pub fn validate_telegram_settings(settings: &ScopedSettings) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(token) = settings.get_str("bot_token") {
        if !BOT_TOKEN_RE.is_match(&token) {
            warnings.push(ValidationWarning::new(
                "invalid_bot_token",
                "Invalid Telegram Bot Token format",
            ));
        }
    }

    if let Some(channel_id) = settings.get_str("channel_id") {
        if !CHANNEL_ID_RE.is_match(&channel_id) {
            warnings.push(ValidationWarning::new(
                "invalid_channel_id",
                "Invalid Telegram Channel ID format",
            ));
        }
    }

    if let Some(mode) = settings.get_str("parse_mode") {
        if ParseMode::parse(&mode).is_none() {
            warnings.push(ValidationWarning::new(
                "invalid_parse_mode",
                format!("Unknown parse mode '{}', expected Markdown, MarkdownV2 or HTML", mode),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::transport::TransportResponse;
    use chrono::NaiveDateTime;
    use serde_json::Map;
    use std::sync::Mutex;

    /// 记录请求并返回预设响应的 mock 传输
    struct MockTransport {
        requests: Mutex<Vec<(String, Value)>>,
        response: Result<TransportResponse, String>,
    }

    impl MockTransport {
        fn ok() -> Self {
            Self::responding(200, r#"{"ok":true,"result":{}}"#)
        }

        fn responding(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Ok(TransportResponse::new(status, body)),
            }
        }

        fn failing(error: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response: Err(error.to_string()),
            }
        }

        fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn post(&self, url: &str, body: &Value) -> Result<TransportResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            self.response.clone().map_err(|e| anyhow!(e))
        }
    }

    fn settings(pairs: Vec<(&str, Value)>) -> ScopedSettings {
        ScopedSettings::from_pairs(TELEGRAM_ID, pairs)
    }

    fn configured() -> ScopedSettings {
        settings(vec![
            ("enabled", json!(true)),
            ("bot_token", json!("123456:ABC-def_gh")),
            ("channel_id", json!("@mychannel")),
        ])
    }

    fn destination(settings: ScopedSettings, transport: Arc<MockTransport>) -> TelegramDestination {
        TelegramDestination::from_settings(&settings, &ScopedSettings::default(), transport)
    }

    fn payload(image: Option<&str>) -> ContentPayload {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        ContentPayload {
            title: "Hi".to_string(),
            excerpt: "World".to_string(),
            url: "https://example.com/hi".to_string(),
            author: "Alice".to_string(),
            published_at: ts,
            modified_at: ts,
            categories: vec![],
            tags: vec![],
            image_url: image.map(str::to_string),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_is_configured_requires_enabled_token_and_channel() {
        let transport = Arc::new(MockTransport::ok());
        assert!(destination(configured(), transport.clone()).is_configured());

        let disabled = settings(vec![
            ("enabled", json!(false)),
            ("bot_token", json!("1:a")),
            ("channel_id", json!("@c")),
        ]);
        assert!(!destination(disabled, transport.clone()).is_configured());

        let no_channel = settings(vec![
            ("enabled", json!(true)),
            ("bot_token", json!("1:a")),
            ("channel_id", json!("")),
        ]);
        let dest = destination(no_channel, transport);
        assert!(dest.is_enabled());
        assert!(!dest.is_configured());
    }

    #[test]
    fn test_format_message_with_custom_template() {
        let pairs = vec![
            ("enabled", json!(true)),
            ("message_template", json!("*{title}*\n\n{excerpt}")),
        ];
        let dest = destination(settings(pairs), Arc::new(MockTransport::ok()));
        assert_eq!(dest.format_message(&payload(None)), "*Hi*\n\nWorld");
    }

    #[test]
    fn test_empty_template_uses_default() {
        let dest = destination(
            settings(vec![("message_template", json!(""))]),
            Arc::new(MockTransport::ok()),
        );
        assert_eq!(dest.format_message(&payload(None)), "*Hi*\n\nWorld");
    }

    #[test]
    fn test_send_text_message() {
        let transport = Arc::new(MockTransport::ok());
        let dest = destination(configured(), transport.clone());

        assert_eq!(dest.send(&payload(None)), SendResult::Sent);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (url, body) = &requests[0];
        assert_eq!(url, "https://api.telegram.org/bot123456:ABC-def_gh/sendMessage");
        assert_eq!(body["chat_id"], "@mychannel");
        assert_eq!(body["text"], "*Hi*\n\nWorld");
        assert_eq!(body["parse_mode"], "Markdown");
        assert_eq!(body["disable_web_page_preview"], true);
        assert_eq!(
            body["reply_markup"],
            json!({"inline_keyboard": [[{"text": "Read More", "url": "https://example.com/hi"}]]})
        );
    }

    #[test]
    fn test_send_photo_with_caption() {
        let transport = Arc::new(MockTransport::ok());
        let pairs = vec![
            ("enabled", json!(true)),
            ("bot_token", json!("1:token")),
            ("channel_id", json!("-100123")),
            ("parse_mode", json!("HTML")),
            ("button_text", json!("Open")),
            ("api_base", json!("http://localhost:8081/")),
            ("message_template", json!("<b>{title}</b>")),
        ];
        let dest = destination(settings(pairs), transport.clone());

        assert!(dest.send(&payload(Some("https://example.com/full.jpg"))).is_sent());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let (url, body) = &requests[0];
        assert_eq!(url, "http://localhost:8081/bot1:token/sendPhoto");
        assert_eq!(body["photo"], "https://example.com/full.jpg");
        assert_eq!(body["caption"], "<b>Hi</b>");
        assert_eq!(body["parse_mode"], "HTML");
        assert!(body.get("disable_web_page_preview").is_none());
        assert_eq!(body["reply_markup"]["inline_keyboard"][0][0]["text"], "Open");
    }

    #[test]
    fn test_remote_rejection_is_failure() {
        let transport = Arc::new(MockTransport::responding(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        ));
        let dest = destination(configured(), transport);
        match dest.send(&payload(None)) {
            SendResult::Failed(reason) => assert!(reason.contains("chat not found")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_is_failure() {
        let transport = Arc::new(MockTransport::failing("connection refused"));
        let dest = destination(configured(), transport);
        match dest.send(&payload(None)) {
            SendResult::Failed(reason) => assert!(reason.contains("connection refused")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_response_is_failure() {
        let transport = Arc::new(MockTransport::responding(502, "<html>Bad Gateway</html>"));
        let dest = destination(configured(), transport);
        assert!(!dest.send(&payload(None)).is_sent());
    }

    #[test]
    fn test_send_when_not_configured_makes_no_call() {
        let transport = Arc::new(MockTransport::ok());
        let dest = destination(settings(vec![("enabled", json!(true))]), transport.clone());
        assert_eq!(dest.send(&payload(None)), SendResult::Failed("not configured".into()));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_validate_settings() {
        assert!(validate_telegram_settings(&configured()).is_empty());
        assert!(validate_telegram_settings(&settings(vec![])).is_empty());

        let bad = settings(vec![
            ("bot_token", json!("not-a-token")),
            ("channel_id", json!("my channel")),
            ("parse_mode", json!("BBCode")),
        ]);
        let codes: Vec<String> = validate_telegram_settings(&bad)
            .into_iter()
            .map(|w| w.code)
            .collect();
        assert_eq!(
            codes,
            vec!["invalid_bot_token", "invalid_channel_id", "invalid_parse_mode"]
        );
    }

    #[test]
    fn test_numeric_channel_id_is_valid() {
        let s = settings(vec![("channel_id", json!(-1001234567890i64))]);
        assert!(validate_telegram_settings(&s).is_empty());
    }

    #[test]
    fn test_validation_is_ascii_only() {
        // 阿拉伯-印度数字和非 ASCII 字母不是合法的 token / channel
        let s = settings(vec![
            ("bot_token", json!("\u{0661}\u{0662}\u{0663}:abc")),
            ("channel_id", json!("@канал")),
        ]);
        let codes: Vec<String> = validate_telegram_settings(&s)
            .into_iter()
            .map(|w| w.code)
            .collect();
        assert_eq!(codes, vec!["invalid_bot_token", "invalid_channel_id"]);
    }

    #[test]
    fn test_timezone_date_format_does_not_break_send() {
        let transport = Arc::new(MockTransport::ok());
        let pairs = vec![
            ("enabled", json!(true)),
            ("bot_token", json!("1:token")),
            ("channel_id", json!("@chan")),
            ("message_template", json!("{title} {date}")),
        ];
        let general = ScopedSettings::from_pairs("general", [("date_format", json!("%Y %z"))]);
        let dest = TelegramDestination::from_settings(&settings(pairs), &general, transport.clone());

        assert_eq!(dest.send(&payload(None)), SendResult::Sent);
        assert_eq!(transport.requests()[0].1["text"], "Hi May 1, 2024");
    }
}
