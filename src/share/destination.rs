//! 分享渠道 trait 定义

use serde::{Deserialize, Serialize};

use super::payload::ContentPayload;
use crate::settings::ScopedSettings;

/// 发送结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（渠道未配置 / dry-run）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

impl SendResult {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendResult::Sent)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SendResult::Skipped(_))
    }

    /// 布尔结果：跳过的渠道没有结果
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SendResult::Sent => Some(true),
            SendResult::Failed(_) => Some(false),
            SendResult::Skipped(_) => None,
        }
    }
}

impl std::fmt::Display for SendResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendResult::Sent => write!(f, "sent"),
            SendResult::Skipped(reason) => write!(f, "skipped ({})", reason),
            SendResult::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// 配置校验警告（保存时提示，不阻止保存）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 分享渠道 trait
pub trait Destination: Send + Sync {
    /// 渠道标识（同时是配置 scope）
    fn id(&self) -> &str;

    /// 显示名称（用于日志）
    fn name(&self) -> &str;

    /// 是否启用
    fn is_enabled(&self) -> bool;

    /// 启用且必填配置都不为空
    fn is_configured(&self) -> bool;

    /// 生成渠道消息文本
    fn format_message(&self, payload: &ContentPayload) -> String;

    /// 发送一次，错误在内部记录并转换为 `SendResult::Failed`
    fn send(&self, payload: &ContentPayload) -> SendResult;

    /// 保存配置时的格式校验
    fn validate_settings(&self, _settings: &ScopedSettings) -> Vec<ValidationWarning> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_result_as_bool() {
        assert_eq!(SendResult::Sent.as_bool(), Some(true));
        assert_eq!(SendResult::Failed("x".into()).as_bool(), Some(false));
        assert_eq!(SendResult::Skipped("x".into()).as_bool(), None);
        assert!(SendResult::Skipped("x".into()).is_skipped());
    }

    #[test]
    fn test_send_result_serialization() {
        assert_eq!(
            serde_json::to_value(SendResult::Failed("boom".into())).unwrap(),
            serde_json::json!({"status": "failed", "reason": "boom"})
        );
        assert_eq!(
            serde_json::to_value(SendResult::Sent).unwrap(),
            serde_json::json!({"status": "sent"})
        );
    }
}
