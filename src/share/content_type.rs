//! 内容类型 - 每种内容类型负责判断分享资格并构建 payload

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::eligibility::{check_eligibility, EligibilityRules, Rejection};
use super::payload::{ContentPayload, PayloadBuilder, PayloadExtension, DEFAULT_EXCERPT_LENGTH};
use crate::content::ContentSource;
use crate::settings::ScopedSettings;

/// 触发分享的生命周期事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishEvent {
    /// 直接发布（含草稿 / 待审 -> 发布）
    Publish,
    /// 定时发布到期
    ScheduledPublish,
}

/// 内容类型 trait
pub trait ContentType: Send + Sync {
    /// 内容类型标识（同时是配置 scope）
    fn id(&self) -> &str;

    /// 显示名称
    fn name(&self) -> &str;

    /// 宿主 hook 名称 -> 事件
    fn hooks(&self) -> Vec<(&'static str, PublishEvent)>;

    /// 是否启用该内容类型的分享
    fn is_enabled(&self) -> bool;

    /// 检查资格，返回拒绝原因
    fn check(&self, content_id: &str) -> Result<(), Rejection>;

    /// 是否应该分享（内容不存在时返回 false）
    fn should_share(&self, content_id: &str) -> bool {
        self.check(content_id).is_ok()
    }

    /// 构建 payload，不符合资格时返回拒绝原因（与阻止构建的是同一个快照）
    fn try_build_payload(&self, content_id: &str) -> Result<ContentPayload, Rejection>;

    /// 构建 payload，不符合资格时返回 None
    fn build_payload(&self, content_id: &str) -> Option<ContentPayload> {
        self.try_build_payload(content_id).ok()
    }
}

/// 文章内容类型
pub struct PostContentType {
    enabled: bool,
    rules: EligibilityRules,
    builder: PayloadBuilder,
    source: Arc<dyn ContentSource>,
}

impl PostContentType {
    pub const ID: &'static str = "post";

    pub fn new(settings: &ScopedSettings, source: Arc<dyn ContentSource>) -> Self {
        let excerpt_length =
            settings.get_u64("excerpt_length", DEFAULT_EXCERPT_LENGTH as u64) as usize;
        Self {
            enabled: settings.get_bool("enabled", false),
            rules: EligibilityRules::from_settings(settings),
            builder: PayloadBuilder::new().with_excerpt_length(excerpt_length),
            source,
        }
    }

    /// 注册 payload 扩展
    pub fn with_extension(mut self, extension: Arc<dyn PayloadExtension>) -> Self {
        self.builder = self.builder.with_extension(extension);
        self
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }
}

impl ContentType for PostContentType {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Posts"
    }

    fn hooks(&self) -> Vec<(&'static str, PublishEvent)> {
        vec![
            ("publish_post", PublishEvent::Publish),
            ("future_to_publish", PublishEvent::ScheduledPublish),
            ("pending_to_publish", PublishEvent::Publish),
            ("draft_to_publish", PublishEvent::Publish),
        ]
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, content_id: &str) -> Result<(), Rejection> {
        check_eligibility(&self.rules, self.source.as_ref(), content_id).map(|_| ())
    }

    fn try_build_payload(&self, content_id: &str) -> Result<ContentPayload, Rejection> {
        // 只读取一次记录，资格检查和构建使用同一个快照
        match check_eligibility(&self.rules, self.source.as_ref(), content_id) {
            Ok(record) => Ok(self.builder.build(&record, self.source.as_ref())),
            Err(rejection) => {
                debug!(content_id, reason = %rejection, "Content not eligible for sharing");
                Err(rejection)
            }
        }
    }
}
