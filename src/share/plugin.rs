//! 自动分享入口 - 把宿主的发布事件路由到分享流水线

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::content_type::{ContentType, PostContentType, PublishEvent};
use super::destination::{Destination, ValidationWarning};
use super::destinations::TelegramDestination;
use super::dispatcher::{DispatchOutcome, ShareDispatcher};
use super::formatter::is_valid_date_format;
use super::transport::{HttpTransport, Transport};
use crate::content::ContentSource;
use crate::settings::{ShareSettings, DEFAULT_HTTP_TIMEOUT_SECS, GENERAL_SCOPE};

/// 自动分享
pub struct AutoShare {
    content_types: Vec<Arc<dyn ContentType>>,
    dispatcher: ShareDispatcher,
}

impl AutoShare {
    pub fn builder(settings: ShareSettings, source: Arc<dyn ContentSource>) -> AutoShareBuilder {
        AutoShareBuilder::new(settings, source)
    }

    /// 内容发布
    pub fn on_publish(&self, content_id: &str) -> DispatchOutcome {
        self.trigger(content_id, PublishEvent::Publish)
    }

    /// 定时发布到期
    pub fn on_scheduled_publish(&self, content_id: &str) -> DispatchOutcome {
        self.trigger(content_id, PublishEvent::ScheduledPublish)
    }

    /// 按宿主 hook 名称路由，未知 hook 返回 None
    pub fn handle_hook(&self, hook: &str, content_id: &str) -> Option<DispatchOutcome> {
        let event = self.content_types.iter().find_map(|ct| {
            ct.hooks()
                .into_iter()
                .find(|(name, _)| *name == hook)
                .map(|(_, event)| event)
        });

        match event {
            Some(event) => Some(self.trigger(content_id, event)),
            None => {
                debug!(hook, "Unknown hook, ignored");
                None
            }
        }
    }

    /// 按顺序尝试已启用的内容类型，使用第一个能构建 payload 的
    pub fn trigger(&self, content_id: &str, event: PublishEvent) -> DispatchOutcome {
        info!(content_id, event = ?event, "Publish event received");

        let mut first_reason: Option<String> = None;
        for content_type in self.content_types.iter().filter(|ct| ct.is_enabled()) {
            match self.dispatcher.dispatch(content_type.as_ref(), content_id) {
                DispatchOutcome::NotShared { reason } => {
                    first_reason.get_or_insert(reason);
                }
                outcome => return outcome,
            }
        }

        DispatchOutcome::not_shared(
            first_reason.unwrap_or_else(|| "content type disabled".to_string()),
        )
    }

    pub fn content_types(&self) -> &[Arc<dyn ContentType>] {
        &self.content_types
    }

    pub fn content_type(&self, id: &str) -> Option<&Arc<dyn ContentType>> {
        self.content_types.iter().find(|ct| ct.id() == id)
    }

    pub fn dispatcher(&self) -> &ShareDispatcher {
        &self.dispatcher
    }

    /// 已启用且已配置的渠道
    pub fn enabled_destinations(&self) -> Vec<Arc<dyn Destination>> {
        self.dispatcher.enabled_destinations()
    }
}

/// 校验某个 scope 的配置（只返回警告）
pub fn validate_scope(
    dispatcher: &ShareDispatcher,
    settings: &ShareSettings,
    scope: &str,
) -> Vec<ValidationWarning> {
    if scope == GENERAL_SCOPE {
        let general = settings.scope(GENERAL_SCOPE);
        return match general.get_str("date_format") {
            Some(format) if !is_valid_date_format(&format) => vec![ValidationWarning::new(
                "invalid_date_format",
                format!("Invalid date format '{}', the default will be used", format),
            )],
            _ => Vec::new(),
        };
    }

    dispatcher
        .destinations()
        .iter()
        .find(|d| d.id() == scope)
        .map(|d| d.validate_settings(&settings.scope(scope)))
        .unwrap_or_default()
}

/// AutoShare 构建器 - 注册内置内容类型和渠道
pub struct AutoShareBuilder {
    settings: ShareSettings,
    source: Arc<dyn ContentSource>,
    transport: Option<Arc<dyn Transport>>,
    content_types: Vec<Arc<dyn ContentType>>,
    destinations: Vec<Arc<dyn Destination>>,
    builtin: bool,
    dry_run: bool,
    parallel: bool,
}

impl AutoShareBuilder {
    pub fn new(settings: ShareSettings, source: Arc<dyn ContentSource>) -> Self {
        Self {
            settings,
            source,
            transport: None,
            content_types: Vec::new(),
            destinations: Vec::new(),
            builtin: true,
            dry_run: false,
            parallel: false,
        }
    }

    /// 设置传输层（默认使用 HttpTransport）
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 额外注册一个渠道（在内置渠道之后）
    pub fn destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }

    /// 额外注册一个内容类型（在内置内容类型之后）
    pub fn content_type(mut self, content_type: Arc<dyn ContentType>) -> Self {
        self.content_types.push(content_type);
        self
    }

    /// 不注册内置的文章类型和 Telegram 渠道
    pub fn without_builtins(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// 设置 dry-run 模式
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 并行发送
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<AutoShare> {
        let mut dispatcher = ShareDispatcher::new()
            .with_dry_run(self.dry_run)
            .with_parallel(self.parallel);
        let mut content_types: Vec<Arc<dyn ContentType>> = Vec::new();

        if self.builtin {
            let transport = match self.transport {
                Some(transport) => transport,
                None => {
                    let timeout = self
                        .settings
                        .scope(GENERAL_SCOPE)
                        .get_u64("http_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS);
                    let timeout = if timeout == 0 { DEFAULT_HTTP_TIMEOUT_SECS } else { timeout };
                    Arc::new(HttpTransport::new(timeout)?)
                }
            };

            let general = self.settings.scope(GENERAL_SCOPE);
            let telegram = TelegramDestination::from_settings(
                &self.settings.scope(super::destinations::TELEGRAM_ID),
                &general,
                transport,
            );
            dispatcher.register_destination(Arc::new(telegram));

            content_types.push(Arc::new(PostContentType::new(
                &self.settings.scope(PostContentType::ID),
                self.source.clone(),
            )));
        }

        for destination in self.destinations {
            dispatcher.register_destination(destination);
        }
        for content_type in self.content_types {
            register_content_type(&mut content_types, content_type);
        }

        info!(
            content_types = content_types.len(),
            destinations = dispatcher.destination_count(),
            dry_run = self.dry_run,
            "Auto share initialized"
        );

        Ok(AutoShare {
            content_types,
            dispatcher,
        })
    }
}

/// id 已存在时替换原内容类型并保留其位置
fn register_content_type(
    content_types: &mut Vec<Arc<dyn ContentType>>,
    content_type: Arc<dyn ContentType>,
) {
    match content_types.iter_mut().find(|ct| ct.id() == content_type.id()) {
        Some(existing) => {
            warn!(content_type = content_type.id(), "Replacing content type with duplicate id");
            *existing = content_type;
        }
        None => content_types.push(content_type),
    }
}
