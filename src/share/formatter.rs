//! 消息格式化 - 将 payload 代入渠道的消息模板
//!
//! 支持的占位符：`{title}`、`{excerpt}`、`{author}`、`{date}`。
//! 未识别的占位符原样保留；替换只进行一次，替换进来的文本不会被再次展开。

use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;

use super::payload::ContentPayload;
use crate::settings::DEFAULT_DATE_FORMAT;

/// 默认消息模板
pub const DEFAULT_TEMPLATE: &str = "*{title}*\n\n{excerpt}";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(title|excerpt|author|date)\}").expect("Invalid placeholder regex")
});

/// 消息格式化器
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFormatter {
    template: String,
    date_format: String,
}

impl MessageFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// 设置日期格式（chrono strftime），无效格式回退到默认值
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        self.date_format = if is_valid_date_format(&date_format) {
            date_format
        } else {
            DEFAULT_DATE_FORMAT.to_string()
        };
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format(&self, payload: &ContentPayload) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "title" => payload.title.clone(),
                "excerpt" => payload.excerpt.clone(),
                "author" => payload.author.clone(),
                "date" => self.format_date(&payload.published_at),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }

    /// 格式化失败（如 naive 时间没有时区）时回退到默认格式
    fn format_date(&self, ts: &NaiveDateTime) -> String {
        let mut out = String::new();
        if write!(out, "{}", ts.format(&self.date_format)).is_err() {
            out.clear();
            let _ = write!(out, "{}", ts.format(DEFAULT_DATE_FORMAT));
        }
        out
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// 检查 strftime 格式能否用于 naive 时间（`%z` 等时区项在 Display 时会失败）
pub fn is_valid_date_format(date_format: &str) -> bool {
    if date_format.is_empty() {
        return false;
    }
    let mut out = String::new();
    write!(out, "{}", NaiveDateTime::default().format(date_format)).is_ok()
}
