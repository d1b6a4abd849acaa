//! Payload 构建模块 - 将内容记录转换为与渠道无关的 ContentPayload
//!
//! Payload 格式：
//! ```json
//! {
//!   "title": "纯文本标题",
//!   "excerpt": "截断后的摘要...",
//!   "url": "https://example.com/hello",
//!   "author": "Alice",
//!   "published_at": "2024-05-01T10:00:00",
//!   "modified_at": "2024-05-01T10:00:00",
//!   "categories": ["News"],
//!   "tags": [],
//!   "image_url": "https://example.com/full.jpg"
//! }
//! ```
//!
//! 扩展字段（由 `PayloadExtension` 添加）平铺在同一层。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::content::text::{decode_entities, strip_shortcodes, trim_words};
use crate::content::{ContentRecord, ContentSource, CATEGORY_TAXONOMY, TAG_TAXONOMY};

/// 默认摘要词数
pub const DEFAULT_EXCERPT_LENGTH: usize = 55;

/// 截断标记
pub const EXCERPT_MORE: &str = "...";

/// 扩展不能覆盖的字段
pub const RESERVED_FIELDS: &[&str] = &[
    "title",
    "excerpt",
    "url",
    "author",
    "published_at",
    "modified_at",
    "categories",
    "tags",
    "image_url",
];

/// 与渠道无关的内容 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub title: String,
    pub excerpt: String,
    pub url: String,
    pub author: String,
    pub published_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// 扩展字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload 扩展点：在分发前追加字段
///
/// 返回的字段会被合并到 `ContentPayload::extra`，保留字段会被忽略。
pub trait PayloadExtension: Send + Sync {
    fn extend(&self, record: &ContentRecord, payload: &ContentPayload) -> Map<String, Value>;
}

impl<F> PayloadExtension for F
where
    F: Fn(&ContentRecord, &ContentPayload) -> Map<String, Value> + Send + Sync,
{
    fn extend(&self, record: &ContentRecord, payload: &ContentPayload) -> Map<String, Value> {
        self(record, payload)
    }
}

/// Payload 构建器
#[derive(Clone)]
pub struct PayloadBuilder {
    excerpt_length: usize,
    extensions: Vec<Arc<dyn PayloadExtension>>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self {
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            extensions: Vec::new(),
        }
    }

    /// 设置摘要词数，0 表示使用默认值
    pub fn with_excerpt_length(mut self, length: usize) -> Self {
        self.excerpt_length = if length == 0 {
            DEFAULT_EXCERPT_LENGTH
        } else {
            length
        };
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn PayloadExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn excerpt_length(&self) -> usize {
        self.excerpt_length
    }

    /// 由内容记录构建 payload（不做资格检查）
    pub fn build(&self, record: &ContentRecord, source: &dyn ContentSource) -> ContentPayload {
        let mut payload = ContentPayload {
            title: decode_entities(&record.title),
            excerpt: decode_entities(&self.excerpt(record)),
            url: record.permalink.clone(),
            author: record.author.clone(),
            published_at: record.created_at,
            modified_at: record.modified_at,
            categories: source.resolve_taxonomy_names(CATEGORY_TAXONOMY, record.categories()),
            tags: source.resolve_taxonomy_names(TAG_TAXONOMY, record.tags()),
            image_url: record
                .featured_image_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            extra: Map::new(),
        };

        for extension in &self.extensions {
            let fields = extension.extend(record, &payload);
            for (key, value) in fields {
                if RESERVED_FIELDS.contains(&key.as_str()) {
                    warn!(
                        content_id = %record.id,
                        field = %key,
                        "Payload extension tried to override a reserved field, ignored"
                    );
                    continue;
                }
                payload.extra.insert(key, value);
            }
        }

        payload
    }

    /// 摘要：优先使用手写摘要，否则从正文截断
    fn excerpt(&self, record: &ContentRecord) -> String {
        match record.explicit_excerpt() {
            Some(excerpt) => excerpt.trim().to_string(),
            None => trim_words(
                &strip_shortcodes(&record.body),
                self.excerpt_length,
                EXCERPT_MORE,
            ),
        }
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
