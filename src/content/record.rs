//! 内容记录 - 宿主 CMS 中一条已发布内容的只读视图

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// 分类目录 taxonomy 名称
pub const CATEGORY_TAXONOMY: &str = "category";

/// 标签 taxonomy 名称
pub const TAG_TAXONOMY: &str = "post_tag";

/// 修订版本的内容类型
pub const REVISION_TYPE: &str = "revision";

/// 内容生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    /// 编辑器自动生成的草稿
    AutoDraft,
    /// 修订版本
    #[serde(alias = "revision")]
    Inherit,
    #[serde(other)]
    Unknown,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Publish => "publish",
            ContentStatus::Future => "future",
            ContentStatus::Draft => "draft",
            ContentStatus::Pending => "pending",
            ContentStatus::Private => "private",
            ContentStatus::Trash => "trash",
            ContentStatus::AutoDraft => "auto-draft",
            ContentStatus::Inherit => "inherit",
            ContentStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 内容记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub status: ContentStatus,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// 作者手写的摘要
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
    /// taxonomy 名称 -> term id 列表（保持存储顺序）
    #[serde(default, deserialize_with = "deserialize_terms")]
    pub taxonomy_terms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub author: String,
    pub permalink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
}

impl ContentRecord {
    /// 是否为修订版本
    pub fn is_revision(&self) -> bool {
        self.status == ContentStatus::Inherit || self.content_type == REVISION_TYPE
    }

    /// 是否为更新（而不是首次发布）
    pub fn is_update(&self) -> bool {
        self.modified_at != self.created_at
    }

    /// 有效的手写摘要（空白视为没有）
    pub fn explicit_excerpt(&self) -> Option<&str> {
        self.excerpt.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// 指定 taxonomy 下的 term id
    pub fn terms(&self, taxonomy: &str) -> &[String] {
        self.taxonomy_terms
            .get(taxonomy)
            .map(|t| t.as_slice())
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> &[String] {
        self.terms(CATEGORY_TAXONOMY)
    }

    pub fn tags(&self) -> &[String] {
        self.terms(TAG_TAXONOMY)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

/// id 既可以是字符串也可以是数字
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawId::deserialize(deserializer)?.into())
}

fn deserialize_terms<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<RawId>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(taxonomy, ids)| (taxonomy, ids.into_iter().map(String::from).collect()))
        .collect())
}
