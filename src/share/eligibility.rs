//! 分享资格过滤 - 判断一条内容是否应该被分享
//!
//! 规则按顺序检查，遇到第一个不满足的规则即返回：
//! 1. 内容存在
//! 2. 内容类型在启用列表中
//! 3. 不是修订版本或自动草稿
//! 4. 正文词数不低于最小词数（配置 > 0 时）
//! 5. 分类目录过滤（排除列表 / 包含列表，空列表表示不过滤）
//! 6. 更新内容仅在开启 `share_updates` 时分享

use serde::Serialize;
use std::collections::HashSet;

use crate::content::{ContentRecord, ContentSource, ContentStatus, CATEGORY_TAXONOMY};
use crate::settings::ScopedSettings;

/// 默认启用的内容类型
pub const DEFAULT_POST_TYPE: &str = "post";

/// 拒绝原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// 内容不存在
    NotFound,
    /// 内容类型未启用
    TypeNotEnabled { content_type: String },
    /// 修订版本
    Revision,
    /// 自动草稿
    AutoDraft,
    /// 词数不足
    TooShort { words: usize, min: usize },
    /// 命中排除分类
    ExcludedCategory { category: String },
    /// 不在包含分类中
    NotInIncludedCategory,
    /// 内容更新但未开启 share_updates
    UpdateNotShared,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotFound => write!(f, "content not found"),
            Rejection::TypeNotEnabled { content_type } => {
                write!(f, "content type '{}' is not enabled", content_type)
            }
            Rejection::Revision => write!(f, "content is a revision"),
            Rejection::AutoDraft => write!(f, "content is an auto-draft"),
            Rejection::TooShort { words, min } => {
                write!(f, "content has {} words, minimum is {}", words, min)
            }
            Rejection::ExcludedCategory { category } => {
                write!(f, "category '{}' is excluded", category)
            }
            Rejection::NotInIncludedCategory => write!(f, "no included category matched"),
            Rejection::UpdateNotShared => write!(f, "content was updated and share_updates is off"),
        }
    }
}

/// 资格规则（从内容类型 scope 读取）
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRules {
    pub post_types: Vec<String>,
    pub min_word_count: usize,
    pub exclude_categories: Vec<String>,
    pub include_categories: Vec<String>,
    pub share_updates: bool,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            post_types: vec![DEFAULT_POST_TYPE.to_string()],
            min_word_count: 0,
            exclude_categories: Vec::new(),
            include_categories: Vec::new(),
            share_updates: false,
        }
    }
}

impl EligibilityRules {
    pub fn from_settings(settings: &ScopedSettings) -> Self {
        Self {
            post_types: settings.get_list_or("post_types", &[DEFAULT_POST_TYPE]),
            min_word_count: settings.get_u64("min_word_count", 0) as usize,
            exclude_categories: settings.get_list("exclude_categories").unwrap_or_default(),
            include_categories: settings.get_list("categories").unwrap_or_default(),
            share_updates: settings.get_bool("share_updates", false),
        }
    }

    /// 检查内容记录，通过返回 Ok(())
    pub fn evaluate(
        &self,
        record: &ContentRecord,
        source: &dyn ContentSource,
    ) -> Result<(), Rejection> {
        if !self.post_types.iter().any(|t| t == &record.content_type) {
            return Err(Rejection::TypeNotEnabled {
                content_type: record.content_type.clone(),
            });
        }

        if record.is_revision() {
            return Err(Rejection::Revision);
        }
        if record.status == ContentStatus::AutoDraft {
            return Err(Rejection::AutoDraft);
        }

        if self.min_word_count > 0 {
            let words = source.word_count(&source.strip_markup(&record.body));
            if words < self.min_word_count {
                return Err(Rejection::TooShort {
                    words,
                    min: self.min_word_count,
                });
            }
        }

        if record.content_type == DEFAULT_POST_TYPE
            || source.supports_taxonomy(&record.content_type, CATEGORY_TAXONOMY)
        {
            self.check_categories(record.categories())?;
        }

        if record.is_update() && !self.share_updates {
            return Err(Rejection::UpdateNotShared);
        }

        Ok(())
    }

    fn check_categories(&self, categories: &[String]) -> Result<(), Rejection> {
        let categories: HashSet<&str> = categories.iter().map(|c| c.as_str()).collect();

        // 空列表表示不限制
        if let Some(hit) = self
            .exclude_categories
            .iter()
            .find(|c| categories.contains(c.as_str()))
        {
            return Err(Rejection::ExcludedCategory {
                category: hit.clone(),
            });
        }

        if !self.include_categories.is_empty()
            && !self
                .include_categories
                .iter()
                .any(|c| categories.contains(c.as_str()))
        {
            return Err(Rejection::NotInIncludedCategory);
        }

        Ok(())
    }
}

/// 按 id 检查资格，包含“内容不存在”的情况
pub fn check_eligibility(
    rules: &EligibilityRules,
    source: &dyn ContentSource,
    content_id: &str,
) -> Result<ContentRecord, Rejection> {
    let record = source.get_record(content_id).ok_or(Rejection::NotFound)?;
    rules.evaluate(&record, source)?;
    Ok(record)
}
