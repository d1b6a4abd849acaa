//! 内容源 - 宿主 CMS 对分享核心暴露的只读接口

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use super::record::{deserialize_id, ContentRecord, CATEGORY_TAXONOMY};
use super::text;

/// 内容源 trait
pub trait ContentSource: Send + Sync {
    /// 按 id 读取内容，不存在时返回 None
    fn get_record(&self, id: &str) -> Option<ContentRecord>;

    /// 将 term id 解析为显示名称，顺序与传入 id 一致，未知 id 被跳过
    fn resolve_taxonomy_names(&self, taxonomy: &str, ids: &[String]) -> Vec<String>;

    /// 内容类型是否挂载了指定 taxonomy
    fn supports_taxonomy(&self, content_type: &str, taxonomy: &str) -> bool;

    fn strip_markup(&self, text: &str) -> String {
        text::strip_markup(text)
    }

    fn word_count(&self, text: &str) -> usize {
        text::word_count(text)
    }
}

/// taxonomy term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub taxonomy: String,
    pub name: String,
}

/// JSON 内容文件格式
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub records: Vec<ContentRecord>,
    #[serde(default)]
    pub terms: Vec<Term>,
    /// 内容类型 -> 挂载的 taxonomy
    #[serde(default)]
    pub taxonomies: BTreeMap<String, Vec<String>>,
}

/// 基于内存（可从 JSON 文件加载）的内容源
#[derive(Debug, Default)]
pub struct JsonContentSource {
    records: HashMap<String, ContentRecord>,
    terms: HashMap<(String, String), String>,
    taxonomies: BTreeMap<String, Vec<String>>,
}

impl JsonContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认内容文件路径：~/.config/social-auto-share/content.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("social-auto-share")
            .join("content.json")
    }

    pub fn from_file_contents(file: ContentFile) -> Self {
        let mut source = Self::new();
        for record in file.records {
            source.insert_record(record);
        }
        for term in file.terms {
            source.insert_term(term);
        }
        source.taxonomies = file.taxonomies;
        source
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ContentFile = serde_json::from_str(content).context("Invalid content JSON")?;
        Ok(Self::from_file_contents(file))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content from {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn insert_record(&mut self, record: ContentRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn insert_term(&mut self, term: Term) {
        self.terms.insert((term.taxonomy, term.id), term.name);
    }

    pub fn register_taxonomy(&mut self, content_type: &str, taxonomy: &str) {
        let entry = self.taxonomies.entry(content_type.to_string()).or_default();
        if !entry.iter().any(|t| t == taxonomy) {
            entry.push(taxonomy.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContentSource for JsonContentSource {
    fn get_record(&self, id: &str) -> Option<ContentRecord> {
        self.records.get(id).cloned()
    }

    fn resolve_taxonomy_names(&self, taxonomy: &str, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.terms.get(&(taxonomy.to_string(), id.clone())).cloned())
            .collect()
    }

    fn supports_taxonomy(&self, content_type: &str, taxonomy: &str) -> bool {
        match self.taxonomies.get(content_type) {
            Some(list) => list.iter().any(|t| t == taxonomy),
            // 未声明时，post 默认带有分类目录
            None => content_type == "post" && taxonomy == CATEGORY_TAXONOMY,
        }
    }
}
