//! 分享配置 - 按 scope（内容类型 / 渠道 / general）组织的 key-value 设置
//!
//! 配置文件格式（JSON）：
//! ```json
//! {
//!   "post": { "enabled": true, "post_types": ["post"], "min_word_count": 10 },
//!   "telegram": { "enabled": true, "bot_token": "123:abc", "channel_id": "@news" },
//!   "general": { "date_format": "%B %-d, %Y" }
//! }
//! ```
//!
//! 分享流程只读取配置，写入只发生在 CLI `settings set` 命令中。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 全局设置所在的 scope
pub const GENERAL_SCOPE: &str = "general";

/// 默认日期格式（chrono strftime）
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// 默认 HTTP 超时（秒）
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// 全部分享配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareSettings {
    scopes: BTreeMap<String, Map<String, Value>>,
}

impl ShareSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认配置文件路径：~/.config/social-auto-share/settings.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("social-auto-share")
            .join("settings.json")
    }

    /// 从 JSON 字符串解析
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid settings JSON")
    }

    /// 读取配置文件，文件不存在时返回空配置（全部使用默认值）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json(&content)
    }

    /// 保存配置文件（带文件锁）
    pub fn save(&self, path: &Path) -> Result<()> {
        use fs2::FileExt;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        file.lock_exclusive()?;
        file.set_len(0)?;
        writeln!(file, "{}", content)?;
        file.unlock()?;
        Ok(())
    }

    /// 读取原始值
    pub fn get(&self, scope: &str, key: &str) -> Option<&Value> {
        self.scopes.get(scope).and_then(|s| s.get(key))
    }

    /// 读取值，缺失时返回默认值
    pub fn get_or(&self, scope: &str, key: &str, default: Value) -> Value {
        self.get(scope, key).cloned().unwrap_or(default)
    }

    /// 写入值，返回值是否发生变化
    pub fn set(&mut self, scope: &str, key: &str, value: Value) -> bool {
        let entries = self.scopes.entry(scope.to_string()).or_default();
        if entries.get(key) == Some(&value) {
            return false;
        }
        entries.insert(key.to_string(), value);
        true
    }

    /// 获取某个 scope 的只读快照
    pub fn scope(&self, scope: &str) -> ScopedSettings {
        ScopedSettings {
            scope: scope.to_string(),
            values: self.scopes.get(scope).cloned().unwrap_or_default(),
        }
    }

    /// 已配置的 scope 名称
    pub fn scope_names(&self) -> Vec<&str> {
        self.scopes.keys().map(|s| s.as_str()).collect()
    }
}

/// 单个 scope 的配置快照
///
/// 取值时做宽松转换：布尔值接受 `"1"`/`"yes"`，数字接受数字字符串，
/// 列表接受单个标量。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopedSettings {
    scope: String,
    values: Map<String, Value>,
}

impl ScopedSettings {
    /// 直接从 key-value 构建（主要用于测试和扩展渠道）
    pub fn from_pairs<'a>(scope: &str, pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self {
            scope: scope.to_string(),
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 按 key 顺序遍历原始值
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    /// 读取非空字符串（去除首尾空白），空字符串视为未设置
    pub fn get_str(&self, key: &str) -> Option<String> {
        let s = match self.values.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or_else(|| default.to_string())
    }

    /// 读取非负整数，空字符串视为 0
    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.values.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().map(|f| if f > 0.0 { f as u64 } else { 0 }))
                .unwrap_or(default),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    0
                } else {
                    s.parse::<i64>().map(|n| n.max(0) as u64).unwrap_or(default)
                }
            }
            Some(Value::Bool(b)) => *b as u64,
            _ => default,
        }
    }

    /// 读取 id 列表；数字和字符串都转为字符串，缺失时返回 None
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.values.get(key)? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(scalar_to_string)
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            other => Some(scalar_to_string(other).filter(|s| !s.is_empty()).into_iter().collect()),
        }
    }

    pub fn get_list_or(&self, key: &str, default: &[&str]) -> Vec<String> {
        self.get_list(key)
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
