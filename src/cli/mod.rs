//! CLI command handling

pub mod check;
pub mod destinations;
pub mod output;
pub mod publish;
pub mod settings;

pub use check::*;
pub use destinations::*;
pub use output::*;
pub use publish::*;
pub use settings::*;

use crate::content::JsonContentSource;
use crate::settings::ShareSettings;
use crate::share::AutoShare;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// 配置文件路径环境变量
pub const SETTINGS_ENV: &str = "AUTOSHARE_SETTINGS";

/// 全局路径（配置文件 + 内容文件）
#[derive(Debug, Clone)]
pub struct CliPaths {
    pub settings: PathBuf,
    pub content: PathBuf,
}

impl CliPaths {
    /// 命令行参数 > 环境变量 > 默认路径
    pub fn resolve(settings: Option<String>, content: Option<String>) -> Self {
        let settings = settings
            .or_else(|| std::env::var(SETTINGS_ENV).ok().filter(|s| !s.trim().is_empty()))
            .map(|p| expand_home(&p))
            .unwrap_or_else(ShareSettings::default_path);
        let content = content
            .map(|p| expand_home(&p))
            .unwrap_or_else(JsonContentSource::default_path);
        Self { settings, content }
    }

    pub fn load_settings(&self) -> Result<ShareSettings> {
        ShareSettings::load(&self.settings)
    }

    pub fn load_source(&self) -> Result<JsonContentSource> {
        JsonContentSource::load(&self.content)
    }

    /// 加载配置和内容并构建 AutoShare
    pub fn build_share(&self, dry_run: bool) -> Result<AutoShare> {
        let settings = self.load_settings()?;
        let source = Arc::new(self.load_source()?);
        AutoShare::builder(settings, source).dry_run(dry_run).build()
    }
}

/// 展开 ~ 为 home 目录
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
