//! Settings 命令 - 读取和修改分享配置
//!
//! `set` 会先运行对应 scope 的格式校验并打印警告，然后照常保存。

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use std::sync::Arc;

use super::output::format_output;
use super::CliPaths;
use crate::content::JsonContentSource;
use crate::share::{validate_scope, AutoShare};

/// Settings 命令参数
#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// 读取单个配置值
    Get {
        /// 配置 scope，如 post / telegram / general
        scope: String,
        /// 配置项
        key: String,
    },
    /// 修改配置值（值按 JSON 解析，失败时作为字符串）
    Set {
        /// 配置 scope，如 post / telegram / general
        scope: String,
        /// 配置项
        key: String,
        /// 新值
        value: String,
    },
    /// 显示全部配置（bot_token 会被遮盖）
    Show,
}

/// 解析命令行传入的值
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// 遮盖 token，只保留 bot id 部分
pub fn mask_secret(key: &str, value: &Value) -> Value {
    if !key.contains("token") {
        return value.clone();
    }
    match value {
        Value::Null => value.clone(),
        Value::String(token) if token.is_empty() => value.clone(),
        // 只在格式为 <bot_id>:<secret> 时显示 bot id
        Value::String(token) => match token.split_once(':') {
            Some((bot_id, _)) if !bot_id.is_empty() => Value::String(format!("{}:***", bot_id)),
            _ => Value::String("***".to_string()),
        },
        _ => Value::String("***".to_string()),
    }
}

/// 处理 settings 命令
pub fn handle_settings(paths: &CliPaths, args: SettingsArgs) -> Result<()> {
    let mut settings = paths.load_settings()?;

    match args.action {
        SettingsAction::Get { scope, key } => {
            let value = settings
                .get(&scope, &key)
                .ok_or_else(|| anyhow!("{}.{} is not set", scope, key))?;
            println!("{}", format_output(value));
        }
        SettingsAction::Set { scope, key, value } => {
            let value = parse_value(&value);
            let changed = settings.set(&scope, &key, value);

            let share =
                AutoShare::builder(settings.clone(), Arc::new(JsonContentSource::new())).build()?;
            for warning in validate_scope(share.dispatcher(), &settings, &scope) {
                eprintln!("⚠️  {}", warning);
            }

            if changed {
                settings.save(&paths.settings)?;
                println!("✓ {}.{} saved to {}", scope, key, paths.settings.display());
            } else {
                println!("{}.{} unchanged", scope, key);
            }
        }
        SettingsAction::Show => {
            println!("Settings file: {}", paths.settings.display());
            for scope in settings.scope_names() {
                let scoped = settings.scope(scope);
                println!("[{}]", scope);
                for (key, value) in scoped.iter() {
                    println!("  {} = {}", key, mask_secret(key, value));
                }
            }
        }
    }

    Ok(())
}
