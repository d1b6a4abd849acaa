//! Check / Preview 命令 - 查看资格判断和各渠道将要发送的消息

use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;

use super::output::format_output;
use super::CliPaths;
use crate::share::{AutoShare, ContentPayload};

/// Check 命令参数
#[derive(Args)]
pub struct CheckArgs {
    /// 内容 ID
    pub id: String,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 单个内容类型的判断结果
#[derive(Debug, Serialize)]
pub struct ContentTypeCheck {
    pub content_type: String,
    pub enabled: bool,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// 渠道状态
#[derive(Debug, Serialize)]
pub struct DestinationStatus {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub configured: bool,
}

/// Check 命令输出
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub content_id: String,
    pub content_types: Vec<ContentTypeCheck>,
    pub destinations: Vec<DestinationStatus>,
}

/// 处理 check 命令
pub fn handle_check(paths: &CliPaths, args: CheckArgs) -> Result<()> {
    let share = paths.build_share(false)?;

    let content_types = share
        .content_types()
        .iter()
        .map(|ct| {
            let check = ct.check(&args.id);
            ContentTypeCheck {
                content_type: ct.id().to_string(),
                enabled: ct.is_enabled(),
                eligible: check.is_ok(),
                reason: check.err().map(|r| r.to_string()),
            }
        })
        .collect();

    let output = CheckOutput {
        content_id: args.id.clone(),
        content_types,
        destinations: destination_statuses(&share),
    };

    if args.json {
        println!("{}", format_output(&output));
        return Ok(());
    }

    println!("Content {}", output.content_id);
    for check in &output.content_types {
        let state = if !check.enabled {
            "disabled".to_string()
        } else if check.eligible {
            "eligible".to_string()
        } else {
            format!("not eligible: {}", check.reason.as_deref().unwrap_or("unknown"))
        };
        println!("  {}: {}", check.content_type, state);
    }
    println!("Destinations");
    for dest in &output.destinations {
        println!(
            "  {} ({}): enabled={} configured={}",
            dest.id, dest.name, dest.enabled, dest.configured
        );
    }

    Ok(())
}

pub(crate) fn destination_statuses(share: &AutoShare) -> Vec<DestinationStatus> {
    share
        .dispatcher()
        .destinations()
        .iter()
        .map(|d| DestinationStatus {
            id: d.id().to_string(),
            name: d.name().to_string(),
            enabled: d.is_enabled(),
            configured: d.is_configured(),
        })
        .collect()
}

/// Preview 命令参数
#[derive(Args)]
pub struct PreviewArgs {
    /// 内容 ID
    pub id: String,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 单个渠道的消息预览
#[derive(Debug, Serialize)]
pub struct MessagePreview {
    pub destination: String,
    pub configured: bool,
    pub message: String,
}

/// Preview 命令输出
#[derive(Debug, Serialize)]
pub struct PreviewOutput {
    pub content_type: String,
    pub payload: ContentPayload,
    pub messages: Vec<MessagePreview>,
}

/// 处理 preview 命令（不检查内容类型是否启用）
pub fn handle_preview(paths: &CliPaths, args: PreviewArgs) -> Result<()> {
    let share = paths.build_share(true)?;

    // 第一个内容类型的拒绝原因作为错误信息
    let mut first_rejection = None;
    let (content_type, payload) = share
        .content_types()
        .iter()
        .find_map(|ct| match ct.try_build_payload(&args.id) {
            Ok(p) => Some((ct.id().to_string(), p)),
            Err(rejection) => {
                first_rejection.get_or_insert(rejection);
                None
            }
        })
        .ok_or_else(|| {
            let reason = first_rejection
                .map(|r| r.to_string())
                .unwrap_or_else(|| "no content type registered".to_string());
            anyhow!("Content {} would not be shared: {}", args.id, reason)
        })?;

    let messages = share
        .dispatcher()
        .destinations()
        .iter()
        .filter(|d| d.is_enabled())
        .map(|d| MessagePreview {
            destination: d.id().to_string(),
            configured: d.is_configured(),
            message: d.format_message(&payload),
        })
        .collect();

    let output = PreviewOutput {
        content_type,
        payload,
        messages,
    };

    if args.json {
        println!("{}", format_output(&output));
        return Ok(());
    }

    let payload = &output.payload;
    println!("Title:    {}", payload.title);
    println!("URL:      {}", payload.url);
    println!("Author:   {}", payload.author);
    println!("Image:    {}", payload.image_url.as_deref().unwrap_or("-"));
    println!("Category: {}", payload.categories.join(", "));
    println!("Tags:     {}", payload.tags.join(", "));
    println!("Excerpt:  {}", payload.excerpt);
    if output.messages.is_empty() {
        println!("\nNo enabled destinations");
    }
    for preview in &output.messages {
        let note = if preview.configured { "" } else { " (not configured)" };
        println!("\n--- {}{} ---", preview.destination, note);
        println!("{}", preview.message);
    }

    Ok(())
}
