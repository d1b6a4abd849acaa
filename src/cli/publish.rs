//! Publish / Hook 命令 - 模拟宿主触发发布事件

use anyhow::{anyhow, Result};
use clap::Args;

use super::output::{format_outcome, format_output};
use super::CliPaths;

/// Publish 命令参数
#[derive(Args)]
pub struct PublishArgs {
    /// 内容 ID
    pub id: String,

    /// 作为定时发布事件触发
    #[arg(long)]
    pub scheduled: bool,

    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 publish 命令
pub fn handle_publish(paths: &CliPaths, args: PublishArgs) -> Result<()> {
    let share = paths.build_share(args.dry_run)?;

    let outcome = if args.scheduled {
        share.on_scheduled_publish(&args.id)
    } else {
        share.on_publish(&args.id)
    };

    if args.json {
        println!("{}", format_output(&outcome));
    } else {
        println!("{}", format_outcome(&args.id, &outcome));
    }

    Ok(())
}

/// Hook 命令参数
#[derive(Args)]
pub struct HookArgs {
    /// 宿主 hook 名称，如 publish_post / future_to_publish
    pub hook: String,

    /// 内容 ID
    pub id: String,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 hook 命令
pub fn handle_hook(paths: &CliPaths, args: HookArgs) -> Result<()> {
    let share = paths.build_share(false)?;

    let outcome = share.handle_hook(&args.hook, &args.id).ok_or_else(|| {
        let known: Vec<&str> = share
            .content_types()
            .iter()
            .flat_map(|ct| ct.hooks().into_iter().map(|(name, _)| name))
            .collect();
        anyhow!("Unknown hook '{}', expected one of: {}", args.hook, known.join(", "))
    })?;

    if args.json {
        println!("{}", format_output(&outcome));
    } else {
        println!("{}", format_outcome(&args.id, &outcome));
    }

    Ok(())
}
