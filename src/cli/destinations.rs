//! Destinations 命令 - 列出已注册的渠道

use anyhow::Result;
use clap::Args;
use std::sync::Arc;

use super::check::destination_statuses;
use super::output::format_output;
use super::CliPaths;
use crate::content::JsonContentSource;
use crate::share::AutoShare;

/// Destinations 命令参数
#[derive(Args)]
pub struct DestinationsArgs {
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 destinations 命令
pub fn handle_destinations(paths: &CliPaths, args: DestinationsArgs) -> Result<()> {
    let settings = paths.load_settings()?;
    // 列渠道不需要内容文件
    let share = AutoShare::builder(settings, Arc::new(JsonContentSource::new())).build()?;
    let statuses = destination_statuses(&share);

    if args.json {
        println!("{}", format_output(&statuses));
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No destinations registered");
        return Ok(());
    }

    println!("{:<12} {:<12} {:<8} {}", "ID", "NAME", "ENABLED", "CONFIGURED");
    for s in &statuses {
        println!(
            "{:<12} {:<12} {:<8} {}",
            s.id,
            s.name,
            if s.enabled { "yes" } else { "no" },
            if s.configured { "yes" } else { "no" }
        );
    }

    Ok(())
}
