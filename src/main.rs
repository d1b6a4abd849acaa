//! Social Auto Share CLI
//!
//! 模拟宿主的发布事件，把内容分享到已配置的渠道 (Telegram)

use anyhow::Result;
use clap::{Parser, Subcommand};
use social_auto_share::cli::{
    handle_check, handle_destinations, handle_hook, handle_preview, handle_publish,
    handle_settings, CheckArgs, CliPaths, DestinationsArgs, HookArgs, PreviewArgs, PublishArgs,
    SettingsArgs,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "autoshare")]
#[command(about = "Social Auto Share - 内容发布时自动分享到社交渠道")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/social-auto-share/settings.json，或 AUTOSHARE_SETTINGS）
    #[arg(long, global = true)]
    settings: Option<String>,

    /// 内容文件路径（默认 ~/.config/social-auto-share/content.json）
    #[arg(long, global = true)]
    content: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 触发发布事件并分享内容
    Publish(PublishArgs),
    /// 按宿主 hook 名称触发
    Hook(HookArgs),
    /// 查看资格判断和渠道状态
    Check(CheckArgs),
    /// 预览 payload 和各渠道消息（不发送）
    Preview(PreviewArgs),
    /// 读取或修改配置
    Settings(SettingsArgs),
    /// 列出已注册的渠道
    Destinations(DestinationsArgs),
}

fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug autoshare publish 42
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("social_auto_share=info,autoshare=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let paths = CliPaths::resolve(cli.settings, cli.content);

    match cli.command {
        Commands::Publish(args) => handle_publish(&paths, args)?,
        Commands::Hook(args) => handle_hook(&paths, args)?,
        Commands::Check(args) => handle_check(&paths, args)?,
        Commands::Preview(args) => handle_preview(&paths, args)?,
        Commands::Settings(args) => handle_settings(&paths, args)?,
        Commands::Destinations(args) => handle_destinations(&paths, args)?,
    }

    Ok(())
}
