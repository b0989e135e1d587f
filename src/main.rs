use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use site_mirror::config::{Cli, MirrorConfig};
use site_mirror::site_mirror::SiteMirror;
use site_mirror::stats::{format_duration, print_mirror_stats};
use site_mirror::utils::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let config = MirrorConfig::from_cli(&cli);
    config.validate().context("配置校验失败")?;

    info!("🚀 启动站点镜像");
    info!("🌐 起始页面: {}", config.start_url());
    info!("📂 镜像目录: {}", config.output_dir().display());
    info!("🔤 翻译方向: {} -> {}", config.source_lang(), config.target_lang());

    let total_start = Instant::now();

    let mirror = SiteMirror::from_config(&config).context("初始化镜像器失败")?;

    match mirror.run().await {
        Ok(stats) => {
            let total_duration = total_start.elapsed();
            info!(
                "✅ 镜像完成！成功 {} 页，跳过 {} 页，失败 {} 页，总耗时: {}",
                stats.pages_mirrored,
                stats.pages_skipped,
                stats.pages_failed,
                format_duration(total_duration)
            );

            if cli.stats || cli.verbose {
                print_mirror_stats(&stats, total_duration);
            }
        }
        Err(e) => {
            error!("❌ 镜像失败: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
