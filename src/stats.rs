use std::time::Duration;

use chrono::{DateTime, Local};

use crate::translator::BatchStats;

/// 一次镜像运行的统计
#[derive(Debug, Clone)]
pub struct MirrorStats {
    pub started_at: DateTime<Local>,
    /// 首页阶段发现的锚点数
    pub anchors_discovered: usize,
    pub pages_mirrored: usize,
    /// 首页、外链、已存在目标等被跳过的数量
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub translation: BatchStats,
    /// 运行结束时镜像目录中的HTML页面数
    pub pages_on_disk: usize,
}

impl Default for MirrorStats {
    fn default() -> Self {
        Self {
            started_at: Local::now(),
            anchors_discovered: 0,
            pages_mirrored: 0,
            pages_skipped: 0,
            pages_failed: 0,
            translation: BatchStats::default(),
            pages_on_disk: 0,
        }
    }
}

/// 打印运行统计
pub fn print_mirror_stats(stats: &MirrorStats, total_duration: Duration) {
    println!("\n📊 镜像统计报告:");
    println!("═══════════════════════════════════════");
    println!("🕒 开始时间: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("⏱️  总耗时: {}", format_duration(total_duration));

    println!("\n📄 页面统计:");
    println!("   发现锚点: {} 个", stats.anchors_discovered);
    println!("   镜像成功: {} 页", stats.pages_mirrored);
    println!("   跳过: {} 页", stats.pages_skipped);
    println!("   失败: {} 页", stats.pages_failed);
    println!("   镜像目录现有: {} 页", stats.pages_on_disk);

    println!("\n🔤 翻译统计:");
    println!("   收集文本: {} 项", stats.translation.texts);
    println!("   创建批次: {} 个", stats.translation.batches);
    println!("   回退逐条: {} 个批次", stats.translation.rejected_batches);
    println!("   后端调用: {} 次", stats.translation.backend_calls);
    if stats.translation.untranslated > 0 {
        println!("   ⚠️  保留原文: {} 项", stats.translation.untranslated);
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }
}
