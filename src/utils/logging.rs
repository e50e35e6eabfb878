/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::services::test_ledger::ResumeStats;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则默认 `info`，`verbose` 为 true 时使用 `debug`。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 启动批量 Alpha 模拟与提交系统");
    info!("🧠 智能参数配置 + 断点续传功能已启用");
    info!("🌐 API 地址: {}", base_url);
    info!("{}", "=".repeat(60));
}

/// 记录断点续传状态
pub fn log_resume_status(stats: &ResumeStats, resume_file: &str) {
    if stats.total_tested == 0 {
        return;
    }
    info!("📊 断点续传状态: 已有 {} 个测试记录", stats.total_tested);
    info!("💡 程序将自动跳过已测试的Alpha表达式");
    info!("🗑️ 如需重新开始，请使用 --clear-resume (记录文件: {})", resume_file);
}

/// 记录断点续传过滤结果
pub fn log_resume_filter(original: usize, skipped: usize, remaining: usize) {
    if skipped == 0 {
        info!("所有 {} 个Alpha表达式都是新的", remaining);
        return;
    }
    info!("\n断点续传统计:");
    info!("   原始表达式: {} 个", original);
    info!("   已测试跳过: {} 个", skipped);
    info!("   待测试数量: {} 个", remaining);
}

/// 打印批次统计信息
pub fn print_batch_stats(tested: usize, qualified: usize, errored: usize, skipped: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 模拟完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🧪 本次测试: {}", tested);
    info!("✅ 合格: {}", qualified);
    info!("❌ 出错: {}", errored);
    info!("⏭️ 跳过(已测试): {}", skipped);
    info!("{}", "=".repeat(60));
}

/// 打印提交统计信息
pub fn print_submission_stats(accepted: &[String], rejected: &[String]) {
    info!("\n{}", "─".repeat(60));
    info!("📤 提交完成: 成功 {}/{}", accepted.len(), accepted.len() + rejected.len());
    for id in accepted {
        info!("  ✅ {}", id);
    }
    for id in rejected {
        info!("  ❌ {}", id);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("rank(close)", 4), "rank...");
        assert_eq!(truncate_text("排名因子", 2), "排名...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
