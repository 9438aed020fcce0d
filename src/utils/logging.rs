/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{ExamContent, ExamResult, HistoryEntry};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用无副作用
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试客户端启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🌐 API: {}", api_base_url);
    info!("{}", "=".repeat(60));
}

/// 记录考试加载信息
pub fn log_exam_loaded(content: &ExamContent, page_size: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📝 {}", content.title);
    info!(
        "共 {} 题 | 限时 {} 分钟 | 每页 {} 题",
        content.question_count(),
        content.duration_minutes,
        page_size
    );
    info!("{}", "=".repeat(60));
}

/// 打印考试结果
pub fn log_result(title: &str, result: &ExamResult) {
    info!("\n{}", "=".repeat(60));
    info!("✅ 交卷成功: {}", title);
    info!(
        "得分: {}/{} ({}%) | 第 {} 次考试",
        result.score,
        result.total,
        result.percentage(),
        result.attempt_number
    );
    info!("{}", "=".repeat(60));
}

/// 打印历史记录
pub fn log_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        info!("还没有考试记录");
        return;
    }
    for entry in entries {
        info!(
            "{} {} | {}/{} | 第 {} 次 | 用时 {} | {}",
            if entry.passed() { "✅" } else { "❌" },
            truncate_text(&entry.exam_title, 40),
            entry.score,
            entry.total_questions,
            entry.attempt_number,
            format_remaining(entry.duration_taken_seconds),
            entry.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }
}

/// 把秒数格式化为 `m:ss`
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
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
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(65), "1:05");
        assert_eq!(format_remaining(3600), "60:00");
    }

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("考试客户端启动", 2), "考试...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
