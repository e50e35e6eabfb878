//! 提交资格检查 - 业务能力层
//!
//! 固定阈值：Sharpe ≥ 1.5，Fitness ≥ 1.0，Turnover ∈ [0.1, 0.9]，IC Mean ≥ 0.02，
//! 子宇宙 Sharpe ≥ 服务端给出的限制；任何 FAIL / PENDING 子检查都会导致不合格。
//! 其他子检查状态（如 WARNING）只作提示，不影响结论。
//! 所有检查都会执行，不会提前返回。

use tracing::{info, warn};

use crate::models::{CheckStatus, IsMetrics};

/// 子宇宙 Sharpe 检查项名称
pub const SUB_UNIVERSE_CHECK: &str = "LOW_SUB_UNIVERSE_SHARPE";

pub const MIN_SHARPE: f64 = 1.5;
pub const MIN_FITNESS: f64 = 1.0;
pub const MIN_TURNOVER: f64 = 0.1;
pub const MAX_TURNOVER: f64 = 0.9;
pub const MIN_IC_MEAN: f64 = 0.02;

/// 单个数值阈值的检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCheck {
    pub name: &'static str,
    pub value: f64,
    pub requirement: String,
    pub passed: bool,
}

/// 资格检查结论
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub qualified: bool,
    pub thresholds: Vec<ThresholdCheck>,
    /// 结果为 FAIL 的子检查
    pub failed_checks: Vec<String>,
    /// 结果为 PENDING 的子检查
    pub pending_checks: Vec<String>,
}

/// 检查 Alpha 是否满足所有提交条件
pub fn evaluate(metrics: &IsMetrics) -> Verdict {
    let (sub_sharpe, sub_limit) = metrics
        .find_check(SUB_UNIVERSE_CHECK)
        .map(|c| (c.value.unwrap_or(0.0), c.limit.unwrap_or(0.0)))
        .unwrap_or((0.0, 0.0));

    let thresholds = vec![
        ThresholdCheck {
            name: "Sharpe",
            value: metrics.sharpe,
            requirement: format!(">= {}", MIN_SHARPE),
            passed: metrics.sharpe >= MIN_SHARPE,
        },
        ThresholdCheck {
            name: "Fitness",
            value: metrics.fitness,
            requirement: format!(">= {}", MIN_FITNESS),
            passed: metrics.fitness >= MIN_FITNESS,
        },
        ThresholdCheck {
            name: "Turnover",
            value: metrics.turnover,
            requirement: format!("{}-{}", MIN_TURNOVER, MAX_TURNOVER),
            passed: (MIN_TURNOVER..=MAX_TURNOVER).contains(&metrics.turnover),
        },
        ThresholdCheck {
            name: "IC Mean",
            value: metrics.ic_mean(),
            requirement: format!(">= {}", MIN_IC_MEAN),
            passed: metrics.ic_mean() >= MIN_IC_MEAN,
        },
        ThresholdCheck {
            name: "子宇宙 Sharpe",
            value: sub_sharpe,
            requirement: format!(">= {:.3}", sub_limit),
            passed: sub_sharpe >= sub_limit,
        },
    ];

    info!("\nAlpha 指标详情:");
    for check in &thresholds {
        let mark = if check.passed { "达标" } else { "不达标" };
        info!("  {}: {:.3} ({}) - {}", check.name, check.value, check.requirement, mark);
    }

    let mut failed_checks = Vec::new();
    let mut pending_checks = Vec::new();

    info!("\n检查项结果:");
    for check in &metrics.checks {
        let value = check.value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into());
        let limit = check.limit.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into());
        match check.result {
            CheckStatus::Pass => info!("  {}: {} (限制: {}) - 通过", check.name, value, limit),
            CheckStatus::Fail => {
                info!("  {}: {} (限制: {}) - 失败", check.name, value, limit);
                failed_checks.push(check.name.clone());
            }
            CheckStatus::Pending => {
                info!("  {}: 检查尚未完成", check.name);
                pending_checks.push(check.name.clone());
            }
            CheckStatus::Other => warn!("  {}: 提示性检查状态，不影响结论", check.name),
        }
    }

    let qualified = thresholds.iter().all(|c| c.passed)
        && failed_checks.is_empty()
        && pending_checks.is_empty();

    if qualified {
        info!("✅ Alpha 满足所有条件，可以提交!");
    } else {
        info!("❌ Alpha 未达到提交标准");
    }

    Verdict {
        qualified,
        thresholds,
        failed_checks,
        pending_checks,
    }
}
