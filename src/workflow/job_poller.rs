//! 单个候选的模拟流程 - 流程层
//!
//! 状态机：`Submitted → Polling → {Qualified, Rejected, Errored}`
//!
//! 1. POST /simulations，必须返回 201 和 Location
//! 2. 按 Retry-After 长轮询进度，直到其为 0
//! 3. 取 Alpha 详情，对 `is` 指标做资格检查

use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::clients::BrainApi;
use crate::error::{AppError, AppResult};
use crate::models::outcome::now_timestamp;
use crate::models::{Candidate, IsMetrics, JobOutcome};
use crate::services::qualification;

/// 模拟请求的"已创建"状态码
const CREATED: u16 = 201;

/// 单个候选所处的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling,
    Qualified,
    Rejected,
    Errored,
}

impl JobState {
    /// 评估结果对应的终止状态
    pub fn of(result: &AppResult<JobOutcome>) -> Self {
        match result {
            Ok(outcome) if outcome.passed_all_checks => JobState::Qualified,
            Ok(_) => JobState::Rejected,
            Err(_) => JobState::Errored,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Qualified | JobState::Rejected | JobState::Errored)
    }
}

/// 已提交的模拟
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub progress_url: String,
}

/// 模拟轮询器
///
/// - 不重试：任何传输错误、非 201 状态、缺失字段都直接作为错误返回
/// - 只在 Retry-After 指定的时长上挂起
pub struct JobPoller<'a, A: BrainApi + ?Sized> {
    api: &'a A,
    settle_delay: Duration,
}

impl<'a, A: BrainApi + ?Sized> JobPoller<'a, A> {
    /// `settle_delay`：模拟完成后等待指标计算的时间
    pub fn new(api: &'a A, settle_delay: Duration) -> Self {
        Self { api, settle_delay }
    }

    /// 提交并轮询到终止状态
    pub async fn evaluate(&self, candidate: &Candidate) -> AppResult<JobOutcome> {
        let handle = self.submit(candidate).await?;
        self.poll(&handle, candidate).await
    }

    /// 提交模拟请求
    pub async fn submit(&self, candidate: &Candidate) -> AppResult<JobHandle> {
        let settings = &candidate.settings;
        info!("表达式: {}", candidate.expression);
        info!(
            "参数配置: Universe={}, Neutralization={}, Decay={}, Truncation={}",
            settings.universe, settings.neutralization, settings.decay, settings.truncation
        );
        info!("策略类型: {}", candidate.category);

        let response = self.api.create_simulation(&candidate.to_request()).await?;

        if response.status != CREATED {
            warn!("❌ 模拟请求失败 (状态码: {})", response.status);
            if !response.body.is_null() {
                warn!("   错误详情: {}", response.body_preview());
            }
            return Err(AppError::bad_status(
                "/simulations",
                response.status,
                response.body_preview(),
            ));
        }

        let progress_url = response
            .location
            .ok_or_else(|| AppError::missing_field("/simulations", "Location"))?;

        debug!("{:?} → {}", JobState::Submitted, progress_url);
        Ok(JobHandle { progress_url })
    }

    /// 长轮询直到模拟完成，然后取指标并检查资格
    pub async fn poll(&self, handle: &JobHandle, candidate: &Candidate) -> AppResult<JobOutcome> {
        let started = Instant::now();
        let mut state = JobState::Polling;

        let alpha_id = loop {
            let progress = self.api.get_simulation_progress(&handle.progress_url).await?;

            if !progress.is_pending() {
                break progress
                    .body
                    .get("alpha")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| AppError::missing_field(&handle.progress_url, "alpha"))?;
            }

            debug!("{:?}: Retry-After={}", state, progress.retry_after);
            info!(
                "等待模拟结果... ({:.1} 秒)",
                started.elapsed().as_secs_f64()
            );
            sleep(retry_delay(progress.retry_after)).await;
        };

        info!("获得 Alpha ID: {}", alpha_id);

        // 等待指标计算完成
        sleep(self.settle_delay).await;

        let detail = self.api.get_alpha(&alpha_id).await?;
        let is_doc = detail.body.get("is").cloned().ok_or_else(|| {
            warn!("无法获取指标数据");
            AppError::missing_field(format!("/alphas/{}", alpha_id), "is")
        })?;
        let metrics: IsMetrics = serde_json::from_value(is_doc)?;

        let verdict = qualification::evaluate(&metrics);
        state = if verdict.qualified {
            JobState::Qualified
        } else {
            JobState::Rejected
        };
        debug!("{} → {:?}", alpha_id, state);

        Ok(JobOutcome {
            expression: candidate.expression.clone(),
            alpha_id,
            passed_all_checks: verdict.qualified,
            metrics,
            parameters: candidate.parameters(),
            expression_type: candidate.category,
            timestamp: now_timestamp(),
        })
    }
}

/// Retry-After 秒数转换为等待时长；无法表示的值按 1 秒处理
pub(crate) fn retry_delay(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn outcome(passed: bool) -> JobOutcome {
        JobOutcome {
            expression: "rank(eps)".to_string(),
            alpha_id: "a1".to_string(),
            passed_all_checks: passed,
            metrics: IsMetrics::default(),
            parameters: JsonValue::Null,
            expression_type: crate::models::Category::Momentum,
            timestamp: now_timestamp(),
        }
    }

    #[test]
    fn test_terminal_state_of_result() {
        assert_eq!(JobState::of(&Ok(outcome(true))), JobState::Qualified);
        assert_eq!(JobState::of(&Ok(outcome(false))), JobState::Rejected);

        let err: AppResult<JobOutcome> = Err(AppError::Api(ApiError::MissingField {
            endpoint: "/alphas/a1".to_string(),
            field: "is".to_string(),
        }));
        assert_eq!(JobState::of(&err), JobState::Errored);

        assert!(!JobState::Submitted.is_terminal());
        assert!(!JobState::Polling.is_terminal());
        assert!(JobState::Errored.is_terminal());
    }

    #[test]
    fn test_retry_delay() {
        assert_eq!(retry_delay(2.5), Duration::from_millis(2500));
        assert_eq!(retry_delay(f64::INFINITY), Duration::from_secs(1));
    }
}
