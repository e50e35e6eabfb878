//! 合格 Alpha 的提交流程 - 流程层
//!
//! 状态机：`Attempt(n) → {Accepted, Rejected, Retry}`，最多 5 次尝试。
//! 提交被创建后进入与模拟轮询同样形状的 Retry-After 子循环，
//! 子循环结束时的状态码（而不是创建时的 201）决定最终结果。
//! 批量提交与中断信号竞争，中断时保留已完成的结果并停止后续条目。

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::clients::BrainApi;
use crate::config::Config;
use crate::error::ApiError;
use crate::infrastructure::ShutdownSignal;
use crate::workflow::job_poller::retry_delay;

const CREATED: u16 = 201;
const ACCEPTED: u16 = 200;
/// 明确拒绝、不再重试的状态码
const REJECTION_CODES: [u16; 2] = [400, 403];

/// 批量提交结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    /// 收到中断信号，后续条目未提交
    pub interrupted: bool,
}

/// 单次尝试的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptResult {
    Accepted,
    Rejected,
    Retry,
}

pub struct SubmissionDriver<'a, A: BrainApi + ?Sized> {
    api: &'a A,
    max_attempts: usize,
    retry_backoff: Duration,
    item_pause: Duration,
}

impl<'a, A: BrainApi + ?Sized> SubmissionDriver<'a, A> {
    pub fn new(api: &'a A, config: &Config) -> Self {
        Self {
            api,
            max_attempts: config.submit_max_attempts,
            retry_backoff: config.submit_retry(),
            item_pause: config.submit_pause(),
        }
    }

    /// 提交单个 Alpha，返回是否最终被接受
    pub async fn submit(&self, alpha_id: &str) -> bool {
        for attempt in 1..=self.max_attempts {
            info!("第 {} 次尝试提交 Alpha {}", attempt, alpha_id);

            match self.attempt(alpha_id).await {
                AttemptResult::Accepted => return true,
                AttemptResult::Rejected => return false,
                AttemptResult::Retry => sleep(self.retry_backoff).await,
            }
        }

        warn!("⚠️ Alpha {} 已达到最大尝试次数 ({})", alpha_id, self.max_attempts);
        false
    }

    async fn attempt(&self, alpha_id: &str) -> AttemptResult {
        let response = match self.api.create_submission(alpha_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ 提交请求异常: {}", e);
                return AttemptResult::Retry;
            }
        };

        match response.status {
            CREATED => info!("POST: 成功，等待提交完成..."),
            status if REJECTION_CODES.contains(&status) => {
                let rejection = ApiError::Rejected {
                    alpha_id: alpha_id.to_string(),
                    status,
                };
                warn!("❌ {}", rejection);
                return AttemptResult::Rejected;
            }
            status => {
                warn!("提交请求返回 {}，稍后重试", status);
                return AttemptResult::Retry;
            }
        }

        loop {
            let status = match self.api.get_submission_status(alpha_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("⚠️ 查询提交状态失败: {}", e);
                    return AttemptResult::Rejected;
                }
            };

            if !status.is_pending() {
                return if status.status == ACCEPTED {
                    info!("✅ 提交成功!");
                    AttemptResult::Accepted
                } else {
                    warn!("❌ 提交未通过 (状态码: {})", status.status);
                    AttemptResult::Rejected
                };
            }

            sleep(retry_delay(status.retry_after)).await;
        }
    }

    /// 依次提交，条目之间固定暂停（最后一个之后不暂停）
    ///
    /// 收到中断信号时放弃进行中的条目，返回已完成部分并置 `interrupted`
    pub async fn submit_batch(
        &self,
        alpha_ids: &[String],
        shutdown: &mut ShutdownSignal,
    ) -> SubmissionReport {
        let mut report = SubmissionReport::default();

        let completed = {
            let batch = self.submit_each(alpha_ids, &mut report);
            tokio::select! {
                biased;
                _ = shutdown.recv() => false,
                _ = batch => true,
            }
        };

        if !completed {
            warn!(
                "\n用户中断，已处理 {} 个，剩余 {} 个未提交",
                report.accepted.len() + report.rejected.len(),
                alpha_ids.len() - report.accepted.len() - report.rejected.len()
            );
            report.interrupted = true;
        }

        report
    }

    async fn submit_each(&self, alpha_ids: &[String], report: &mut SubmissionReport) {
        for (i, alpha_id) in alpha_ids.iter().enumerate() {
            if self.submit(alpha_id).await {
                report.accepted.push(alpha_id.clone());
            } else {
                report.rejected.push(alpha_id.clone());
            }

            if i + 1 < alpha_ids.len() {
                sleep(self.item_pause).await;
            }
        }
    }
}
