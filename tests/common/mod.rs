//! 测试用的脚本化 BrainApi

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::Mutex;

use alpha_batch_submit::config::Config;
use alpha_batch_submit::error::{AppError, AppResult};
use alpha_batch_submit::infrastructure::ShutdownTrigger;
use alpha_batch_submit::models::{DatasetConfig, SimulationRequest};
use alpha_batch_submit::{ApiResponse, BrainApi};

type Script = Mutex<VecDeque<AppResult<ApiResponse>>>;

/// 每个端点一个响应队列；队列为空时返回错误
#[derive(Default)]
pub struct MockBrainApi {
    simulations: Script,
    progress: Script,
    alphas: Script,
    submissions: Script,
    submission_status: Script,
    data_fields: Script,
    calls: Mutex<Vec<String>>,
    interrupt_on_simulation: Mutex<Option<(usize, ShutdownTrigger)>>,
    interrupt_on_submission: Mutex<Option<(usize, ShutdownTrigger)>>,
}

fn push(script: &Script, response: AppResult<ApiResponse>) {
    script.lock().unwrap().push_back(response);
}

fn next(script: &Script, endpoint: &str) -> AppResult<ApiResponse> {
    script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(AppError::Other(format!("no scripted response for {}", endpoint))))
}

impl MockBrainApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_simulation(&self, response: AppResult<ApiResponse>) {
        push(&self.simulations, response);
    }

    pub fn push_progress(&self, response: AppResult<ApiResponse>) {
        push(&self.progress, response);
    }

    pub fn push_alpha(&self, response: AppResult<ApiResponse>) {
        push(&self.alphas, response);
    }

    pub fn push_submission(&self, response: AppResult<ApiResponse>) {
        push(&self.submissions, response);
    }

    pub fn push_submission_status(&self, response: AppResult<ApiResponse>) {
        push(&self.submission_status, response);
    }

    pub fn push_data_fields(&self, response: AppResult<ApiResponse>) {
        push(&self.data_fields, response);
    }

    /// 一次完整的模拟：201 → 进度完成 → 指标
    pub fn script_simulation(&self, alpha_id: &str, is_doc: JsonValue) {
        self.push_simulation(Ok(created(&format!("/simulations/{}", alpha_id))));
        self.push_progress(Ok(ApiResponse::new(200).with_body(json!({ "alpha": alpha_id }))));
        self.push_alpha(Ok(ApiResponse::new(200).with_body(json!({ "id": alpha_id, "is": is_doc }))));
    }

    /// 第 `n` 次 create_simulation 时触发中断
    pub fn interrupt_on_simulation(&self, n: usize, trigger: ShutdownTrigger) {
        *self.interrupt_on_simulation.lock().unwrap() = Some((n, trigger));
    }

    /// 第 `n` 次 create_submission 时触发中断
    pub fn interrupt_on_submission(&self, n: usize, trigger: ShutdownTrigger) {
        *self.interrupt_on_submission.lock().unwrap() = Some((n, trigger));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BrainApi for MockBrainApi {
    async fn create_simulation(&self, request: &SimulationRequest) -> AppResult<ApiResponse> {
        self.record(format!("create_simulation {}", request.regular));

        let made = self.count_calls("create_simulation");
        if let Some((n, trigger)) = self.interrupt_on_simulation.lock().unwrap().as_ref() {
            if made == *n {
                trigger.trigger();
            }
        }

        next(&self.simulations, "create_simulation")
    }

    async fn get_simulation_progress(&self, progress_url: &str) -> AppResult<ApiResponse> {
        self.record(format!("get_simulation_progress {}", progress_url));
        next(&self.progress, "get_simulation_progress")
    }

    async fn get_alpha(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        self.record(format!("get_alpha {}", alpha_id));
        next(&self.alphas, "get_alpha")
    }

    async fn create_submission(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        self.record(format!("create_submission {}", alpha_id));

        let made = self.count_calls("create_submission");
        if let Some((n, trigger)) = self.interrupt_on_submission.lock().unwrap().as_ref() {
            if made == *n {
                trigger.trigger();
            }
        }
        next(&self.submissions, "create_submission")
    }

    async fn get_submission_status(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        self.record(format!("get_submission_status {}", alpha_id));
        next(&self.submission_status, "get_submission_status")
    }

    async fn get_data_fields(
        &self,
        dataset: &DatasetConfig,
        offset: usize,
        limit: usize,
    ) -> AppResult<ApiResponse> {
        self.record(format!("get_data_fields {} {} {}", dataset.id, offset, limit));
        next(&self.data_fields, "get_data_fields")
    }
}

pub fn created(location: &str) -> ApiResponse {
    ApiResponse::new(201).with_location(location)
}

pub fn pending(seconds: f64) -> ApiResponse {
    ApiResponse::new(200).with_retry_after(seconds)
}

/// 满足全部条件的指标
pub fn passing_is() -> JsonValue {
    json!({
        "sharpe": 2.0,
        "fitness": 1.2,
        "turnover": 0.5,
        "margin": 0.03,
        "checks": [
            {"name": "LOW_SHARPE", "result": "PASS", "value": 2.0, "limit": 1.25},
            {"name": "LOW_SUB_UNIVERSE_SHARPE", "result": "PASS", "value": 1.0, "limit": 0.8}
        ]
    })
}

/// Sharpe 不达标的指标
pub fn failing_is() -> JsonValue {
    let mut doc = passing_is();
    doc["sharpe"] = json!(1.0);
    doc
}

pub fn transport_error() -> AppError {
    AppError::api_request_failed(
        "mock",
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
    )
}

/// 所有文件都放在临时目录中的配置
pub fn test_config(dir: &tempfile::TempDir) -> Config {
    let path = |name: &str| dir.path().join(name).display().to_string();
    Config {
        resume_file: path("alpha_resume.json"),
        alpha_ids_file: path("alpha_ids.txt"),
        alpha_details_file: path("alpha_details.json"),
        dataset_catalog_file: path("datasets.toml"),
        ..Config::default()
    }
}
