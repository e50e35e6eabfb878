//! 远程服务边界
//!
//! 上层（services / workflow / orchestrator）只依赖 `BrainApi`，
//! 测试时可以用脚本化的实现替换真实 HTTP 客户端。

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::{DatasetConfig, SimulationRequest};

/// 与传输层无关的响应
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `Retry-After` 的值（秒），缺失或无法解析时为 0
    pub retry_after: f64,
    /// `Location` 头
    pub location: Option<String>,
    /// JSON 响应体；非 JSON 时为字符串，空响应为 Null
    pub body: JsonValue,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            retry_after: 0.0,
            location: None,
            body: JsonValue::Null,
        }
    }

    pub fn with_retry_after(mut self, seconds: f64) -> Self {
        self.retry_after = seconds;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }

    /// 服务端是否仍要求等待
    pub fn is_pending(&self) -> bool {
        self.retry_after > 0.0
    }

    /// 截断后的响应体，用于日志和错误信息
    pub fn body_preview(&self) -> String {
        let text = match &self.body {
            JsonValue::Null => String::new(),
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        crate::utils::logging::truncate_text(&text, 500)
    }
}

/// 远程模拟服务能力
#[async_trait]
pub trait BrainApi: Send + Sync {
    /// POST /simulations
    async fn create_simulation(&self, request: &SimulationRequest) -> AppResult<ApiResponse>;

    /// GET 模拟进度（`Location` 返回的地址）
    async fn get_simulation_progress(&self, progress_url: &str) -> AppResult<ApiResponse>;

    /// GET /alphas/{id}
    async fn get_alpha(&self, alpha_id: &str) -> AppResult<ApiResponse>;

    /// POST /alphas/{id}/submit
    async fn create_submission(&self, alpha_id: &str) -> AppResult<ApiResponse>;

    /// GET /alphas/{id}/submit
    async fn get_submission_status(&self, alpha_id: &str) -> AppResult<ApiResponse>;

    /// GET /data-fields（分页）
    async fn get_data_fields(
        &self,
        dataset: &DatasetConfig,
        offset: usize,
        limit: usize,
    ) -> AppResult<ApiResponse>;
}
