use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::models::category::Category;

/// 子检查项状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Pending,
    /// 服务端返回的其他状态（如 WARNING），以及缺失或为 null 的状态
    #[default]
    #[serde(other)]
    Other,
}

/// 缺失和 `null` 都按默认值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 服务端返回的单个检查项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCheck {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
}

/// 样本内（IS）指标文档
///
/// `margin` 即 IC Mean。缺失或为 null 的数值按 0 处理，其余字段原样保留。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsMetrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sharpe: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fitness: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub turnover: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub margin: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checks: Vec<SubCheck>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl IsMetrics {
    pub fn ic_mean(&self) -> f64 {
        self.margin
    }

    pub fn find_check(&self, name: &str) -> Option<&SubCheck> {
        self.checks.iter().find(|check| check.name == name)
    }
}

/// 单个候选的模拟结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub expression: String,
    pub alpha_id: String,
    pub passed_all_checks: bool,
    pub metrics: IsMetrics,
    pub parameters: JsonValue,
    pub expression_type: Category,
    pub timestamp: String,
}

/// 合格 Alpha 的详细记录（alpha_details.json 中的一项）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaDetail {
    pub alpha_id: String,
    pub expression: String,
    pub timestamp: String,
    pub metrics: IsMetrics,
    pub parameters: JsonValue,
    pub expression_type: Category,
}

impl From<&JobOutcome> for AlphaDetail {
    fn from(outcome: &JobOutcome) -> Self {
        Self {
            alpha_id: outcome.alpha_id.clone(),
            expression: outcome.expression.clone(),
            timestamp: outcome.timestamp.clone(),
            metrics: outcome.metrics.clone(),
            parameters: outcome.parameters.clone(),
            expression_type: outcome.expression_type,
        }
    }
}

/// 当前本地时间（ISO 8601，秒精度）
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metrics_tolerate_missing_and_unknown_fields() {
        let metrics: IsMetrics = serde_json::from_value(json!({
            "sharpe": 1.7,
            "returns": 0.12,
            "checks": [
                {"name": "LOW_SHARPE", "result": "PASS", "value": 1.7, "limit": 1.25},
                {"name": "CONCENTRATED_WEIGHT", "result": "WARNING"}
            ]
        }))
        .unwrap();

        assert_eq!(metrics.sharpe, 1.7);
        assert_eq!(metrics.fitness, 0.0);
        assert_eq!(metrics.checks[1].result, CheckStatus::Other);
        assert_eq!(metrics.checks[1].value, None);
        assert_eq!(metrics.extra["returns"], json!(0.12));
    }

    #[test]
    fn test_metrics_treat_null_as_zero() {
        let metrics: IsMetrics = serde_json::from_value(json!({
            "sharpe": 1.7,
            "fitness": null,
            "margin": null,
            "checks": [
                {"name": "LOW_SHARPE", "result": null},
                {"name": "LOW_FITNESS"}
            ]
        }))
        .unwrap();

        assert_eq!(metrics.sharpe, 1.7);
        assert_eq!(metrics.fitness, 0.0);
        assert_eq!(metrics.margin, 0.0);
        assert_eq!(metrics.checks[0].result, CheckStatus::Other);
        assert_eq!(metrics.checks[1].result, CheckStatus::Other);

        let no_checks: IsMetrics = serde_json::from_value(json!({ "checks": null })).unwrap();
        assert!(no_checks.checks.is_empty());
    }
}
