use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::category::Category;

/// 中性化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Neutralization {
    None,
    Market,
    Sector,
    Industry,
    Subindustry,
}

impl Neutralization {
    pub fn as_str(self) -> &'static str {
        match self {
            Neutralization::None => "NONE",
            Neutralization::Market => "MARKET",
            Neutralization::Sector => "SECTOR",
            Neutralization::Industry => "INDUSTRY",
            Neutralization::Subindustry => "SUBINDUSTRY",
        }
    }
}

impl std::fmt::Display for Neutralization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 由参数策略选出的、影响模拟结果的参数
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedParameters {
    pub universe: String,
    pub neutralization: Neutralization,
    pub decay: u32,
    pub truncation: f64,
    pub category: Category,
}

/// 模拟参数
///
/// 除 universe / neutralization / decay / truncation 外的字段均为固定值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSettings {
    pub instrument_type: String,
    pub region: String,
    pub universe: String,
    pub delay: u32,
    pub decay: u32,
    pub neutralization: Neutralization,
    pub truncation: f64,
    pub pasteurization: String,
    pub unit_handling: String,
    pub nan_handling: String,
    pub language: String,
    pub visualization: bool,
}

impl SimulationSettings {
    /// 使用固定字段 + 策略选出的参数构建
    pub fn from_selected(params: &SelectedParameters) -> Self {
        Self {
            instrument_type: "EQUITY".to_string(),
            region: "USA".to_string(),
            universe: params.universe.clone(),
            delay: 1,
            decay: params.decay,
            neutralization: params.neutralization,
            truncation: params.truncation,
            pasteurization: "ON".to_string(),
            unit_handling: "VERIFY".to_string(),
            nan_handling: "ON".to_string(),
            language: "FASTEXPR".to_string(),
            visualization: false,
        }
    }
}

/// 待模拟的候选：一个表达式 + 一组参数
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub expression: String,
    pub settings: SimulationSettings,
    /// 仅供本地统计，不发送给 API
    pub category: Category,
}

impl Candidate {
    pub fn new(expression: impl Into<String>, params: &SelectedParameters) -> Self {
        Self {
            expression: expression.into(),
            settings: SimulationSettings::from_selected(params),
            category: params.category,
        }
    }

    /// 参数快照（JSON 对象），用于指纹计算和持久化
    pub fn parameters(&self) -> JsonValue {
        serde_json::to_value(&self.settings).unwrap_or(JsonValue::Null)
    }

    /// 发送给 API 的请求体（不含内部字段）
    pub fn to_request(&self) -> SimulationRequest {
        SimulationRequest {
            kind: "REGULAR".to_string(),
            settings: self.settings.clone(),
            regular: self.expression.clone(),
        }
    }
}

/// 模拟请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: SimulationSettings,
    pub regular: String,
}
