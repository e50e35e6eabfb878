//! 表达式生成 - 业务能力层
//!
//! 从数据集拉取 MATRIX 字段，再按策略模板生成 FASTEXPR 表达式

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::clients::BrainApi;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::DatasetConfig;

/// 每页字段数
pub const FIELDS_PAGE_SIZE: usize = 50;

/// 单字段模板，`{f}` 为字段占位
const BASIC_TEMPLATES: &[&str] = &[
    "rank({f})",
    "-rank({f})",
    "ts_rank({f}, 20)",
    "ts_delta({f}, 5)",
    "zscore({f})",
    "ts_mean({f}, 10) - {f}",
    "group_rank({f}, industry)",
];

/// 双字段模板，`{a}` / `{b}` 为字段占位
const PAIR_TEMPLATES: &[&str] = &[
    "rank({a}) - rank({b})",
    "rank({a} / {b})",
    "ts_corr({a}, {b}, 20)",
    "vector_neut(rank({a}), rank({b}))",
];

/// 多因子模式下参与两两组合的字段上限
const MAX_PAIR_FIELDS: usize = 12;

/// 策略模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    /// 基础策略模式
    Basic = 1,
    /// 多因子组合模式
    MultiFactor = 2,
}

impl StrategyMode {
    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Basic),
            2 => Some(Self::MultiFactor),
            _ => None,
        }
    }
}

impl std::str::FromStr for StrategyMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| {
                ConfigError::InvalidStrategy {
                    value: s.to_string(),
                }
                .into()
            })
    }
}

/// 表达式生产者：把字段列表变成表达式序列
pub trait ExpressionProducer {
    fn produce(&self, fields: &[String]) -> Vec<String>;
}

/// 基于模板的表达式生成策略
#[derive(Debug, Clone)]
pub struct TemplateStrategy {
    mode: StrategyMode,
}

impl TemplateStrategy {
    pub fn new(mode: StrategyMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> StrategyMode {
        self.mode
    }
}

/// 过滤掉不能直接放进表达式的字段 ID，保持原顺序并去重
fn usable_fields(fields: &[String]) -> Vec<&str> {
    let pattern = Regex::new(r"^[A-Za-z0-9_]+$").ok();
    let mut seen = std::collections::HashSet::new();
    fields
        .iter()
        .map(String::as_str)
        .filter(|f| {
            let ok = pattern.as_ref().is_some_and(|re| re.is_match(f));
            if !ok {
                debug!("跳过无效字段: {}", f);
            }
            ok
        })
        .filter(|f| seen.insert(*f))
        .collect()
}

impl ExpressionProducer for TemplateStrategy {
    fn produce(&self, fields: &[String]) -> Vec<String> {
        let fields = usable_fields(fields);

        let expressions: Vec<String> = match self.mode {
            StrategyMode::Basic => fields
                .iter()
                .flat_map(|f| BASIC_TEMPLATES.iter().map(move |t| t.replace("{f}", f)))
                .collect(),
            StrategyMode::MultiFactor => {
                let head = &fields[..fields.len().min(MAX_PAIR_FIELDS)];
                let mut out = Vec::new();
                for (i, a) in head.iter().enumerate() {
                    for b in &head[i + 1..] {
                        for template in PAIR_TEMPLATES {
                            out.push(template.replace("{a}", a).replace("{b}", b));
                        }
                    }
                }
                out
            }
        };

        info!("生成了 {} 个Alpha表达式", expressions.len());
        expressions
    }
}

/// 拉取数据集的全部 MATRIX 字段 ID
///
/// 首页失败视为错误；之后失败的页会被跳过
pub async fn fetch_matrix_fields<A: BrainApi + ?Sized>(
    api: &A,
    dataset: &DatasetConfig,
) -> AppResult<Vec<String>> {
    let first = api.get_data_fields(dataset, 0, FIELDS_PAGE_SIZE).await?;
    if first.status != 200 {
        return Err(AppError::bad_status(
            "data-fields",
            first.status,
            first.body_preview(),
        ));
    }

    let total = first
        .body
        .get("count")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| AppError::missing_field("data-fields", "count"))? as usize;

    let mut all_fields: Vec<JsonValue> = page_results(&first.body);

    for offset in (FIELDS_PAGE_SIZE..total).step_by(FIELDS_PAGE_SIZE) {
        match api.get_data_fields(dataset, offset, FIELDS_PAGE_SIZE).await {
            Ok(resp) if resp.status == 200 => all_fields.extend(page_results(&resp.body)),
            Ok(resp) => warn!("⚠️ 字段分页 offset={} 失败 (状态码: {})，跳过", offset, resp.status),
            Err(e) => warn!("⚠️ 字段分页 offset={} 请求异常: {}，跳过", offset, e),
        }
    }

    let matrix_fields: Vec<String> = all_fields
        .iter()
        .filter(|field| field.get("type").and_then(JsonValue::as_str) == Some("MATRIX"))
        .filter_map(|field| field.get("id").and_then(JsonValue::as_str))
        .map(str::to_string)
        .collect();

    info!("获取到 {} 个数据字段", matrix_fields.len());
    Ok(matrix_fields)
}

fn page_results(body: &JsonValue) -> Vec<JsonValue> {
    body.get("results")
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default()
}
