use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::models::settings::Neutralization;

/// 表达式策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 日内策略
    Intraday,
    /// 成交量策略
    Volume,
    /// 波动率策略
    Volatility,
    /// 动量策略
    Momentum,
    /// 均值回归策略
    MeanReversion,
    /// 复杂策略
    Complex,
    /// 默认策略
    Default,
}

/// 某类策略允许的参数范围
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub universes: &'static [&'static str],
    pub neutralizations: &'static [Neutralization],
    pub decay: RangeInclusive<u32>,
    pub truncation: RangeInclusive<f64>,
}

impl Category {
    /// 匹配优先级：靠前的类型先匹配
    pub const PRIORITY: [Category; 6] = [
        Category::Intraday,
        Category::Volume,
        Category::Volatility,
        Category::Momentum,
        Category::MeanReversion,
        Category::Complex,
    ];

    /// 识别关键字（对小写表达式做子串匹配）
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Intraday => &["open", "close", "high", "low", "(close - open)", "(open - delay"],
            Category::Volume => &["volume", "turnover", "sharesout"],
            Category::Volatility => &["std_dev", "volatility", "ts_std_dev", "power("],
            Category::Momentum => &["ts_rank", "rank(", "correlation", "ts_corr"],
            Category::MeanReversion => &["mean(", "group_mean", "ts_mean", "delay("],
            Category::Complex => &["regression_neut", "vector_neut", "trade_when", "if_else"],
            Category::Default => &[],
        }
    }

    pub fn rules(self) -> CategoryRules {
        use Neutralization as N;
        match self {
            Category::Intraday => CategoryRules {
                universes: &["TOP1000", "TOP500"],
                neutralizations: &[N::Subindustry, N::Industry],
                decay: 0..=5,
                truncation: 0.05..=0.10,
            },
            Category::Volume => CategoryRules {
                universes: &["TOP3000", "TOP1000"],
                neutralizations: &[N::Market, N::Sector],
                decay: 2..=8,
                truncation: 0.06..=0.12,
            },
            Category::Volatility => CategoryRules {
                universes: &["TOP3000", "TOP1000"],
                neutralizations: &[N::Subindustry, N::Industry],
                decay: 5..=15,
                truncation: 0.04..=0.08,
            },
            Category::Momentum => CategoryRules {
                universes: &["TOP1000", "TOP500"],
                neutralizations: &[N::Industry, N::Sector],
                decay: 3..=10,
                truncation: 0.07..=0.12,
            },
            Category::MeanReversion => CategoryRules {
                universes: &["TOP3000", "TOP1000"],
                neutralizations: &[N::Subindustry, N::Market],
                decay: 1..=6,
                truncation: 0.05..=0.10,
            },
            Category::Complex => CategoryRules {
                universes: &["TOP1000", "TOP500"],
                neutralizations: &[N::Subindustry, N::Industry],
                decay: 8..=18,
                truncation: 0.03..=0.07,
            },
            Category::Default => CategoryRules {
                universes: &["TOP3000", "TOP1000"],
                neutralizations: &[N::Subindustry, N::Industry],
                decay: 0..=10,
                truncation: 0.05..=0.10,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Intraday => "intraday",
            Category::Volume => "volume",
            Category::Volatility => "volatility",
            Category::Momentum => "momentum",
            Category::MeanReversion => "mean_reversion",
            Category::Complex => "complex",
            Category::Default => "default",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
