//! 智能参数配置 - 业务能力层
//!
//! 根据表达式类型选择模拟参数。随机源由调用方注入，测试时可固定种子。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Category, Neutralization, SelectedParameters};

/// 识别表达式类型
///
/// 按 `Category::PRIORITY` 的顺序对小写表达式做关键字子串匹配，第一个命中的类型胜出
pub fn classify(expression: &str) -> Category {
    let expression_lower = expression.to_lowercase();

    Category::PRIORITY
        .into_iter()
        .find(|category| {
            category
                .keywords()
                .iter()
                .any(|keyword| expression_lower.contains(keyword))
        })
        .unwrap_or(Category::Default)
}

/// 参数选择策略
pub struct ParameterPolicy<R: Rng = StdRng> {
    rng: R,
}

impl ParameterPolicy<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ParameterPolicy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 为表达式选择参数
    ///
    /// 数据集指定了非空 universe 时总是使用它；其余参数在该类型的范围内随机选取，
    /// truncation 保留 3 位小数
    pub fn select_parameters(
        &mut self,
        expression: &str,
        dataset_universe: Option<&str>,
    ) -> SelectedParameters {
        let category = classify(expression);
        let rules = category.rules();

        let universe = match dataset_universe.map(str::trim).filter(|u| !u.is_empty()) {
            Some(universe) => universe.to_string(),
            None => rules
                .universes
                .choose(&mut self.rng)
                .copied()
                .unwrap_or("TOP3000")
                .to_string(),
        };

        let neutralization = rules
            .neutralizations
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Neutralization::Industry);

        let decay = self.rng.gen_range(rules.decay.clone());
        let truncation = round_to(self.rng.gen_range(rules.truncation.clone()), 3);

        SelectedParameters {
            universe,
            neutralization,
            decay,
            truncation,
            category,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_beats_momentum() {
        assert_eq!(classify("ts_rank(volume, 5)"), Category::Volume);
    }

    #[test]
    fn test_classify_each_category() {
        assert_eq!(classify("close - open"), Category::Intraday);
        assert_eq!(classify("ts_std_dev(returns, 20)"), Category::Volatility);
        assert_eq!(classify("rank(eps)"), Category::Momentum);
        assert_eq!(classify("ts_mean(eps, 10)"), Category::MeanReversion);
        assert_eq!(classify("vector_neut(eps, sales)"), Category::Complex);
        assert_eq!(classify("eps / sales"), Category::Default);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("TS_RANK(EPS, 5)"), Category::Momentum);
    }

    #[test]
    fn test_dataset_universe_always_wins() {
        for seed in 0..50 {
            let mut policy = ParameterPolicy::with_seed(seed);
            let params = policy.select_parameters("close - open", Some("TOP500"));
            assert_eq!(params.universe, "TOP500");
            assert_eq!(params.category, Category::Intraday);
        }
    }

    #[test]
    fn test_empty_universe_is_not_an_override() {
        let rules = Category::Intraday.rules();
        for seed in 0..50 {
            let mut policy = ParameterPolicy::with_seed(seed);
            for empty in ["", "  "] {
                let params = policy.select_parameters("close - open", Some(empty));
                assert!(rules.universes.contains(&params.universe.as_str()));
            }
        }
    }

    #[test]
    fn test_selected_values_stay_in_category_ranges() {
        let mut policy = ParameterPolicy::with_seed(7);
        for expression in ["close - open", "ts_rank(volume, 5)", "ts_std_dev(x, 5)", "eps"] {
            let rules = classify(expression).rules();
            for _ in 0..200 {
                let params = policy.select_parameters(expression, None);
                assert!(rules.universes.contains(&params.universe.as_str()));
                assert!(rules.neutralizations.contains(&params.neutralization));
                assert!(rules.decay.contains(&params.decay));
                assert!(params.truncation >= *rules.truncation.start() - 1e-9);
                assert!(params.truncation <= *rules.truncation.end() + 1e-9);
                assert_eq!(round_to(params.truncation, 3), params.truncation);
            }
        }
    }

    #[test]
    fn test_same_seed_same_parameters() {
        let mut a = ParameterPolicy::with_seed(42);
        let mut b = ParameterPolicy::with_seed(42);
        for _ in 0..20 {
            assert_eq!(
                a.select_parameters("rank(eps)", None),
                b.select_parameters("rank(eps)", None)
            );
        }
    }
}
