use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 数据集配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub id: String,
    /// 数据集强制使用的 universe
    pub universe: String,
    #[serde(default)]
    pub description: String,
}

struct BuiltinDataset {
    id: &'static str,
    universe: &'static str,
    description: &'static str,
}

/// 内置数据集目录
static BUILTIN_DATASETS: phf::Map<&'static str, BuiltinDataset> = phf_map! {
    "fundamental6" => BuiltinDataset { id: "fundamental6", universe: "TOP3000", description: "公司基本面数据" },
    "analyst4" => BuiltinDataset { id: "analyst4", universe: "TOP1000", description: "分析师预期数据" },
    "model16" => BuiltinDataset { id: "model16", universe: "TOP3000", description: "模型因子数据" },
    "news12" => BuiltinDataset { id: "news12", universe: "TOP3000", description: "新闻情绪数据" },
    "pv1" => BuiltinDataset { id: "pv1", universe: "TOP3000", description: "价格成交量数据" },
    "socialmedia8" => BuiltinDataset { id: "socialmedia8", universe: "TOP3000", description: "社交媒体数据" },
};

/// 数据集目录（按名称排序，编号从 1 开始）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetCatalog {
    #[serde(default)]
    pub datasets: Vec<NamedDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedDataset {
    pub name: String,
    #[serde(flatten)]
    pub config: DatasetConfig,
}

impl DatasetCatalog {
    pub fn builtin() -> Self {
        let mut datasets: Vec<NamedDataset> = BUILTIN_DATASETS
            .entries()
            .map(|(name, d)| NamedDataset {
                name: name.to_string(),
                config: DatasetConfig {
                    id: d.id.to_string(),
                    universe: d.universe.to_string(),
                    description: d.description.to_string(),
                },
            })
            .collect();
        datasets.sort_by(|a, b| a.name.cmp(&b.name));
        Self { datasets }
    }

    pub fn get(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .map(|d| &d.config)
    }

    /// 按编号（1 开始）或名称查找
    pub fn resolve(&self, key: &str) -> Option<&NamedDataset> {
        let key = key.trim();
        if let Ok(index) = key.parse::<usize>() {
            return index.checked_sub(1).and_then(|i| self.datasets.get(i));
        }
        self.datasets.iter().find(|d| d.name == key)
    }

    /// 用于菜单显示的列表
    pub fn listing(&self) -> Vec<String> {
        self.datasets
            .iter()
            .enumerate()
            .map(|(i, d)| {
                format!(
                    "{}: {} ({}, {})",
                    i + 1,
                    d.name,
                    d.config.universe,
                    d.config.description
                )
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
