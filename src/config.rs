use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 凭据文件（JSON: ["用户名", "密码"]）
    pub credentials_file: String,
    /// 依次尝试的 API 基础 URL，全部认证失败时使用第一个
    pub api_base_urls: Vec<String>,
    /// 依次尝试的认证端点
    pub auth_endpoints: Vec<String>,
    /// 单次认证请求超时（秒）
    pub auth_timeout_secs: u64,
    /// 断点续传记录文件
    pub resume_file: String,
    /// 合格 Alpha ID 列表文件
    pub alpha_ids_file: String,
    /// 合格 Alpha 详细信息文件
    pub alpha_details_file: String,
    /// 数据集目录 TOML 文件（不存在时使用内置目录）
    pub dataset_catalog_file: String,
    /// 两个模拟之间的间隔（秒）
    pub item_pause_secs: u64,
    /// 两次提交之间的间隔（秒）
    pub submit_pause_secs: u64,
    /// 提交失败后的重试等待（秒）
    pub submit_retry_secs: u64,
    /// 单个 Alpha 最大提交尝试次数
    pub submit_max_attempts: usize,
    /// 模拟完成后等待指标计算的时间（秒）
    pub settle_delay_secs: u64,
    /// 自动模式下提交的 Alpha 数量
    pub auto_submit_count: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_file: "brain_credentials.txt".to_string(),
            api_base_urls: vec![
                "https://api.worldquantbrain.com".to_string(),
                "https://platform.worldquantbrain.com/api".to_string(),
                "https://brain.worldquant.com/api".to_string(),
            ],
            auth_endpoints: vec![
                "/authentication".to_string(),
                "/auth".to_string(),
                "/login".to_string(),
            ],
            auth_timeout_secs: 10,
            resume_file: "alpha_resume.json".to_string(),
            alpha_ids_file: "alpha_ids.txt".to_string(),
            alpha_details_file: "alpha_details.json".to_string(),
            dataset_catalog_file: "datasets.toml".to_string(),
            item_pause_secs: 5,
            submit_pause_secs: 10,
            submit_retry_secs: 3,
            submit_max_attempts: 5,
            settle_delay_secs: 3,
            auto_submit_count: 2,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            credentials_file: std::env::var("BRAIN_CREDENTIALS_FILE").unwrap_or(default.credentials_file),
            api_base_urls: std::env::var("BRAIN_API_BASE_URLS").ok().map(|v| split_list(&v)).filter(|v| !v.is_empty()).unwrap_or(default.api_base_urls),
            auth_endpoints: std::env::var("BRAIN_AUTH_ENDPOINTS").ok().map(|v| split_list(&v)).filter(|v| !v.is_empty()).unwrap_or(default.auth_endpoints),
            auth_timeout_secs: std::env::var("AUTH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auth_timeout_secs),
            resume_file: std::env::var("RESUME_FILE").unwrap_or(default.resume_file),
            alpha_ids_file: std::env::var("ALPHA_IDS_FILE").unwrap_or(default.alpha_ids_file),
            alpha_details_file: std::env::var("ALPHA_DETAILS_FILE").unwrap_or(default.alpha_details_file),
            dataset_catalog_file: std::env::var("DATASET_CATALOG_FILE").unwrap_or(default.dataset_catalog_file),
            item_pause_secs: std::env::var("ITEM_PAUSE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.item_pause_secs),
            submit_pause_secs: std::env::var("SUBMIT_PAUSE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_pause_secs),
            submit_retry_secs: std::env::var("SUBMIT_RETRY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_retry_secs),
            submit_max_attempts: std::env::var("SUBMIT_MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_max_attempts),
            settle_delay_secs: std::env::var("SETTLE_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_delay_secs),
            auto_submit_count: std::env::var("AUTO_SUBMIT_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_submit_count),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn item_pause(&self) -> Duration {
        Duration::from_secs(self.item_pause_secs)
    }

    pub fn submit_pause(&self) -> Duration {
        Duration::from_secs(self.submit_pause_secs)
    }

    pub fn submit_retry(&self) -> Duration {
        Duration::from_secs(self.submit_retry_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
