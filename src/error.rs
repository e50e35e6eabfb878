use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 收到中断信号，断点续传记录已保存
    #[error("用户中断 (本次会话已测试 {session_tested} 个表达式)")]
    Interrupted { session_tested: usize },
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回了非预期的状态码
    #[error("API返回非预期状态码 ({endpoint}): {status}, 响应: {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应缺少必需字段
    #[error("API响应缺少字段 '{field}' ({endpoint})")]
    MissingField { endpoint: String, field: String },
    /// 提交被服务端明确拒绝
    #[error("Alpha {alpha_id} 提交被拒绝 (状态码: {status})")]
    Rejected { alpha_id: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    JsonParseFailed(#[source] serde_json::Error),
}

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 凭据文件无法读取或格式不正确
    #[error("无法加载凭据文件 ({path}): {reason}")]
    CredentialsUnavailable { path: String, reason: String },
    /// 所有认证端点都失败
    #[error("所有认证端点都失败 (共尝试 {attempts} 个)")]
    AllEndpointsFailed { attempts: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 删除文件失败
    #[error("删除文件失败 ({path}): {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 数据集不存在
    #[error("未知的数据集: {name}")]
    UnknownDataset { name: String },
    /// 无效的运行模式
    #[error("无效的运行模式: {value}")]
    InvalidMode { value: String },
    /// 无效的策略模式
    #[error("无效的策略模式: {value}")]
    InvalidStrategy { value: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|url| url.to_string())
            .unwrap_or_default();
        AppError::api_request_failed(endpoint, err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建状态码错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        AppError::Api(ApiError::BadStatus {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        })
    }

    /// 创建缺少字段错误
    pub fn missing_field(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        AppError::Api(ApiError::MissingField {
            endpoint: endpoint.into(),
            field: field.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为中断信号
    pub fn is_interrupted(&self) -> bool {
        matches!(self, AppError::Interrupted { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
