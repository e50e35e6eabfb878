/// Brain API 客户端
///
/// 封装所有与远程模拟服务相关的 HTTP 调用
use crate::clients::brain_api::{ApiResponse, BrainApi};
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};
use crate::models::{DatasetConfig, SimulationRequest};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Alpha-Batch-Submit/2.0";

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 从 JSON 文件加载凭据，格式为 `["用户名", "密码"]`，支持 `~` 开头的路径
    pub fn load(path: &str) -> Result<Self, AuthError> {
        let full_path = expand_home(path);
        let content = std::fs::read_to_string(&full_path).map_err(|e| {
            AuthError::CredentialsUnavailable {
                path: full_path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let (username, password): (String, String) =
            serde_json::from_str(&content).map_err(|e| AuthError::CredentialsUnavailable {
                path: full_path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self::new(username, password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Brain API 客户端
pub struct BrainClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl BrainClient {
    /// 使用固定的基础 URL 创建客户端（不做认证）
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// 加载凭据并依次尝试所有基础 URL × 认证端点
    ///
    /// 全部失败时不会报错，而是使用第一个基础 URL 继续运行
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let default_base = config
            .api_base_urls
            .first()
            .cloned()
            .unwrap_or_else(|| Config::default().api_base_urls[0].clone());

        let credentials = match Credentials::load(&config.credentials_file) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("⚠️ 认证错误: {}，使用默认 API URL 继续", e);
                return Self::new(default_base, None);
            }
        };

        info!("🔐 尝试认证用户: {}", credentials.username);
        let mut client = Self::new(default_base, Some(credentials))?;

        match client.authenticate(config).await {
            Ok(base_url) => {
                info!("✓ 认证成功! API 地址: {}", base_url);
                client.base_url = base_url;
            }
            Err(e) => {
                warn!("⚠️ {}，使用默认 API URL 继续: {}", e, client.base_url);
            }
        }

        Ok(client)
    }

    /// 返回认证成功的基础 URL
    async fn authenticate(&self, config: &Config) -> Result<String, AuthError> {
        let mut attempts = 0;

        for base_url in &config.api_base_urls {
            let base_url = base_url.trim_end_matches('/');
            for endpoint in &config.auth_endpoints {
                attempts += 1;
                let full_url = format!("{}{}", base_url, endpoint);
                debug!("尝试认证端点: {}", full_url);

                let result = self
                    .request(Method::POST, &full_url)
                    .timeout(config.auth_timeout())
                    .send()
                    .await;

                match result {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        match status {
                            200 | 201 => return Ok(base_url.to_string()),
                            400 => {
                                let text = response.text().await.unwrap_or_default();
                                warn!(
                                    "  {} 400错误: {}",
                                    full_url,
                                    crate::utils::logging::truncate_text(&text, 200)
                                );
                            }
                            401 => warn!("  {} 401错误: 认证失败，请检查用户名密码", full_url),
                            404 => debug!("  {} 404错误: 端点不存在", full_url),
                            other => warn!("  {} 其他错误: {}", full_url, other),
                        }
                    }
                    Err(e) => {
                        warn!("  {} 请求异常: {}", full_url, e);
                    }
                }
            }
        }

        Err(AuthError::AllEndpointsFailed { attempts })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 构建请求，所有请求都附带 basic auth
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, endpoint: &str) -> AppResult<ApiResponse> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        self.read_response(response, endpoint).await
    }

    async fn read_response(&self, response: Response, endpoint: &str) -> AppResult<ApiResponse> {
        let status = response.status().as_u16();
        let headers = response.headers();

        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0);

        let location = headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                if v.starts_with('/') {
                    self.url(v)
                } else {
                    v.to_string()
                }
            });

        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        };

        debug!(
            "{} -> 状态码: {}, Retry-After: {}, Location: {:?}",
            endpoint, status, retry_after, location
        );

        Ok(ApiResponse {
            status,
            retry_after,
            location,
            body,
        })
    }
}

#[async_trait]
impl BrainApi for BrainClient {
    async fn create_simulation(&self, request: &SimulationRequest) -> AppResult<ApiResponse> {
        let url = self.url("/simulations");
        debug!("模拟请求数据: {}", serde_json::to_string(request)?);
        let builder = self.request(Method::POST, &url).json(request);
        self.send(builder, &url).await
    }

    async fn get_simulation_progress(&self, progress_url: &str) -> AppResult<ApiResponse> {
        let builder = self.request(Method::GET, progress_url);
        self.send(builder, progress_url).await
    }

    async fn get_alpha(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        let url = self.url(&format!("/alphas/{}", alpha_id));
        let builder = self.request(Method::GET, &url);
        self.send(builder, &url).await
    }

    async fn create_submission(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        let url = self.url(&format!("/alphas/{}/submit", alpha_id));
        let builder = self.request(Method::POST, &url);
        self.send(builder, &url).await
    }

    async fn get_submission_status(&self, alpha_id: &str) -> AppResult<ApiResponse> {
        let url = self.url(&format!("/alphas/{}/submit", alpha_id));
        let builder = self.request(Method::GET, &url);
        self.send(builder, &url).await
    }

    async fn get_data_fields(
        &self,
        dataset: &DatasetConfig,
        offset: usize,
        limit: usize,
    ) -> AppResult<ApiResponse> {
        let url = self.url("/data-fields");
        let builder = self.request(Method::GET, &url).query(&[
            ("instrumentType", "EQUITY".to_string()),
            ("region", "USA".to_string()),
            ("delay", "1".to_string()),
            ("universe", dataset.universe.clone()),
            ("dataset.id", dataset.id.clone()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        self.send(builder, &url).await
    }
}

/// 展开 `~` 开头的路径
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
