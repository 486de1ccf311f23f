use std::sync::{Arc, RwLock};
use std::time::{Duration as StdDuration, Instant};

use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::estimate::{ExerciseEstimate, MealEstimate};
use crate::models::profile::Profile;
use crate::services::prompt_templates::{
    exercise_burn_prompt, meal_image_prompt, meal_name_prompt,
};

/// Gateway to the external Gemini estimator. The provider only exists while
/// an API key is configured; every estimate call checks that before any
/// network I/O happens.
#[derive(Clone)]
pub struct EstimationService {
    provider: Arc<RwLock<Option<Arc<GeminiProvider>>>>,
    config: Arc<RwLock<EstimationConfig>>,
}

#[derive(Debug, Clone)]
struct EstimationConfig {
    api_key: Option<String>,
    api_base_url: String,
    model: String,
    http_timeout: StdDuration,
}

impl EstimationService {
    pub fn new() -> AppResult<Self> {
        let config = EstimationConfig::from_env();
        let provider = config.build_provider()?;

        Ok(Self {
            provider: Arc::new(RwLock::new(provider)),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Applies the key kept in settings. The environment key, when present,
    /// takes precedence so a developer override survives settings changes.
    pub fn configure(&self, stored_api_key: Option<&str>) -> AppResult<()> {
        let config = EstimationConfig::from_env().with_stored_key(stored_api_key);

        let mut provider_update: Option<Option<Arc<GeminiProvider>>> = None;

        {
            let mut current = self.config.write().expect("config lock poisoned");
            if current.differs_from(&config) {
                provider_update = Some(config.build_provider()?);
            }
            *current = config;
        }

        if let Some(update) = provider_update {
            let mut guard = self.provider.write().expect("provider lock poisoned");
            *guard = update;
        }

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.provider
            .read()
            .expect("provider lock poisoned")
            .is_some()
    }

    pub async fn estimate_meal_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<MealEstimate> {
        if image.is_empty() {
            return Err(AppError::validation("图片内容不能为空"));
        }
        if !mime_type.starts_with("image/") {
            return Err(AppError::validation(format!(
                "不支持的图片类型: {mime_type}"
            )));
        }

        let provider = self.current_provider()?;
        provider.estimate_meal_from_image(image, mime_type).await
    }

    pub async fn estimate_meal_from_name(&self, description: &str) -> AppResult<MealEstimate> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("食物描述不能为空"));
        }

        let provider = self.current_provider()?;
        provider.estimate_meal_from_name(trimmed).await
    }

    pub async fn estimate_exercise_burn(
        &self,
        profile: &Profile,
        description: &str,
    ) -> AppResult<ExerciseEstimate> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("运动描述不能为空"));
        }

        let provider = self.current_provider()?;
        provider.estimate_exercise_burn(profile, trimmed).await
    }

    fn current_provider(&self) -> AppResult<Arc<GeminiProvider>> {
        let guard = self.provider.read().expect("provider lock poisoned");
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::ai(AiErrorCode::MissingApiKey, "Gemini API Key 未配置"))
    }
}

impl EstimationConfig {
    fn from_env() -> Self {
        let api_key = std::env::var("MACROTRACK_GEMINI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let api_base_url = std::env::var("MACROTRACK_GEMINI_BASE_URL")
            .ok()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());
        let model = std::env::var("MACROTRACK_GEMINI_MODEL")
            .ok()
            .unwrap_or_else(|| "gemini-2.5-flash".to_string());

        Self {
            api_key,
            api_base_url,
            model,
            http_timeout: StdDuration::from_secs(30),
        }
    }

    fn with_stored_key(mut self, stored: Option<&str>) -> Self {
        if self.api_key.is_none() {
            self.api_key = stored
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
        }
        self
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.api_key != other.api_key
            || self.api_base_url != other.api_base_url
            || self.model != other.model
            || self.http_timeout != other.http_timeout
    }

    fn build_provider(&self) -> AppResult<Option<Arc<GeminiProvider>>> {
        match &self.api_key {
            Some(api_key) => {
                let provider = GeminiProvider::try_new(self, api_key.clone())?;
                Ok(Some(Arc::new(provider)))
            }
            None => Ok(None),
        }
    }
}

/// The three estimator operations share one wire invocation path but carry
/// their own prompt and payload parts.
#[derive(Clone, Copy)]
enum GeminiOperation {
    MealFromImage,
    MealFromName,
    ExerciseBurn,
}

impl GeminiOperation {
    fn as_str(self) -> &'static str {
        match self {
            GeminiOperation::MealFromImage => "estimateMealFromImage",
            GeminiOperation::MealFromName => "estimateMealFromName",
            GeminiOperation::ExerciseBurn => "estimateExerciseBurn",
        }
    }
}

/// Narrow seam over the external estimator so command flows can be tested
/// against a local mock server.
#[async_trait::async_trait]
pub trait NutritionEstimator: Send + Sync {
    async fn estimate_meal_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<MealEstimate>;

    async fn estimate_meal_from_name(&self, description: &str) -> AppResult<MealEstimate>;

    async fn estimate_exercise_burn(
        &self,
        profile: &Profile,
        description: &str,
    ) -> AppResult<ExerciseEstimate>;
}

struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    fn try_new(config: &EstimationConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("初始化 Gemini HTTP 客户端失败: {err}")))?;

        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        let endpoint = format!("{}/v1beta/models/{}:generateContent", base_url, config.model);

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    async fn invoke_generate(
        &self,
        operation: GeminiOperation,
        parts: JsonValue,
    ) -> AppResult<JsonValue> {
        let correlation_id = Uuid::new_v4().to_string();
        let request_body = json!({ "contents": [{ "parts": parts }] });
        let backoff_schedule = [
            StdDuration::from_secs(0),
            StdDuration::from_secs(1),
            StdDuration::from_secs(2),
            StdDuration::from_secs(4),
        ];

        let mut last_error: Option<AppError> = None;

        for (attempt, delay) in backoff_schedule.iter().enumerate() {
            if *delay > StdDuration::from_secs(0) {
                sleep(*delay).await;
            }

            debug!(
                target: "app::ai::gemini",
                operation = operation.as_str(),
                attempt = attempt + 1,
                correlation_id = %correlation_id,
                "invoking Gemini"
            );

            let start = Instant::now();
            let response = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&request_body)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let latency_ms = start.elapsed().as_millis();
                        debug!(
                            target: "app::ai::gemini",
                            correlation_id = %correlation_id,
                            latency_ms,
                            "Gemini responded"
                        );

                        let body: JsonValue = resp.json().await.map_err(|err| {
                            AppError::ai_with_details(
                                AiErrorCode::InvalidResponse,
                                "解析 Gemini 响应失败",
                                Some(correlation_id.as_str()),
                                Some(json!({ "reason": err.to_string() })),
                            )
                        })?;

                        let content = body
                            .pointer("/candidates/0/content/parts/0/text")
                            .and_then(|value| value.as_str())
                            .ok_or_else(|| {
                                AppError::ai_with_details(
                                    AiErrorCode::InvalidResponse,
                                    "Gemini 响应缺少 candidates 文本内容",
                                    Some(correlation_id.as_str()),
                                    Some(json!({ "reason": "missing_candidates_text" })),
                                )
                            })?;

                        return Self::parse_content(content, &correlation_id);
                    }

                    let (error, retryable) = Self::map_http_error(status, correlation_id.as_str());
                    warn!(
                        target: "app::ai::gemini",
                        correlation_id = %correlation_id,
                        status = status.as_u16(),
                        retryable,
                        "Gemini returned non-success status"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                    continue;
                }
                Err(err) => {
                    let (error, retryable) = Self::error_from_reqwest(err, correlation_id.as_str());
                    warn!(
                        target: "app::ai::gemini",
                        correlation_id = %correlation_id,
                        retryable,
                        "Gemini request error"
                    );

                    if !retryable || attempt == backoff_schedule.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                    continue;
                }
            }
        }

        if let Some(error) = last_error {
            Err(error)
        } else {
            Err(AppError::ai_with_details(
                AiErrorCode::GeminiUnavailable,
                "Gemini 请求失败",
                Some(correlation_id.as_str()),
                None,
            ))
        }
    }

    /// Strips incidental markdown fences, then requires strictly valid JSON.
    fn parse_content(content: &str, correlation_id: &str) -> AppResult<JsonValue> {
        let trimmed = content.trim();
        let cleaned = if trimmed.starts_with("```") {
            let without_prefix = trimmed
                .trim_start_matches("```json")
                .trim_start_matches("```JSON")
                .trim_start_matches("```");
            let without_suffix = without_prefix.trim_end_matches("```").trim();
            without_suffix.to_string()
        } else {
            trimmed.to_string()
        };

        serde_json::from_str(&cleaned).map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::InvalidResponse,
                format!("Gemini 响应内容非 JSON: {err}"),
                Some(correlation_id),
                Some(json!({ "reason": "invalid_json" })),
            )
        })
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> (AppError, bool) {
        match status.as_u16() {
            401 => (
                AppError::ai_with_details(
                    AiErrorCode::MissingApiKey,
                    "Gemini API Key 无效或未授权",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            403 => (
                AppError::ai_with_details(
                    AiErrorCode::Forbidden,
                    "Gemini API 权限不足",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            429 => (
                AppError::ai_with_details(
                    AiErrorCode::RateLimited,
                    "Gemini 请求过于频繁，请稍后重试",
                    Some(correlation_id),
                    None,
                ),
                true,
            ),
            code @ 500..=599 => (
                AppError::ai_with_details(
                    AiErrorCode::GeminiUnavailable,
                    format!("Gemini 服务暂时不可用 (状态码 {code})"),
                    Some(correlation_id),
                    None,
                ),
                true,
            ),
            400 => (
                AppError::ai_with_details(
                    AiErrorCode::InvalidRequest,
                    "Gemini 请求格式无效",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            404 => (
                AppError::ai_with_details(
                    AiErrorCode::InvalidRequest,
                    "Gemini 接口地址无效",
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
            code => (
                AppError::ai_with_details(
                    AiErrorCode::Unknown,
                    format!("Gemini 返回错误状态码 {code}"),
                    Some(correlation_id),
                    None,
                ),
                false,
            ),
        }
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> (AppError, bool) {
        if err.is_timeout() {
            (
                AppError::ai_with_details(
                    AiErrorCode::HttpTimeout,
                    "Gemini 请求超时",
                    Some(correlation_id),
                    None,
                ),
                true,
            )
        } else if err.is_connect() {
            (
                AppError::ai_with_details(
                    AiErrorCode::GeminiUnavailable,
                    "Gemini 网络连接失败",
                    Some(correlation_id),
                    None,
                ),
                true,
            )
        } else if let Some(status) = err.status() {
            Self::map_http_error(status, correlation_id)
        } else {
            (
                AppError::ai_with_details(
                    AiErrorCode::Unknown,
                    format!("Gemini 请求失败: {err}"),
                    Some(correlation_id),
                    None,
                ),
                false,
            )
        }
    }
}

#[async_trait::async_trait]
impl NutritionEstimator for GeminiProvider {
    async fn estimate_meal_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<MealEstimate> {
        let parts = json!([
            { "text": meal_image_prompt() },
            { "inlineData": { "mimeType": mime_type, "data": Base64.encode(image) } }
        ]);
        let content = self
            .invoke_generate(GeminiOperation::MealFromImage, parts)
            .await?;
        Ok(MealEstimate::from_json(&content))
    }

    async fn estimate_meal_from_name(&self, description: &str) -> AppResult<MealEstimate> {
        let parts = json!([{ "text": meal_name_prompt(description) }]);
        let content = self
            .invoke_generate(GeminiOperation::MealFromName, parts)
            .await?;
        Ok(MealEstimate::from_json(&content))
    }

    async fn estimate_exercise_burn(
        &self,
        profile: &Profile,
        description: &str,
    ) -> AppResult<ExerciseEstimate> {
        let parts = json!([{ "text": exercise_burn_prompt(profile, description) }]);
        let content = self
            .invoke_generate(GeminiOperation::ExerciseBurn, parts)
            .await?;
        Ok(ExerciseEstimate::from_json(&content))
    }
}

pub mod testing {
    use super::*;

    /// Expose Gemini error mapping for integration tests without widening
    /// the public API surface.
    pub fn map_http_error(status: StatusCode) -> (AppError, bool) {
        GeminiProvider::map_http_error(status, "test-correlation-id")
    }

    fn provider(base_url: &str, timeout: StdDuration) -> AppResult<GeminiProvider> {
        let config = EstimationConfig {
            api_key: Some("test-key".to_string()),
            api_base_url: base_url.trim_end_matches('/').to_string(),
            model: "gemini-2.5-flash".to_string(),
            http_timeout: timeout,
        };
        GeminiProvider::try_new(&config, "test-key".to_string())
    }

    pub async fn estimate_meal_from_name_via_http(
        base_url: &str,
        timeout: StdDuration,
        description: &str,
    ) -> AppResult<MealEstimate> {
        provider(base_url, timeout)?
            .estimate_meal_from_name(description)
            .await
    }

    pub async fn estimate_meal_from_image_via_http(
        base_url: &str,
        timeout: StdDuration,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<MealEstimate> {
        provider(base_url, timeout)?
            .estimate_meal_from_image(image, mime_type)
            .await
    }

    pub async fn estimate_exercise_burn_via_http(
        base_url: &str,
        timeout: StdDuration,
        profile: &Profile,
        description: &str,
    ) -> AppResult<ExerciseEstimate> {
        provider(base_url, timeout)?
            .estimate_exercise_burn(profile, description)
            .await
    }
}
