/// 平台 API 客户端
///
/// 封装所有与考试平台 REST API 相关的调用逻辑
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::CredentialProvider;
use crate::config::Config;
use crate::error::{ApiError, ApiResult, AppResult};
use crate::models::{
    Exam, ExamContent, ExamResult, HistoryEntry, NewExam, TeacherResult, UserProfile,
};
use crate::services::{ExamCatalog, ExamContentService, ScoringService, TeacherResultsService};
use crate::session::AnswerMap;

/// 平台 API 客户端
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: UserProfile,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::network("client", e))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            credentials,
        })
    }

    /// 登录并保存 token
    ///
    /// # 参数
    /// - `username`: 用户名
    /// - `password`: 密码
    ///
    /// # 返回
    /// 返回当前用户信息
    /// 凭证写入失败时返回 `AppError::Credential`
    pub async fn login(&self, username: &str, password: &str) -> AppResult<UserProfile> {
        let body = json!({ "username": username, "password": password });
        let resp: LoginResponse = self.send(Method::POST, "/auth/login", Some(body)).await?;

        self.credentials.store(&resp.token)?;

        debug!("登录成功: {} ({})", resp.user.username, resp.user.role);
        Ok(resp.user)
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let resp: ProfileResponse = self.send(Method::GET, "/auth/me", None).await?;
        Ok(resp.user)
    }

    /// 新建考试（教师 / 管理员）
    pub async fn create_exam(&self, exam: &NewExam) -> ApiResult<()> {
        let body = serde_json::to_value(exam).map_err(|e| ApiError::decode("/exams", e))?;
        let _: Value = self.send(Method::POST, "/exams", Some(body)).await?;
        Ok(())
    }

    /// 删除考试（教师 / 管理员）
    pub async fn delete_exam(&self, exam_id: &str) -> ApiResult<()> {
        let endpoint = format!("/exams/{}", exam_id);
        let _: Value = self.send(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    /// 发送请求并解析响应
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let token = self.credentials.token();
        let mut request = self.http.request(method, &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;

        if !status.is_success() {
            let err = status_error(endpoint, status, &raw_body);
            // 只有带着 token 的请求被拒绝才说明 token 失效
            if err == ApiError::Unauthenticated && token.is_some() {
                warn!("登录已过期，清除本地凭证");
                self.credentials.clear();
            }
            return Err(err);
        }

        serde_json::from_str(&raw_body).map_err(|e| ApiError::decode(endpoint, e))
    }
}

/// 把非 2xx 响应映射为 `ApiError`
fn status_error(endpoint: &str, status: StatusCode, raw_body: &str) -> ApiError {
    let message = extract_error_message(raw_body);
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthenticated,
        StatusCode::FORBIDDEN => ApiError::Forbidden {
            endpoint: endpoint.to_string(),
            message,
        },
        StatusCode::NOT_FOUND => ApiError::NotFound {
            endpoint: endpoint.to_string(),
            message,
        },
        other => ApiError::Server {
            endpoint: endpoint.to_string(),
            status: other.as_u16(),
            message,
        },
    }
}

fn extract_error_message(raw_body: &str) -> String {
    serde_json::from_str::<Value>(raw_body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| raw_body.chars().take(200).collect())
}

#[async_trait]
impl ExamCatalog for ApiClient {
    async fn list_exams(&self) -> ApiResult<Vec<Exam>> {
        self.send(Method::GET, "/exams", None).await
    }
}

#[async_trait]
impl ExamContentService for ApiClient {
    async fn start_exam(&self, exam_id: &str, password: Option<&str>) -> ApiResult<ExamContent> {
        let endpoint = format!("/exams/{}/start", exam_id);
        let body = match password {
            Some(password) => json!({ "password": password }),
            None => json!({}),
        };
        self.send(Method::POST, &endpoint, Some(body)).await
    }

    async fn history(&self) -> ApiResult<Vec<HistoryEntry>> {
        self.send(Method::GET, "/exams/history", None).await
    }
}

#[async_trait]
impl ScoringService for ApiClient {
    async fn submit_exam(
        &self,
        exam_id: &str,
        answers: &AnswerMap,
        duration_taken_seconds: u64,
    ) -> ApiResult<ExamResult> {
        let endpoint = format!("/exams/{}/submit", exam_id);
        let body = json!({
            "answers": answers,
            "duration_taken": duration_taken_seconds,
        });
        self.send(Method::POST, &endpoint, Some(body)).await
    }
}

#[async_trait]
impl TeacherResultsService for ApiClient {
    async fn teacher_results(&self) -> ApiResult<Vec<TeacherResult>> {
        self.send(Method::GET, "/exams/results", None).await
    }
}
