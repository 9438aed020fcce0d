use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 考试会话错误
    #[error("考试错误: {0}")]
    Session(#[from] SessionError),
    /// AI 出题错误
    #[error("出题错误: {0}")]
    Generation(#[from] GenerationError),
    /// 凭证存储错误
    #[error("凭证错误: {0}")]
    Credential(#[from] std::io::Error),
}

/// API 调用错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 凭证缺失或已过期 (401)
    #[error("未登录或登录已过期")]
    Unauthenticated,
    /// 无权访问，例如考试密码错误 (403)
    #[error("无权访问 ({endpoint}): {message}")]
    Forbidden { endpoint: String, message: String },
    /// 资源不存在 (404)
    #[error("资源不存在 ({endpoint}): {message}")]
    NotFound { endpoint: String, message: String },
    /// 网络请求失败
    #[error("网络请求失败 ({endpoint}): {message}")]
    Network { endpoint: String, message: String },
    /// 服务端返回其他错误状态
    #[error("服务端错误 ({endpoint}): status={status}, message={message}")]
    Server {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 响应 JSON 解析失败
    #[error("响应解析失败 ({endpoint}): {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    pub fn network(endpoint: impl Into<String>, message: impl ToString) -> Self {
        ApiError::Network {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        ApiError::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

/// 考试会话错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// 开始考试失败：密码错误、考试不存在或已关闭
    #[error("无法开始考试 {exam_id}: {reason}")]
    StartFailed { exam_id: String, reason: String },
    /// 答题下标非法
    #[error("答案无效: 题目 {question_index} 选项 {option_index} ({reason})")]
    Validation {
        question_index: usize,
        option_index: usize,
        reason: String,
    },
    /// 请求失败（可重试）
    #[error("网络错误: {0}")]
    Network(String),
    /// 未登录或登录已过期
    #[error("未登录或登录已过期")]
    Unauthenticated,
    /// 当前状态不允许该操作
    #[error("当前状态 {state} 不允许执行 {operation}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// 会话任务已经退出
    #[error("考试会话已关闭")]
    Closed,
}

impl SessionError {
    /// 开始考试阶段的错误映射
    pub fn from_start(exam_id: &str, err: ApiError) -> Self {
        match err {
            ApiError::Unauthenticated => SessionError::Unauthenticated,
            ApiError::Network { .. } => SessionError::Network(err.to_string()),
            ApiError::Forbidden { .. }
            | ApiError::NotFound { .. }
            | ApiError::Server { .. }
            | ApiError::Decode { .. } => SessionError::StartFailed {
                exam_id: exam_id.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// 交卷阶段的错误映射，除登录失效外都视为可重试的网络错误
    pub fn from_submit(err: ApiError) -> Self {
        match err {
            ApiError::Unauthenticated => SessionError::Unauthenticated,
            other => SessionError::Network(other.to_string()),
        }
    }

    /// 是否可以通过 retry_submit 重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Network(_) | SessionError::Unauthenticated
        )
    }
}

/// AI 出题错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 文件为空
    #[error("PDF 文件为空")]
    EmptyDocument,
    /// LLM 调用失败
    #[error("LLM调用失败 (模型: {model}): {message}")]
    Llm { model: String, message: String },
    /// LLM 返回内容无法使用
    #[error("LLM返回内容无效: {0}")]
    InvalidOutput(String),
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

pub type ApiResult<T> = Result<T, ApiError>;

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_errors_map_to_start_failed() {
        let err = SessionError::from_start(
            "e1",
            ApiError::Forbidden {
                endpoint: "/exams/e1/start".into(),
                message: "wrong password".into(),
            },
        );
        assert!(matches!(err, SessionError::StartFailed { ref exam_id, .. } if exam_id == "e1"));

        let err = SessionError::from_start("e1", ApiError::network("/exams/e1/start", "timeout"));
        assert!(matches!(err, SessionError::Network(_)));
    }

    #[test]
    fn test_submit_errors_are_retryable() {
        let err = SessionError::from_submit(ApiError::Server {
            endpoint: "/exams/e1/submit".into(),
            status: 500,
            message: "boom".into(),
        });
        assert!(err.is_retryable());
        assert_eq!(
            SessionError::from_submit(ApiError::Unauthenticated),
            SessionError::Unauthenticated
        );
    }

    #[test]
    fn test_app_error_wraps_layers() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "token").into();
        assert!(matches!(err, AppError::Credential(_)));

        let err: AppError = GenerationError::EmptyDocument.into();
        assert_eq!(err.to_string(), "出题错误: PDF 文件为空");
    }
}
