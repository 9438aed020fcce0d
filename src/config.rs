/// 程序配置文件
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 平台 API 地址（不带结尾斜杠）
    pub api_base_url: String,
    /// 登录凭证保存文件
    pub token_file: String,
    /// 每页显示的题目数量
    pub questions_per_page: usize,
    /// 倒计时间隔（毫秒），正常情况下为 1000
    pub tick_interval_ms: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            token_file: ".exam_token".to_string(),
            questions_per_page: 2,
            tick_interval_ms: 1000,
            request_timeout_secs: 30,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_retries: 3,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果设置了 `EXAM_CONFIG`，先读取该 TOML 文件，再用环境变量覆盖
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("EXAM_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(Self::with_env_overrides(base))
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config.normalized())
    }

    fn with_env_overrides(current: Self) -> Self {
        Self {
            api_base_url: env_or("EXAM_API_BASE_URL", current.api_base_url),
            token_file: env_or("EXAM_TOKEN_FILE", current.token_file),
            questions_per_page: env_parse_or("QUESTIONS_PER_PAGE", current.questions_per_page),
            tick_interval_ms: env_parse_or("TICK_INTERVAL_MS", current.tick_interval_ms),
            request_timeout_secs: env_parse_or("REQUEST_TIMEOUT_SECS", current.request_timeout_secs),
            verbose_logging: env_parse_or("VERBOSE_LOGGING", current.verbose_logging),
            llm_api_key: env_or("LLM_API_KEY", current.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", current.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", current.llm_model_name),
            llm_max_retries: env_parse_or("LLM_MAX_RETRIES", current.llm_max_retries),
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.questions_per_page = self.questions_per_page.max(1);
        self.tick_interval_ms = self.tick_interval_ms.max(1);
        self.llm_max_retries = self.llm_max_retries.max(1);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://exam.example.com/api/"
            questions_per_page = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://exam.example.com/api");
        assert_eq!(config.questions_per_page, 1);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.llm_max_retries, 3);
    }

    #[test]
    fn test_zero_page_size_is_coerced() {
        let config = Config::from_toml_str("questions_per_page = 0").unwrap();
        assert_eq!(config.questions_per_page, 1);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("questions_per_page = \"two\"").is_err());
    }
}
