//! LLM 服务 - 业务能力层
//!
//! 只负责"从 PDF 生成选择题"能力，不关心考试流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务，PDF 以 base64 data URL 作为 file 内容块内联发送

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartFile,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, FileObject,
    },
    Client,
};
use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::GeneratedQuestion;
use crate::services::QuestionGenerator;

const SYSTEM_PROMPT: &str = "你是一个专业的出题助手，擅长根据教学资料编写单项选择题。\
                             你只输出 JSON，不输出任何解释。";

const USER_PROMPT: &str = r#"请阅读附带的 PDF 文档，根据其中的知识点编写单项选择题。

【要求】
- 每道题 4 个选项，只有一个正确答案
- 题目使用文档原本的语言
- 题干和选项都不能为空

【输出格式】
只返回一个 JSON 数组，不要返回任何其他内容：
[
  {"question": "题干", "options": ["A", "B", "C", "D"], "correct_index": 0}
]"#;

/// 随用户消息内联发送的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFile {
    pub filename: String,
    /// `data:<mime>;base64,...`
    pub data_url: String,
}

impl InlineFile {
    pub fn pdf(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            data_url: format!(
                "data:application/pdf;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
        }
    }
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成题目
/// - 解析并校验 LLM 输出
/// - 不持有考试状态
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_retries: usize,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_retries: config.llm_max_retries.max(1),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `files`: 内联文件，作为 file 内容块追加到用户消息中
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        files: &[InlineFile],
    ) -> Result<String, GenerationError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!(
            "用户消息长度: {} 字符，文件 {} 个",
            user_message.len(),
            files.len()
        );

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.llm_error(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if files.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: user_message.to_string(),
                    },
                ),
            ];
            content_parts.extend(files.iter().map(file_part));
            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
        }
        .map_err(|e| self.llm_error(e))?;

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(8192u32)
            .build()
            .map_err(|e| self.llm_error(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.llm_error(e)
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| GenerationError::InvalidOutput("LLM 返回内容为空".to_string()))
    }

    fn llm_error(&self, err: impl std::fmt::Display) -> GenerationError {
        GenerationError::Llm {
            model: self.model_name.clone(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl QuestionGenerator for LlmService {
    /// 从 PDF 生成题目，输出不可用时最多重试 `llm_max_retries` 次
    async fn generate_from_pdf(&self, pdf: &[u8]) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        if pdf.is_empty() {
            return Err(GenerationError::EmptyDocument);
        }

        let files = [InlineFile::pdf("document.pdf", pdf)];

        let mut last_error = None;
        for attempt in 1..=self.max_retries {
            info!("🤖 正在生成题目 (尝试 {}/{})...", attempt, self.max_retries);

            let outcome = match self
                .send_to_llm(USER_PROMPT, Some(SYSTEM_PROMPT), &files)
                .await
            {
                Ok(response) => parse_generated_questions(&response),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(questions) => {
                    info!("✓ 生成 {} 道题目", questions.len());
                    return Ok(questions);
                }
                Err(e) => {
                    warn!("生成失败 (尝试 {}/{}): {}", attempt, self.max_retries, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::InvalidOutput("没有进行任何尝试".to_string())))
    }
}

fn file_part(file: &InlineFile) -> ChatCompletionRequestUserMessageContentPart {
    ChatCompletionRequestUserMessageContentPart::File(ChatCompletionRequestMessageContentPartFile {
        // FileObject 的字段在 async-openai 中是私有的，只能通过 serde 构造
        file: serde_json::from_value::<FileObject>(serde_json::json!({
            "file_data": file.data_url,
            "filename": file.filename,
        }))
        .expect("FileObject 由字符串字段构造，不会失败"),
    })
}

/// 解析 LLM 返回的题目 JSON
///
/// 支持纯数组、`{"questions": [...]}` 以及包在 ```json 代码块里的输出；
/// 不合格的题目会被丢弃
pub fn parse_generated_questions(response: &str) -> Result<Vec<GeneratedQuestion>, GenerationError> {
    let json_text = extract_json(response)
        .ok_or_else(|| GenerationError::InvalidOutput("响应中没有 JSON".to_string()))?;

    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| GenerationError::InvalidOutput(format!("JSON 解析失败: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GenerationError::InvalidOutput(
                    "缺少 questions 数组".to_string(),
                ))
            }
        },
        _ => {
            return Err(GenerationError::InvalidOutput(
                "顶层不是数组或对象".to_string(),
            ))
        }
    };

    let questions: Vec<GeneratedQuestion> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            match serde_json::from_value::<GeneratedQuestion>(item) {
                Ok(q) => match q.validate() {
                    Ok(()) => Some(q),
                    Err(reason) => {
                        warn!("丢弃第 {} 题: {}", idx + 1, reason);
                        None
                    }
                },
                Err(e) => {
                    warn!("丢弃第 {} 题: 字段不完整 ({})", idx + 1, e);
                    None
                }
            }
        })
        .collect();

    if questions.is_empty() {
        return Err(GenerationError::InvalidOutput("没有可用的题目".to_string()));
    }
    Ok(questions)
}

/// 取出 JSON 文本：优先代码块，其次第一个 `[`/`{` 到最后一个 `]`/`}`
fn extract_json(response: &str) -> Option<&str> {
    if let Ok(re) = Regex::new(r"(?s)```(?:json)?\s*(.*?)```") {
        if let Some(body) = re.captures(response).and_then(|cap| cap.get(1)) {
            return Some(body.as_str().trim());
        }
    }

    let start = response.find(&['[', '{'][..])?;
    let end = response.rfind(&[']', '}'][..])?;
    (end > start).then(|| &response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_is_sent_as_file_part() {
        let file = InlineFile::pdf("bai-giang.pdf", b"%PDF-1.4");
        assert_eq!(file.data_url, "data:application/pdf;base64,JVBERi0xLjQ=");

        match file_part(&file) {
            ChatCompletionRequestUserMessageContentPart::File(part) => {
                // FileObject 的字段是私有的，通过序列化读取
                let obj = serde_json::to_value(&part.file).unwrap();
                assert_eq!(obj.get("file_data").and_then(Value::as_str), Some(file.data_url.as_str()));
                assert_eq!(obj.get("filename").and_then(Value::as_str), Some("bai-giang.pdf"));
                assert!(obj.get("file_id").is_none());
            }
            other => panic!("PDF 应作为 file 内容块发送: {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_array() {
        let questions = parse_generated_questions(
            r#"[{"question": "2+2?", "options": ["3", "4", "5", "6"], "correct_index": 1}]"#,
        )
        .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_index, 1);
    }

    #[test]
    fn test_parse_fenced_object_and_drop_invalid() {
        let response = r#"好的，以下是题目：
```json
{"questions": [
  {"question": "Thủ đô của Việt Nam?", "options": ["Hà Nội", "Huế"], "correct_index": 0},
  {"question": "bad", "options": ["A", "B"], "correct_index": 5},
  {"question": "missing options", "correct_index": 0}
]}
```"#;
        let questions = parse_generated_questions(response).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["Hà Nội", "Huế"]);
    }

    #[test]
    fn test_parse_rejects_unusable_output() {
        assert!(matches!(
            parse_generated_questions("抱歉，我无法阅读该文件"),
            Err(GenerationError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_generated_questions(r#"[{"question": "", "options": ["A", "B"], "correct_index": 0}]"#),
            Err(GenerationError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_pdf_is_rejected_without_calling_llm() {
        let service = LlmService::new(&Config::default());
        assert!(matches!(
            service.generate_from_pdf(&[]).await,
            Err(GenerationError::EmptyDocument)
        ));
    }

    /// 需要真实的 LLM_API_KEY：cargo test test_generate_from_pdf_live -- --ignored --nocapture
    #[tokio::test]
    #[ignore]
    async fn test_generate_from_pdf_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("加载配置失败");
        let path = std::env::var("SAMPLE_PDF").expect("请设置 SAMPLE_PDF");
        let pdf = std::fs::read(path).expect("读取 PDF 失败");

        let service = LlmService::new(&config);
        let questions = service.generate_from_pdf(&pdf).await.expect("生成失败");

        for q in &questions {
            println!("{} -> {:?} [{}]", q.question, q.options, q.correct_index);
        }
        assert!(!questions.is_empty());
    }
}
