use serde::{Deserialize, Serialize};

/// 考试目录条目
///
/// 兼容旧后端的字段名（`_id`、`duration`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub creator_name: String,
}

/// 开始考试后拿到的完整题目
///
/// 客户端永远拿不到正确答案，题目的身份就是它在 `questions` 中的下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamContent {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(alias = "duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ExamContent {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// 总时长（秒）
    pub fn total_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
}

/// AI 生成的题目，带正确答案，仅用于出题流程
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl GeneratedQuestion {
    /// 检查题目是否可用，返回不可用的原因
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("题干为空".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!("选项数量不足: {}", self.options.len()));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err("存在空选项".to_string());
        }
        if self.correct_index >= self.options.len() {
            return Err(format!(
                "正确答案下标 {} 超出范围 [0, {}]",
                self.correct_index,
                self.options.len() - 1
            ));
        }
        Ok(())
    }
}

/// 新建考试的请求体
#[derive(Debug, Clone, Serialize)]
pub struct NewExam {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub questions: Vec<GeneratedQuestion>,
}
