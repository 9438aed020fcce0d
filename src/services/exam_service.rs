//! 外部服务契约 - 业务能力层
//!
//! 考试会话只依赖这些 trait，具体实现可以是 REST 客户端，也可以是测试里的内存实现

use async_trait::async_trait;

use crate::error::{ApiResult, GenerationError};
use crate::models::{Exam, ExamContent, ExamResult, GeneratedQuestion, HistoryEntry, TeacherResult};
use crate::session::AnswerMap;

/// 考试目录
#[async_trait]
pub trait ExamCatalog: Send + Sync {
    async fn list_exams(&self) -> ApiResult<Vec<Exam>>;
}

/// 考试内容
#[async_trait]
pub trait ExamContentService: Send + Sync {
    /// 获取整套题目，密码错误返回 `Forbidden`，考试不存在返回 `NotFound`
    async fn start_exam(&self, exam_id: &str, password: Option<&str>) -> ApiResult<ExamContent>;

    /// 当前用户的历史记录，按时间倒序
    async fn history(&self) -> ApiResult<Vec<HistoryEntry>>;
}

/// 评分服务
///
/// 未作答的题目不会出现在 `answers` 中，由服务端按错误处理
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn submit_exam(
        &self,
        exam_id: &str,
        answers: &AnswerMap,
        duration_taken_seconds: u64,
    ) -> ApiResult<ExamResult>;
}

/// 教师 / 管理员成绩汇总
#[async_trait]
pub trait TeacherResultsService: Send + Sync {
    async fn teacher_results(&self) -> ApiResult<Vec<TeacherResult>>;
}

/// 从 PDF 生成选择题（外部 AI，可能很慢，也可能失败）
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_from_pdf(&self, pdf: &[u8]) -> Result<Vec<GeneratedQuestion>, GenerationError>;
}
