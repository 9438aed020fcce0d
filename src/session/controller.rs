//! 考试会话控制器 - 流程层
//!
//! 管理一次考试从开始到出分的完整生命周期：
//!
//! ```text
//! Idle ──start──▶ Loading ──▶ Active ──submit / 倒计时归零──▶ Submitting ──▶ Completed
//!   ▲                │
//!   └──── 失败 ───────┘
//! ```
//!
//! - 作答记录、倒计时、翻页游标只属于当前实例，会话结束即丢弃
//! - 进入 `Submitting` 就是单飞锁：之后的 submit 调用全部忽略
//! - 交卷失败时保留原始载荷，`retry_submit` 原样重发，不重新计算用时

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::CredentialProvider;
use crate::error::{SessionError, SessionResult};
use crate::models::{Exam, ExamContent, ExamResult};
use crate::services::{ExamContentService, ScoringService};
use crate::session::answers::AnswerMap;
use crate::session::countdown::{Countdown, TickOutcome};
use crate::session::pager::{Navigation, Pager};
use crate::session::state::{SessionState, SubmitTrigger};

/// 低于该剩余时间（秒）时界面应高亮提醒
pub const LOW_TIME_THRESHOLD_SECS: u64 = 300;

/// 待发送（或发送失败待重试）的交卷载荷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub exam_id: String,
    pub answers: AnswerMap,
    /// 第一次交卷时确定，重试时原样使用
    pub duration_taken_seconds: u64,
    pub trigger: SubmitTrigger,
    pub attempts: u32,
}

/// 会话快照，供界面渲染
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub exam_title: Option<String>,
    pub remaining_seconds: u64,
    pub current_page: usize,
    pub total_pages: usize,
    /// 当前页的题目下标
    pub page_questions: Vec<usize>,
    /// 答题卡：每题是否已作答
    pub answered: Vec<bool>,
    /// 每题当前选中的选项
    pub selected: Vec<Option<usize>>,
    pub result: Option<ExamResult>,
    /// 是否有交卷失败待重试
    pub awaiting_retry: bool,
}

impl SessionSnapshot {
    pub fn answered_count(&self) -> usize {
        self.answered.iter().filter(|a| **a).count()
    }

    pub fn is_low_time(&self) -> bool {
        self.state == SessionState::Active && self.remaining_seconds < LOW_TIME_THRESHOLD_SECS
    }
}

/// 考试会话控制器
///
/// 每次考试创建一个新实例，`Completed` 之后不可复用
pub struct ExamSession {
    content_service: Arc<dyn ExamContentService>,
    scoring_service: Arc<dyn ScoringService>,
    credentials: Arc<dyn CredentialProvider>,
    page_size: usize,

    state: SessionState,
    exam: Option<ExamContent>,
    answers: AnswerMap,
    countdown: Countdown,
    pager: Pager,
    pending: Option<PendingSubmission>,
    result: Option<ExamResult>,
}

impl ExamSession {
    /// 创建新的考试会话
    ///
    /// # 参数
    /// - `content_service`: 获取题目
    /// - `scoring_service`: 交卷评分
    /// - `credentials`: 当前登录凭证
    /// - `page_size`: 每页题目数量
    pub fn new(
        content_service: Arc<dyn ExamContentService>,
        scoring_service: Arc<dyn ScoringService>,
        credentials: Arc<dyn CredentialProvider>,
        page_size: usize,
    ) -> Self {
        Self {
            content_service,
            scoring_service,
            credentials,
            page_size: page_size.max(1),
            state: SessionState::Idle,
            exam: None,
            answers: AnswerMap::new(),
            countdown: Countdown::disarmed(),
            pager: Pager::new(0, page_size),
            pending: None,
            result: None,
        }
    }

    // ========== 状态查询 ==========

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exam(&self) -> Option<&ExamContent> {
        self.exam.as_ref()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.countdown.remaining_seconds()
    }

    pub fn is_timer_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    pub fn current_page(&self) -> usize {
        self.pager.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages()
    }

    pub fn page_of(&self, question_index: usize) -> Option<usize> {
        self.pager.page_of(question_index)
    }

    pub fn pending(&self) -> Option<&PendingSubmission> {
        self.pending.as_ref()
    }

    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let question_count = self.exam.as_ref().map_or(0, ExamContent::question_count);
        SessionSnapshot {
            state: self.state,
            exam_title: self.exam.as_ref().map(|e| e.title.clone()),
            remaining_seconds: self.countdown.remaining_seconds(),
            current_page: self.pager.current_page(),
            total_pages: self.pager.total_pages(),
            page_questions: self.pager.question_range().collect(),
            answered: (0..question_count)
                .map(|i| self.answers.is_answered(i))
                .collect(),
            selected: (0..question_count).map(|i| self.answers.get(i)).collect(),
            result: self.result,
            awaiting_retry: self.can_retry(),
        }
    }

    // ========== 操作 ==========

    /// 开始考试
    ///
    /// 需要密码的考试必须提供密码，密码本身由服务端校验。
    /// 失败时回到 `Idle`，可以再次调用
    pub async fn start(&mut self, exam: &Exam, password: Option<&str>) -> SessionResult<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid_state("start"));
        }
        if !self.credentials.is_authenticated() {
            return Err(SessionError::Unauthenticated);
        }

        let password = password.filter(|p| !p.is_empty());
        if exam.has_password && password.is_none() {
            return Err(SessionError::StartFailed {
                exam_id: exam.id.clone(),
                reason: "该考试需要密码".to_string(),
            });
        }

        self.state = SessionState::Loading;
        debug!("正在加载考试 {} ({})", exam.id, exam.title);

        match self.content_service.start_exam(&exam.id, password).await {
            Ok(content) => {
                self.activate(content);
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                warn!("开始考试 {} 失败: {}", exam.id, e);
                Err(SessionError::from_start(&exam.id, e))
            }
        }
    }

    fn activate(&mut self, content: ExamContent) {
        info!(
            "✓ 考试开始: {} | {} 题 | {} 分钟",
            content.title,
            content.question_count(),
            content.duration_minutes
        );

        self.countdown = Countdown::armed(content.total_seconds());
        self.pager = Pager::new(content.question_count(), self.page_size);
        self.answers = AnswerMap::new();
        self.exam = Some(content);
        self.state = SessionState::Active;
    }

    /// 选择答案
    ///
    /// 非 `Active` 状态下直接忽略（返回 `Ok(false)`），下标越界返回 `Validation`
    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> SessionResult<bool> {
        if self.state != SessionState::Active {
            debug!(
                "忽略答题事件 ({} → {})，当前状态 {}",
                question_index, option_index, self.state
            );
            return Ok(false);
        }

        let questions = self.exam.as_ref().map_or(&[][..], |e| &e.questions[..]);
        let question = questions.get(question_index).ok_or_else(|| SessionError::Validation {
            question_index,
            option_index,
            reason: format!("共 {} 题", questions.len()),
        })?;
        if option_index >= question.options.len() {
            return Err(SessionError::Validation {
                question_index,
                option_index,
                reason: format!("共 {} 个选项", question.options.len()),
            });
        }

        self.answers.set(question_index, option_index);
        Ok(true)
    }

    /// 翻页，只在 `Active` 状态下生效，返回当前页码
    pub fn navigate(&mut self, to: Navigation) -> usize {
        if self.state == SessionState::Active {
            self.pager.navigate(to);
        }
        self.pager.current_page()
    }

    /// 倒计时前进一秒
    ///
    /// 归零时自动以 `Timeout` 交卷，之后的 tick 不再有效果
    pub async fn tick(&mut self) -> SessionResult<TickOutcome> {
        if self.state != SessionState::Active {
            return Ok(TickOutcome::Disarmed);
        }

        match self.countdown.tick() {
            TickOutcome::Expired => {
                info!("⏰ 时间到，自动交卷");
                self.submit(SubmitTrigger::Timeout).await?;
                Ok(TickOutcome::Expired)
            }
            outcome => Ok(outcome),
        }
    }

    /// 交卷
    ///
    /// 只有第一次调用会真正发送请求；之后的调用（包括倒计时与手动交卷同时触发）
    /// 都返回 `Ok(None)`
    pub async fn submit(&mut self, trigger: SubmitTrigger) -> SessionResult<Option<ExamResult>> {
        if !self.begin_submit(trigger) {
            debug!("忽略交卷请求 ({})，当前状态 {}", trigger, self.state);
            return Ok(None);
        }
        self.send_pending().await.map(Some)
    }

    /// 锁定会话并准备交卷载荷
    ///
    /// 同步完成状态切换和倒计时解除，返回是否抢到了这次交卷
    pub fn begin_submit(&mut self, trigger: SubmitTrigger) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        let Some(exam) = self.exam.as_ref() else {
            return false;
        };

        self.state = SessionState::Submitting;
        self.countdown.disarm();

        let duration_taken_seconds = self.countdown.elapsed_seconds();
        info!(
            "📋 交卷 ({}): 已答 {}/{} 题，用时 {} 秒",
            trigger,
            self.answers.len(),
            exam.question_count(),
            duration_taken_seconds
        );

        self.pending = Some(PendingSubmission {
            exam_id: exam.id.clone(),
            answers: self.answers.clone(),
            duration_taken_seconds,
            trigger,
            attempts: 0,
        });
        true
    }

    /// 重新发送上一次失败的交卷请求
    ///
    /// 载荷和用时保持第一次交卷时的值。上一次发送的 future 被丢弃
    /// （例如超时取消）后同样可以重试
    pub async fn retry_submit(&mut self) -> SessionResult<ExamResult> {
        if !self.can_retry() {
            return Err(self.invalid_state("retry_submit"));
        }
        self.send_pending().await
    }

    /// `&mut self` 保证同一时间只有一个发送在进行
    fn can_retry(&self) -> bool {
        self.state == SessionState::Submitting && self.pending.is_some()
    }

    async fn send_pending(&mut self) -> SessionResult<ExamResult> {
        let pending = match self.pending.as_mut() {
            Some(pending) => {
                pending.attempts += 1;
                pending.clone()
            }
            None => return Err(self.invalid_state("submit")),
        };

        let outcome = self
            .scoring_service
            .submit_exam(
                &pending.exam_id,
                &pending.answers,
                pending.duration_taken_seconds,
            )
            .await;

        match outcome {
            Ok(result) => {
                info!(
                    "✓ 交卷成功: {}/{} (第 {} 次考试)",
                    result.score, result.total, result.attempt_number
                );
                self.result = Some(result);
                self.pending = None;
                self.state = SessionState::Completed;
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "⚠️ 交卷失败 (第 {} 次尝试): {}，可调用 retry_submit 重试",
                    pending.attempts, e
                );
                Err(SessionError::from_submit(e))
            }
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}
