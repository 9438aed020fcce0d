//! 终端前端 - 编排层
//!
//! 负责把配置、凭证、API 客户端和考试会话组装起来，解析命令行子命令，
//! 并在终端里完成一次考试（答题卡、翻页、交卷确认都在这一层）

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::auth::{CredentialProvider, TokenFile};
use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ExamContent, NewExam};
use crate::services::{
    ExamCatalog, ExamContentService, LlmService, QuestionGenerator, TeacherResultsService,
};
use crate::session::{
    ExamSession, Navigation, SessionEvent, SessionHandle, SessionRunner, SessionSnapshot,
    SubmitTrigger,
};
use crate::utils::logging::{self, format_remaining, truncate_text};

const USAGE: &str = "用法:
  exam-cli list                              列出考试
  exam-cli history                           我的考试记录
  exam-cli results                           学生成绩（教师）
  exam-cli login <用户名> <密码>             登录
  exam-cli whoami                            当前用户
  exam-cli logout                            退出登录
  exam-cli take <考试ID> [密码]              参加考试
  exam-cli generate <PDF> <标题> [分钟]      从 PDF 生成考试（教师）
  exam-cli delete <考试ID>                   删除考试（教师）";

const TAKE_HELP: &str = "a <题号> <选项号> 作答 | n 下一页 | p 上一页 | g <页码> 跳页 | j <题号> 跳到题目 | s 交卷 | r 重试交卷 | q 放弃";

/// 命令行子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    History,
    Results,
    Login { username: String, password: String },
    WhoAmI,
    Logout,
    Delete { exam_id: String },
    Take { exam_id: String, password: Option<String> },
    Generate { pdf: PathBuf, title: String, minutes: u32 },
}

impl Command {
    /// 解析命令行参数（不含程序名）
    pub fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            ["list"] => Command::List,
            ["history"] => Command::History,
            ["results"] => Command::Results,
            ["login", username, password] => Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            },
            ["whoami"] => Command::WhoAmI,
            ["logout"] => Command::Logout,
            ["delete", exam_id] => Command::Delete {
                exam_id: exam_id.to_string(),
            },
            ["take", exam_id] => Command::Take {
                exam_id: exam_id.to_string(),
                password: None,
            },
            ["take", exam_id, password] => Command::Take {
                exam_id: exam_id.to_string(),
                password: Some(password.to_string()),
            },
            ["generate", pdf, title] => Command::Generate {
                pdf: PathBuf::from(pdf),
                title: title.to_string(),
                minutes: 30,
            },
            ["generate", pdf, title, minutes] => Command::Generate {
                pdf: PathBuf::from(pdf),
                title: title.to_string(),
                minutes: minutes
                    .parse()
                    .with_context(|| format!("无效的分钟数: {}", minutes))?,
            },
            _ => bail!("{}", USAGE),
        };
        Ok(command)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    credentials: Arc<dyn CredentialProvider>,
    client: Arc<ApiClient>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config.api_base_url);

        let credentials: Arc<dyn CredentialProvider> =
            Arc::new(TokenFile::new(&config.token_file));
        let client = Arc::new(
            ApiClient::new(&config, credentials.clone()).context("无法创建 API 客户端")?,
        );

        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    /// 运行子命令
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::List => self.list().await,
            Command::History => {
                let history = self.client.history().await?;
                logging::log_history(&history);
                Ok(())
            }
            Command::Results => self.results().await,
            Command::Login { username, password } => {
                let user = self.client.login(&username, &password).await?;
                info!("✓ 已登录: {} ({})", user.username, user.role);
                Ok(())
            }
            Command::WhoAmI => {
                let user = self.client.profile().await?;
                info!("👤 {} ({})", user.username, user.role);
                Ok(())
            }
            Command::Logout => {
                self.credentials.clear();
                info!("✓ 已退出登录");
                Ok(())
            }
            Command::Delete { exam_id } => {
                self.client.delete_exam(&exam_id).await?;
                info!("✓ 考试已删除: {}", exam_id);
                Ok(())
            }
            Command::Take { exam_id, password } => self.take(&exam_id, password.as_deref()).await,
            Command::Generate {
                pdf,
                title,
                minutes,
            } => self.generate(&pdf, title, minutes).await,
        }
    }

    async fn list(&self) -> Result<()> {
        let exams = self.client.list_exams().await?;
        if exams.is_empty() {
            warn!("⚠️ 暂无考试");
            return Ok(());
        }
        info!("✓ 找到 {} 个考试", exams.len());
        for exam in &exams {
            info!(
                "[{}] {} | {} 分钟{}{}",
                exam.id,
                truncate_text(&exam.title, 50),
                exam.duration_minutes,
                if exam.has_password { " | 🔒" } else { "" },
                if exam.creator_name.is_empty() {
                    String::new()
                } else {
                    format!(" | {}", exam.creator_name)
                }
            );
        }
        Ok(())
    }

    async fn results(&self) -> Result<()> {
        let results = self.client.teacher_results().await?;
        info!("✓ 共 {} 条成绩", results.len());
        for r in &results {
            info!(
                "{} | {} | {}/{} | {}",
                r.username,
                truncate_text(&r.exam_title, 40),
                r.score,
                r.total_questions,
                r.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
            );
        }
        Ok(())
    }

    async fn generate(&self, pdf: &Path, title: String, minutes: u32) -> Result<()> {
        let bytes = tokio::fs::read(pdf)
            .await
            .with_context(|| format!("无法读取 PDF: {}", pdf.display()))?;

        let generator = LlmService::new(&self.config);
        let exam = self.author_exam(&generator, &bytes, title, minutes).await?;
        info!("✓ 考试已创建: {} ({} 题)", exam.title, exam.questions.len());
        Ok(())
    }

    /// 生成题目并发布为新考试
    ///
    /// # 参数
    /// - `generator`: 出题服务
    /// - `pdf`: PDF 文件内容
    /// - `title`: 考试标题
    /// - `minutes`: 考试时长
    ///
    /// # 返回
    /// 返回已发布的考试
    async fn author_exam(
        &self,
        generator: &dyn QuestionGenerator,
        pdf: &[u8],
        title: String,
        minutes: u32,
    ) -> AppResult<NewExam> {
        let questions = generator.generate_from_pdf(pdf).await?;
        for (i, q) in questions.iter().enumerate() {
            info!("{}. {}", i + 1, truncate_text(&q.question, 80));
        }

        let exam = NewExam {
            title,
            description: String::new(),
            duration_minutes: minutes,
            password: None,
            questions,
        };
        self.client.create_exam(&exam).await?;
        Ok(exam)
    }

    /// 参加一次考试
    async fn take(&self, exam_id: &str, password: Option<&str>) -> Result<()> {
        let exams = self.client.list_exams().await?;
        let exam = exams
            .iter()
            .find(|e| e.id == exam_id)
            .with_context(|| format!("考试不存在: {}", exam_id))?;

        let mut session = ExamSession::new(
            self.client.clone(),
            self.client.clone(),
            self.credentials.clone(),
            self.config.questions_per_page,
        );
        session.start(exam, password).await?;

        let content = session
            .exam()
            .cloned()
            .context("考试内容为空")?;
        logging::log_exam_loaded(&content, self.config.questions_per_page);
        info!("{}", TAKE_HELP);

        let (handle, mut events) = SessionRunner::spawn(session, self.config.tick_interval());
        render_page(&content, &handle.snapshot().await?);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut confirming = false;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Tick { remaining_seconds }) => {
                        if remaining_seconds % 60 == 0 || remaining_seconds <= 10 {
                            info!("⏳ 剩余时间 {}", format_remaining(remaining_seconds));
                        }
                    }
                    Some(SessionEvent::Submitted { trigger, result }) => {
                        if trigger == SubmitTrigger::Timeout {
                            warn!("⏰ 时间到，已自动交卷");
                        }
                        logging::log_result(&content.title, &result);
                        break;
                    }
                    Some(SessionEvent::SubmitFailed { error, .. }) => {
                        error!("❌ 交卷失败: {}，输入 r 重试", error);
                    }
                    None => break,
                },
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        warn!("输入结束，放弃本次考试");
                        break;
                    };
                    let line = line.trim().to_string();

                    if confirming {
                        confirming = false;
                        if line.eq_ignore_ascii_case("y") {
                            if let Err(e) = handle.submit().await {
                                error!("❌ {}", e);
                            }
                        } else {
                            info!("已取消交卷");
                        }
                        continue;
                    }

                    match line.as_str() {
                        "s" => {
                            let snapshot = handle.snapshot().await?;
                            info!(
                                "已答 {}/{} 题，确定要交卷吗？(y/n)",
                                snapshot.answered_count(),
                                snapshot.answered.len()
                            );
                            confirming = true;
                        }
                        "q" => {
                            warn!("放弃本次考试，本次作答不会提交");
                            break;
                        }
                        _ => {
                            if let Err(e) = self.handle_input(&handle, &content, &line).await {
                                warn!("⚠️ {}", e);
                            }
                        }
                    }
                }
            }
        }

        handle.abandon().await;
        Ok(())
    }

    async fn handle_input(&self, handle: &SessionHandle, content: &ExamContent, line: &str) -> Result<()> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["a", q, o] => {
                let q = parse_one_based(q)?;
                let o = parse_one_based(o)?;
                handle.select_answer(q, o).await?;
            }
            ["n"] => {
                handle.navigate(Navigation::Next).await?;
            }
            ["p"] => {
                handle.navigate(Navigation::Previous).await?;
            }
            ["g", page] => {
                let page: i64 = page.parse().with_context(|| format!("无效的页码: {}", page))?;
                handle.navigate(Navigation::Page(page - 1)).await?;
            }
            ["j", q] => {
                let q = parse_one_based(q)?;
                handle.navigate(Navigation::Question(q)).await?;
            }
            ["r"] => {
                let result = handle.retry_submit().await?;
                info!("✓ 重试成功: {}/{}", result.score, result.total);
                return Ok(());
            }
            [] => {}
            _ => bail!("无法识别的输入: {} ({})", line, TAKE_HELP),
        }

        render_page(content, &handle.snapshot().await?);
        Ok(())
    }
}

/// 题号 / 选项号从 1 开始输入
fn parse_one_based(value: &str) -> Result<usize> {
    let n: usize = value.parse().with_context(|| format!("无效的数字: {}", value))?;
    n.checked_sub(1).context("编号从 1 开始")
}

fn render_page(content: &ExamContent, snapshot: &SessionSnapshot) {
    info!(
        "── 第 {}/{} 页 | 剩余 {}{} ──",
        snapshot.current_page + 1,
        snapshot.total_pages,
        format_remaining(snapshot.remaining_seconds),
        if snapshot.is_low_time() { " ⚠️" } else { "" }
    );

    for &idx in &snapshot.page_questions {
        let Some(question) = content.questions.get(idx) else {
            continue;
        };
        info!("{}. {}", idx + 1, question.question);
        for (opt_idx, option) in question.options.iter().enumerate() {
            let marker = if snapshot.selected.get(idx).copied().flatten() == Some(opt_idx) {
                "●"
            } else {
                "○"
            };
            info!("   {} {}. {}", marker, opt_idx + 1, option);
        }
    }

    let card: String = snapshot
        .answered
        .iter()
        .map(|answered| if *answered { '■' } else { '□' })
        .collect();
    info!("答题卡: {} ({}/{})", card, snapshot.answered_count(), snapshot.answered.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, GenerationError};
    use crate::models::GeneratedQuestion;
    use async_trait::async_trait;

    struct NoQuestions;

    #[async_trait]
    impl QuestionGenerator for NoQuestions {
        async fn generate_from_pdf(&self, _pdf: &[u8]) -> Result<Vec<GeneratedQuestion>, GenerationError> {
            Err(GenerationError::InvalidOutput("没有可用的题目".into()))
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&args(&["list"])).unwrap(), Command::List);
        assert_eq!(
            Command::parse(&args(&["take", "e1", "secret"])).unwrap(),
            Command::Take {
                exam_id: "e1".into(),
                password: Some("secret".into()),
            }
        );
        assert_eq!(
            Command::parse(&args(&["generate", "a.pdf", "Bài 1", "15"])).unwrap(),
            Command::Generate {
                pdf: PathBuf::from("a.pdf"),
                title: "Bài 1".into(),
                minutes: 15,
            }
        );
        assert!(Command::parse(&args(&["generate", "a.pdf", "t", "abc"])).is_err());
        assert!(Command::parse(&args(&[])).is_err());
    }

    #[test]
    fn test_parse_one_based() {
        assert_eq!(parse_one_based("1").unwrap(), 0);
        assert!(parse_one_based("0").is_err());
        assert!(parse_one_based("x").is_err());
    }

    #[tokio::test]
    async fn test_author_exam_stops_before_publishing_when_generation_fails() {
        let config = Config {
            api_base_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        let app = App::initialize(config).unwrap();

        let err = app
            .author_exam(&NoQuestions, b"%PDF-1.4", "Chương 1".into(), 15)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(GenerationError::InvalidOutput(_))));
    }
}
