//! # Exam Session
//!
//! 在线选择题考试客户端：登录、开考、限时作答、交卷出分
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients / Auth）
//! - `clients/` - 考试后端 REST 客户端，持有 HTTP 连接
//! - `auth/` - 登录凭证的读取、保存与清除
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"：列出考试、获取题目、评分、成绩查询、AI 出题
//! - `LlmService` - 从 PDF 生成选择题
//!
//! ### ③ 流程层（Session）
//! - `session/` - 一次考试的完整生命周期
//! - `ExamSession` - 状态机（Idle → Loading → Active → Submitting → Completed）
//! - `Countdown` / `Pager` / `AnswerMap` - 倒计时、翻页、作答记录
//! - `SessionRunner` - 驱动倒计时与界面命令的 tokio 任务
//!
//! ### ④ 编排层（App）
//! - `app` - 组装各层并提供终端前端
//!
//! ## 模块结构

pub mod app;
pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

// 重新导出常用类型
pub use app::{App, Command};
pub use auth::{CredentialProvider, MemoryCredential, TokenFile};
pub use clients::ApiClient;
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, GenerationError, SessionError, SessionResult};
pub use models::{Exam, ExamContent, ExamResult, HistoryEntry, Question};
pub use session::{
    AnswerMap, ExamSession, Navigation, SessionEvent, SessionHandle, SessionRunner, SessionState,
    SubmitTrigger,
};
