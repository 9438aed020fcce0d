//! 考试会话
//!
//! - `ExamSession` - 状态机本身，不依赖任何真实定时器，可直接在测试中驱动
//! - `SessionRunner` - 用 tokio 定时器和命令通道驱动一个会话

pub mod answers;
pub mod controller;
pub mod countdown;
pub mod pager;
pub mod runner;
pub mod state;

pub use answers::AnswerMap;
pub use controller::{ExamSession, PendingSubmission, SessionSnapshot, LOW_TIME_THRESHOLD_SECS};
pub use countdown::{Countdown, TickOutcome};
pub use pager::{Navigation, Pager};
pub use runner::{SessionCommand, SessionEvent, SessionHandle, SessionRunner};
pub use state::{SessionState, SubmitTrigger};
