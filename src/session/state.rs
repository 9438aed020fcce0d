use std::fmt;

/// 考试会话状态
///
/// `Idle → Loading → Active → Submitting → Completed`，倒计时归零时
/// 由 `Active` 经 `Submitting` 直接进入 `Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Active,
    Submitting,
    Completed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Loading => "Loading",
            SessionState::Active => "Active",
            SessionState::Submitting => "Submitting",
            SessionState::Completed => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 交卷触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// 用户主动交卷（确认由界面负责）
    Manual,
    /// 倒计时归零自动交卷
    Timeout,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitTrigger::Manual => f.write_str("manual"),
            SubmitTrigger::Timeout => f.write_str("timeout"),
        }
    }
}
