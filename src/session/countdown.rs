//! 考试倒计时
//!
//! 纯状态，不持有任何真实定时器；每秒由外部调用一次 `tick`

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 仍在计时，剩余秒数
    Running(u64),
    /// 本次 tick 归零，只会出现一次
    Expired,
    /// 已解除，tick 不再产生效果
    Disarmed,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    total_seconds: u64,
    remaining_seconds: u64,
    armed: bool,
}

impl Countdown {
    /// 创建并启动倒计时
    pub fn armed(total_seconds: u64) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
            armed: true,
        }
    }

    /// 未启动的倒计时
    pub fn disarmed() -> Self {
        Self {
            total_seconds: 0,
            remaining_seconds: 0,
            armed: false,
        }
    }

    /// 每秒调用一次
    ///
    /// 剩余时间严格减 1，归零时返回一次 `Expired` 并自动解除
    pub fn tick(&mut self) -> TickOutcome {
        if !self.armed {
            return TickOutcome::Disarmed;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);

        if self.remaining_seconds == 0 {
            self.armed = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_seconds)
        }
    }

    /// 解除倒计时，返回解除前是否处于启动状态
    pub fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    /// 已用时间（秒）
    pub fn elapsed_seconds(&self) -> u64 {
        self.total_seconds - self.remaining_seconds
    }
}
