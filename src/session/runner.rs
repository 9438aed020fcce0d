//! 会话驱动任务
//!
//! 一个 tokio 任务独占 `ExamSession`，把每秒的倒计时和界面命令串行化处理：
//! - 倒计时来自 `tokio::time::interval`，测试里可以用暂停的虚拟时钟驱动
//! - 每条命令通过 oneshot 返回结果，错误同步交还给调用方
//! - 丢弃 `SessionHandle` 即放弃考试：任务退出，定时器随之销毁，不会交卷

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::models::ExamResult;
use crate::session::controller::{ExamSession, SessionSnapshot};
use crate::session::countdown::TickOutcome;
use crate::session::pager::Navigation;
use crate::session::state::{SessionState, SubmitTrigger};

const COMMAND_BUFFER: usize = 32;

/// 发给会话任务的命令
#[derive(Debug)]
pub enum SessionCommand {
    SelectAnswer {
        question_index: usize,
        option_index: usize,
        reply: oneshot::Sender<SessionResult<bool>>,
    },
    Navigate {
        to: Navigation,
        reply: oneshot::Sender<usize>,
    },
    Submit {
        reply: oneshot::Sender<SessionResult<Option<ExamResult>>>,
    },
    RetrySubmit {
        reply: oneshot::Sender<SessionResult<ExamResult>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// 会话任务推送给界面的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 倒计时更新
    Tick { remaining_seconds: u64 },
    /// 交卷成功
    Submitted {
        trigger: SubmitTrigger,
        result: ExamResult,
    },
    /// 交卷失败，等待 retry_submit
    SubmitFailed {
        trigger: SubmitTrigger,
        error: SessionError,
    },
}

/// 界面持有的会话句柄
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<ExamSession>,
}

pub struct SessionRunner;

impl SessionRunner {
    /// 启动会话任务
    ///
    /// # 参数
    /// - `session`: 已经 `start` 成功的会话
    /// - `tick_interval`: 倒计时间隔，正常为 1 秒
    ///
    /// # 返回
    /// 返回命令句柄和事件接收端
    pub fn spawn(
        session: ExamSession,
        tick_interval: Duration,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(session, cmd_rx, event_tx, tick_interval));

        (
            SessionHandle {
                commands: cmd_tx,
                task,
            },
            event_rx,
        )
    }
}

async fn run(
    mut session: ExamSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,
    tick_interval: Duration,
) -> ExamSession {
    // 第一次 tick 在一个间隔之后，而不是立即触发
    let mut ticker = time::interval_at(Instant::now() + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick(), if session.state() == SessionState::Active => {
                handle_tick(&mut session, &events).await;
            }
            command = commands.recv() => match command {
                Some(command) => handle_command(&mut session, &events, command).await,
                None => break,
            },
        }
    }

    if !session.state().is_terminal() {
        info!("考试会话被放弃，状态: {}", session.state());
    }
    session
}

async fn handle_tick(session: &mut ExamSession, events: &mpsc::UnboundedSender<SessionEvent>) {
    match session.tick().await {
        Ok(TickOutcome::Running(remaining_seconds)) => {
            let _ = events.send(SessionEvent::Tick { remaining_seconds });
        }
        Ok(TickOutcome::Expired) => {
            let _ = events.send(SessionEvent::Tick { remaining_seconds: 0 });
            if let Some(result) = session.result() {
                let _ = events.send(SessionEvent::Submitted {
                    trigger: SubmitTrigger::Timeout,
                    result: *result,
                });
            }
        }
        Ok(TickOutcome::Disarmed) => {}
        Err(error) => {
            let _ = events.send(SessionEvent::Tick { remaining_seconds: 0 });
            let _ = events.send(SessionEvent::SubmitFailed {
                trigger: SubmitTrigger::Timeout,
                error,
            });
        }
    }
}

async fn handle_command(
    session: &mut ExamSession,
    events: &mpsc::UnboundedSender<SessionEvent>,
    command: SessionCommand,
) {
    match command {
        SessionCommand::SelectAnswer {
            question_index,
            option_index,
            reply,
        } => {
            let _ = reply.send(session.select_answer(question_index, option_index));
        }
        SessionCommand::Navigate { to, reply } => {
            let _ = reply.send(session.navigate(to));
        }
        SessionCommand::Submit { reply } => {
            let outcome = session.submit(SubmitTrigger::Manual).await;
            match &outcome {
                Ok(Some(result)) => {
                    let _ = events.send(SessionEvent::Submitted {
                        trigger: SubmitTrigger::Manual,
                        result: *result,
                    });
                }
                Ok(None) => debug!("重复的交卷请求已忽略"),
                Err(error) => {
                    let _ = events.send(SessionEvent::SubmitFailed {
                        trigger: SubmitTrigger::Manual,
                        error: error.clone(),
                    });
                }
            }
            let _ = reply.send(outcome);
        }
        SessionCommand::RetrySubmit { reply } => {
            let trigger = session
                .pending()
                .map_or(SubmitTrigger::Manual, |p| p.trigger);
            let outcome = session.retry_submit().await;
            match &outcome {
                Ok(result) => {
                    let _ = events.send(SessionEvent::Submitted {
                        trigger,
                        result: *result,
                    });
                }
                Err(error) => warn!("重试交卷失败: {}", error),
            }
            let _ = reply.send(outcome);
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
    }
}

impl SessionHandle {
    pub async fn select_answer(&self, question_index: usize, option_index: usize) -> SessionResult<bool> {
        self.request(|reply| SessionCommand::SelectAnswer {
            question_index,
            option_index,
            reply,
        })
        .await?
    }

    pub async fn navigate(&self, to: Navigation) -> SessionResult<usize> {
        self.request(|reply| SessionCommand::Navigate { to, reply }).await
    }

    /// 手动交卷（确认对话框由界面负责）
    pub async fn submit(&self) -> SessionResult<Option<ExamResult>> {
        self.request(|reply| SessionCommand::Submit { reply }).await?
    }

    pub async fn retry_submit(&self) -> SessionResult<ExamResult> {
        self.request(|reply| SessionCommand::RetrySubmit { reply }).await?
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// 放弃考试：停止任务，不向服务端发送任何请求
    pub async fn abandon(self) {
        let SessionHandle { commands, task } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!("会话任务异常退出: {}", e);
        }
    }

    /// 关闭任务并取回会话（用于读取最终结果）
    pub async fn close(self) -> SessionResult<ExamSession> {
        let SessionHandle { commands, task } = self;
        drop(commands);
        task.await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SessionResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}
