//! 编排运行时：命令通道 + 后台任务
//!
//! 界面只持有 DebateHandle：通过 mpsc 发送命令，通过 watch 读取快照、通过 broadcast 订阅事件。
//! 后台任务串行受理命令；回合执行期间到达的输入一律按 PrematureTurn 拒绝，而不是排队。

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::core::{
    AcceptedTurn, DebateError, DebateEvent, DebateSnapshot, TurnOrchestrator, TurnTiming,
};
use crate::gateway::LlmGateway;
use crate::llm::create_llm_from_config;

type Ack = Option<oneshot::Sender<Result<(), DebateError>>>;

/// 从界面发往编排器的命令
#[derive(Debug)]
pub enum Command {
    /// 提交新辩题（替换当前会话并开始开场回合）
    SubmitTopic { topic: String, ack: Ack },
    /// 提交反驳
    SubmitTurn { text: String, ack: Ack },
    /// 跑完当前回合后退出
    Quit,
}

/// 界面侧句柄，可克隆
#[derive(Clone)]
pub struct DebateHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<DebateSnapshot>,
    event_tx: broadcast::Sender<DebateEvent>,
}

impl DebateHandle {
    /// 提交辩题；受理（而非回合完成）时返回
    pub async fn submit_topic(&self, topic: impl Into<String>) -> Result<(), DebateError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SubmitTopic {
            topic: topic.into(),
            ack: Some(tx),
        })?;
        rx.await.map_err(|_| DebateError::RuntimeStopped)?
    }

    /// 提交反驳；受理（而非回合完成）时返回
    pub async fn submit_user_turn(&self, text: impl Into<String>) -> Result<(), DebateError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SubmitTurn {
            text: text.into(),
            ack: Some(tx),
        })?;
        rx.await.map_err(|_| DebateError::RuntimeStopped)?
    }

    /// 发后即忘；被拒绝时只会收到 InputRejected 事件
    pub fn send_topic(&self, topic: impl Into<String>) -> Result<(), DebateError> {
        self.send(Command::SubmitTopic {
            topic: topic.into(),
            ack: None,
        })
    }

    /// 发后即忘；被拒绝时只会收到 InputRejected 事件
    pub fn send_turn(&self, text: impl Into<String>) -> Result<(), DebateError> {
        self.send(Command::SubmitTurn {
            text: text.into(),
            ack: None,
        })
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(Command::Quit);
    }

    pub fn snapshot(&self) -> DebateSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<DebateSnapshot> {
        self.state_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DebateEvent> {
        self.event_tx.subscribe()
    }

    fn send(&self, cmd: Command) -> Result<(), DebateError> {
        self.cmd_tx.send(cmd).map_err(|_| DebateError::RuntimeStopped)
    }
}

/// 按配置创建 LLM、网关与编排器，并启动后台任务
pub fn create_debate(cfg: &AppConfig) -> (DebateHandle, JoinHandle<()>) {
    let llm = create_llm_from_config(cfg);
    let gateway = Arc::new(LlmGateway::from_config(llm, cfg));
    let orchestrator = TurnOrchestrator::new(gateway, TurnTiming::from_config(&cfg.debate))
        .with_score_policy(cfg.debate.score_policy)
        .with_event_capacity(cfg.debate.event_buffer);
    spawn_debate(orchestrator)
}

/// 将编排器移入后台任务，返回界面句柄
pub fn spawn_debate(orchestrator: TurnOrchestrator) -> (DebateHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
    let handle = DebateHandle {
        cmd_tx,
        state_rx: orchestrator.watch(),
        event_tx: orchestrator.event_sender(),
    };
    let task = tokio::spawn(run_loop(orchestrator, cmd_rx));
    (handle, task)
}

async fn run_loop(
    mut orchestrator: TurnOrchestrator,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    let event_tx = orchestrator.event_sender();
    let state_rx = orchestrator.watch();

    while let Some(cmd) = cmd_rx.recv().await {
        let turn = match cmd {
            Command::SubmitTopic { topic, ack } => {
                acknowledge(ack, orchestrator.begin_topic(&topic), &event_tx)
            }
            Command::SubmitTurn { text, ack } => {
                acknowledge(ack, orchestrator.begin_turn(&text), &event_tx)
            }
            Command::Quit => break,
        };
        let Some(turn) = turn else { continue };

        let mut quit = false;
        let run = orchestrator.run_turn(turn);
        tokio::pin!(run);
        loop {
            tokio::select! {
                result = &mut run => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Turn aborted by invariant violation");
                    }
                    break;
                }
                Some(cmd) = cmd_rx.recv() => {
                    let phase = state_rx.borrow().phase;
                    match cmd {
                        Command::Quit => quit = true,
                        Command::SubmitTopic { ack, .. } | Command::SubmitTurn { ack, .. } => {
                            let rejected: Result<AcceptedTurn, DebateError> =
                                Err(DebateError::PrematureTurn { phase });
                            let _ = acknowledge(ack, rejected, &event_tx);
                        }
                    }
                }
            }
        }
        if quit {
            break;
        }
    }
    tracing::info!("Debate runtime stopped");
}

fn acknowledge(
    ack: Ack,
    result: Result<AcceptedTurn, DebateError>,
    event_tx: &broadcast::Sender<DebateEvent>,
) -> Option<AcceptedTurn> {
    match result {
        Ok(turn) => {
            if let Some(ack) = ack {
                let _ = ack.send(Ok(()));
            }
            Some(turn)
        }
        Err(e) => {
            if e.is_rejection() {
                tracing::debug!(reason = %e, "Input rejected");
            } else {
                tracing::warn!(error = %e, "Turn could not start");
            }
            let _ = event_tx.send(DebateEvent::InputRejected {
                reason: e.to_string(),
            });
            if let Some(ack) = ack {
                let _ = ack.send(Err(e));
            }
            None
        }
    }
}
