//! 回合编排器：状态机本体
//!
//! 入口校验（begin_*）与回合执行（run_turn）分开：校验通过即视为受理，
//! 之后回合必然跑完并回到 Idle。网关失败一律替换为兜底内容，保证
//! `分数条数 == 已完成回合数`。每次阶段跳转都会发布快照与事件。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::DebateSection;
use crate::core::{
    DebateError, DebateEvent, DebateSnapshot, GatewayOperation, Message, Phase, Score, ScorePolicy,
    SessionStore,
};
use crate::gateway::{DebateGateway, Rebuttal};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// 两段纯展示用的停顿
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnTiming {
    pub listen_delay: Duration,
    pub debate_delay: Duration,
}

impl TurnTiming {
    pub fn new(listen_delay: Duration, debate_delay: Duration) -> Self {
        Self {
            listen_delay,
            debate_delay,
        }
    }

    /// 无停顿（测试与脚本场景）
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(cfg: &DebateSection) -> Self {
        Self::new(cfg.listen_delay(), cfg.debate_delay())
    }
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self::from_config(&DebateSection::default())
    }
}

/// 已通过入口校验、处于 Listening 的回合
#[derive(Debug)]
#[must_use = "an accepted turn must be driven to Idle with run_turn"]
pub struct AcceptedTurn {
    text: String,
}

/// 一个回合的结果
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub reply: Message,
    pub score: Score,
    /// 辩手调用失败，回复为兜底文本
    pub reply_fallback: bool,
    /// 评审失败，分数为中性分
    pub score_fallback: bool,
}

pub struct TurnOrchestrator {
    gateway: Arc<dyn DebateGateway>,
    timing: TurnTiming,
    score_policy: ScorePolicy,
    store: SessionStore,
    state_tx: watch::Sender<DebateSnapshot>,
    event_tx: broadcast::Sender<DebateEvent>,
}

impl TurnOrchestrator {
    pub fn new(gateway: Arc<dyn DebateGateway>, timing: TurnTiming) -> Self {
        let (state_tx, _) = watch::channel(DebateSnapshot::default());
        let (event_tx, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            gateway,
            timing,
            score_policy: ScorePolicy::default(),
            store: SessionStore::new(),
            state_tx,
            event_tx,
        }
    }

    pub fn with_score_policy(mut self, policy: ScorePolicy) -> Self {
        self.score_policy = policy;
        self
    }

    /// 重建事件通道；须在订阅之前调用
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        self.event_tx = event_tx;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.store.phase()
    }

    pub fn snapshot(&self) -> DebateSnapshot {
        self.store.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<DebateSnapshot> {
        self.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DebateEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<DebateEvent> {
        self.event_tx.clone()
    }

    /// 提交辩题并跑完开场回合（辩题本身即第一条用户发言）
    pub async fn submit_topic(&mut self, topic: &str) -> Result<TurnReport, DebateError> {
        let turn = self.begin_topic(topic)?;
        self.run_turn(turn).await
    }

    /// 提交反驳并跑完回合；非 Idle 或文本为空时直接拒绝，不改动任何状态
    pub async fn submit_user_turn(&mut self, text: &str) -> Result<TurnReport, DebateError> {
        let turn = self.begin_turn(text)?;
        self.run_turn(turn).await
    }

    /// 入口校验 + 新建会话 + 进入 Listening
    pub fn begin_topic(&mut self, topic: &str) -> Result<AcceptedTurn, DebateError> {
        let phase = self.phase();
        if !phase.accepts_input() {
            return Err(DebateError::PrematureTurn { phase });
        }
        if topic.trim().is_empty() {
            return Err(DebateError::InvalidInput);
        }

        let context = self.gateway.open_context(topic);
        let session = self.store.create_session(topic, context)?;
        info!(session_id = %session.id(), topic = %session.topic(), "Debate session started");
        let started = DebateEvent::SessionStarted {
            session_id: session.id().to_string(),
            topic: session.topic().to_string(),
        };
        let opening = session.messages()[0].clone();
        self.emit(started);
        self.emit(DebateEvent::MessageAppended { message: opening });
        self.publish();

        self.advance(Phase::Listening)?;
        Ok(AcceptedTurn {
            text: topic.to_string(),
        })
    }

    /// 入口校验 + 追加用户消息 + 进入 Listening
    pub fn begin_turn(&mut self, text: &str) -> Result<AcceptedTurn, DebateError> {
        if self.store.active().is_none() {
            return Err(DebateError::NoActiveSession);
        }
        let phase = self.phase();
        if !phase.accepts_input() {
            return Err(DebateError::PrematureTurn { phase });
        }
        if text.trim().is_empty() {
            return Err(DebateError::InvalidInput);
        }

        let message = Message::user(text);
        self.store.append_message(message.clone())?;
        self.emit(DebateEvent::MessageAppended { message });
        self.advance(Phase::Listening)?;
        Ok(AcceptedTurn {
            text: text.to_string(),
        })
    }

    /// 从 Listening 跑到 Idle。不支持中途取消；只有内部不变量被破坏时才返回错误
    pub async fn run_turn(&mut self, turn: AcceptedTurn) -> Result<TurnReport, DebateError> {
        let gateway = Arc::clone(&self.gateway);

        tokio::time::sleep(self.timing.listen_delay).await;
        self.advance(Phase::Researching)?;

        let result = {
            let session = self.store.active_mut()?;
            gateway
                .continue_debate(&mut session.context, &turn.text)
                .await
        };
        let (rebuttal, reply_fallback) = match result {
            Ok(r) => (r, false),
            Err(e) => {
                warn!(error = %e, "Debater unavailable, using fallback reply");
                self.emit(DebateEvent::GatewayFallback {
                    operation: GatewayOperation::Continue,
                    reason: e.to_string(),
                });
                (Rebuttal::fallback(), true)
            }
        };

        self.advance(Phase::Debating)?;
        tokio::time::sleep(self.timing.debate_delay).await;

        let reply = Message::agent(rebuttal.text, rebuttal.sources);
        self.store.append_message(reply.clone())?;
        self.emit(DebateEvent::MessageAppended {
            message: reply.clone(),
        });
        self.publish();

        self.advance(Phase::Judging)?;
        let policy = self.score_policy;
        let (score, score_fallback) = match gateway
            .score(&turn.text, &reply.text)
            .await
            .and_then(|s| policy.apply(s))
        {
            Ok(s) => (s, false),
            Err(e) => {
                warn!(error = %e, "Judge unavailable, using neutral score");
                self.emit(DebateEvent::GatewayFallback {
                    operation: GatewayOperation::Score,
                    reason: e.to_string(),
                });
                (Score::neutral(), true)
            }
        };
        self.store.append_score(score.clone())?;
        self.emit(DebateEvent::ScoreRecorded {
            score: score.clone(),
        });

        self.advance(Phase::Idle)?;
        let turns = self.store.active().map(|s| s.scores().len()).unwrap_or(0);
        let (_, _, tokens) = gateway.token_usage();
        info!(turn = turns, reply_fallback, score_fallback, tokens, "Turn completed");
        self.emit(DebateEvent::TurnCompleted { turn: turns });

        Ok(TurnReport {
            reply,
            score,
            reply_fallback,
            score_fallback,
        })
    }

    fn advance(&mut self, to: Phase) -> Result<(), DebateError> {
        let from = self.store.set_phase(to)?;
        debug!(%from, %to, "Phase transition");
        self.emit(DebateEvent::PhaseChanged { from, to });
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.store.snapshot());
    }

    fn emit(&self, event: DebateEvent) {
        // 无订阅者时发送失败，忽略即可
        let _ = self.event_tx.send(event);
    }
}
