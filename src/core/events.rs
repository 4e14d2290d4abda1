//! 回合过程事件：阶段跳转、消息与分数追加、兜底与拒绝，供界面与日志订阅

use serde::Serialize;

use crate::core::{Message, Phase, Score};

/// 网关兜底发生在哪一步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOperation {
    Continue,
    Score,
}

/// 单个事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    /// 新辩题开始（旧会话已丢弃）
    SessionStarted { session_id: String, topic: String },
    /// 阶段跳转
    PhaseChanged { from: Phase, to: Phase },
    /// 追加了一条消息
    MessageAppended { message: Message },
    /// 追加了一条分数
    ScoreRecorded { score: Score },
    /// 网关调用失败，已替换为兜底内容
    GatewayFallback {
        operation: GatewayOperation,
        reason: String,
    },
    /// 输入在入口被拒绝，无状态变更
    InputRejected { reason: String },
    /// 回合结束，回到 Idle（turn 为已完成回合数）
    TurnCompleted { turn: usize },
}
