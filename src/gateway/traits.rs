//! 辩论网关抽象：开启上下文、推进辩论、独立评分
//!
//! 上下文由会话持有并显式传入每次 continue 调用，网关本身不保存任何会话状态。

use async_trait::async_trait;
use serde::Serialize;

use crate::core::{DebateError, Score, Source};
use crate::llm::ChatMessage;

/// 辩手对话上下文：只记录成功的往返
#[derive(Clone, Debug, Serialize)]
pub struct ContextHandle {
    id: String,
    topic: String,
    history: Vec<ChatMessage>,
}

impl ContextHandle {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: format!("ctx_{}", uuid::Uuid::new_v4()),
            topic: topic.into(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// 已完成的往返次数
    pub fn exchanges(&self) -> usize {
        self.history.len() / 2
    }

    pub fn record_exchange(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.history.push(ChatMessage::user(user));
        self.history.push(ChatMessage::assistant(reply));
    }
}

/// 辩手的一次回复
#[derive(Clone, Debug, PartialEq)]
pub struct Rebuttal {
    pub text: String,
    pub sources: Vec<Source>,
}

impl Rebuttal {
    pub const FALLBACK_TEXT: &'static str = "I apologize, but I am unable to formulate a counter-argument at this moment due to a connection issue. Let's pause and resume shortly.";

    /// 辩手调用失败时的兜底回复
    pub fn fallback() -> Self {
        Self {
            text: Self::FALLBACK_TEXT.to_string(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait DebateGateway: Send + Sync {
    /// 每个新会话调用一次，早于任何 continue_debate
    fn open_context(&self, topic: &str) -> ContextHandle {
        ContextHandle::new(topic)
    }

    /// 以一条用户消息推进上下文；失败时返回 GatewayUnavailable
    async fn continue_debate(
        &self,
        context: &mut ContextHandle,
        text: &str,
    ) -> Result<Rebuttal, DebateError>;

    /// 以 context_text 为依据评价 user_text；结构化字段缺失视为 EvaluationFailure
    async fn score(&self, user_text: &str, context_text: &str) -> Result<Score, DebateError>;

    /// 累计 token：(prompt, completion, total)；不计费的实现返回全 0
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
