//! 基于 LlmClient 的辩论网关
//!
//! 辩手：系统提示 + 上下文历史 + 本轮用户消息；评审：独立的一次性调用。
//! 每次调用都有超时上限，编排器自身不做超时。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::core::{DebateError, Score};
use crate::gateway::parse::{parse_rebuttal, parse_score};
use crate::gateway::prompts::{debater_instruction, judge_instruction, judge_prompt};
use crate::gateway::{ContextHandle, DebateGateway, Rebuttal};
use crate::llm::{ChatMessage, LlmClient, LlmError};

pub struct LlmGateway {
    llm: Arc<dyn LlmClient>,
    debater_instruction: String,
    judge_instruction: String,
    request_timeout: Duration,
}

impl LlmGateway {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            debater_instruction: debater_instruction(),
            judge_instruction: judge_instruction(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Self {
        Self::new(llm).with_timeout(Duration::from_secs(cfg.llm.timeouts.request))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn complete_bounded(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        tokio::time::timeout(self.request_timeout, self.llm.complete(messages))
            .await
            .map_err(|_| LlmError::Timeout(self.request_timeout.as_secs()))?
    }
}

#[async_trait]
impl DebateGateway for LlmGateway {
    async fn continue_debate(
        &self,
        context: &mut ContextHandle,
        text: &str,
    ) -> Result<Rebuttal, DebateError> {
        let mut messages = Vec::with_capacity(context.history().len() + 2);
        messages.push(ChatMessage::system(self.debater_instruction.as_str()));
        messages.extend(context.history().iter().cloned());
        messages.push(ChatMessage::user(text));

        let raw = self
            .complete_bounded(&messages)
            .await
            .map_err(|e| DebateError::GatewayUnavailable(e.to_string()))?;

        let rebuttal = parse_rebuttal(&raw);
        context.record_exchange(text, rebuttal.text.as_str());
        tracing::debug!(
            context = %context.id(),
            sources = rebuttal.sources.len(),
            exchanges = context.exchanges(),
            "Debater replied"
        );
        Ok(rebuttal)
    }

    async fn score(&self, user_text: &str, context_text: &str) -> Result<Score, DebateError> {
        let messages = [
            ChatMessage::system(self.judge_instruction.as_str()),
            ChatMessage::user(judge_prompt(user_text, context_text)),
        ];
        let raw = self
            .complete_bounded(&messages)
            .await
            .map_err(|e| DebateError::EvaluationFailure(e.to_string()))?;
        parse_score(&raw)
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            Err(LlmError::Api("connection refused".to_string()))
        }
    }

    struct HangingLlm;

    #[async_trait]
    impl LlmClient for HangingLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_continue_records_successful_exchange() {
        let gateway = LlmGateway::new(Arc::new(MockLlmClient));
        let mut ctx = gateway.open_context("Cats are better than dogs");
        let r = gateway
            .continue_debate(&mut ctx, "Cats are better than dogs")
            .await
            .unwrap();
        assert!(r.text.contains("Cats are better than dogs"));
        assert_eq!(r.sources.len(), 1);
        assert_eq!(ctx.exchanges(), 1);
        assert_eq!(ctx.history()[1].content, r.text);
    }

    #[tokio::test]
    async fn test_continue_failure_leaves_history_untouched() {
        let gateway = LlmGateway::new(Arc::new(FailingLlm));
        let mut ctx = gateway.open_context("topic");
        let err = gateway.continue_debate(&mut ctx, "topic").await.unwrap_err();
        assert!(matches!(err, DebateError::GatewayUnavailable(_)));
        assert!(ctx.history().is_empty());
    }

    #[tokio::test]
    async fn test_score_uses_judge_output() {
        let gateway = LlmGateway::new(Arc::new(MockLlmClient));
        let score = gateway
            .score("In 2023, 40% of teens reported harm", "rebuttal")
            .await
            .unwrap();
        assert_eq!(score.evidence, 75.0);
        assert!(!score.feedback.is_empty());
    }

    #[tokio::test]
    async fn test_score_failure_is_evaluation_failure() {
        let gateway = LlmGateway::new(Arc::new(FailingLlm));
        let err = gateway.score("x", "y").await.unwrap_err();
        assert!(matches!(err, DebateError::EvaluationFailure(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_backend_times_out() {
        let gateway = LlmGateway::new(Arc::new(HangingLlm)).with_timeout(Duration::from_secs(5));
        let mut ctx = gateway.open_context("topic");
        let err = gateway.continue_debate(&mut ctx, "topic").await.unwrap_err();
        assert_eq!(
            err,
            DebateError::GatewayUnavailable("Request timed out after 5s".to_string())
        );
    }
}
