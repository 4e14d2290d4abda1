//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! 识别评审系统提示时返回评分 JSON，否则针对最后一条 User 消息生成一段固定格式的反驳 JSON，
//! 便于不联网跑通完整回合。

use async_trait::async_trait;

use crate::gateway::prompts::JUDGE_INSTRUCTION;
use crate::llm::{ChatMessage, ChatRole, LlmClient, LlmError};

/// Mock 客户端：确定性输出
#[derive(Debug, Default)]
pub struct MockLlmClient;

impl MockLlmClient {
    fn rebuttal(claim: &str) -> String {
        let reply = format!(
            "You claim that \"{}\". Consider the strongest counter-example before \
             generalising. **What evidence would change your mind?**",
            claim.trim()
        );
        serde_json::json!({
            "reply": reply,
            "sources": [
                { "title": "Argument - Wikipedia", "uri": "https://en.wikipedia.org/wiki/Argument" }
            ]
        })
        .to_string()
    }

    /// 粗略启发式：含数字或链接视为有证据，感叹号与全大写视为情绪化
    fn score(prompt: &str) -> String {
        let has_evidence = prompt.chars().any(|c| c.is_ascii_digit()) || prompt.contains("http");
        let exclamations = prompt.matches('!').count() as f64;
        let shouting = prompt
            .split_whitespace()
            .filter(|w| w.len() > 3 && w.chars().all(|c| c.is_ascii_uppercase()))
            .count() as f64;

        let logic = (40.0 + (prompt.split_whitespace().count() as f64).min(40.0)).min(100.0);
        let evidence = if has_evidence { 75.0 } else { 35.0 };
        let emotional_control = (90.0 - exclamations * 10.0 - shouting * 5.0).max(0.0);

        serde_json::json!({
            "logic": logic,
            "evidence": evidence,
            "emotionalControl": emotional_control,
            "feedback": "Back your central claim with a concrete, verifiable example."
        })
        .to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        let judging = messages
            .iter()
            .any(|m| m.role == ChatRole::System && m.content.starts_with(JUDGE_INSTRUCTION));

        if judging {
            Ok(Self::score(last_user))
        } else {
            Ok(Self::rebuttal(last_user))
        }
    }
}
