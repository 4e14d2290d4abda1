//! OpenAI 兼容后端
//!
//! 任意 OpenAI 兼容端点（DeepSeek、OpenAI、自建代理）都走这里，区别只在 base_url、模型名与 Key。

use std::sync::atomic::{AtomicU64, Ordering};

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{ChatMessage, ChatRole, LlmClient, LlmError};

/// 进程内累计的 token 计数
#[derive(Debug, Default)]
pub struct TokenUsage {
    prompt: AtomicU64,
    completion: AtomicU64,
}

impl TokenUsage {
    pub fn record(&self, prompt: u64, completion: u64) {
        self.prompt.fetch_add(prompt, Ordering::Relaxed);
        self.completion.fetch_add(completion, Ordering::Relaxed);
    }

    /// (prompt, completion, total)
    pub fn totals(&self) -> (u64, u64, u64) {
        let prompt = self.prompt.load(Ordering::Relaxed);
        let completion = self.completion.load(Ordering::Relaxed);
        (prompt, completion, prompt + completion)
    }
}

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    usage: TokenUsage,
}

impl OpenAiClient {
    /// base_url 为空时使用 async-openai 默认端点
    pub fn new(base_url: Option<&str>, model: impl Into<String>, api_key: &str) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            client: Client::with_config(config),
            model: model.into(),
            usage: TokenUsage::default(),
        }
    }
}

fn request_message(m: &ChatMessage) -> Result<ChatCompletionRequestMessage, LlmError> {
    let content = m.content.clone();
    let built = match m.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::System),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::User),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(ChatCompletionRequestMessage::Assistant),
    };
    built.map_err(|e| LlmError::InvalidRequest(e.to_string()))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let messages = messages
            .iter()
            .map(request_message)
            .collect::<Result<Vec<_>, _>>()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if let Some(usage) = &response.usage {
            self.usage
                .record(u64::from(usage.prompt_tokens), u64::from(usage.completion_tokens));
        }

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        tracing::debug!(model = %self.model, chars = content.len(), "Completion received");
        Ok(content)
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.totals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_accumulates() {
        let usage = TokenUsage::default();
        usage.record(10, 4);
        usage.record(5, 1);
        assert_eq!(usage.totals(), (15, 5, 20));
    }

    #[test]
    fn test_roles_map_to_request_variants() {
        assert!(matches!(
            request_message(&ChatMessage::system("s")).unwrap(),
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            request_message(&ChatMessage::assistant("a")).unwrap(),
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }
}
