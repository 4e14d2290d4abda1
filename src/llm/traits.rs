//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：complete 一次性返回完整文本。
//! 辩论网关只依赖此 trait，不关心传输与鉴权。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::ChatMessage;

/// LLM 调用失败的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// 请求构造失败（参数不合法）
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 远端返回错误或网络不可达
    #[error("API error: {0}")]
    Api(String),

    /// 超过等待上限（秒）
    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
