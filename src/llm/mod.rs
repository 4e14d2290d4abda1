//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod traits;

pub use message::{ChatMessage, ChatRole};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use provider::{create_llm_from_config, Backend, DEEPSEEK_CHAT};
pub use traits::{LlmClient, LlmError};
