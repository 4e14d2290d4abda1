//! 辩论网关：辩手（倾听 / 调研 / 反驳）与评审的模型调用封装

pub mod llm_gateway;
pub mod parse;
pub mod prompts;
pub mod traits;

pub use llm_gateway::LlmGateway;
pub use traits::{ContextHandle, DebateGateway, Rebuttal};
