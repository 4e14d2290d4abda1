//! Advocate - 多角色辩论智能体
//!
//! 用户提出观点，倾听者、调研者、辩手与评审依次上场：反驳用户并给出引用来源，再为用户的论证打分。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 会话存储、回合状态机、评分策略、事件与运行时
//! - **gateway**: 辩论网关（辩手 / 评审的模型调用、提示与输出解析）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: 日志初始化
//! - **ui**: Ratatui TUI 界面

pub mod config;
pub mod core;
pub mod gateway;
pub mod llm;
pub mod observability;
pub mod ui;
