//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ADVOCATE__*` 覆盖（双下划线表示嵌套，如 `ADVOCATE__LLM__PROVIDER=openai`）。

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::ScorePolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub debate: DebateSection,
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；最终选择还取决于是否设置了 API Key
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: ProviderModelSection,
    #[serde(default)]
    pub openai: ProviderModelSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            deepseek: ProviderModelSection::default(),
            openai: ProviderModelSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderModelSection {
    pub model: Option<String>,
}

/// [llm.timeouts] 段：网关单次调用的等待上限
#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [debate] 段：回合节奏与评分策略
#[derive(Debug, Clone, Deserialize)]
pub struct DebateSection {
    /// Listening 阶段的停顿（毫秒），给界面一个可感知的节拍
    #[serde(default = "default_listen_delay_ms")]
    pub listen_delay_ms: u64,
    /// Debating 阶段追加回复前的停顿（毫秒）
    #[serde(default = "default_debate_delay_ms")]
    pub debate_delay_ms: u64,
    /// 评审分数越界时的处理方式
    #[serde(default)]
    pub score_policy: ScorePolicy,
    /// 事件广播通道容量
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DebateSection {
    fn default() -> Self {
        Self {
            listen_delay_ms: default_listen_delay_ms(),
            debate_delay_ms: default_debate_delay_ms(),
            score_policy: ScorePolicy::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl DebateSection {
    pub fn listen_delay(&self) -> Duration {
        Duration::from_millis(self.listen_delay_ms)
    }

    pub fn debate_delay(&self) -> Duration {
        Duration::from_millis(self.debate_delay_ms)
    }
}

fn default_listen_delay_ms() -> u64 {
    800
}

fn default_debate_delay_ms() -> u64 {
    600
}

fn default_event_buffer() -> usize {
    64
}

/// 按固定路径查找的默认配置文件
const DEFAULT_CONFIG_CANDIDATES: [&str; 3] =
    ["config/default.toml", "../config/default.toml", "default.toml"];

/// 加载配置，后者覆盖前者：默认配置文件（取第一个存在的）、显式文件、`ADVOCATE__*` 环境变量
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let defaults = DEFAULT_CONFIG_CANDIDATES
        .iter()
        .copied()
        .map(Path::new)
        .find(|p| p.exists());
    let explicit = config_path.filter(|p| p.exists());

    let mut builder = config::Config::builder();
    for file in defaults.into_iter().chain(explicit) {
        tracing::debug!(path = %file.display(), "Loading config file");
        builder = builder.add_source(config::File::from(file).required(false));
    }

    builder
        .add_source(
            config::Environment::with_prefix("ADVOCATE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
