//! 后端选择
//!
//! 先按配置与环境中可用的 Key 决定 Backend，再构建客户端。DeepSeek 与 OpenAI 同为兼容协议，
//! 只是端点与默认模型不同。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// 解析后的后端
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    DeepSeek { model: String, api_key: String },
    OpenAi {
        model: String,
        base_url: Option<String>,
        api_key: String,
    },
    Mock,
}

impl Backend {
    /// `env` 用于读取 Key（测试时可注入）
    pub fn resolve(cfg: &AppConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let deepseek_key = env("DEEPSEEK_API_KEY");
        let openai_key = env("OPENAI_API_KEY");

        match cfg.llm.provider.to_lowercase().as_str() {
            "mock" => Backend::Mock,
            "openai" => match openai_key {
                Some(api_key) => Backend::OpenAi {
                    model: cfg
                        .llm
                        .openai
                        .model
                        .clone()
                        .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
                    base_url: cfg.llm.base_url.clone(),
                    api_key,
                },
                None => Backend::Mock,
            },
            // deepseek 或未知名称：DeepSeek Key 优先，OpenAI Key 也可用于兼容端点
            _ => match deepseek_key.or(openai_key) {
                Some(api_key) => Backend::DeepSeek {
                    model: cfg
                        .llm
                        .deepseek
                        .model
                        .clone()
                        .or_else(|| env("DEEPSEEK_MODEL"))
                        .unwrap_or_else(|| cfg.llm.model.clone()),
                    api_key,
                },
                None => Backend::Mock,
            },
        }
    }

    pub fn build(self) -> Arc<dyn LlmClient> {
        match self {
            Backend::DeepSeek { model, api_key } => {
                tracing::info!(%model, "Using DeepSeek backend");
                Arc::new(OpenAiClient::new(Some(DEEPSEEK_BASE_URL), model, &api_key))
            }
            Backend::OpenAi {
                model,
                base_url,
                api_key,
            } => {
                tracing::info!(%model, "Using OpenAI-compatible backend");
                Arc::new(OpenAiClient::new(base_url.as_deref(), model, &api_key))
            }
            Backend::Mock => {
                tracing::warn!("Using mock backend; replies are canned");
                Arc::new(MockLlmClient)
            }
        }
    }
}

/// 按配置与进程环境创建客户端；缺少 Key 时回退到 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    Backend::resolve(cfg, |name| std::env::var(name).ok()).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_no_keys_falls_back_to_mock() {
        let cfg = AppConfig::default();
        assert_eq!(Backend::resolve(&cfg, env_with(&[])), Backend::Mock);
    }

    #[test]
    fn test_deepseek_accepts_openai_key() {
        let cfg = AppConfig::default();
        let backend = Backend::resolve(&cfg, env_with(&[("OPENAI_API_KEY", "sk-o")]));
        assert_eq!(
            backend,
            Backend::DeepSeek {
                model: DEEPSEEK_CHAT.to_string(),
                api_key: "sk-o".to_string()
            }
        );
    }

    #[test]
    fn test_openai_uses_configured_endpoint() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "OpenAI".to_string();
        cfg.llm.base_url = Some("http://localhost:8080/v1".to_string());
        let backend = Backend::resolve(
            &cfg,
            env_with(&[("OPENAI_API_KEY", "sk-o"), ("DEEPSEEK_API_KEY", "sk-d")]),
        );
        assert_eq!(
            backend,
            Backend::OpenAi {
                model: OPENAI_DEFAULT_MODEL.to_string(),
                base_url: Some("http://localhost:8080/v1".to_string()),
                api_key: "sk-o".to_string()
            }
        );
    }

    #[test]
    fn test_mock_provider_ignores_keys() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        let backend = Backend::resolve(&cfg, env_with(&[("DEEPSEEK_API_KEY", "sk-d")]));
        assert_eq!(backend, Backend::Mock);
    }
}
