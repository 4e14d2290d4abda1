//! 解析模型输出：辩手回复（JSON 或纯文本 + Markdown 链接）与评审分数（JSON）

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{dedup_sources, DebateError, Score, Source};
use crate::gateway::prompts::EMPTY_REPLY_TEXT;
use crate::gateway::Rebuttal;

#[derive(Deserialize)]
struct RebuttalPayload {
    reply: String,
    #[serde(default)]
    sources: Vec<SourcePayload>,
}

#[derive(Deserialize)]
struct SourcePayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "url")]
    uri: Option<String>,
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\]\n]+)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
    })
}

/// 从第一个 `{` 起反序列化一个 JSON 值，忽略其后的任何文字（代码块结尾、附注等）
pub fn first_json_value<T: DeserializeOwned>(raw: &str) -> Option<serde_json::Result<T>> {
    let start = raw.find('{')?;
    serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<T>()
        .next()
}

/// 提取 `[title](https://...)` 形式的链接
pub fn extract_markdown_links(text: &str) -> Vec<Source> {
    markdown_link_re()
        .captures_iter(text)
        .map(|c| Source::new(c[1].trim(), &c[2]))
        .collect()
}

/// 解析辩手输出；不是约定的 JSON 时整段作为回复，并从中提取链接作为来源。
/// 标题或 URI 缺失的来源会被丢弃。
pub fn parse_rebuttal(raw: &str) -> Rebuttal {
    let parsed = first_json_value::<RebuttalPayload>(raw).and_then(Result::ok);

    let (text, sources) = match parsed {
        Some(payload) => {
            let mut sources: Vec<Source> = payload
                .sources
                .into_iter()
                .filter_map(|s| {
                    let title = s.title.filter(|t| !t.trim().is_empty())?;
                    let uri = s.uri.filter(|u| !u.trim().is_empty())?;
                    Some(Source::new(title.trim(), uri.trim()))
                })
                .collect();
            sources.extend(extract_markdown_links(&payload.reply));
            (payload.reply.trim().to_string(), sources)
        }
        None => {
            let text = raw.trim().to_string();
            let sources = extract_markdown_links(&text);
            (text, sources)
        }
    };

    let text = if text.is_empty() {
        EMPTY_REPLY_TEXT.to_string()
    } else {
        text
    };

    Rebuttal {
        text,
        sources: dedup_sources(sources),
    }
}

/// 解析评审输出；四个字段缺一不可
pub fn parse_score(raw: &str) -> Result<Score, DebateError> {
    first_json_value::<Score>(raw)
        .ok_or_else(|| DebateError::EvaluationFailure("no evaluation generated".to_string()))?
        .map_err(|e| DebateError::EvaluationFailure(format!("malformed evaluation: {e}")))
}
