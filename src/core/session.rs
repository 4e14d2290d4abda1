//! 会话存储：唯一活跃会话及其变更约定
//!
//! 会话按值持有消息、分数与网关上下文；消息与分数只追加不重排。
//! 新辩题提交时整体替换旧会话（旧状态直接丢弃，不做持久化）。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{DebateError, DebateSnapshot, Phase, Score};
use crate::gateway::ContextHandle;

/// 消息作者
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    User,
    Agent,
}

/// 引用来源
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

impl Source {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// 按 URI 去重，保留首次出现的条目与顺序（标题不参与比较）
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect()
}

/// 单条消息，追加后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: AuthorRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// 仅 Agent 消息携带
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    /// 预留给倾听者的情绪标注，目前不填充
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: AuthorRole::User,
            text: text.into(),
            timestamp: Utc::now(),
            sources: None,
            sentiment: None,
        }
    }

    pub fn agent(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: AuthorRole::Agent,
            text: text.into(),
            timestamp: Utc::now(),
            sources: Some(dedup_sources(sources)),
            sentiment: None,
        }
    }

    pub fn sources(&self) -> &[Source] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

/// 一场辩论
#[derive(Debug)]
pub struct Session {
    id: String,
    topic: String,
    messages: Vec<Message>,
    scores: Vec<Score>,
    phase: Phase,
    pub(crate) context: ContextHandle,
}

impl Session {
    /// 辩题为空或仅含空白时返回 InvalidInput；否则以辩题作为第一条用户消息
    pub fn new(topic: &str, context: ContextHandle) -> Result<Self, DebateError> {
        if topic.trim().is_empty() {
            return Err(DebateError::InvalidInput);
        }
        Ok(Self {
            id: format!("debate_{}", uuid::Uuid::new_v4()),
            topic: topic.to_string(),
            messages: vec![Message::user(topic)],
            scores: Vec::new(),
            phase: Phase::Idle,
            context,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    pub fn snapshot(&self) -> DebateSnapshot {
        DebateSnapshot {
            session_id: Some(self.id.clone()),
            topic: Some(self.topic.clone()),
            phase: self.phase,
            messages: self.messages.clone(),
            scores: self.scores.clone(),
        }
    }
}

/// 持有唯一活跃会话
#[derive(Debug, Default)]
pub struct SessionStore {
    active: Option<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建会话并替换旧会话；辩题非法时旧会话保持不变
    pub fn create_session(
        &mut self,
        topic: &str,
        context: ContextHandle,
    ) -> Result<&Session, DebateError> {
        let session = Session::new(topic, context)?;
        if let Some(old) = self.active.replace(session) {
            tracing::info!(session_id = %old.id, "Discarding previous debate session");
        }
        self.active.as_ref().ok_or(DebateError::NoActiveSession)
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub(crate) fn active_mut(&mut self) -> Result<&mut Session, DebateError> {
        self.active.as_mut().ok_or(DebateError::NoActiveSession)
    }

    /// 无会话时视为 Idle
    pub fn phase(&self) -> Phase {
        self.active.as_ref().map(Session::phase).unwrap_or_default()
    }

    pub fn append_message(&mut self, message: Message) -> Result<(), DebateError> {
        self.active_mut()?.messages.push(message);
        Ok(())
    }

    pub fn append_score(&mut self, score: Score) -> Result<(), DebateError> {
        self.active_mut()?.scores.push(score);
        Ok(())
    }

    /// 仅供编排器调用；返回跳转前的阶段
    pub(crate) fn set_phase(&mut self, phase: Phase) -> Result<Phase, DebateError> {
        let session = self.active_mut()?;
        let from = session.phase;
        if !from.can_transition_to(phase) {
            return Err(DebateError::IllegalTransition { from, to: phase });
        }
        session.phase = phase;
        Ok(from)
    }

    pub fn snapshot(&self) -> DebateSnapshot {
        self.active
            .as_ref()
            .map(Session::snapshot)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(uri: &str) -> Source {
        Source::new(format!("title of {uri}"), uri)
    }

    #[test]
    fn test_create_session_seeds_topic_message() {
        let mut store = SessionStore::new();
        let session = store
            .create_session("X is bad", ContextHandle::new("X is bad"))
            .unwrap();
        assert_eq!(session.topic(), "X is bad");
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, AuthorRole::User);
        assert_eq!(session.messages()[0].text, "X is bad");
        assert!(session.messages()[0].sources.is_none());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.scores().is_empty());
    }

    #[test]
    fn test_blank_topic_rejected_without_touching_store() {
        let mut store = SessionStore::new();
        store
            .create_session("first", ContextHandle::new("first"))
            .unwrap();
        let err = store
            .create_session("  \t\n", ContextHandle::new(""))
            .unwrap_err();
        assert_eq!(err, DebateError::InvalidInput);
        assert_eq!(store.active().unwrap().topic(), "first");
    }

    #[test]
    fn test_new_topic_replaces_session() {
        let mut store = SessionStore::new();
        store.create_session("one", ContextHandle::new("one")).unwrap();
        store.append_message(Message::user("more")).unwrap();
        let first_id = store.active().unwrap().id().to_string();

        store.create_session("two", ContextHandle::new("two")).unwrap();
        let session = store.active().unwrap();
        assert_ne!(session.id(), first_id);
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_rebuttal_turns_grow_counts() {
        let mut store = SessionStore::new();
        store.create_session("t", ContextHandle::new("t")).unwrap();
        for n in 1..=3 {
            store.append_message(Message::user(format!("rebuttal {n}"))).unwrap();
            store.append_message(Message::agent("reply", vec![])).unwrap();
            store.append_score(Score::neutral()).unwrap();
            let session = store.active().unwrap();
            assert_eq!(session.messages().len(), 2 * n + 1);
            assert_eq!(session.scores().len(), n);
        }
    }

    #[test]
    fn test_append_requires_session() {
        let mut store = SessionStore::new();
        assert_eq!(
            store.append_message(Message::user("hi")),
            Err(DebateError::NoActiveSession)
        );
        assert_eq!(
            store.append_score(Score::neutral()),
            Err(DebateError::NoActiveSession)
        );
        assert_eq!(store.phase(), Phase::Idle);
    }

    #[test]
    fn test_set_phase_enforces_cycle() {
        let mut store = SessionStore::new();
        store.create_session("t", ContextHandle::new("t")).unwrap();
        assert_eq!(store.set_phase(Phase::Listening), Ok(Phase::Idle));
        assert_eq!(
            store.set_phase(Phase::Judging),
            Err(DebateError::IllegalTransition {
                from: Phase::Listening,
                to: Phase::Judging
            })
        );
        assert_eq!(store.phase(), Phase::Listening);
    }

    #[test]
    fn test_dedup_keeps_first_by_uri() {
        let mut dup = src("A");
        dup.title = "another title".to_string();
        let deduped = dedup_sources(vec![src("A"), src("B"), dup, src("C")]);
        let uris: Vec<&str> = deduped.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["A", "B", "C"]);
        assert_eq!(deduped[0].title, "title of A");
    }

    #[test]
    fn test_agent_message_dedups_sources() {
        let msg = Message::agent("rebuttal", vec![src("A"), src("A")]);
        assert_eq!(msg.role, AuthorRole::Agent);
        assert_eq!(msg.sources().len(), 1);
        assert!(msg.sentiment.is_none());
    }
}
