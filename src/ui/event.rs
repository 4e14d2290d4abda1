//! 事件处理
//!
//! 轮询 crossterm 键盘事件：Ctrl+Q / Ctrl+C 退出，Ctrl+N 换题，F1..F4 选预设辩题，
//! 其余按键交给 run_app 拼输入缓冲；Enter 时通过 DebateHandle 发送辩题或反驳。

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::DebateHandle;
use crate::ui::render::Submission;

/// 应用事件：快捷键或原始 KeyEvent
#[derive(Debug, Clone)]
pub enum AppEvent {
    Quit,
    NewTopic,
    Preset(usize),
    Key(KeyEvent),
}

/// 事件处理器：持有 DebateHandle，poll 时读键盘并返回 AppEvent
pub struct EventHandler {
    handle: DebateHandle,
}

impl EventHandler {
    pub fn new(handle: DebateHandle) -> Self {
        Self { handle }
    }

    pub fn poll(&self) -> anyhow::Result<Option<AppEvent>> {
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(Self::map_key(key)));
                }
            }
        }
        Ok(None)
    }

    fn map_key(key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => AppEvent::Quit,
            KeyCode::Char('n') if ctrl => AppEvent::NewTopic,
            KeyCode::F(n @ 1..=4) => AppEvent::Preset(usize::from(n) - 1),
            _ => AppEvent::Key(key),
        }
    }

    /// 发后即忘；被拒绝时运行时会广播 InputRejected
    pub fn submit(&self, submission: Submission) {
        let sent = match submission {
            Submission::Topic(topic) => self.handle.send_topic(topic),
            Submission::Rebuttal(text) => self.handle.send_turn(text),
        };
        if let Err(e) = sent {
            tracing::warn!("Failed to submit input: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_shortcuts() {
        assert!(matches!(
            EventHandler::map_key(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            AppEvent::Quit
        ));
        assert!(matches!(
            EventHandler::map_key(key(KeyCode::Char('n'), KeyModifiers::CONTROL)),
            AppEvent::NewTopic
        ));
        assert!(matches!(
            EventHandler::map_key(key(KeyCode::F(3), KeyModifiers::NONE)),
            AppEvent::Preset(2)
        ));
        assert!(matches!(
            EventHandler::map_key(key(KeyCode::Char('n'), KeyModifiers::NONE)),
            AppEvent::Key(_)
        ));
        assert!(matches!(
            EventHandler::map_key(key(KeyCode::F(5), KeyModifiers::NONE)),
            AppEvent::Key(_)
        ));
    }
}
