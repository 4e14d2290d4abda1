//! TUI 应用主循环
//!
//! 进入全屏/原始模式，每帧读取最新快照、消费事件广播（拒绝与兜底提示），
//! 把键盘输入转为辩题或反驳发给编排器，再用 draw 渲染。

use std::io::{self, Stdout};

use crossterm::event::KeyCode;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::broadcast::error::TryRecvError;

use crate::core::{DebateEvent, DebateHandle, GatewayOperation};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{draw, ViewState};

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(handle: DebateHandle) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, handle).await;

    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    handle: DebateHandle,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(handle.clone());
    let mut events = handle.subscribe();
    let mut view = ViewState::default();
    let mut last_message_count = 0usize;

    loop {
        drain_events(&mut events, &mut view);
        let snapshot = handle.snapshot();

        if snapshot.messages.len() != last_message_count {
            last_message_count = snapshot.messages.len();
            view.scroll = usize::MAX;
        }

        let landing = view.on_landing(&snapshot);
        if let Some(ev) = event_handler.poll()? {
            match ev {
                AppEvent::Quit => break,
                AppEvent::NewTopic => {
                    view.choosing_topic = true;
                    view.input.clear();
                    view.notice = None;
                }
                AppEvent::Preset(i) => {
                    if let Some(submission) = view.choose_preset(i, &snapshot) {
                        event_handler.submit(submission);
                    }
                }
                AppEvent::Key(key) => match key.code {
                    KeyCode::Enter => {
                        if let Some(submission) = view.submit(&snapshot) {
                            event_handler.submit(submission);
                        }
                    }
                    KeyCode::Esc if landing && snapshot.topic.is_some() => {
                        view.choosing_topic = false;
                        view.input.clear();
                    }
                    KeyCode::Backspace => {
                        view.input.pop();
                    }
                    KeyCode::Char(c) => {
                        view.input.push(c);
                        view.notice = None;
                    }
                    KeyCode::Up => view.scroll = view.scroll.saturating_sub(1),
                    KeyCode::Down => view.scroll = view.scroll.saturating_add(1),
                    KeyCode::PageUp => view.scroll = view.scroll.saturating_sub(10),
                    KeyCode::PageDown => view.scroll = view.scroll.saturating_add(10),
                    KeyCode::Home => view.scroll = 0,
                    KeyCode::End => view.scroll = usize::MAX,
                    _ => {}
                },
            }
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| draw(f, &snapshot, &view, &mut scroll_info))?;
        let (total_lines, viewport_height) = scroll_info;
        view.scroll = view.scroll.min(total_lines.saturating_sub(viewport_height));

        tokio::task::yield_now().await;
    }

    Ok(())
}

/// 将拒绝 / 兜底事件转为界面提示
fn drain_events(
    events: &mut tokio::sync::broadcast::Receiver<DebateEvent>,
    view: &mut ViewState,
) {
    loop {
        match events.try_recv() {
            Ok(DebateEvent::InputRejected { reason }) => view.notice = Some(reason),
            Ok(DebateEvent::GatewayFallback { operation, .. }) => {
                let notice = match operation {
                    GatewayOperation::Continue => "Debater offline, fallback reply used",
                    GatewayOperation::Score => "Judge offline, neutral score used",
                };
                view.notice = Some(notice.to_string());
            }
            Ok(DebateEvent::SessionStarted { .. }) => view.notice = None,
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "UI lagged behind debate events");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
