//! 界面渲染
//!
//! 无会话或正在换题时绘制落地页（辩题输入 + 预设辩题）；否则左侧为对话与输入框，
//! 右侧为评审面板（最新分数、点评、历史平均）。

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Gauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};

use crate::core::{AuthorRole, DebateSnapshot, Message};

/// 落地页的预设辩题（F1..F4）
pub const PRESET_TOPICS: &[&str] = &[
    "Social media does more harm than good.",
    "Universal Basic Income is inevitable.",
    "AI art is not real art.",
    "Remote work destroys company culture.",
];

const ACCENT: Color = Color::Yellow;

/// 界面本地状态（输入缓冲、滚动、提示），不属于会话
#[derive(Debug, Default)]
pub struct ViewState {
    pub input: String,
    pub scroll: usize,
    /// Ctrl+N 后回到落地页选择新辩题
    pub choosing_topic: bool,
    /// 最近一次拒绝或兜底的提示
    pub notice: Option<String>,
}

/// Enter 或预设键产生的提交
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Topic(String),
    Rebuttal(String),
}

const BUSY_NOTICE: &str = "Agents are still working; your text is kept";

impl ViewState {
    pub fn on_landing(&self, snapshot: &DebateSnapshot) -> bool {
        self.choosing_topic || snapshot.topic.is_none()
    }

    /// Enter：回合进行中不取走输入，只给出提示
    pub fn submit(&mut self, snapshot: &DebateSnapshot) -> Option<Submission> {
        if self.input.trim().is_empty() {
            return None;
        }
        if snapshot.input_locked() {
            self.notice = Some(BUSY_NOTICE.to_string());
            return None;
        }
        let input = std::mem::take(&mut self.input);
        if self.on_landing(snapshot) {
            self.choosing_topic = false;
            Some(Submission::Topic(input))
        } else {
            Some(Submission::Rebuttal(input))
        }
    }

    /// F1..F4：仅在落地页且处于 Idle 时生效
    pub fn choose_preset(&mut self, index: usize, snapshot: &DebateSnapshot) -> Option<Submission> {
        if !self.on_landing(snapshot) {
            return None;
        }
        let topic = PRESET_TOPICS.get(index)?;
        if snapshot.input_locked() {
            self.notice = Some(BUSY_NOTICE.to_string());
            return None;
        }
        self.choosing_topic = false;
        self.input.clear();
        Some(Submission::Topic(topic.to_string()))
    }
}

/// 将内容按宽度换行，按字符数计，避免在 UTF-8 中间截断
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        lines.push(line);
    }
    lines
}

/// Paragraph 的滚动行号为 u16，超长对话停在最大值
fn scroll_row(offset: usize) -> u16 {
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// 消息时间，本地时区 HH:MM
fn message_time(m: &Message) -> String {
    m.timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// 绘制一帧；将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(f: &mut Frame, snapshot: &DebateSnapshot, view: &ViewState, out: &mut (usize, usize)) {
    if view.on_landing(snapshot) {
        draw_landing(f, snapshot, view);
        *out = (0, 0);
    } else {
        draw_debate(f, snapshot, view, out);
    }
}

fn draw_landing(f: &mut Frame, snapshot: &DebateSnapshot, view: &ViewState) {
    let area = centered(f.area(), 72, 18);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "The Devil's Advocate",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "State a controversial opinion. The agents will research, rebut and judge you.",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(title, chunks[0]);

    let input = Paragraph::new(view.input.as_str()).block(
        Block::default()
            .title(" State a controversial opinion... ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT)),
    );
    f.render_widget(input, chunks[1]);

    let mut presets = vec![Line::from(Span::styled(
        "Or choose a topic",
        Style::default().fg(Color::DarkGray),
    ))];
    presets.extend(PRESET_TOPICS.iter().enumerate().map(|(i, t)| {
        Line::from(vec![
            Span::styled(format!("F{} ", i + 1), Style::default().fg(ACCENT)),
            Span::raw(*t),
        ])
    }));
    f.render_widget(Paragraph::new(presets), chunks[2]);

    let hint = match (&view.notice, snapshot.topic.is_some()) {
        (Some(n), _) => n.clone(),
        (None, true) => "Enter start │ Esc back to debate │ Ctrl+Q quit".to_string(),
        (None, false) => "Enter start │ Ctrl+Q quit".to_string(),
    };
    f.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray)))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn draw_debate(
    f: &mut Frame,
    snapshot: &DebateSnapshot,
    view: &ViewState,
    out: &mut (usize, usize),
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(38)])
        .split(f.area());
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(columns[0]);

    draw_conversation(f, snapshot, view, left[0], out);

    let activity = match snapshot.phase.activity() {
        Some(text) => Line::from(vec![
            Span::styled(
                " Agent Active ",
                Style::default().fg(Color::Black).bg(ACCENT),
            ),
            Span::styled(
                format!(" ⟳ {text}"),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
        ]),
        None => Line::from(Span::styled(
            " Your Turn ",
            Style::default().fg(Color::Black).bg(Color::Green),
        )),
    };
    f.render_widget(Paragraph::new(activity), left[1]);

    let locked = snapshot.input_locked();
    let title = if let Some(notice) = &view.notice {
        format!(" {} ", notice.chars().take(48).collect::<String>())
    } else if locked {
        " Agent is speaking... ".to_string()
    } else {
        " Type your rebuttal... ".to_string()
    };
    let hint = " Enter send │ PgUp/PgDn scroll │ Ctrl+N new topic │ Ctrl+Q quit ";
    let input = Paragraph::new(view.input.as_str())
        .block(
            Block::default()
                .title(title)
                .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if locked {
                    Color::DarkGray
                } else {
                    Color::Blue
                })),
        )
        .style(if locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });
    f.render_widget(input, left[2]);

    draw_score_panel(f, snapshot, columns[1]);
}

fn draw_conversation(
    f: &mut Frame,
    snapshot: &DebateSnapshot,
    view: &ViewState,
    area: Rect,
    out: &mut (usize, usize),
) {
    let topic = snapshot.topic.as_deref().unwrap_or_default();
    let block = Block::default()
        .title(format!(" ● {} │ {} ", topic, snapshot.phase))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    let content_width = area.width.saturating_sub(3) as usize; // 边框 + 滚动条

    let lines = conversation_lines(&snapshot.messages, content_width);

    let content_height = area.height.saturating_sub(2) as usize;
    let total_lines = lines.len();
    let scroll_offset = view.scroll.min(total_lines.saturating_sub(content_height));

    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Text::from(lines)).scroll((scroll_row(scroll_offset), 0)),
        inner,
    );

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    *out = (total_lines, content_height);
}

/// 对话区的全部行：作者与时间、正文、引用来源
fn conversation_lines(messages: &[Message], content_width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for (idx, m) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        let (author, color) = match m.role {
            AuthorRole::User => ("You", Color::Cyan),
            AuthorRole::Agent => ("Devil's Advocate", ACCENT),
        };
        lines.push(Line::from(vec![
            Span::styled(author, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", message_time(m)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        for line in wrap_text(&m.text, content_width.saturating_sub(2).max(20)) {
            lines.push(Line::from(vec![
                Span::styled("▌ ", Style::default().fg(color)),
                Span::raw(line),
            ]));
        }
        if !m.sources().is_empty() {
            lines.push(Line::from(Span::styled(
                "  Researched Evidence",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        for (n, source) in m.sources().iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!("  [{}] {} - {}", n + 1, source.title, source.uri),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    lines
}

fn draw_score_panel(f: &mut Frame, snapshot: &DebateSnapshot, area: Rect) {
    let block = Block::default()
        .title(" Judge's Evaluation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(score) = snapshot.latest_score() else {
        let empty = Paragraph::new("Review unavailable.\nStart debating to receive a critique.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, inner);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(inner);

    for (row, (label, value)) in [
        ("Logic", score.logic),
        ("Facts", score.evidence),
        ("Tone", score.emotional_control),
    ]
    .into_iter()
    .enumerate()
    {
        f.render_widget(score_gauge(label, value), rows[row]);
    }

    let critique = Paragraph::new(format!("\"{}\"", score.feedback))
        .block(Block::default().title(" Critique ").borders(Borders::TOP))
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .wrap(Wrap { trim: true });
    f.render_widget(critique, rows[3]);

    if let Some(summary) = snapshot.score_summary() {
        let text = format!(
            "{} turn(s): L {:.0} / F {:.0} / T {:.0}",
            summary.turns, summary.logic, summary.evidence, summary.emotional_control
        );
        let avg = Paragraph::new(Span::styled(text, Style::default().fg(Color::Gray)))
            .block(Block::default().title(" Average ").borders(Borders::TOP));
        f.render_widget(avg, rows[4]);
    }
}

fn score_gauge(label: &str, value: f64) -> Gauge<'static> {
    let percent = if value.is_finite() {
        value.clamp(0.0, 100.0).round() as u16
    } else {
        0
    };
    Gauge::default()
        .block(Block::default().title(format!(" {label} ")))
        .gauge_style(Style::default().fg(ACCENT).bg(Color::Black))
        .percent(percent)
        .label(format!("{value:.0}"))
}

/// 取 area 中央 width x height 的矩形（不超过 area）
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Phase, Source};

    #[test]
    fn test_wrap_text_by_chars() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("辩论辩论辩", 2), vec!["辩论", "辩论", "辩"]);
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_agent_sources_listed_under_evidence_label() {
        let user = Message::user("X is bad");
        let agent = Message::agent(
            "Not quite.",
            vec![Source::new("Study", "https://example.org/study")],
        );
        let lines: Vec<String> = conversation_lines(&[user.clone(), agent], 60)
            .iter()
            .map(line_text)
            .collect();

        assert_eq!(lines[0], format!("You  {}", message_time(&user)));
        assert_eq!(lines.iter().filter(|l| l.contains("Researched Evidence")).count(), 1);
        assert!(lines.last().unwrap().ends_with("[1] Study - https://example.org/study"));
        let time = message_time(&user);
        assert_eq!(time.len(), 5);
        assert_eq!(&time[2..3], ":");
    }

    #[test]
    fn test_user_message_has_no_evidence_label() {
        let lines = conversation_lines(&[Message::user("X is bad")], 60);
        assert!(!lines.iter().any(|l| line_text(l).contains("Researched Evidence")));
    }

    #[test]
    fn test_scroll_row_saturates() {
        assert_eq!(scroll_row(42), 42);
        assert_eq!(scroll_row(usize::from(u16::MAX) + 10), u16::MAX);
    }

    fn locked_snapshot() -> DebateSnapshot {
        DebateSnapshot {
            topic: Some("t".to_string()),
            phase: Phase::Researching,
            ..DebateSnapshot::default()
        }
    }

    #[test]
    fn test_new_topic_typed_mid_turn_is_kept() {
        let mut view = ViewState {
            input: "Tea beats coffee".to_string(),
            choosing_topic: true,
            ..ViewState::default()
        };
        let snapshot = locked_snapshot();
        assert_eq!(view.submit(&snapshot), None);
        assert_eq!(view.input, "Tea beats coffee");
        assert!(view.choosing_topic);
        assert!(view.notice.is_some());
        assert_eq!(view.choose_preset(0, &snapshot), None);

        let idle = DebateSnapshot {
            phase: Phase::Idle,
            ..snapshot
        };
        assert_eq!(
            view.submit(&idle),
            Some(Submission::Topic("Tea beats coffee".to_string()))
        );
        assert!(view.input.is_empty());
        assert!(!view.choosing_topic);
    }

    #[test]
    fn test_submit_routes_by_view() {
        let idle = DebateSnapshot {
            topic: Some("t".to_string()),
            ..DebateSnapshot::default()
        };
        let mut view = ViewState {
            input: "  ".to_string(),
            ..ViewState::default()
        };
        assert_eq!(view.submit(&idle), None);
        view.input = "But consider...".to_string();
        assert_eq!(
            view.submit(&idle),
            Some(Submission::Rebuttal("But consider...".to_string()))
        );
        assert_eq!(view.choose_preset(1, &idle), None);
        assert_eq!(
            view.choose_preset(1, &DebateSnapshot::default()),
            Some(Submission::Topic(PRESET_TOPICS[1].to_string()))
        );
    }

    #[test]
    fn test_landing_when_no_session() {
        let view = ViewState::default();
        let mut snapshot = DebateSnapshot::default();
        assert!(view.on_landing(&snapshot));
        snapshot.topic = Some("t".to_string());
        assert!(!view.on_landing(&snapshot));
    }
}
