//! 阶段定义与 UI 投影快照
//!
//! 回合阶段严格按 Idle → Listening → Researching → Debating → Judging → Idle 循环，
//! 只有 Idle 接受新的用户输入。UI 只持有 DebateSnapshot，从不直接修改会话。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Message, Score, ScoreSummary};

/// 编排器当前所处阶段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Listening,
    Researching,
    Debating,
    Judging,
}

impl Phase {
    /// 循环中的下一阶段（Judging 之后回到 Idle）
    pub fn next(self) -> Phase {
        match self {
            Phase::Idle => Phase::Listening,
            Phase::Listening => Phase::Researching,
            Phase::Researching => Phase::Debating,
            Phase::Debating => Phase::Judging,
            Phase::Judging => Phase::Idle,
        }
    }

    /// 唯一合法的跳转是循环中的下一条边
    pub fn can_transition_to(self, to: Phase) -> bool {
        self.next() == to
    }

    pub fn accepts_input(self) -> bool {
        self == Phase::Idle
    }

    /// 当前阶段对应的智能体活动描述；Idle 时无
    pub fn activity(self) -> Option<&'static str> {
        match self {
            Phase::Idle => None,
            Phase::Listening => Some("Listener Agent: Analyzing your argument..."),
            Phase::Researching => {
                Some("Researcher Agent: Scouring the web for counter-evidence...")
            }
            Phase::Debating => Some("Debater Agent: Constructing logical rebuttal..."),
            Phase::Judging => Some("Judge Agent: Evaluating your performance..."),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "Idle",
            Phase::Listening => "Listening",
            Phase::Researching => "Researching",
            Phase::Debating => "Debating",
            Phase::Judging => "Judging",
        };
        f.write_str(name)
    }
}

/// UI 看到的「投影」状态：会话的只读副本
#[derive(Clone, Debug, Default, Serialize)]
pub struct DebateSnapshot {
    pub session_id: Option<String>,
    pub topic: Option<String>,
    pub phase: Phase,
    pub messages: Vec<Message>,
    pub scores: Vec<Score>,
}

impl DebateSnapshot {
    pub fn input_locked(&self) -> bool {
        !self.phase.accepts_input()
    }

    pub fn latest_score(&self) -> Option<&Score> {
        self.scores.last()
    }

    pub fn score_summary(&self) -> Option<ScoreSummary> {
        ScoreSummary::from_scores(&self.scores)
    }
}
