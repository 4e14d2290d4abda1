//! 评审分数与越界处理策略

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::DebateError;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// 评审对用户一次发言的打分，产生后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Score 0-100 for logical consistency
    pub logic: f64,
    /// Score 0-100 for factual backing
    pub evidence: f64,
    /// Score 0-100 for tone/civility
    pub emotional_control: f64,
    /// One sentence constructive critique
    pub feedback: String,
}

impl Score {
    pub fn new(
        logic: f64,
        evidence: f64,
        emotional_control: f64,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            logic,
            evidence,
            emotional_control,
            feedback: feedback.into(),
        }
    }

    /// 评审不可用时的中性分
    pub fn neutral() -> Self {
        Self::new(50.0, 50.0, 50.0, "Evaluation unavailable")
    }

    fn values(&self) -> [f64; 3] {
        [self.logic, self.evidence, self.emotional_control]
    }
}

/// 分数越界时的处理方式；默认原样保留
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    #[default]
    PassThrough,
    /// 截断到 0..=100；非有限值仍视为评审失败
    Clamp,
    /// 任一字段越界即视为评审失败
    Reject,
}

impl ScorePolicy {
    pub fn apply(self, score: Score) -> Result<Score, DebateError> {
        match self {
            ScorePolicy::PassThrough => Ok(score),
            ScorePolicy::Clamp => {
                if score.values().iter().any(|v| !v.is_finite()) {
                    return Err(DebateError::EvaluationFailure(
                        "non-finite score field".to_string(),
                    ));
                }
                let clamp = |v: f64| v.clamp(SCORE_MIN, SCORE_MAX);
                Ok(Score {
                    logic: clamp(score.logic),
                    evidence: clamp(score.evidence),
                    emotional_control: clamp(score.emotional_control),
                    feedback: score.feedback,
                })
            }
            ScorePolicy::Reject => {
                if let Some(v) = score
                    .values()
                    .into_iter()
                    .find(|v| !(SCORE_MIN..=SCORE_MAX).contains(v))
                {
                    return Err(DebateError::EvaluationFailure(format!(
                        "score field out of range: {v}"
                    )));
                }
                Ok(score)
            }
        }
    }
}

/// 分数历史的各项平均值（评分面板用）
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub turns: usize,
    pub logic: f64,
    pub evidence: f64,
    pub emotional_control: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[Score]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let avg = |f: fn(&Score) -> f64| scores.iter().map(f).sum::<f64>() / n;
        Some(Self {
            turns: scores.len(),
            logic: avg(|s| s.logic),
            evidence: avg(|s| s.evidence),
            emotional_control: avg(|s| s.emotional_control),
        })
    }
}
