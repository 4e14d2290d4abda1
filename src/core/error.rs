//! 辩论运行时错误类型
//!
//! 只有 InvalidInput / PrematureTurn / NoActiveSession 会阻止回合开始；
//! GatewayUnavailable 与 EvaluationFailure 由编排器就地替换为兜底内容，不会传给调用方。

use thiserror::Error;

use crate::core::Phase;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DebateError {
    /// 辩题或反驳为空（或仅含空白）
    #[error("Input must not be empty")]
    InvalidInput,

    /// 非 Idle 阶段提交输入
    #[error("A turn is already in progress (phase: {phase})")]
    PrematureTurn { phase: Phase },

    /// 尚未提交辩题就发送反驳
    #[error("No active debate session")]
    NoActiveSession,

    /// 辩手调用失败（网络、超时、接口错误）
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// 评审调用失败，或返回缺少必需字段 / 数值不合法
    #[error("Evaluation failed: {0}")]
    EvaluationFailure(String),

    /// 非法阶段跳转（编排器内部不变量被破坏）
    #[error("Illegal phase transition: {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },

    /// 编排后台任务已退出
    #[error("Debate runtime stopped")]
    RuntimeStopped,
}

impl DebateError {
    /// 是否属于入口校验拒绝（不产生任何状态变更）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput | Self::PrematureTurn { .. } | Self::NoActiveSession
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_entry_errors_only() {
        assert!(DebateError::InvalidInput.is_rejection());
        assert!(DebateError::PrematureTurn {
            phase: Phase::Judging
        }
        .is_rejection());
        assert!(!DebateError::GatewayUnavailable("x".to_string()).is_rejection());
        assert_eq!(
            DebateError::PrematureTurn {
                phase: Phase::Researching
            }
            .to_string(),
            "A turn is already in progress (phase: Researching)"
        );
    }
}
