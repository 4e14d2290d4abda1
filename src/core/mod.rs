//! 核心编排层：会话存储、阶段状态机、评分策略、事件与运行时

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod runtime;
pub mod score;
pub mod session;
pub mod state;

pub use error::DebateError;
pub use events::{DebateEvent, GatewayOperation};
pub use orchestrator::{AcceptedTurn, TurnOrchestrator, TurnReport, TurnTiming};
pub use runtime::{create_debate, spawn_debate, Command, DebateHandle};
pub use score::{Score, ScorePolicy, ScoreSummary};
pub use session::{dedup_sources, AuthorRole, Message, Session, SessionStore, Source};
pub use state::{DebateSnapshot, Phase};
