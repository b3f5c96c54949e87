//! Application layer: chart computation and the conversation orchestrator.

pub mod chart_usecase;
pub mod messages;
pub mod mode;
pub mod orchestrator;

pub use chart_usecase::{ChartService, ChartView};
pub use mode::{Mode, ModeState};
pub use orchestrator::ConversationOrchestrator;
