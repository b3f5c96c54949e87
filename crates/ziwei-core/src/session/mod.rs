//! Session domain module.
//!
//! - `message`: chat log entries (`MessageRole`, `ChatMessage`)
//! - `state`: the per-tab session (`SessionState`, `ActiveView`)
//! - `event`: progress notifications (`SessionEvent`)

mod event;
mod message;
mod state;

pub use event::SessionEvent;
pub use message::{ChatMessage, MessageRole};
pub use state::{ActiveView, SessionState};
