//! Authentication orchestration.
//!
//! The core of the bot: the per-user conversation state machine, the
//! in-memory pending-authentication registry correlating in-flight logins
//! with the users that started them, and the orchestrator sequencing the
//! phone → code → two-factor protocol against the account client.
//!
//! Nothing here is persisted; a process restart loses in-flight logins and
//! the user starts the flow over.

mod error;
mod orchestrator;
mod registry;
mod state;

pub use error::AuthFlowError;
pub use orchestrator::{AuthOrchestrator, FlowReply};
pub use registry::{
    session_ref, BeginOutcome, CodeOutcome, PendingAuthRegistry, RetryReason, TwoFactorOutcome,
};
pub use state::{is_plausible_phone_number, ConversationState, ConversationTracker};
