//! Chat-driven client assessment: one status question per criterion, persisted between turns.

pub mod flow;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

pub use flow::{
    AssessmentError, AssessmentFlow, AssessmentPrompt, AssessmentStep, StatusOption,
    DEFAULT_SESSION_TTL_SECS,
};
pub use router::assessment_router;
pub use session::{AssessmentSession, ChatUserId, SessionStore};
