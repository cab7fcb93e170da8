pub mod model;
pub mod session_state;
pub mod speech;
pub mod transcript;

pub use session_state::{InterviewController, Phase, SessionSettings, SessionState};

/// Updates that the core logic (`InterviewController`) publishes to the presentation layer.
///
/// The controller never renders anything itself; it only reports what changed
/// and lets the runtime decide how to show it.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// The status line changed.
    Status(String),
    /// The last recognized candidate utterance.
    Heard(String),
    /// The last interviewer line (opening question or model reply).
    Reply(String),
    /// The controller moved to a new phase.
    Phase(Phase),
}
