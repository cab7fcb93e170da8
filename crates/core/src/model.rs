use crate::transcript::Turn;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Instruction sent ahead of the transcript on every request.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional job interviewer conducting a spoken interview. \
Ask exactly one question at a time and keep it short enough to be read aloud. \
Never repeat a question you have already asked. \
Stop after five questions in total and close the interview politely.";

/// Line spoken in place of a reply when the model cannot be reached or answers
/// with something unusable.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't understand.";

// The `ModelClient` trait is the seam between the turn-taking logic and whatever
// hosted model produces the next question. Implementations swallow their own
// failures: `ask` always yields text to speak, so the controller has a single
// reply path.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends the system instruction plus the whole transcript (oldest turn first)
    /// and returns the interviewer's next line.
    async fn ask(&self, transcript: &[Turn]) -> String;
}
