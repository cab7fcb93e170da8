//! Speech capability adapters.
//!
//! The controller talks to speech-to-text and text-to-speech only through the
//! [`SpeechInput`] and [`SpeechOutput`] traits. Which concrete engine backs them
//! is decided once, at startup, and bundled into a [`SpeechCapabilities`]. A
//! missing engine is represented by the `Unavailable*` adapters, so the
//! controller never probes the host environment itself.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech capability unavailable: {0}")]
    Unavailable(String),
    #[error("speech source closed")]
    Closed,
    #[error("speech engine failed: {0}")]
    Failed(String),
}

/// A single-shot speech-to-text source.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Starts listening and resolves with the first final utterance.
    ///
    /// The adapter deactivates itself after delivering it; capturing again
    /// requires another call.
    async fn listen(&self) -> Result<String, SpeechError>;

    /// Stops listening. Anything captured while inactive is discarded.
    fn stop(&self);

    fn is_available(&self) -> bool {
        true
    }
}

/// A text-to-speech sink.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Renders one utterance; resolves once it has finished playing.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Silences the utterance in progress, if any.
    fn cancel(&self);

    fn is_available(&self) -> bool {
        true
    }
}

/// Stands in for a host without speech recognition.
#[derive(Debug, Clone)]
pub struct UnavailableSpeechInput {
    reason: String,
}

impl UnavailableSpeechInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechInput for UnavailableSpeechInput {
    async fn listen(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn stop(&self) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// Stands in for a host without speech synthesis.
#[derive(Debug, Clone)]
pub struct UnavailableSpeechOutput {
    reason: String,
}

impl UnavailableSpeechOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechOutput for UnavailableSpeechOutput {
    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }

    fn cancel(&self) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// The speech adapters resolved for this host.
#[derive(Clone)]
pub struct SpeechCapabilities {
    pub input: Arc<dyn SpeechInput>,
    pub output: Arc<dyn SpeechOutput>,
}

impl SpeechCapabilities {
    pub fn new(input: Arc<dyn SpeechInput>, output: Arc<dyn SpeechOutput>) -> Self {
        Self { input, output }
    }

    /// Capabilities for a host with neither engine.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            input: Arc::new(UnavailableSpeechInput::new(reason)),
            output: Arc::new(UnavailableSpeechOutput::new(reason)),
        }
    }
}

impl std::fmt::Debug for SpeechCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCapabilities")
            .field("input_available", &self.input.is_available())
            .field("output_available", &self.output.is_available())
            .finish()
    }
}
