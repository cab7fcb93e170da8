//! Speech engines available on a terminal host.
//!
//! `probe` runs once at startup and decides which engine backs each side of
//! the conversation. Everything after that only sees the core speech traits.

use crate::config::{SpeechConfig, SpeechInputKind, SpeechOutputKind};
use async_trait::async_trait;
use interview_core::speech::{
    SpeechCapabilities, SpeechError, SpeechInput, SpeechOutput, UnavailableSpeechInput,
    UnavailableSpeechOutput,
};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, mpsc};

/// Synthesizers tried, in order, when `SPEECH_OUTPUT=auto`.
const KNOWN_SYNTHESIZERS: [&str; 3] = ["espeak-ng", "espeak", "say"];

/// Feeds typed lines into a [`TerminalSpeechInput`].
pub type UtteranceSender = mpsc::UnboundedSender<String>;

/// Treats each line typed on the terminal as one final recognition result.
pub struct TerminalSpeechInput {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
    listening: Arc<AtomicBool>,
}

impl TerminalSpeechInput {
    pub fn new() -> (Self, UtteranceSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let input = Self {
            lines: Mutex::new(rx),
            listening: Arc::new(AtomicBool::new(false)),
        };
        (input, tx)
    }

    /// Shared flag that is true only while an activation is pending.
    pub fn listening_flag(&self) -> Arc<AtomicBool> {
        self.listening.clone()
    }
}

#[async_trait]
impl SpeechInput for TerminalSpeechInput {
    async fn listen(&self) -> Result<String, SpeechError> {
        let mut lines = self.lines.lock().await;

        // Lines typed while nobody was listening were never heard.
        let mut discarded = 0;
        while lines.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!("Discarded {} line(s) typed while not listening.", discarded);
        }

        self.listening.store(true, Ordering::SeqCst);
        let line = lines.recv().await;
        self.listening.store(false, Ordering::SeqCst);
        line.ok_or(SpeechError::Closed)
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}

/// Speaks through an external synthesizer process, one process per utterance.
pub struct CommandSpeechOutput {
    program: PathBuf,
    cancelled: Notify,
}

impl CommandSpeechOutput {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            cancelled: Notify::new(),
        }
    }

    fn args(&self, text: &str) -> Vec<String> {
        let name = self
            .program
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match name {
            "espeak" | "espeak-ng" => vec!["-v".into(), "en".into(), text.into()],
            _ => vec![text.into()],
        }
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeechOutput {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let cancelled = self.cancelled.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let mut child = tokio::process::Command::new(&self.program)
            .args(self.args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SpeechError::Failed(format!("failed to start {}: {}", self.program.display(), e))
            })?;

        let finished = tokio::select! {
            status = child.wait() => Some(status),
            _ = &mut cancelled => None,
        };

        match finished {
            Some(status) => {
                let status = status.map_err(|e| SpeechError::Failed(e.to_string()))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(SpeechError::Failed(format!(
                        "{} exited with {}",
                        self.program.display(),
                        status
                    )))
                }
            }
            None => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to silence synthesizer: {}", e);
                }
                Err(SpeechError::Failed("utterance cancelled".to_string()))
            }
        }
    }

    fn cancel(&self) {
        self.cancelled.notify_waiters();
    }
}

/// Console stand-in for a synthesizer. The view already prints the line, so
/// "speaking" is just the time it takes to read it.
pub struct ConsoleSpeechOutput {
    pace: Duration,
    cancelled: Notify,
}

impl ConsoleSpeechOutput {
    pub fn new(pace: Duration) -> Self {
        Self {
            pace,
            cancelled: Notify::new(),
        }
    }

    pub fn reading_time(&self, text: &str) -> Duration {
        let words = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
        self.pace.checked_mul(words).unwrap_or(Duration::MAX)
    }
}

#[async_trait]
impl SpeechOutput for ConsoleSpeechOutput {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let cancelled = self.cancelled.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        tokio::select! {
            _ = tokio::time::sleep(self.reading_time(text)) => Ok(()),
            _ = &mut cancelled => Err(SpeechError::Failed("utterance cancelled".to_string())),
        }
    }

    fn cancel(&self) {
        self.cancelled.notify_waiters();
    }
}

/// The resolved speech engines plus whatever the terminal needs to feed them.
pub struct ProbedSpeech {
    pub capabilities: SpeechCapabilities,
    /// Present when typed lines should reach the speech input.
    pub utterances: Option<UtteranceSender>,
    pub listening: Option<Arc<AtomicBool>>,
}

/// Resolves the speech engines for this host.
pub fn probe(config: &SpeechConfig) -> ProbedSpeech {
    probe_with(config, |name| which::which(name).ok())
}

/// Same as [`probe`] with an injectable `PATH` lookup.
pub fn probe_with(config: &SpeechConfig, find: impl Fn(&str) -> Option<PathBuf>) -> ProbedSpeech {
    let (input, utterances, listening) = match config.input {
        SpeechInputKind::Terminal => {
            let (input, tx) = TerminalSpeechInput::new();
            let flag = input.listening_flag();
            let input: Arc<dyn SpeechInput> = Arc::new(input);
            (input, Some(tx), Some(flag))
        }
        SpeechInputKind::None => {
            let input: Arc<dyn SpeechInput> =
                Arc::new(UnavailableSpeechInput::new("speech input disabled"));
            (input, None, None)
        }
    };

    let output: Arc<dyn SpeechOutput> = match &config.output {
        SpeechOutputKind::Auto => match KNOWN_SYNTHESIZERS.iter().find_map(|name| find(name)) {
            Some(program) => {
                tracing::info!("Using synthesizer {}", program.display());
                Arc::new(CommandSpeechOutput::new(program))
            }
            None => {
                tracing::info!("No synthesizer found; speaking to the console.");
                Arc::new(ConsoleSpeechOutput::new(config.pace))
            }
        },
        SpeechOutputKind::Console => Arc::new(ConsoleSpeechOutput::new(config.pace)),
        SpeechOutputKind::Command(name) => match find(name) {
            Some(program) => Arc::new(CommandSpeechOutput::new(program)),
            None => {
                tracing::warn!("Synthesizer '{}' not found on PATH.", name);
                Arc::new(UnavailableSpeechOutput::new(format!("{name} not found")))
            }
        },
    };

    ProbedSpeech {
        capabilities: SpeechCapabilities::new(input, output),
        utterances,
        listening,
    }
}
