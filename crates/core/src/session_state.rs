use crate::{
    ViewUpdate,
    model::ModelClient,
    speech::{SpeechCapabilities, SpeechError},
    transcript::{Speaker, Transcript, Turn},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Questions asked per session, the opening question included.
pub const MAX_QUESTIONS: u32 = 5;
pub const OPENING_QUESTION: &str = "Hello! Let's start the interview. Tell me about yourself.";
pub const ENDED_MESSAGE: &str = "Interview ended. Thank you!";
pub const IN_PROGRESS_MESSAGE: &str = "Interview in progress.";
/// Pause between the end of an utterance and re-activating capture, so the
/// tail of the interviewer's own voice is not recognized as an answer.
pub const DEFAULT_LISTEN_DELAY: Duration = Duration::from_millis(700);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Listening,
    AwaitingReply,
    Speaking,
    Ended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Gates all speech I/O.
    pub active: bool,
    pub turns_asked: u32,
    /// True while a model request is outstanding.
    pub busy: bool,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_questions: u32,
    pub listen_delay: Duration,
    pub opening_question: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_questions: MAX_QUESTIONS,
            listen_delay: DEFAULT_LISTEN_DELAY,
            opening_question: OPENING_QUESTION.to_string(),
        }
    }
}

enum Capture {
    Answer(String),
    Stopped,
    Stalled,
}

/// Owns the transcript and session state and runs the
/// listen → ask → speak loop of one interview at a time.
pub struct InterviewController {
    phase: Phase,
    state: SessionState,
    transcript: Transcript,
    speech: SpeechCapabilities,
    model: Arc<dyn ModelClient>,
    settings: SessionSettings,
    view_tx: UnboundedSender<ViewUpdate>,
    stop_token: CancellationToken,
}

impl InterviewController {
    pub fn new(
        speech: SpeechCapabilities,
        model: Arc<dyn ModelClient>,
        settings: SessionSettings,
        view_tx: UnboundedSender<ViewUpdate>,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            state: SessionState::default(),
            transcript: Transcript::new(),
            speech,
            model,
            settings,
            view_tx,
            stop_token: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Token that, once cancelled, forces the running session to end.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop_token.clone()
    }

    /// Begins a new session: clears the transcript, resets the counters and
    /// queues the opening question. Returns the session's stop handle.
    ///
    /// Nothing is spoken until [`conduct`](Self::conduct) runs.
    pub fn start(&mut self) -> CancellationToken {
        if self.state.active {
            tracing::warn!("Start requested while a session is active; restarting.");
            self.stop_token.cancel();
            self.speech.output.cancel();
            self.speech.input.stop();
        }

        self.stop_token = CancellationToken::new();
        self.transcript.clear();
        self.state = SessionState {
            active: true,
            turns_asked: 1,
            busy: false,
        };

        let opening = self.settings.opening_question.clone();
        self.transcript.push(Turn::interviewer(opening.clone()));
        tracing::info!("Interview started.");
        self.publish(ViewUpdate::Status(IN_PROGRESS_MESSAGE.to_string()));
        self.publish(ViewUpdate::Reply(opening));
        self.set_phase(Phase::Speaking);

        self.stop_token.clone()
    }

    /// Drives the session until it ends, either because the question limit was
    /// reached or because the stop handle was cancelled.
    ///
    /// Every wait (speech, listen delay, capture, model reply) is raced against
    /// the stop handle.
    pub async fn conduct(&mut self) -> Phase {
        let stop = self.stop_token.clone();

        while self.state.active {
            let line = match self.transcript.last() {
                Some(turn) if turn.speaker == Speaker::Interviewer => turn.text.clone(),
                _ => break,
            };

            if !self.say(&line, &stop).await {
                return self.stop();
            }

            if self.state.turns_asked >= self.settings.max_questions {
                return self.finish();
            }

            if until_stopped(&stop, tokio::time::sleep(self.settings.listen_delay))
                .await
                .is_none()
            {
                return self.stop();
            }

            let answer = match self.capture(&stop).await {
                Capture::Answer(text) => text,
                Capture::Stopped => return self.stop(),
                Capture::Stalled => {
                    // Nothing can be captured any more; only a stop can end the session.
                    stop.cancelled().await;
                    return self.stop();
                }
            };

            if self.submit_answer(answer, &stop).await.is_none() && stop.is_cancelled() {
                return self.stop();
            }
        }

        self.phase
    }

    /// Records a candidate turn and asks the model for the next question.
    ///
    /// Returns `None` without issuing a request when the session is inactive or
    /// a request is already in flight, and discards a reply that arrives after
    /// the stop handle was cancelled.
    pub async fn submit_answer(
        &mut self,
        text: String,
        stop: &CancellationToken,
    ) -> Option<String> {
        if !self.state.active {
            tracing::debug!("Ignoring answer: no active session.");
            return None;
        }
        if self.state.busy {
            tracing::debug!("Ignoring answer: a model request is already in flight.");
            return None;
        }

        tracing::info!("Candidate said: \"{}\"", text);
        self.transcript.push(Turn::candidate(text.clone()));
        self.publish(ViewUpdate::Heard(text));
        self.set_phase(Phase::AwaitingReply);

        self.state.busy = true;
        let model = Arc::clone(&self.model);
        let reply = until_stopped(stop, model.ask(self.transcript.turns())).await;
        self.state.busy = false;

        let Some(reply) = reply else {
            tracing::info!("Discarding model reply: interview was stopped.");
            return None;
        };

        tracing::info!("Interviewer replied: \"{}\"", reply);
        self.transcript.push(Turn::interviewer(reply.clone()));
        self.state.turns_asked = (self.state.turns_asked + 1).min(self.settings.max_questions);
        self.publish(ViewUpdate::Reply(reply.clone()));
        self.set_phase(Phase::Speaking);
        Some(reply)
    }

    /// Forces the session to end from any phase.
    pub fn stop(&mut self) -> Phase {
        self.stop_token.cancel();
        self.speech.output.cancel();
        self.speech.input.stop();
        self.state.turns_asked = self.settings.max_questions;
        self.state.active = false;
        self.state.busy = false;
        tracing::info!("Interview stopped.");
        self.publish(ViewUpdate::Status(ENDED_MESSAGE.to_string()));
        self.set_phase(Phase::Ended);
        self.phase
    }

    fn finish(&mut self) -> Phase {
        self.speech.input.stop();
        self.state.active = false;
        tracing::info!(
            "Interview complete after {} questions.",
            self.state.turns_asked
        );
        self.publish(ViewUpdate::Status(ENDED_MESSAGE.to_string()));
        self.set_phase(Phase::Ended);
        self.phase
    }

    /// Speaks `text`. Returns false if the stop handle fired first.
    async fn say(&mut self, text: &str, stop: &CancellationToken) -> bool {
        if !self.state.active {
            return true;
        }
        self.speech.input.stop();
        self.set_phase(Phase::Speaking);

        let output = Arc::clone(&self.speech.output);
        match until_stopped(stop, output.speak(text)).await {
            None => {
                output.cancel();
                false
            }
            Some(Ok(())) => true,
            Some(Err(e)) => {
                // The reply is still on screen; carry on as if it had been heard.
                tracing::warn!("Speech output failed: {}", e);
                true
            }
        }
    }

    async fn capture(&mut self, stop: &CancellationToken) -> Capture {
        let input = Arc::clone(&self.speech.input);
        if !input.is_available() {
            tracing::warn!("No speech input available; waiting for stop.");
            return Capture::Stalled;
        }
        if !self.state.active || self.state.busy {
            return Capture::Stalled;
        }

        self.set_phase(Phase::Listening);
        loop {
            match until_stopped(stop, input.listen()).await {
                None => {
                    input.stop();
                    return Capture::Stopped;
                }
                Some(Ok(text)) => {
                    input.stop();
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    return Capture::Answer(text.to_string());
                }
                Some(Err(SpeechError::Closed)) => {
                    tracing::warn!("Speech input closed; waiting for stop.");
                    return Capture::Stalled;
                }
                Some(Err(e)) => {
                    tracing::error!("Speech input failed: {}", e);
                    return Capture::Stalled;
                }
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.publish(ViewUpdate::Phase(phase));
        }
    }

    fn publish(&self, update: ViewUpdate) {
        if self.view_tx.send(update).is_err() {
            tracing::trace!("View receiver dropped; update discarded.");
        }
    }
}

async fn until_stopped<F: Future>(stop: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = stop.cancelled() => None,
        out = fut => Some(out),
    }
}
