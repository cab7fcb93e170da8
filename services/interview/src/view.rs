//! Terminal presentation: two controls in, three readouts out.

use crate::speech_host::UtteranceSender;
use interview_core::{Phase, ViewUpdate};
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

pub const HELP: &str = "Commands: /start begins an interview, /stop ends it, /quit exits. \
Anything else you type while the interviewer is listening is your spoken answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalLine {
    Control(Control),
    Utterance(String),
    Blank,
    Unknown(String),
}

pub fn parse_line(line: &str) -> TerminalLine {
    let line = line.trim();
    if line.is_empty() {
        return TerminalLine::Blank;
    }
    match line.strip_prefix('/') {
        Some(command) => match command.to_lowercase().as_str() {
            "start" => TerminalLine::Control(Control::Start),
            "stop" => TerminalLine::Control(Control::Stop),
            "quit" | "exit" => TerminalLine::Control(Control::Quit),
            _ => TerminalLine::Unknown(line.to_string()),
        },
        None => TerminalLine::Utterance(line.to_string()),
    }
}

/// What the screen currently shows.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Readouts {
    pub status: String,
    pub heard: Option<String>,
    pub reply: Option<String>,
    pub phase: Option<Phase>,
}

impl Readouts {
    /// Applies one update and returns the line to print for it, if any.
    pub fn apply(&mut self, update: ViewUpdate) -> Option<String> {
        match update {
            ViewUpdate::Status(status) => {
                let line = format!("== {} ==", status);
                self.status = status;
                Some(line)
            }
            ViewUpdate::Heard(text) => {
                let line = format!("You: {}", text);
                self.heard = Some(text);
                Some(line)
            }
            ViewUpdate::Reply(text) => {
                let line = format!("Interviewer: {}", text);
                self.reply = Some(text);
                Some(line)
            }
            ViewUpdate::Phase(phase) => {
                self.phase = Some(phase);
                match phase {
                    Phase::Listening => {
                        Some("(listening - type your answer and press Enter)".to_string())
                    }
                    Phase::AwaitingReply => Some("(thinking...)".to_string()),
                    Phase::Idle | Phase::Speaking | Phase::Ended => None,
                }
            }
        }
    }
}

/// Prints updates until the controller drops its sender.
pub async fn render(mut updates: mpsc::UnboundedReceiver<ViewUpdate>) -> Readouts {
    let mut readouts = Readouts::default();
    while let Some(update) = updates.recv().await {
        if let Some(line) = readouts.apply(update) {
            println!("{}", line);
        }
    }
    readouts
}

/// Reads stdin on a dedicated thread and routes each line to the controls or
/// the speech input.
///
/// A plain thread keeps the blocking read from holding up runtime shutdown.
pub fn spawn_terminal_reader(
    controls: mpsc::Sender<Control>,
    utterances: Option<UtteranceSender>,
    listening: Option<Arc<AtomicBool>>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("terminal-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!("Failed to read from stdin: {}", e);
                        break;
                    }
                };
                match parse_line(&line) {
                    TerminalLine::Control(control) => {
                        if controls.blocking_send(control).is_err() {
                            return;
                        }
                    }
                    TerminalLine::Utterance(text) => match &utterances {
                        Some(tx) => {
                            let heard = listening
                                .as_ref()
                                .is_some_and(|flag| flag.load(Ordering::SeqCst));
                            if !heard {
                                println!("(not listening - answer ignored)");
                            }
                            if tx.send(text).is_err() {
                                tracing::debug!("Speech input dropped; ignoring typed line.");
                            }
                        }
                        None => println!("(speech input is disabled)"),
                    },
                    TerminalLine::Unknown(command) => {
                        println!("Unknown command {}. {}", command, HELP);
                    }
                    TerminalLine::Blank => {}
                }
            }
            tracing::debug!("stdin closed.");
            let _ = controls.blocking_send(Control::Quit);
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls_and_utterances() {
        assert_eq!(parse_line("/start"), TerminalLine::Control(Control::Start));
        assert_eq!(parse_line("  /STOP "), TerminalLine::Control(Control::Stop));
        assert_eq!(parse_line("/exit"), TerminalLine::Control(Control::Quit));
        assert_eq!(parse_line("   "), TerminalLine::Blank);
        assert_eq!(
            parse_line("/dance"),
            TerminalLine::Unknown("/dance".to_string())
        );
        assert_eq!(
            parse_line(" I led the storage team. "),
            TerminalLine::Utterance("I led the storage team.".to_string())
        );
    }

    #[test]
    fn test_readouts_track_last_values() {
        let mut readouts = Readouts::default();

        assert_eq!(
            readouts.apply(ViewUpdate::Reply("Tell me about yourself.".to_string())),
            Some("Interviewer: Tell me about yourself.".to_string())
        );
        readouts.apply(ViewUpdate::Heard("I write Rust.".to_string()));
        assert_eq!(readouts.apply(ViewUpdate::Phase(Phase::Speaking)), None);
        readouts.apply(ViewUpdate::Status("Interview ended. Thank you!".to_string()));

        assert_eq!(readouts.heard.as_deref(), Some("I write Rust."));
        assert_eq!(readouts.reply.as_deref(), Some("Tell me about yourself."));
        assert_eq!(readouts.status, "Interview ended. Thank you!");
        assert_eq!(readouts.phase, Some(Phase::Speaking));
    }

    #[tokio::test]
    async fn test_render_returns_final_readouts_when_sender_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ViewUpdate::Phase(Phase::Listening)).unwrap();
        tx.send(ViewUpdate::Heard("hello".to_string())).unwrap();
        drop(tx);

        let readouts = render(rx).await;

        assert_eq!(readouts.phase, Some(Phase::Listening));
        assert_eq!(readouts.heard.as_deref(), Some("hello"));
    }
}
