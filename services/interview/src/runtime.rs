use crate::view::Control;
use interview_core::{InterviewController, Phase};
use tokio::sync::mpsc;

/// Dispatches controls to the controller until `Quit` arrives or every
/// control sender is gone.
///
/// While a session runs, a `Stop` only cancels its stop handle; the session
/// itself performs the transition the next time it is polled.
pub async fn run(controller: &mut InterviewController, controls: &mut mpsc::Receiver<Control>) {
    while let Some(control) = controls.recv().await {
        match control {
            Control::Start => {
                let stop = controller.start();
                let mut quit = false;
                let session = controller.conduct();
                tokio::pin!(session);

                loop {
                    tokio::select! {
                        phase = &mut session => {
                            tracing::debug!("Session finished in phase {:?}", phase);
                            break;
                        }
                        control = controls.recv(), if !quit => match control {
                            Some(Control::Stop) => stop.cancel(),
                            Some(Control::Start) => {
                                tracing::info!("An interview is already running; /stop it first.");
                            }
                            Some(Control::Quit) | None => {
                                stop.cancel();
                                quit = true;
                            }
                        },
                    }
                }

                if quit {
                    return;
                }
            }
            Control::Stop => {
                if controller.phase() != Phase::Ended {
                    controller.stop();
                }
            }
            Control::Quit => {
                if controller.phase() != Phase::Ended {
                    controller.stop();
                }
                return;
            }
        }
    }
}
