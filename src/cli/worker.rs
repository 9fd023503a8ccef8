use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde_json::Value;

use crate::api::RequestTrace;
use crate::dispatch::{AdvanceOutcome, Dispatcher, SelectionChoice};
use crate::game::action::ActionDescriptor;
use crate::game::snapshot::{GameStateSnapshot, TranscriptEntry};
use crate::types::{HumanPlacement, RequiredAction};

/// Work the UI thread hands to the network worker. Fetch commands carry the
/// sequence numbers the UI will use to discard superseded responses.
pub enum NetCommand {
    Refresh {
        state_seq: u64,
        transcript_seq: u64,
    },
    Submit {
        submission: Submission,
        state_seq: u64,
        transcript_seq: u64,
    },
}

pub enum Submission {
    Advance(ActionDescriptor),
    Message(ActionDescriptor, String),
    Secondary(ActionDescriptor),
    Selection(ActionDescriptor, SelectionChoice),
    Round3Start(ActionDescriptor, String, HumanPlacement),
    Raw { event: String, payload: Value },
}

pub enum NetResponse {
    State {
        seq: u64,
        state: Option<GameStateSnapshot>,
    },
    Transcript {
        seq: u64,
        transcript: Vec<TranscriptEntry>,
    },
    RefreshFailed {
        message: String,
    },
    SubmitOk,
    SubmitFailed {
        message: String,
        required_action: Option<RequiredAction>,
    },
    Traces(Vec<RequestTrace>),
}

pub struct WorkerHandle {
    pub commands: Sender<NetCommand>,
    pub responses: Receiver<NetResponse>,
}

/// Run the dispatcher on its own thread. The worker ends when the UI drops
/// its handle, which also stops any pending refresh from landing anywhere.
pub fn spawn(dispatcher: Dispatcher) -> WorkerHandle {
    let (command_tx, command_rx) = mpsc::channel();
    let (response_tx, response_rx) = mpsc::channel();
    thread::spawn(move || run(dispatcher, command_rx, response_tx));
    WorkerHandle {
        commands: command_tx,
        responses: response_rx,
    }
}

fn run(
    mut dispatcher: Dispatcher,
    commands: Receiver<NetCommand>,
    responses: Sender<NetResponse>,
) {
    while let Ok(command) = commands.recv() {
        let ok = match command {
            NetCommand::Refresh {
                state_seq,
                transcript_seq,
            } => match dispatcher.refresh() {
                Ok(outcome) => send_outcome(&responses, outcome, state_seq, transcript_seq),
                Err(err) => responses
                    .send(NetResponse::RefreshFailed {
                        message: err.to_string(),
                    })
                    .is_ok(),
            },
            NetCommand::Submit {
                submission,
                state_seq,
                transcript_seq,
            } => {
                let result = submit(&mut dispatcher, submission);
                match result {
                    Ok(outcome) => {
                        responses.send(NetResponse::SubmitOk).is_ok()
                            && send_outcome(&responses, outcome, state_seq, transcript_seq)
                    }
                    Err(err) => {
                        let required_action = dispatcher
                            .store()
                            .load_for_game(dispatcher.game_id())
                            .required_action;
                        responses
                            .send(NetResponse::SubmitFailed {
                                message: err.to_string(),
                                required_action,
                            })
                            .is_ok()
                    }
                }
            }
        };
        if !ok {
            break;
        }
        let _ = responses.send(NetResponse::Traces(dispatcher.api().recent_traces()));
    }
    tracing::debug!("network worker stopped");
}

fn submit(
    dispatcher: &mut Dispatcher,
    submission: Submission,
) -> Result<AdvanceOutcome, crate::dispatch::DispatchError> {
    match submission {
        Submission::Advance(descriptor) => dispatcher.submit_advance(&descriptor),
        Submission::Message(descriptor, text) => dispatcher.submit_message(&descriptor, &text),
        Submission::Secondary(descriptor) => dispatcher.submit_secondary(&descriptor),
        Submission::Selection(descriptor, choice) => {
            dispatcher.submit_selection(&descriptor, choice)
        }
        Submission::Round3Start(descriptor, issue_id, placement) => {
            dispatcher.submit_round3_start(&descriptor, &issue_id, placement)
        }
        Submission::Raw { event, payload } => dispatcher.raw_advance(&event, payload),
    }
}

/// State strictly before transcript; the UI applies them in arrival order.
fn send_outcome(
    responses: &Sender<NetResponse>,
    outcome: AdvanceOutcome,
    state_seq: u64,
    transcript_seq: u64,
) -> bool {
    responses
        .send(NetResponse::State {
            seq: state_seq,
            state: outcome.state,
        })
        .is_ok()
        && responses
            .send(NetResponse::Transcript {
                seq: transcript_seq,
                transcript: outcome.transcript,
            })
            .is_ok()
}
