use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError};
use crate::game::action::ActionDescriptor;
use crate::game::snapshot::{GameStateSnapshot, TranscriptEntry};
use crate::session::{SessionError, SessionStore};
use crate::types::{AdvanceEvent, HumanPlacement, RequiredAction};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Local validation failure; nothing was sent to the server.
    #[error("{0}")]
    Blocked(&'static str),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("failed to persist session: {0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChoice {
    Pick(String),
    Skip,
}

/// Fresh state and transcript fetched after a successful advance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceOutcome {
    pub state: Option<GameStateSnapshot>,
    pub transcript: Vec<TranscriptEntry>,
}

/// Validates local enablement, issues the advance, and keeps the per-game
/// required-action flag in sync with what the backend demands.
pub struct Dispatcher {
    api: ApiClient,
    store: SessionStore,
    game_id: Uuid,
}

impl Dispatcher {
    pub fn new(api: ApiClient, store: SessionStore, game_id: Uuid) -> Self {
        Self {
            api,
            store,
            game_id,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// State first, transcript second. The resolver needs current state to
    /// decide what is displayable, so the order is load-bearing.
    pub fn refresh(&self) -> Result<AdvanceOutcome, ApiError> {
        let state = self.api.get_game(self.game_id)?;
        let transcript = self.api.get_transcript(self.game_id, Some(true))?;
        Ok(AdvanceOutcome { state, transcript })
    }

    pub fn submit_advance(
        &mut self,
        descriptor: &ActionDescriptor,
    ) -> Result<AdvanceOutcome, DispatchError> {
        let event = self.require_event(descriptor)?;
        self.advance(event, descriptor.payload.clone(), false)
    }

    pub fn submit_message(
        &mut self,
        descriptor: &ActionDescriptor,
        text: &str,
    ) -> Result<AdvanceOutcome, DispatchError> {
        let event = self.require_event(descriptor)?;
        let Some(spec) = descriptor.message.as_ref() else {
            return Err(DispatchError::Blocked("not a message control"));
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DispatchError::Blocked("message text required"));
        }
        self.advance(event, json!({ spec.payload_key: trimmed }), true)
    }

    /// Secondary path of a message control (end conversation early). Fires
    /// regardless of draft content.
    pub fn submit_secondary(
        &mut self,
        descriptor: &ActionDescriptor,
    ) -> Result<AdvanceOutcome, DispatchError> {
        let Some(event) = descriptor.message.as_ref().and_then(|m| m.secondary_event) else {
            return Err(DispatchError::Blocked("no secondary action for this control"));
        };
        self.advance(event, json!({}), false)
    }

    pub fn submit_selection(
        &mut self,
        descriptor: &ActionDescriptor,
        choice: SelectionChoice,
    ) -> Result<AdvanceOutcome, DispatchError> {
        if !descriptor.enabled {
            return Err(DispatchError::Blocked("action is not currently enabled"));
        }
        let Some(spec) = descriptor.selection.as_ref() else {
            return Err(DispatchError::Blocked("not a selection control"));
        };
        match choice {
            SelectionChoice::Skip => match spec.skip_event {
                Some(skip_event) => self.advance(skip_event, json!({}), false),
                None => Err(DispatchError::Blocked("skip is not offered here")),
            },
            SelectionChoice::Pick(value) => {
                if value.is_empty() {
                    return Err(DispatchError::Blocked("selection required"));
                }
                self.advance(spec.select_event, json!({ spec.payload_key: value }), false)
            }
        }
    }

    pub fn submit_round3_start(
        &mut self,
        descriptor: &ActionDescriptor,
        issue_id: &str,
        placement: HumanPlacement,
    ) -> Result<AdvanceOutcome, DispatchError> {
        if !descriptor.enabled {
            return Err(DispatchError::Blocked("action is not currently enabled"));
        }
        let Some(spec) = descriptor.round3.as_ref() else {
            return Err(DispatchError::Blocked("not a round-3 setup control"));
        };
        if issue_id.is_empty() {
            return Err(DispatchError::Blocked("issue selection required"));
        }
        self.advance(
            spec.event,
            json!({ "issue_id": issue_id, "human_placement": placement }),
            false,
        )
    }

    /// Dev-mode escape hatch: arbitrary event tag and payload.
    pub fn raw_advance(
        &mut self,
        event: &str,
        payload: Value,
    ) -> Result<AdvanceOutcome, DispatchError> {
        match self.api.advance_raw(self.game_id, event, payload) {
            Ok(_) => Ok(self.refresh()?),
            Err(err) => Err(self.note_rejection(err)?),
        }
    }

    fn require_event(
        &self,
        descriptor: &ActionDescriptor,
    ) -> Result<AdvanceEvent, DispatchError> {
        if !descriptor.enabled {
            return Err(DispatchError::Blocked("action is not currently enabled"));
        }
        descriptor
            .event
            .ok_or(DispatchError::Blocked("no advance event for this control"))
    }

    fn advance(
        &mut self,
        event: AdvanceEvent,
        payload: Value,
        clears_required: bool,
    ) -> Result<AdvanceOutcome, DispatchError> {
        tracing::info!(game_id = %self.game_id, event = %event, "advance");
        match self.api.advance(self.game_id, event, payload) {
            Ok(_) => {
                if clears_required
                    && self
                        .store
                        .load_for_game(self.game_id)
                        .required_action
                        .is_some()
                {
                    self.store.persist_required_action(self.game_id, None)?;
                }
                Ok(self.refresh()?)
            }
            Err(err) => Err(self.note_rejection(err)?),
        }
    }

    /// Persist any required-action the rejection implies, then hand the
    /// original error back for display. Drafts stay untouched; retry is
    /// manual.
    fn note_rejection(&mut self, err: ApiError) -> Result<DispatchError, SessionError> {
        if let Some(required) = required_action_from(&err) {
            tracing::warn!(game_id = %self.game_id, %required, "advance rejected pending human input");
            self.store
                .persist_required_action(self.game_id, Some(required))?;
        }
        Ok(DispatchError::Api(err))
    }
}

/// Server-signaled precondition failures are recognized by message content;
/// the backend has no structured error codes for them.
fn required_action_from(err: &ApiError) -> Option<RequiredAction> {
    let ApiError::Status { body, .. } = err else {
        return None;
    };
    let lowered = body.to_ascii_lowercase();
    (lowered.contains("human debate") || body.contains("HUMAN_DEBATE_MESSAGE"))
        .then_some(RequiredAction::HumanDebate)
}

/// Monotonic sequencing for overlapping fetches. Only the newest issued
/// sequence is admitted, so a slow reply from a superseded request can never
/// revert displayed state.
#[derive(Debug, Default)]
pub struct SeqGate {
    latest: u64,
}

impl SeqGate {
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn admits(&self, seq: u64) -> bool {
        seq == self.latest
    }
}
