pub mod action;
pub mod resolver;
pub mod snapshot;

pub use action::{
    ActionDescriptor, ActionInput, MessageSpec, Round3Spec, SelectionOption, SelectionSpec,
};
pub use resolver::{TurnIndicator, current_turn_role, issue_title, next_indicator, resolve};
pub use snapshot::{
    ActiveIssue, ConvoState, GameStateSnapshot, IssueOption, ReviewPayload, RoleInfo, Round1State,
    Round2State, Round3State, TranscriptEntry,
};
