use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Backend-authoritative game phase. Unrecognized tags are carried verbatim
/// in `Unknown` so a newer backend never breaks deserialization.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(from = "String", into = "String")]
pub enum GameStatus {
    RoleSelection,
    #[strum(serialize = "ROUND_1_SETUP")]
    Round1Setup,
    #[strum(serialize = "ROUND_1_OPENING_STATEMENTS")]
    Round1OpeningStatements,
    #[strum(serialize = "ROUND_2_SETUP")]
    Round2Setup,
    #[strum(serialize = "ROUND_2_SELECT_CONVO_1")]
    Round2SelectConvo1,
    #[strum(serialize = "ROUND_2_SELECT_CONVO_2")]
    Round2SelectConvo2,
    #[strum(serialize = "ROUND_2_CONVERSATION_ACTIVE")]
    Round2ConversationActive,
    #[strum(serialize = "ROUND_2_WRAP_UP")]
    Round2WrapUp,
    #[strum(serialize = "ROUND_3_SETUP")]
    Round3Setup,
    IssueIntro,
    #[strum(serialize = "ISSUE_DEBATE_ROUND_1")]
    IssueDebateRound1,
    #[strum(serialize = "ISSUE_DEBATE_ROUND_2")]
    IssueDebateRound2,
    IssueVote,
    IssueResolution,
    IssuePositionFinalization,
    IssueProposalSelection,
    #[strum(default)]
    Unknown(String),
}

impl From<String> for GameStatus {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or(GameStatus::Unknown(raw))
    }
}

impl From<GameStatus> for String {
    fn from(status: GameStatus) -> Self {
        status.to_string()
    }
}

impl GameStatus {
    /// Coarse round label shown in the orientation header.
    pub fn round_label(&self) -> Option<&'static str> {
        use GameStatus::*;
        match self {
            Round1Setup | Round1OpeningStatements => Some("1"),
            Round2Setup | Round2SelectConvo1 | Round2SelectConvo2 | Round2ConversationActive
            | Round2WrapUp => Some("2"),
            Round3Setup | IssueIntro | IssueDebateRound1 | IssueDebateRound2 | IssueVote
            | IssueResolution | IssuePositionFinalization | IssueProposalSelection => Some("3"),
            // Future phases still group by tag prefix.
            Unknown(raw) if raw.starts_with("ROUND_1") => Some("1"),
            Unknown(raw) if raw.starts_with("ROUND_2") => Some("2"),
            Unknown(raw) if raw.starts_with("ROUND_3") || raw.starts_with("ISSUE_") => Some("3"),
            _ => None,
        }
    }
}

/// Named action tag sent to the backend to transition game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvanceEvent {
    RoleConfirmed,
    #[strum(serialize = "ROUND_1_READY")]
    Round1Ready,
    #[strum(serialize = "ROUND_1_STEP")]
    Round1Step,
    HumanOpeningStatement,
    #[strum(serialize = "ROUND_2_READY")]
    Round2Ready,
    #[strum(serialize = "CONVO_1_SELECTED")]
    Convo1Selected,
    #[strum(serialize = "CONVO_1_MESSAGE")]
    Convo1Message,
    #[strum(serialize = "CONVO_2_SELECTED")]
    Convo2Selected,
    #[strum(serialize = "CONVO_2_MESSAGE")]
    Convo2Message,
    #[strum(serialize = "CONVO_2_SKIPPED")]
    Convo2Skipped,
    ConvoEndEarly,
    #[strum(serialize = "ROUND_2_WRAP_READY")]
    Round2WrapReady,
    #[strum(serialize = "ROUND_3_START_ISSUE")]
    Round3StartIssue,
    IssueIntroContinue,
    IssueDebateStep,
    HumanDebateMessage,
    HumanVote,
    IssueResolutionContinue,
    Continue,
}

/// Role category. The chair is procedural and never a partner or voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Country,
    Ngo,
    Chair,
    #[serde(other)]
    Other,
}

/// Which control the action bar must render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionMode {
    Advance,
    Message,
    Selection,
    Round3Setup,
}

/// Where the human lands in the debate queue when an issue starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HumanPlacement {
    First,
    Random,
    Skip,
}

impl HumanPlacement {
    pub const ALL: [HumanPlacement; 3] = [
        HumanPlacement::First,
        HumanPlacement::Random,
        HumanPlacement::Skip,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    Yes,
    No,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 2] = [VoteChoice::Yes, VoteChoice::No];
}

/// Mandatory human contribution the backend rejected an advance over.
/// Persisted per game so the control stays highlighted across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequiredAction {
    HumanDebate,
}
