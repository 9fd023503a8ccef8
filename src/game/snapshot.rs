use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{GameStatus, RoleKind};

/// Server-owned game state, read-only to the client. The backend has grown
/// a few alternate spellings for the same concepts over time; they are
/// normalized here with serde aliases so downstream code never performs
/// multi-key lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    #[serde(default)]
    pub status: Option<GameStatus>,
    #[serde(default, alias = "humanRoleId")]
    pub human_role_id: Option<String>,
    #[serde(default)]
    pub roles: BTreeMap<String, RoleInfo>,
    #[serde(default)]
    pub round1: Round1State,
    #[serde(default)]
    pub round2: Round2State,
    #[serde(default)]
    pub round3: Round3State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    #[serde(rename = "type", alias = "role_type", alias = "roleType")]
    pub kind: RoleKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Round1State {
    #[serde(default)]
    pub speaker_order: Vec<String>,
    #[serde(default)]
    pub cursor: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Round2State {
    #[serde(default)]
    pub convo1: Option<ConvoState>,
    #[serde(default)]
    pub convo2: Option<ConvoState>,
    #[serde(default)]
    pub active_convo_index: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvoState {
    #[serde(default, alias = "partner_role")]
    pub partner_role_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Round3State {
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub closed_issues: Vec<String>,
    #[serde(default)]
    pub active_issue: Option<ActiveIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveIssue {
    #[serde(default)]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub issue_title: Option<String>,
    #[serde(default)]
    pub options: Vec<IssueOption>,
    #[serde(default)]
    pub proposed_option_id: Option<String>,
    #[serde(default)]
    pub debate_queue: Vec<String>,
    #[serde(default)]
    pub debate_cursor: Option<usize>,
    #[serde(default)]
    pub vote_order: Vec<String>,
    #[serde(default)]
    pub next_voter_index: Option<usize>,
    /// Presence of the map (even empty) means vote accounting is live.
    #[serde(default)]
    pub votes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueOption {
    pub option_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "short_description")]
    pub description: Option<String>,
}

impl IssueOption {
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or(&self.option_id)
    }
}

impl GameStateSnapshot {
    /// Role ids of a given kind, sorted.
    pub fn role_ids_of_kind(&self, kind: RoleKind) -> Vec<&str> {
        // BTreeMap iteration is already ordered by role id.
        self.roles
            .iter()
            .filter(|(_, info)| info.kind == kind)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn convo1_partner(&self) -> Option<&str> {
        self.round2
            .convo1
            .as_ref()
            .and_then(|c| c.partner_role_id.as_deref())
    }

    pub fn active_issue(&self) -> Option<&ActiveIssue> {
        self.round3.active_issue.as_ref()
    }
}

/// One transcript line as served by `GET /games/{id}/transcript`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub round: Option<u8>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// End-of-game review payload. The shape beyond the two top-level keys is
/// backend-defined and rendered as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub votes: serde_json::Value,
    #[serde(default)]
    pub transcript: serde_json::Value,
}
