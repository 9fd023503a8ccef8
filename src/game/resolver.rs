use serde_json::json;

use crate::game::action::{
    ActionDescriptor, MessageSpec, Round3Spec, SelectionOption, SelectionSpec,
};
use crate::game::snapshot::GameStateSnapshot;
use crate::types::{AdvanceEvent, GameStatus, RoleKind, VoteChoice};

/// Derive the next-action descriptor from a snapshot and the externally
/// confirmed role id.
///
/// Pure and total: every enumerated status resolves to a descriptor, and an
/// unrecognized status degrades to a disabled advance rather than a panic.
/// Safe to call on every render tick.
pub fn resolve(snapshot: &GameStateSnapshot, confirmed_role_id: Option<&str>) -> ActionDescriptor {
    let Some(status) = snapshot.status.as_ref() else {
        return ActionDescriptor::disabled("Status unknown.");
    };
    let human = human_role(snapshot, confirmed_role_id);

    match status {
        GameStatus::RoleSelection => match confirmed_role_id.filter(|r| !r.is_empty()) {
            Some(role) => {
                ActionDescriptor::advance(AdvanceEvent::RoleConfirmed, "Confirm role")
                    .with_payload(json!({ "human_role_id": role }))
            }
            None => ActionDescriptor::disabled("No confirmed role available."),
        },
        GameStatus::Round1Setup => {
            ActionDescriptor::advance(AdvanceEvent::Round1Ready, "Start Round 1")
        }
        GameStatus::Round1OpeningStatements => resolve_opening_statements(snapshot, human),
        GameStatus::Round2Setup => {
            ActionDescriptor::advance(AdvanceEvent::Round2Ready, "Start Round 2")
        }
        GameStatus::Round2SelectConvo1 => resolve_partner_selection(snapshot, human, ConvoSlot::First),
        GameStatus::Round2SelectConvo2 => {
            resolve_partner_selection(snapshot, human, ConvoSlot::Second)
        }
        GameStatus::Round2ConversationActive => resolve_conversation(snapshot),
        GameStatus::Round2WrapUp => {
            ActionDescriptor::advance(AdvanceEvent::Round2WrapReady, "Proceed to Round 3")
        }
        GameStatus::Round3Setup => resolve_round3_setup(snapshot),
        GameStatus::IssueIntro => {
            ActionDescriptor::advance(AdvanceEvent::IssueIntroContinue, "Start debate")
        }
        // A pending vote blocks all other progress, so the vote check owns
        // this status outright; a debate cursor pointing at the human at the
        // same time is inconsistent upstream data and loses.
        GameStatus::IssueVote => resolve_vote(snapshot, human),
        GameStatus::IssueDebateRound1 | GameStatus::IssueDebateRound2 => {
            resolve_debate(snapshot, human)
        }
        GameStatus::IssueResolution => {
            ActionDescriptor::advance(AdvanceEvent::IssueResolutionContinue, "Continue")
        }
        GameStatus::IssuePositionFinalization | GameStatus::IssueProposalSelection => {
            ActionDescriptor::advance(AdvanceEvent::Continue, "Continue")
        }
        GameStatus::Unknown(raw) => {
            ActionDescriptor::disabled(format!("Status {raw} not actionable."))
        }
    }
}

/// `human_role_id` from the snapshot wins; the locally confirmed id covers
/// the window before the backend has recorded it.
fn human_role<'a>(
    snapshot: &'a GameStateSnapshot,
    confirmed_role_id: Option<&'a str>,
) -> Option<&'a str> {
    snapshot
        .human_role_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or(confirmed_role_id)
}

fn resolve_opening_statements(
    snapshot: &GameStateSnapshot,
    human: Option<&str>,
) -> ActionDescriptor {
    let order = &snapshot.round1.speaker_order;
    let cursor = snapshot.round1.cursor;
    let (Some(cursor), false) = (cursor, order.is_empty()) else {
        return ActionDescriptor::disabled("Opening order unavailable.");
    };
    if cursor >= order.len() {
        return ActionDescriptor::advance(AdvanceEvent::Round1Step, "Continue");
    }
    let Some(human) = human else {
        return ActionDescriptor::disabled("Human role not set.");
    };
    if order[cursor] == human {
        ActionDescriptor::message(
            AdvanceEvent::HumanOpeningStatement,
            "Submit opening statement",
            MessageSpec {
                payload_key: "text",
                placeholder: "Enter your opening statement...",
                secondary_event: None,
                secondary_label: None,
                helper_text: None,
            },
        )
    } else {
        ActionDescriptor::advance(AdvanceEvent::Round1Step, "Advance opening statement")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConvoSlot {
    First,
    Second,
}

fn resolve_partner_selection(
    snapshot: &GameStateSnapshot,
    human: Option<&str>,
    slot: ConvoSlot,
) -> ActionDescriptor {
    let exclude = match slot {
        ConvoSlot::First => None,
        ConvoSlot::Second => snapshot.convo1_partner(),
    };
    let options = partner_options(snapshot, human, exclude);
    if options.is_empty() {
        return ActionDescriptor::disabled("No partner options available.");
    }
    let spec = match slot {
        ConvoSlot::First => SelectionSpec {
            options,
            payload_key: "partner_role_id",
            select_event: AdvanceEvent::Convo1Selected,
            skip_event: None,
            skip_label: None,
            header: None,
            note: Some("Partner options are derived from roles (temporary)."),
        },
        ConvoSlot::Second => SelectionSpec {
            options,
            payload_key: "partner_role_id",
            select_event: AdvanceEvent::Convo2Selected,
            skip_event: Some(AdvanceEvent::Convo2Skipped),
            skip_label: Some("Skip second conversation"),
            header: None,
            note: Some("Partner options are derived from roles (temporary)."),
        },
    };
    ActionDescriptor::selection("Select partner", spec)
}

/// Candidate partners: countries first, then NGOs, each in id order; never
/// the chair, the human, or an already-chosen partner.
// TODO: switch to backend-provided round2.available_partners once the API
// exposes it.
fn partner_options(
    snapshot: &GameStateSnapshot,
    human: Option<&str>,
    exclude: Option<&str>,
) -> Vec<SelectionOption> {
    let countries = snapshot.role_ids_of_kind(RoleKind::Country);
    let ngos = snapshot.role_ids_of_kind(RoleKind::Ngo);
    countries
        .into_iter()
        .chain(ngos)
        .filter(|id| Some(*id) != human && Some(*id) != exclude)
        .map(|id| SelectionOption::new(id, id))
        .collect()
}

fn resolve_conversation(snapshot: &GameStateSnapshot) -> ActionDescriptor {
    let event = if snapshot.round2.active_convo_index == Some(2) {
        AdvanceEvent::Convo2Message
    } else {
        AdvanceEvent::Convo1Message
    };
    ActionDescriptor::message(
        event,
        "Send message",
        MessageSpec {
            payload_key: "content",
            placeholder: "Enter your message...",
            secondary_event: Some(AdvanceEvent::ConvoEndEarly),
            secondary_label: Some("End conversation early"),
            helper_text: Some("Backend drives turns; send when status allows."),
        },
    )
}

fn resolve_round3_setup(snapshot: &GameStateSnapshot) -> ActionDescriptor {
    let issues = &snapshot.round3.issues;
    let closed = &snapshot.round3.closed_issues;
    let active_id = snapshot
        .active_issue()
        .and_then(|issue| issue.issue_id.as_deref());
    let default_issue_id = issues
        .iter()
        .find(|id| Some(id.as_str()) != active_id && !closed.contains(id))
        .or_else(|| issues.first())
        .cloned();
    let disabled_reason = issues
        .is_empty()
        .then(|| "No issues available.".to_string());
    ActionDescriptor::round3_setup(
        !issues.is_empty(),
        disabled_reason,
        Round3Spec {
            event: AdvanceEvent::Round3StartIssue,
            issues: issues.clone(),
            default_issue_id,
            header: "Round 3 setup",
            button_label: "Start Issue",
        },
    )
}

fn resolve_vote(snapshot: &GameStateSnapshot, human: Option<&str>) -> ActionDescriptor {
    let issue = snapshot.active_issue();
    let human_vote_turn = issue.is_some_and(|issue| {
        let Some(human) = human else { return false };
        let Some(idx) = issue.next_voter_index else {
            return false;
        };
        issue.votes.is_some() && issue.vote_order.get(idx).is_some_and(|role| role == human)
    });
    if !human_vote_turn {
        return ActionDescriptor::advance(AdvanceEvent::IssueDebateStep, "Debate step");
    }
    // issue is present whenever human_vote_turn holds
    let header = issue
        .and_then(|issue| issue.proposed_option_id.as_deref().map(|id| (issue, id)))
        .map(|(issue, proposed)| {
            let label = issue
                .options
                .iter()
                .find(|option| option.option_id == proposed)
                .map(|option| option.display_label())
                .unwrap_or(proposed);
            format!("Vote on proposal {proposed}: {label}")
        })
        .unwrap_or_else(|| "Vote on proposal".to_string());
    ActionDescriptor::selection(
        "Submit Vote",
        SelectionSpec {
            options: VoteChoice::ALL
                .iter()
                .map(|choice| SelectionOption::new(choice.to_string(), choice.to_string()))
                .collect(),
            payload_key: "vote",
            select_event: AdvanceEvent::HumanVote,
            skip_event: None,
            skip_label: None,
            header: Some(header),
            note: None,
        },
    )
}

fn resolve_debate(snapshot: &GameStateSnapshot, human: Option<&str>) -> ActionDescriptor {
    let Some(issue) = snapshot.active_issue() else {
        return ActionDescriptor::disabled("Debate order unavailable.");
    };
    let queue = &issue.debate_queue;
    let (Some(cursor), false) = (issue.debate_cursor, queue.is_empty()) else {
        return ActionDescriptor::disabled("Debate order unavailable.");
    };
    if cursor >= queue.len() {
        return ActionDescriptor::advance(AdvanceEvent::IssueDebateStep, "Continue");
    }
    let Some(human) = human else {
        return ActionDescriptor::disabled("Human role not set.");
    };
    if queue[cursor] == human {
        ActionDescriptor::message(
            AdvanceEvent::HumanDebateMessage,
            "Submit debate message",
            MessageSpec {
                payload_key: "text",
                placeholder: "Enter your debate message...",
                secondary_event: None,
                secondary_label: None,
                helper_text: None,
            },
        )
    } else {
        ActionDescriptor::advance(AdvanceEvent::IssueDebateStep, "Debate step")
    }
}

/// Header strip: whose turn the game is logically waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnIndicator {
    pub label: String,
    pub hint: Option<&'static str>,
}

impl TurnIndicator {
    fn unknown() -> Self {
        Self {
            label: "(unknown)".to_string(),
            hint: None,
        }
    }

    fn at(order: &[String], cursor: Option<usize>, human: Option<&str>, hint: &'static str) -> Self {
        match cursor {
            Some(cursor) if cursor < order.len() => {
                let role = order[cursor].as_str();
                Self {
                    label: if Some(role) == human {
                        "You".to_string()
                    } else {
                        role.to_string()
                    },
                    hint: Some(hint),
                }
            }
            _ => Self::unknown(),
        }
    }
}

pub fn next_indicator(
    snapshot: &GameStateSnapshot,
    confirmed_role_id: Option<&str>,
) -> TurnIndicator {
    let Some(status) = snapshot.status.as_ref() else {
        return TurnIndicator::unknown();
    };
    let human = human_role(snapshot, confirmed_role_id);
    match status {
        GameStatus::Round1OpeningStatements => TurnIndicator::at(
            &snapshot.round1.speaker_order,
            snapshot.round1.cursor,
            human,
            "opening statement",
        ),
        GameStatus::IssueDebateRound1 | GameStatus::IssueDebateRound2 => match snapshot
            .active_issue()
        {
            Some(issue) => {
                TurnIndicator::at(&issue.debate_queue, issue.debate_cursor, human, "debate speech")
            }
            None => TurnIndicator::unknown(),
        },
        GameStatus::IssueVote => match snapshot.active_issue() {
            Some(issue) => {
                TurnIndicator::at(&issue.vote_order, issue.next_voter_index, human, "vote")
            }
            None => TurnIndicator::unknown(),
        },
        GameStatus::Round2SelectConvo1 | GameStatus::Round2SelectConvo2 => TurnIndicator {
            label: "You".to_string(),
            hint: Some("select conversation partner"),
        },
        _ => TurnIndicator::unknown(),
    }
}

/// The role whose turn is in progress, for highlighting transcript entries.
pub fn current_turn_role(snapshot: &GameStateSnapshot) -> Option<&str> {
    let at = |order: &'_ [String], cursor: Option<usize>| -> Option<usize> {
        cursor.filter(|cursor| *cursor < order.len())
    };
    match snapshot.status.as_ref()? {
        GameStatus::Round1OpeningStatements => {
            let order = &snapshot.round1.speaker_order;
            at(order, snapshot.round1.cursor).map(|cursor| order[cursor].as_str())
        }
        GameStatus::IssueDebateRound1 | GameStatus::IssueDebateRound2 => {
            let issue = snapshot.active_issue()?;
            at(&issue.debate_queue, issue.debate_cursor).map(|cursor| issue.debate_queue[cursor].as_str())
        }
        GameStatus::IssueVote => {
            let issue = snapshot.active_issue()?;
            at(&issue.vote_order, issue.next_voter_index)
                .map(|cursor| issue.vote_order[cursor].as_str())
        }
        _ => None,
    }
}

/// Active issue title, only meaningful inside round 3.
pub fn issue_title(snapshot: &GameStateSnapshot) -> Option<&str> {
    if snapshot.status.as_ref()?.round_label() != Some("3") {
        return None;
    }
    snapshot
        .active_issue()?
        .issue_title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::types::ActionMode;

    fn snapshot(value: serde_json::Value) -> GameStateSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn full_roles() -> serde_json::Value {
        json!({
            "BRA": {"type": "country"},
            "CAN": {"type": "country"},
            "CHN": {"type": "country"},
            "EU": {"type": "country"},
            "TZA": {"type": "country"},
            "USA": {"type": "country"},
            "AMAP": {"type": "ngo"},
            "MFF": {"type": "ngo"},
            "WCPA": {"type": "ngo"},
            "JPN": {"type": "chair"}
        })
    }

    #[test]
    fn test_every_status_resolves_without_panic() {
        for status in GameStatus::iter() {
            let snap = snapshot(json!({ "status": status.to_string() }));
            let descriptor = resolve(&snap, Some("USA"));
            assert!(
                matches!(
                    descriptor.mode,
                    ActionMode::Advance
                        | ActionMode::Message
                        | ActionMode::Selection
                        | ActionMode::Round3Setup
                ),
                "status {status} produced {descriptor:?}"
            );
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "USA",
            "round1": {"speaker_order": ["BRA", "USA"], "cursor": 1}
        }));
        assert_eq!(resolve(&snap, Some("USA")), resolve(&snap, Some("USA")));
    }

    #[test]
    fn test_missing_status_is_disabled() {
        let descriptor = resolve(&GameStateSnapshot::default(), Some("USA"));
        assert!(!descriptor.enabled);
        assert_eq!(descriptor.disabled_reason.as_deref(), Some("Status unknown."));
    }

    #[test]
    fn test_unknown_status_falls_back_disabled() {
        let snap = snapshot(json!({ "status": "ROUND_4_RECAP" }));
        let descriptor = resolve(&snap, Some("USA"));
        assert!(!descriptor.enabled);
        assert_eq!(descriptor.event, None);
        assert_eq!(
            descriptor.disabled_reason.as_deref(),
            Some("Status ROUND_4_RECAP not actionable.")
        );
    }

    #[test]
    fn test_role_confirmation_payload() {
        let snap = snapshot(json!({ "status": "ROLE_SELECTION" }));
        let descriptor = resolve(&snap, Some("BRA"));
        assert_eq!(descriptor.mode, ActionMode::Advance);
        assert_eq!(descriptor.event, Some(AdvanceEvent::RoleConfirmed));
        assert!(descriptor.enabled);
        assert_eq!(descriptor.payload, json!({ "human_role_id": "BRA" }));

        let unconfirmed = resolve(&snap, None);
        assert!(!unconfirmed.enabled);
        assert_eq!(
            unconfirmed.disabled_reason.as_deref(),
            Some("No confirmed role available.")
        );
    }

    #[test]
    fn test_opening_cursor_exhaustion_continues() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "H",
            "round1": {"speaker_order": ["A", "B", "C"], "cursor": 3}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Advance);
        assert_eq!(descriptor.event, Some(AdvanceEvent::Round1Step));
        assert_eq!(descriptor.label, "Continue");
    }

    #[test]
    fn test_opening_human_turn_is_message_mode() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "H",
            "round1": {"speaker_order": ["A", "B", "H"], "cursor": 2}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Message);
        assert_eq!(descriptor.event, Some(AdvanceEvent::HumanOpeningStatement));
        let spec = descriptor.message.unwrap();
        assert_eq!(spec.payload_key, "text");
    }

    #[test]
    fn test_opening_ai_turn_advances() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "H",
            "round1": {"speaker_order": ["A", "B", "H"], "cursor": 0}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.event, Some(AdvanceEvent::Round1Step));
        assert_eq!(descriptor.label, "Advance opening statement");
    }

    #[test]
    fn test_opening_missing_cursor_is_unavailable() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "H",
            "round1": {"speaker_order": ["A", "B"]}
        }));
        let descriptor = resolve(&snap, None);
        assert!(!descriptor.enabled);
        assert_eq!(
            descriptor.disabled_reason.as_deref(),
            Some("Opening order unavailable.")
        );
    }

    #[test]
    fn test_convo1_partner_candidates() {
        let snap = snapshot(json!({
            "status": "ROUND_2_SELECT_CONVO_1",
            "human_role_id": "USA",
            "roles": full_roles()
        }));
        let descriptor = resolve(&snap, None);
        let spec = descriptor.selection.unwrap();
        let values: Vec<&str> = spec.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(
            values,
            ["BRA", "CAN", "CHN", "EU", "TZA", "AMAP", "MFF", "WCPA"]
        );
        assert!(!spec.allow_skip());
    }

    #[test]
    fn test_convo2_excludes_chair_human_and_prior_partner() {
        let snap = snapshot(json!({
            "status": "ROUND_2_SELECT_CONVO_2",
            "human_role_id": "USA",
            "roles": full_roles(),
            "round2": {"convo1": {"partner_role_id": "CHN"}}
        }));
        let descriptor = resolve(&snap, None);
        let spec = descriptor.selection.unwrap();
        let values: Vec<&str> = spec.options.iter().map(|o| o.value.as_str()).collect();
        assert!(!values.contains(&"JPN"));
        assert!(!values.contains(&"USA"));
        assert!(!values.contains(&"CHN"));
        assert_eq!(spec.skip_event, Some(AdvanceEvent::Convo2Skipped));
        assert_eq!(spec.select_event, AdvanceEvent::Convo2Selected);
    }

    #[test]
    fn test_partner_selection_without_roles_is_disabled() {
        let snap = snapshot(json!({ "status": "ROUND_2_SELECT_CONVO_1" }));
        let descriptor = resolve(&snap, Some("USA"));
        assert!(!descriptor.enabled);
        assert_eq!(
            descriptor.disabled_reason.as_deref(),
            Some("No partner options available.")
        );
    }

    #[test]
    fn test_active_conversation_routes_by_convo_index() {
        let first = snapshot(json!({
            "status": "ROUND_2_CONVERSATION_ACTIVE",
            "round2": {"active_convo_index": 1}
        }));
        let descriptor = resolve(&first, Some("USA"));
        assert_eq!(descriptor.event, Some(AdvanceEvent::Convo1Message));
        let spec = descriptor.message.unwrap();
        assert_eq!(spec.payload_key, "content");
        assert_eq!(spec.secondary_event, Some(AdvanceEvent::ConvoEndEarly));

        let second = snapshot(json!({
            "status": "ROUND_2_CONVERSATION_ACTIVE",
            "round2": {"active_convo_index": 2}
        }));
        assert_eq!(
            resolve(&second, Some("USA")).event,
            Some(AdvanceEvent::Convo2Message)
        );
    }

    #[test]
    fn test_round3_setup_default_skips_active_and_closed() {
        let snap = snapshot(json!({
            "status": "ROUND_3_SETUP",
            "round3": {
                "issues": ["1", "2", "3", "4"],
                "closed_issues": ["2"],
                "active_issue": {"issue_id": "1"}
            }
        }));
        let descriptor = resolve(&snap, Some("USA"));
        assert!(descriptor.enabled);
        let spec = descriptor.round3.unwrap();
        assert_eq!(spec.default_issue_id.as_deref(), Some("3"));
        assert_eq!(spec.event, AdvanceEvent::Round3StartIssue);
    }

    #[test]
    fn test_round3_setup_without_issues_is_disabled() {
        let snap = snapshot(json!({ "status": "ROUND_3_SETUP" }));
        let descriptor = resolve(&snap, Some("USA"));
        assert!(!descriptor.enabled);
        assert_eq!(
            descriptor.disabled_reason.as_deref(),
            Some("No issues available.")
        );
    }

    #[test]
    fn test_human_vote_turn_offers_yes_no() {
        let snap = snapshot(json!({
            "status": "ISSUE_VOTE",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "vote_order": ["BRA", "USA"],
                "next_voter_index": 1,
                "votes": {},
                "options": [{"option_id": "A"}]
            }}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Selection);
        assert_eq!(descriptor.event, Some(AdvanceEvent::HumanVote));
        let spec = descriptor.selection.unwrap();
        assert_eq!(spec.payload_key, "vote");
        let values: Vec<&str> = spec.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["YES", "NO"]);
    }

    #[test]
    fn test_vote_header_names_proposed_option() {
        let snap = snapshot(json!({
            "status": "ISSUE_VOTE",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "vote_order": ["USA"],
                "next_voter_index": 0,
                "votes": {},
                "proposed_option_id": "A",
                "options": [{"option_id": "A", "label": "Freeze quotas"}]
            }}
        }));
        let spec = resolve(&snap, None).selection.unwrap();
        assert_eq!(
            spec.header.as_deref(),
            Some("Vote on proposal A: Freeze quotas")
        );
    }

    #[test]
    fn test_vote_takes_precedence_over_debate_cursor() {
        // Inconsistent upstream data: both the vote pointer and the debate
        // cursor name the human. The vote must win.
        let snap = snapshot(json!({
            "status": "ISSUE_VOTE",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "vote_order": ["USA", "BRA"],
                "next_voter_index": 0,
                "votes": {},
                "debate_queue": ["USA", "BRA"],
                "debate_cursor": 0,
                "options": [{"option_id": "A"}]
            }}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Selection);
        assert_eq!(descriptor.event, Some(AdvanceEvent::HumanVote));
    }

    #[test]
    fn test_vote_waiting_on_ai_voter_steps() {
        let snap = snapshot(json!({
            "status": "ISSUE_VOTE",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "vote_order": ["BRA", "USA"],
                "next_voter_index": 0,
                "votes": {}
            }}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Advance);
        assert_eq!(descriptor.event, Some(AdvanceEvent::IssueDebateStep));
        assert_eq!(descriptor.label, "Debate step");
    }

    #[test]
    fn test_vote_without_votes_map_is_not_a_human_turn() {
        let snap = snapshot(json!({
            "status": "ISSUE_VOTE",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "vote_order": ["USA"],
                "next_voter_index": 0
            }}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.event, Some(AdvanceEvent::IssueDebateStep));
    }

    #[test]
    fn test_debate_human_turn_is_message_mode() {
        let snap = snapshot(json!({
            "status": "ISSUE_DEBATE_ROUND_1",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "debate_queue": ["USA", "BRA"],
                "debate_cursor": 0
            }}
        }));
        let descriptor = resolve(&snap, None);
        assert_eq!(descriptor.mode, ActionMode::Message);
        assert_eq!(descriptor.event, Some(AdvanceEvent::HumanDebateMessage));
        assert_eq!(descriptor.message.unwrap().payload_key, "text");
    }

    #[test]
    fn test_debate_cursor_walk() {
        let ai_turn = snapshot(json!({
            "status": "ISSUE_DEBATE_ROUND_2",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "debate_queue": ["BRA", "USA"],
                "debate_cursor": 0
            }}
        }));
        assert_eq!(
            resolve(&ai_turn, None).event,
            Some(AdvanceEvent::IssueDebateStep)
        );

        let exhausted = snapshot(json!({
            "status": "ISSUE_DEBATE_ROUND_2",
            "human_role_id": "USA",
            "round3": {"active_issue": {
                "debate_queue": ["BRA", "USA"],
                "debate_cursor": 2
            }}
        }));
        let descriptor = resolve(&exhausted, None);
        assert_eq!(descriptor.event, Some(AdvanceEvent::IssueDebateStep));
        assert_eq!(descriptor.label, "Continue");

        let missing = snapshot(json!({
            "status": "ISSUE_DEBATE_ROUND_1",
            "human_role_id": "USA",
            "round3": {"active_issue": {"debate_queue": ["BRA"]}}
        }));
        let descriptor = resolve(&missing, None);
        assert!(!descriptor.enabled);
        assert_eq!(
            descriptor.disabled_reason.as_deref(),
            Some("Debate order unavailable.")
        );
    }

    #[test]
    fn test_confirmed_role_fills_in_for_missing_human_role() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "round1": {"speaker_order": ["USA"], "cursor": 0}
        }));
        let descriptor = resolve(&snap, Some("USA"));
        assert_eq!(descriptor.mode, ActionMode::Message);
    }

    #[test]
    fn test_next_indicator_labels_human_as_you() {
        let snap = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "USA",
            "round1": {"speaker_order": ["BRA", "USA"], "cursor": 1}
        }));
        let indicator = next_indicator(&snap, None);
        assert_eq!(indicator.label, "You");
        assert_eq!(indicator.hint, Some("opening statement"));

        let ai = snapshot(json!({
            "status": "ROUND_1_OPENING_STATEMENTS",
            "human_role_id": "USA",
            "round1": {"speaker_order": ["BRA", "USA"], "cursor": 0}
        }));
        assert_eq!(next_indicator(&ai, None).label, "BRA");
    }

    #[test]
    fn test_current_turn_role_per_phase() {
        let vote = snapshot(json!({
            "status": "ISSUE_VOTE",
            "round3": {"active_issue": {
                "vote_order": ["BRA", "USA"],
                "next_voter_index": 1,
                "votes": {}
            }}
        }));
        assert_eq!(current_turn_role(&vote), Some("USA"));

        let wrap = snapshot(json!({ "status": "ROUND_2_WRAP_UP" }));
        assert_eq!(current_turn_role(&wrap), None);
    }

    #[test]
    fn test_issue_title_only_in_round3() {
        let snap = snapshot(json!({
            "status": "ISSUE_INTRO",
            "round3": {"active_issue": {"issue_id": "1", "issue_title": "Marine quotas"}}
        }));
        assert_eq!(issue_title(&snap), Some("Marine quotas"));

        let round1 = snapshot(json!({
            "status": "ROUND_1_SETUP",
            "round3": {"active_issue": {"issue_title": "Marine quotas"}}
        }));
        assert_eq!(issue_title(&round1), None);

        let blank = snapshot(json!({
            "status": "ISSUE_INTRO",
            "round3": {"active_issue": {"issue_title": "   "}}
        }));
        assert_eq!(issue_title(&blank), None);
    }
}
