use serde_json::{Value, json};

use crate::types::{ActionMode, AdvanceEvent, HumanPlacement};

/// Fully specified next action derived from one snapshot. Constructed fresh
/// by the resolver on every state change, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub mode: ActionMode,
    pub event: Option<AdvanceEvent>,
    pub enabled: bool,
    pub label: &'static str,
    pub disabled_reason: Option<String>,
    /// Base payload sent with the event (role confirmation only; the
    /// mode-specific specs below contribute the rest at submit time).
    pub payload: Value,
    pub message: Option<MessageSpec>,
    pub selection: Option<SelectionSpec>,
    pub round3: Option<Round3Spec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSpec {
    pub payload_key: &'static str,
    pub placeholder: &'static str,
    pub secondary_event: Option<AdvanceEvent>,
    pub secondary_label: Option<&'static str>,
    pub helper_text: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpec {
    pub options: Vec<SelectionOption>,
    pub payload_key: &'static str,
    pub select_event: AdvanceEvent,
    pub skip_event: Option<AdvanceEvent>,
    pub skip_label: Option<&'static str>,
    pub header: Option<String>,
    pub note: Option<&'static str>,
}

impl SelectionSpec {
    pub fn allow_skip(&self) -> bool {
        self.skip_event.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOption {
    pub value: String,
    pub label: String,
}

impl SelectionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round3Spec {
    pub event: AdvanceEvent,
    pub issues: Vec<String>,
    pub default_issue_id: Option<String>,
    pub header: &'static str,
    pub button_label: &'static str,
}

impl ActionDescriptor {
    pub fn advance(event: AdvanceEvent, label: &'static str) -> Self {
        Self {
            mode: ActionMode::Advance,
            event: Some(event),
            enabled: true,
            label,
            disabled_reason: None,
            payload: json!({}),
            message: None,
            selection: None,
            round3: None,
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            mode: ActionMode::Advance,
            event: None,
            enabled: false,
            label: "Continue",
            disabled_reason: Some(reason.into()),
            payload: json!({}),
            message: None,
            selection: None,
            round3: None,
        }
    }

    pub fn message(event: AdvanceEvent, label: &'static str, spec: MessageSpec) -> Self {
        Self {
            mode: ActionMode::Message,
            event: Some(event),
            enabled: true,
            label,
            disabled_reason: Some("Message required.".to_string()),
            payload: json!({}),
            message: Some(spec),
            selection: None,
            round3: None,
        }
    }

    pub fn selection(label: &'static str, spec: SelectionSpec) -> Self {
        Self {
            mode: ActionMode::Selection,
            event: Some(spec.select_event),
            enabled: true,
            label,
            disabled_reason: None,
            payload: json!({}),
            selection: Some(spec),
            message: None,
            round3: None,
        }
    }

    pub fn round3_setup(enabled: bool, disabled_reason: Option<String>, spec: Round3Spec) -> Self {
        Self {
            mode: ActionMode::Round3Setup,
            // The event fires only once the caller picks an issue.
            event: None,
            enabled,
            label: spec.button_label,
            disabled_reason,
            payload: json!({}),
            round3: Some(spec),
            message: None,
            selection: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Identity of the control this descriptor asks for. Local drafts are
    /// reset whenever the key changes between two resolutions.
    pub fn action_key(&self) -> String {
        let event = self
            .event
            .map(|e| e.to_string())
            .or_else(|| self.round3.as_ref().map(|r| r.event.to_string()))
            .unwrap_or_else(|| "none".to_string());
        format!("{}:{}", self.mode, event)
    }

    /// Whether the submit control is live given the user's in-progress input.
    pub fn ready_with(&self, input: &ActionInput) -> bool {
        if !self.enabled {
            return false;
        }
        match self.mode {
            ActionMode::Advance => true,
            ActionMode::Message => !input.message_draft.trim().is_empty(),
            ActionMode::Selection => {
                let skip_allowed = self
                    .selection
                    .as_ref()
                    .is_some_and(|spec| spec.allow_skip());
                (skip_allowed && input.skip_checked) || input.selection_value.is_some()
            }
            ActionMode::Round3Setup => input.issue_id.as_deref().is_some_and(|id| !id.is_empty()),
        }
    }

    /// Why the submit control is not live, for the action bar.
    pub fn blocked_reason(&self, input: &ActionInput) -> Option<String> {
        if self.ready_with(input) {
            return None;
        }
        match self.mode {
            ActionMode::Message if self.enabled => Some("Message required.".to_string()),
            ActionMode::Selection if self.enabled => Some("Selection required.".to_string()),
            ActionMode::Round3Setup if self.enabled => {
                Some("Issue selection required.".to_string())
            }
            _ => self.disabled_reason.clone(),
        }
    }
}

/// The user's in-progress input for the current control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInput {
    pub message_draft: String,
    pub selection_value: Option<String>,
    pub skip_checked: bool,
    pub issue_id: Option<String>,
    pub placement: HumanPlacement,
}

impl Default for ActionInput {
    fn default() -> Self {
        Self {
            message_draft: String::new(),
            selection_value: None,
            skip_checked: false,
            issue_id: None,
            placement: HumanPlacement::Random,
        }
    }
}

impl ActionInput {
    /// Fresh input state for a newly resolved descriptor.
    pub fn for_descriptor(descriptor: &ActionDescriptor) -> Self {
        Self {
            issue_id: descriptor
                .round3
                .as_ref()
                .and_then(|spec| spec.default_issue_id.clone()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_gating_on_whitespace() {
        let descriptor = ActionDescriptor::message(
            AdvanceEvent::HumanDebateMessage,
            "Submit debate message",
            MessageSpec {
                payload_key: "text",
                placeholder: "",
                secondary_event: None,
                secondary_label: None,
                helper_text: None,
            },
        );
        let mut input = ActionInput::default();
        input.message_draft = "   ".to_string();
        assert!(!descriptor.ready_with(&input));
        assert_eq!(
            descriptor.blocked_reason(&input).as_deref(),
            Some("Message required.")
        );
        input.message_draft = "we propose a cap".to_string();
        assert!(descriptor.ready_with(&input));
        assert_eq!(descriptor.blocked_reason(&input), None);
    }

    #[test]
    fn test_selection_requires_pick_or_allowed_skip() {
        let spec = SelectionSpec {
            options: vec![SelectionOption::new("BRA", "BRA")],
            payload_key: "partner_role_id",
            select_event: AdvanceEvent::Convo2Selected,
            skip_event: Some(AdvanceEvent::Convo2Skipped),
            skip_label: Some("Skip second conversation"),
            header: None,
            note: None,
        };
        let descriptor = ActionDescriptor::selection("Select partner", spec);
        let mut input = ActionInput::default();
        assert!(!descriptor.ready_with(&input));
        input.skip_checked = true;
        assert!(descriptor.ready_with(&input));
        input.skip_checked = false;
        input.selection_value = Some("BRA".to_string());
        assert!(descriptor.ready_with(&input));
    }

    #[test]
    fn test_skip_is_ignored_where_not_offered() {
        let spec = SelectionSpec {
            options: vec![SelectionOption::new("BRA", "BRA")],
            payload_key: "partner_role_id",
            select_event: AdvanceEvent::Convo1Selected,
            skip_event: None,
            skip_label: None,
            header: None,
            note: None,
        };
        let descriptor = ActionDescriptor::selection("Select partner", spec);
        let mut input = ActionInput::default();
        input.skip_checked = true;
        assert!(!descriptor.ready_with(&input));
    }

    #[test]
    fn test_action_key_uses_round3_event() {
        let descriptor = ActionDescriptor::round3_setup(
            true,
            None,
            Round3Spec {
                event: AdvanceEvent::Round3StartIssue,
                issues: vec!["1".to_string()],
                default_issue_id: Some("1".to_string()),
                header: "Round 3 setup",
                button_label: "Start Issue",
            },
        );
        assert_eq!(descriptor.action_key(), "round3_setup:ROUND_3_START_ISSUE");
        let input = ActionInput::for_descriptor(&descriptor);
        assert_eq!(input.issue_id.as_deref(), Some("1"));
        assert!(descriptor.ready_with(&input));
    }
}
