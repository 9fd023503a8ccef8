use std::io::{self, Stdout, stdout};
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use itertools::Itertools;
use ratatui::Frame;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use serde_json::json;
use uuid::Uuid;

use crate::api::{RequestTrace, TraceOutcome};
use crate::cli::worker::{NetCommand, NetResponse, Submission, WorkerHandle};
use crate::dispatch::{SelectionChoice, SeqGate};
use crate::game::action::{ActionDescriptor, ActionInput};
use crate::game::resolver::{current_turn_role, issue_title, next_indicator, resolve};
use crate::game::snapshot::{GameStateSnapshot, TranscriptEntry};
use crate::types::{ActionMode, HumanPlacement, RequiredAction};

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Terminal shell around the resolver: header, transcript, context panel and
/// the action bar for whatever control the current snapshot calls for.
pub struct TuiApp {
    worker: WorkerHandle,
    game_id: Uuid,
    confirmed_role_id: Option<String>,
    snapshot: Option<GameStateSnapshot>,
    transcript: Vec<TranscriptEntry>,
    descriptor: ActionDescriptor,
    action_key: String,
    input: ActionInput,
    selection_idx: usize,
    state_gate: SeqGate,
    transcript_gate: SeqGate,
    required_action: Option<RequiredAction>,
    error: Option<String>,
    busy: bool,
    traces: Vec<RequestTrace>,
    show_debug: bool,
    raw_line: String,
    transcript_scroll: u16,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(
        worker: WorkerHandle,
        game_id: Uuid,
        confirmed_role_id: Option<String>,
        required_action: Option<RequiredAction>,
    ) -> Self {
        Self {
            worker,
            game_id,
            confirmed_role_id,
            snapshot: None,
            transcript: Vec::new(),
            descriptor: ActionDescriptor::disabled("No state loaded."),
            action_key: String::new(),
            input: ActionInput::default(),
            selection_idx: 0,
            state_gate: SeqGate::default(),
            transcript_gate: SeqGate::default(),
            required_action,
            error: None,
            busy: false,
            traces: Vec::new(),
            show_debug: false,
            raw_line: String::new(),
            transcript_scroll: 0,
            should_quit: false,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut out = stdout();
        execute!(out, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(out);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.request_refresh();

        let result = loop {
            if self.should_quit {
                break Ok(());
            }

            self.drain_responses();
            terminal.draw(|f| self.render(f))?;

            if crossterm::event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        };

        // Always cleanup terminal state
        let _ = terminal.clear();
        let _ = disable_raw_mode();
        let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
        let _ = terminal.show_cursor();

        result
    }

    pub fn request_refresh(&mut self) {
        let state_seq = self.state_gate.begin();
        let transcript_seq = self.transcript_gate.begin();
        self.busy = self
            .worker
            .commands
            .send(NetCommand::Refresh {
                state_seq,
                transcript_seq,
            })
            .is_ok();
    }

    fn drain_responses(&mut self) {
        while let Ok(response) = self.worker.responses.try_recv() {
            self.on_response(response);
        }
    }

    fn on_response(&mut self, response: NetResponse) {
        match response {
            NetResponse::State { seq, state } => {
                // Superseded fetches are dropped; newer state stays on screen.
                if self.state_gate.admits(seq) {
                    self.snapshot = state;
                    self.resolve_now();
                }
            }
            NetResponse::Transcript { seq, transcript } => {
                // The transcript is the last message of a refresh cycle.
                self.busy = false;
                if self.transcript_gate.admits(seq) {
                    self.transcript = transcript;
                    self.transcript_scroll = 0;
                }
            }
            NetResponse::RefreshFailed { message } => {
                self.error = Some(message);
                self.busy = false;
            }
            NetResponse::SubmitOk => {
                self.error = None;
                self.busy = false;
                self.required_action = None;
                self.input.message_draft.clear();
                self.input.selection_value = None;
                self.input.skip_checked = false;
            }
            NetResponse::SubmitFailed {
                message,
                required_action,
            } => {
                self.error = Some(message);
                self.required_action = required_action;
                self.busy = false;
            }
            NetResponse::Traces(traces) => {
                self.traces = traces;
            }
        }
    }

    /// Rebuild the descriptor from the current snapshot. Drafts survive only
    /// while the resolved control keeps the same identity.
    fn resolve_now(&mut self) {
        let descriptor = match self.snapshot.as_ref() {
            Some(snapshot) => resolve(snapshot, self.confirmed_role_id.as_deref()),
            None => ActionDescriptor::disabled("No state loaded."),
        };
        let key = descriptor.action_key();
        if key != self.action_key {
            self.input = ActionInput::for_descriptor(&descriptor);
            self.selection_idx = 0;
        }
        self.action_key = key;
        self.descriptor = descriptor;
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('d') => {
                    self.show_debug = !self.show_debug;
                    self.raw_line.clear();
                }
                KeyCode::Char('r') => self.request_refresh(),
                KeyCode::Char('e') => self.submit_secondary(),
                _ => {}
            }
            return;
        }

        if self.show_debug {
            self.handle_debug_key(key);
            return;
        }

        match self.descriptor.mode {
            ActionMode::Message => self.handle_message_key(key),
            ActionMode::Selection => self.handle_selection_key(key),
            ActionMode::Round3Setup => self.handle_round3_key(key),
            ActionMode::Advance => self.handle_advance_key(key),
        }
    }

    fn handle_advance_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Up => self.transcript_scroll = self.transcript_scroll.saturating_sub(1),
            KeyCode::Down => self.transcript_scroll = self.transcript_scroll.saturating_add(1),
            _ => {}
        }
    }

    fn handle_message_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.message_draft.pop();
            }
            KeyCode::Char(c) => self.input.message_draft.push(c),
            KeyCode::Up => self.transcript_scroll = self.transcript_scroll.saturating_sub(1),
            KeyCode::Down => self.transcript_scroll = self.transcript_scroll.saturating_add(1),
            _ => {}
        }
    }

    fn handle_selection_key(&mut self, key: KeyEvent) {
        let options = self
            .descriptor
            .selection
            .as_ref()
            .map(|spec| spec.options.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => {
                if self.selection_idx > 0 {
                    self.selection_idx -= 1;
                }
                self.sync_selection_value();
            }
            KeyCode::Down => {
                if self.selection_idx + 1 < options {
                    self.selection_idx += 1;
                }
                self.sync_selection_value();
            }
            KeyCode::Char(' ') => self.sync_selection_value(),
            KeyCode::Char('s') => {
                let allow_skip = self
                    .descriptor
                    .selection
                    .as_ref()
                    .is_some_and(|spec| spec.allow_skip());
                if allow_skip {
                    self.input.skip_checked = !self.input.skip_checked;
                }
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn sync_selection_value(&mut self) {
        self.input.selection_value = self
            .descriptor
            .selection
            .as_ref()
            .and_then(|spec| spec.options.get(self.selection_idx))
            .map(|option| option.value.clone());
    }

    fn handle_round3_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Right => self.cycle_issue(key.code == KeyCode::Right),
            KeyCode::Tab => self.cycle_placement(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn cycle_issue(&mut self, forward: bool) {
        let Some(spec) = self.descriptor.round3.as_ref() else {
            return;
        };
        if spec.issues.is_empty() {
            return;
        }
        let current = self
            .input
            .issue_id
            .as_ref()
            .and_then(|id| spec.issues.iter().position(|issue| issue == id))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % spec.issues.len()
        } else {
            (current + spec.issues.len() - 1) % spec.issues.len()
        };
        self.input.issue_id = Some(spec.issues[next].clone());
    }

    fn cycle_placement(&mut self) {
        let current = HumanPlacement::ALL
            .iter()
            .position(|p| *p == self.input.placement)
            .unwrap_or(0);
        self.input.placement = HumanPlacement::ALL[(current + 1) % HumanPlacement::ALL.len()];
    }

    fn handle_debug_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.show_debug = false;
                self.raw_line.clear();
            }
            KeyCode::Backspace => {
                self.raw_line.pop();
            }
            KeyCode::Enter => self.submit_raw(),
            KeyCode::Char(c) => self.raw_line.push(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        if self.busy || !self.descriptor.ready_with(&self.input) {
            return;
        }
        let submission = match self.descriptor.mode {
            ActionMode::Advance => Submission::Advance(self.descriptor.clone()),
            ActionMode::Message => Submission::Message(
                self.descriptor.clone(),
                self.input.message_draft.clone(),
            ),
            ActionMode::Selection => {
                let choice = if self.input.skip_checked {
                    SelectionChoice::Skip
                } else {
                    SelectionChoice::Pick(self.input.selection_value.clone().unwrap_or_default())
                };
                Submission::Selection(self.descriptor.clone(), choice)
            }
            ActionMode::Round3Setup => Submission::Round3Start(
                self.descriptor.clone(),
                self.input.issue_id.clone().unwrap_or_default(),
                self.input.placement,
            ),
        };
        self.send(submission);
    }

    fn submit_secondary(&mut self) {
        if self.busy {
            return;
        }
        let has_secondary = self
            .descriptor
            .message
            .as_ref()
            .is_some_and(|spec| spec.secondary_event.is_some());
        if has_secondary {
            self.send(Submission::Secondary(self.descriptor.clone()));
        }
    }

    /// Raw advance: `EVENT {"optional": "json payload"}`.
    fn submit_raw(&mut self) {
        if self.busy {
            return;
        }
        let mut parts = self.raw_line.splitn(2, ' ');
        let event = parts.next().unwrap_or("").trim().to_string();
        if event.is_empty() {
            return;
        }
        let payload = match parts.next().map(str::trim).filter(|rest| !rest.is_empty()) {
            Some(text) => match serde_json::from_str(text) {
                Ok(value) => value,
                Err(_) => {
                    self.error = Some("Payload must be valid JSON".to_string());
                    return;
                }
            },
            None => json!({}),
        };
        self.raw_line.clear();
        self.send(Submission::Raw { event, payload });
    }

    fn send(&mut self, submission: Submission) {
        let state_seq = self.state_gate.begin();
        let transcript_seq = self.transcript_gate.begin();
        self.busy = self
            .worker
            .commands
            .send(NetCommand::Submit {
                submission,
                state_seq,
                transcript_seq,
            })
            .is_ok();
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(8),
                Constraint::Length(1),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(42)])
            .split(chunks[1]);
        self.render_transcript(frame, main[0]);
        if self.show_debug {
            self.render_debug(frame, main[1]);
        } else {
            self.render_context(frame, main[1]);
        }

        self.render_action_bar(frame, chunks[2]);
        self.render_status_line(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let (round, phase, issue, next) = match self.snapshot.as_ref() {
            Some(snapshot) => {
                let round = snapshot
                    .status
                    .as_ref()
                    .and_then(|status| status.round_label())
                    .unwrap_or("(unknown)");
                let phase = snapshot
                    .status
                    .as_ref()
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "(unknown)".to_string());
                let issue = issue_title(snapshot).unwrap_or("-").to_string();
                let indicator = next_indicator(snapshot, self.confirmed_role_id.as_deref());
                let next = match indicator.hint {
                    Some(hint) => format!("{} ({hint})", indicator.label),
                    None => indicator.label,
                };
                (round, phase, issue, next)
            }
            None => (
                "(unknown)",
                "(unknown)".to_string(),
                "-".to_string(),
                "(unknown)".to_string(),
            ),
        };
        let role = self.confirmed_role_id.as_deref().unwrap_or("(none)");
        let lines = vec![
            Line::from(vec![
                Span::styled("Mercury Game  ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("game {}  role {role}", self.game_id)),
            ]),
            Line::from(format!(
                "round {round}  phase {phase}  issue {issue}  next: {next}"
            )),
        ];
        let header = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Session"));
        frame.render_widget(header, area);
    }

    fn render_transcript(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let active_role =
            self.snapshot.as_ref().and_then(current_turn_role).map(str::to_string);
        let items: Vec<ListItem<'_>> = self
            .transcript
            .iter()
            .map(|entry| transcript_item(entry, active_role.as_deref()))
            .collect();
        let count = items.len();
        let title = format!("Transcript ({count})");
        let visible = area.height.saturating_sub(2) as usize;
        let max_scroll = count.saturating_sub(visible) as u16;
        if self.transcript_scroll > max_scroll {
            self.transcript_scroll = max_scroll;
        }
        // Bottom-anchored: newest entries stay in view unless scrolled up.
        let offset = max_scroll.saturating_sub(self.transcript_scroll) as usize;
        let mut state = ListState::default().with_offset(offset);
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_context(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'_>> = Vec::new();
        if let Some(snapshot) = self.snapshot.as_ref() {
            if let Some(human) = snapshot.human_role_id.as_deref() {
                lines.push(Line::from(format!("human role: {human}")));
            }
            if !snapshot.round1.speaker_order.is_empty() {
                let cursor = snapshot
                    .round1
                    .cursor
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                lines.push(Line::from(format!(
                    "speakers [{}] cursor {cursor}",
                    snapshot.round1.speaker_order.iter().join(", ")
                )));
            }
            if let Some(partner) = snapshot.convo1_partner() {
                lines.push(Line::from(format!("convo 1 partner: {partner}")));
            }
            if let Some(partner) = snapshot
                .round2
                .convo2
                .as_ref()
                .and_then(|c| c.partner_role_id.as_deref())
            {
                lines.push(Line::from(format!("convo 2 partner: {partner}")));
            }
            if !snapshot.round3.issues.is_empty() {
                let issues = snapshot
                    .round3
                    .issues
                    .iter()
                    .map(|id| {
                        if snapshot.round3.closed_issues.contains(id) {
                            format!("{id}*")
                        } else {
                            id.clone()
                        }
                    })
                    .join(", ");
                lines.push(Line::from(format!("issues: {issues} (* closed)")));
            }
            if let Some(issue) = snapshot.active_issue() {
                if let Some(id) = issue.issue_id.as_deref() {
                    lines.push(Line::from(format!("active issue: {id}")));
                }
                for option in &issue.options {
                    let marker = if issue.proposed_option_id.as_deref()
                        == Some(option.option_id.as_str())
                    {
                        ">"
                    } else {
                        " "
                    };
                    lines.push(Line::from(format!(
                        " {marker} {}: {}",
                        option.option_id,
                        option.display_label()
                    )));
                }
                if !issue.debate_queue.is_empty() {
                    let cursor = issue
                        .debate_cursor
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    lines.push(Line::from(format!(
                        "debate [{}] cursor {cursor}",
                        issue.debate_queue.iter().join(", ")
                    )));
                }
                if let Some(votes) = issue.votes.as_ref() {
                    lines.push(Line::from(format!(
                        "votes: {}/{} cast",
                        votes.len(),
                        issue.vote_order.len()
                    )));
                }
            }
        } else {
            lines.push(Line::from("no state loaded"));
        }
        let context = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Context"));
        frame.render_widget(context, area);
    }

    fn render_debug(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'_>> = self
            .traces
            .iter()
            .rev()
            .take(area.height.saturating_sub(4) as usize)
            .map(|trace| {
                let style = match trace.outcome {
                    TraceOutcome::Ok => Style::default().fg(Color::Green),
                    TraceOutcome::Error => Style::default().fg(Color::Red),
                };
                Line::from(Span::styled(
                    format!(
                        "{} {} {}",
                        trace.timestamp.format("%H:%M:%S"),
                        trace.method,
                        trace.url
                    ),
                    style,
                ))
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(format!("raw> {}", self.raw_line)));
        let debug = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Debug (Enter sends raw advance, Esc closes)"),
            );
        frame.render_widget(debug, area);
    }

    fn render_action_bar(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'_>> = Vec::new();
        let ready = self.descriptor.ready_with(&self.input);
        let label_style = if ready {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(Span::styled(
            format!("[Enter] {}", self.descriptor.label),
            label_style,
        )));

        match self.descriptor.mode {
            ActionMode::Message => {
                if let Some(spec) = self.descriptor.message.as_ref() {
                    let draft = if self.input.message_draft.is_empty() {
                        Span::styled(spec.placeholder, Style::default().fg(Color::DarkGray))
                    } else {
                        Span::raw(self.input.message_draft.as_str())
                    };
                    lines.push(Line::from(vec![Span::raw("> "), draft]));
                    if let Some(helper) = spec.helper_text {
                        lines.push(Line::from(Span::styled(
                            helper,
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                    if let Some(label) = spec.secondary_label {
                        lines.push(Line::from(format!("[Ctrl-E] {label}")));
                    }
                }
                if self.required_action == Some(RequiredAction::HumanDebate) {
                    lines.push(Line::from(Span::styled(
                        "Backend requires a human debate message before advancing.",
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            ActionMode::Selection => {
                if let Some(spec) = self.descriptor.selection.as_ref() {
                    if let Some(header) = spec.header.as_deref() {
                        lines.push(Line::from(header.to_string()));
                    }
                    for (idx, option) in spec.options.iter().enumerate() {
                        let marker = if self.input.selection_value.as_deref()
                            == Some(option.value.as_str())
                        {
                            "(x)"
                        } else {
                            "( )"
                        };
                        let style = if idx == self.selection_idx {
                            Style::default().add_modifier(Modifier::REVERSED)
                        } else {
                            Style::default()
                        };
                        lines.push(Line::from(Span::styled(
                            format!("{marker} {}", option.label),
                            style,
                        )));
                    }
                    if let Some(skip_label) = spec.skip_label {
                        let checked = if self.input.skip_checked { "x" } else { " " };
                        lines.push(Line::from(format!("[s] {skip_label} [{checked}]")));
                    }
                    if let Some(note) = spec.note {
                        lines.push(Line::from(Span::styled(
                            note,
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
            }
            ActionMode::Round3Setup => {
                if let Some(spec) = self.descriptor.round3.as_ref() {
                    lines.push(Line::from(spec.header));
                    let issue = self.input.issue_id.as_deref().unwrap_or("(none)");
                    lines.push(Line::from(format!("next issue: < {issue} >  (Left/Right)")));
                    lines.push(Line::from(format!(
                        "human placement: {}  (Tab cycles)",
                        self.input.placement
                    )));
                }
            }
            ActionMode::Advance => {}
        }

        if let Some(reason) = self.descriptor.blocked_reason(&self.input) {
            lines.push(Line::from(Span::styled(
                reason,
                Style::default().fg(Color::Yellow),
            )));
        }

        let bar = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Action"));
        frame.render_widget(bar, area);
    }

    fn render_status_line(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = if let Some(error) = self.error.as_deref() {
            Line::from(Span::styled(error, Style::default().fg(Color::Red)))
        } else if self.busy {
            Line::from(Span::styled("Working...", Style::default().fg(Color::Yellow)))
        } else {
            Line::from(Span::styled(
                "Ready  (Ctrl-R refresh, Ctrl-D debug, q quits)",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn transcript_item<'a>(entry: &'a TranscriptEntry, active_role: Option<&str>) -> ListItem<'a> {
    let role = entry.role_id.as_deref().unwrap_or("?");
    let phase = entry.phase.as_deref().unwrap_or("-");
    let round = entry
        .round
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    let content = entry.content.as_deref().unwrap_or("");
    let style = if Some(role) == active_role {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("[{round}/{phase}] {role}: "), style),
        Span::raw(content),
    ]))
}
