use std::fmt::Write;

use review_module::workflow::InFlightAction;
use review_module::{ActionFamily, PauseDescriptor, ReportTone, WorkflowPhase, WorkflowState};
use serde_json::Value;

pub(crate) fn render(state: &WorkflowState) -> String {
    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {}", error);
    }
    match state.phase {
        WorkflowPhase::Listing => render_listing(&mut out, state),
        WorkflowPhase::Processing => {
            let label = match state.processing_action() {
                Some(InFlightAction::Summarizing) => "Summarizing inbox...".to_string(),
                Some(InFlightAction::Resuming(kind)) => format!("Sending {}...", kind.as_str()),
                _ => "Agent is working on the email...".to_string(),
            };
            let _ = writeln!(out, "{}", label);
        }
        WorkflowPhase::AwaitingDecision => {
            if let Some(pause) = &state.pause {
                render_pause(&mut out, state, pause);
            }
        }
        WorkflowPhase::Reporting => {
            if let Some(report) = &state.report {
                let marker = match report.tone() {
                    ReportTone::Success => "+",
                    ReportTone::Ignored => "-",
                };
                let _ = writeln!(out, "[{}] {}", marker, report.title);
                let _ = writeln!(out, "{}", report.message);
                let _ = writeln!(out, "(dismiss to return to the list)");
            }
        }
    }
    out
}

fn render_listing(out: &mut String, state: &WorkflowState) {
    let visible = state.pending.visible();
    let _ = writeln!(
        out,
        "Unread emails ({} shown, {} total, filter {:?}){}",
        visible.len(),
        state.pending.len(),
        state.pending.filter(),
        if state.is_loading() { " loading..." } else { "" }
    );
    for item in visible {
        let unread = if state.pending.is_locally_read(&item.id) {
            ' '
        } else {
            '*'
        };
        let when = item
            .received_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| item.raw_time.clone());
        let _ = writeln!(
            out,
            "{} {:>6}  {:<16}  {:<28}  {}",
            unread,
            item.id,
            when,
            truncate(&item.sender, 28),
            truncate(&item.subject, 60)
        );
    }
}

fn render_pause(out: &mut String, state: &WorkflowState, pause: &PauseDescriptor) {
    let description = &pause.human_description;
    match pause.family() {
        ActionFamily::Triage => {
            let _ = writeln!(
                out,
                "Triage suggestion: {}",
                pause.triage_suggestion().unwrap_or("")
            );
        }
        ActionFamily::Question => {
            let _ = writeln!(out, "Question: {}", pause.question_text().unwrap_or(""));
        }
        ActionFamily::Tool => {
            let _ = writeln!(out, "Proposed action: {}", pause.action_kind);
            let fields = state
                .edit
                .as_ref()
                .map(|draft| &draft.fields)
                .unwrap_or(&pause.arguments);
            for (key, value) in fields {
                let _ = writeln!(out, "  {}: {}", key, display_value(value));
            }
            if state.is_editing() {
                let _ = writeln!(out, "(editing: set <field> <value>, save, cancel-edit)");
            }
        }
    }
    if let Some(author) = &description.author {
        let _ = writeln!(out, "From: {}", author);
    }
    if let Some(subject) = &description.subject {
        let _ = writeln!(out, "Subject: {}", subject);
    }
    if let Some(body) = &description.body {
        let _ = writeln!(out, "{}", body);
    }
    let options: Vec<&str> = pause
        .allowed_decisions()
        .into_iter()
        .map(|kind| kind.as_str())
        .collect();
    let _ = writeln!(out, "Options: {}", options.join(", "));
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
