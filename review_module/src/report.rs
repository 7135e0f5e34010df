use agent_api_module::DecisionKind;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pending::PendingItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Dismissed,
    AutoSkipped,
    Sent,
    Handled,
    Completed,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportIcon {
    Trash,
    Archive,
    Send,
    Check,
    Sparkles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTone {
    Success,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub kind: ReportKind,
    pub title: String,
    pub message: String,
    pub icon: ReportIcon,
}

impl ReportDescriptor {
    fn new(kind: ReportKind, title: &str, message: impl Into<String>, icon: ReportIcon) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
            icon,
        }
    }

    pub fn tone(&self) -> ReportTone {
        match self.kind {
            ReportKind::Dismissed | ReportKind::AutoSkipped => ReportTone::Ignored,
            _ => ReportTone::Success,
        }
    }
}

/// The agent's own triage classification for a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerOutcome {
    Ignore,
    Respond,
    Notify,
    Other(Option<String>),
}

impl ServerOutcome {
    pub fn from_classification(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()) {
            Some(value) if value == "ignore" => ServerOutcome::Ignore,
            Some(value) if value == "respond" => ServerOutcome::Respond,
            Some(value) if value == "notify" => ServerOutcome::Notify,
            other => ServerOutcome::Other(other),
        }
    }
}

/// First match wins: the human's own ignore beats anything the agent says.
pub fn classify(outcome: &ServerOutcome, decision: Option<DecisionKind>) -> ReportDescriptor {
    if decision == Some(DecisionKind::Ignore) {
        return ReportDescriptor::new(
            ReportKind::Dismissed,
            "Action Dismissed",
            "You chose to ignore this action. No changes were made.",
            ReportIcon::Trash,
        );
    }
    match outcome {
        ServerOutcome::Ignore => ReportDescriptor::new(
            ReportKind::AutoSkipped,
            "Skipped (Triage Decision: Ignore)",
            "The AI ignored this mail and marked it as read cause it might be related to promotional/spam.",
            ReportIcon::Archive,
        ),
        ServerOutcome::Respond => ReportDescriptor::new(
            ReportKind::Sent,
            "Reply Sent Successfully",
            "The email response has been generated and sent.",
            ReportIcon::Send,
        ),
        ServerOutcome::Notify => ReportDescriptor::new(
            ReportKind::Handled,
            "Triage Handled",
            "You decided to ignore the email.",
            ReportIcon::Check,
        ),
        ServerOutcome::Other(_) => ReportDescriptor::new(
            ReportKind::Completed,
            "Completed",
            "Workflow finished successfully.",
            ReportIcon::Check,
        ),
    }
}

/// Classify a finished run and drop its item from the pending collection.
pub fn report_completion(
    store: &mut PendingItemStore,
    item_id: Option<&str>,
    outcome: &ServerOutcome,
    decision: Option<DecisionKind>,
) -> ReportDescriptor {
    let report = classify(outcome, decision);
    if let Some(item_id) = item_id {
        let removed = store.remove(item_id);
        info!(
            "run for email {} finished as {:?} (removed from pending: {})",
            item_id, report.kind, removed
        );
    }
    report
}

pub fn summary_report(summary: impl Into<String>) -> ReportDescriptor {
    ReportDescriptor::new(
        ReportKind::Summary,
        "Inbox Executive Summary",
        summary,
        ReportIcon::Sparkles,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pending::PendingItem;
    use chrono::Local;

    #[test]
    fn user_ignore_takes_precedence() {
        let report = classify(&ServerOutcome::Respond, Some(DecisionKind::Ignore));
        assert_eq!(report.kind, ReportKind::Dismissed);
        assert_eq!(report.icon, ReportIcon::Trash);
        assert_eq!(report.tone(), ReportTone::Ignored);
    }

    #[test]
    fn server_outcomes_map_in_order() {
        let cases = [
            (Some("ignore"), ReportKind::AutoSkipped, ReportIcon::Archive),
            (Some("respond"), ReportKind::Sent, ReportIcon::Send),
            (Some("NOTIFY"), ReportKind::Handled, ReportIcon::Check),
            (Some("archive"), ReportKind::Completed, ReportIcon::Check),
            (None, ReportKind::Completed, ReportIcon::Check),
        ];
        for (raw, kind, icon) in cases {
            let outcome = ServerOutcome::from_classification(raw);
            let report = classify(&outcome, Some(DecisionKind::Accept));
            assert_eq!(report.kind, kind, "classification {:?}", raw);
            assert_eq!(report.icon, icon);
        }
    }

    #[test]
    fn auto_skip_title_matches_triage_wording() {
        let report = classify(&ServerOutcome::Ignore, None);
        assert_eq!(report.title, "Skipped (Triage Decision: Ignore)");
        assert_eq!(report.tone(), ReportTone::Ignored);
    }

    #[test]
    fn report_messages_match_client_wording() {
        let skipped = classify(&ServerOutcome::Ignore, Some(DecisionKind::Accept));
        assert_eq!(
            skipped.message,
            "The AI ignored this mail and marked it as read cause it might be related to promotional/spam."
        );
        let handled = classify(&ServerOutcome::Notify, None);
        assert_eq!(handled.message, "You decided to ignore the email.");
        let dismissed = classify(&ServerOutcome::Respond, Some(DecisionKind::Ignore));
        assert_eq!(
            dismissed.message,
            "You chose to ignore this action. No changes were made."
        );
        let sent = classify(&ServerOutcome::Respond, Some(DecisionKind::Edit));
        assert_eq!(sent.message, "The email response has been generated and sent.");
    }

    #[test]
    fn report_completion_removes_item_once() {
        let mut store = PendingItemStore::default();
        store.replace_items(
            vec![
                PendingItem::new("1", "a@example.com", "One", "", "2024-10-01T10:00:00Z"),
                PendingItem::new("2", "b@example.com", "Two", "", "2024-10-02T10:00:00Z"),
            ],
            Local::now(),
        );

        let report = report_completion(&mut store, Some("1"), &ServerOutcome::Notify, None);
        assert_eq!(report.kind, ReportKind::Handled);
        assert_eq!(store.len(), 1);

        report_completion(&mut store, Some("1"), &ServerOutcome::Notify, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn summary_report_carries_server_text() {
        let report = summary_report("Two invoices, one invite.");
        assert_eq!(report.kind, ReportKind::Summary);
        assert_eq!(report.title, "Inbox Executive Summary");
        assert_eq!(report.message, "Two invoices, one invite.");
        assert_eq!(report.icon, ReportIcon::Sparkles);
    }
}
