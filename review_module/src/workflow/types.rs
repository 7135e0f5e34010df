use agent_api_module::{
    ClientError, DecisionKind, ListOrder, PendingItemRecord, ResumeRequest, StepResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::decision::Decision;
use crate::interrupt::PauseDescriptor;
use crate::pending::{ItemFilter, PendingItemStore};
use crate::report::ReportDescriptor;

pub(crate) const FETCH_FAILED: &str = "Failed to fetch emails";
pub(crate) const PROCESS_FAILED: &str = "Failed to process email";
pub(crate) const RESUME_FAILED: &str = "Failed to process response";
pub(crate) const SUMMARY_FAILED: &str = "Failed to generate summary";
pub(crate) const SUMMARY_NETWORK_FAILED: &str = "Network error during summarization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Listing,
    Processing,
    AwaitingDecision,
    Reporting,
}

/// An open agent run. `session_id` is the server's `thread_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub item_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InFlightAction {
    Starting,
    Resuming(DecisionKind),
    Summarizing,
}

/// The processing-action marker. Only one workflow request at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlight {
    pub ticket: Uuid,
    pub action: InFlightAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditDraft {
    pub fields: Map<String, Value>,
}

/// Everything the controller knows. Owned by the caller and threaded through
/// `apply_command` / `apply_completion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub user_id: String,
    pub order: ListOrder,
    pub phase: WorkflowPhase,
    pub selected_item: Option<String>,
    pub session: Option<Session>,
    pub pause: Option<PauseDescriptor>,
    pub edit: Option<EditDraft>,
    pub error: Option<String>,
    pub report: Option<ReportDescriptor>,
    pub in_flight: Option<InFlight>,
    /// Ticket of the outstanding list request; doubles as the loading marker.
    pub list_ticket: Option<Uuid>,
    pub pending: PendingItemStore,
}

impl WorkflowState {
    pub fn new(user_id: impl Into<String>, order: ListOrder) -> Self {
        Self {
            user_id: user_id.into(),
            order,
            phase: WorkflowPhase::Listing,
            selected_item: None,
            session: None,
            pause: None,
            edit: None,
            error: None,
            report: None,
            in_flight: None,
            list_ticket: None,
            pending: PendingItemStore::default(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.list_ticket.is_some()
    }

    /// A draft survives a pending resume but is only editable while the
    /// pause waits on the reviewer.
    pub fn is_editing(&self) -> bool {
        self.edit.is_some() && self.phase == WorkflowPhase::AwaitingDecision
    }

    pub fn processing_action(&self) -> Option<InFlightAction> {
        self.in_flight.map(|in_flight| in_flight.action)
    }

    /// True while any request (workflow or listing) is outstanding.
    pub fn has_outstanding_requests(&self) -> bool {
        self.in_flight.is_some() || self.list_ticket.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Refresh,
    SelectFilter(ItemFilter),
    StartSession { item_id: String },
    Summarize,
    EnterEditMode,
    EditField { key: String, value: Value },
    ExitEditMode,
    SubmitEdits,
    SubmitDecision(Decision),
    Dismiss,
    /// Close the workflow view. The remote run is not told.
    Cancel,
    Logout,
}

/// Work the caller must perform on behalf of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ListPending {
        ticket: Uuid,
    },
    Process {
        ticket: Uuid,
        item_id: String,
    },
    Resume {
        ticket: Uuid,
        session_id: String,
        request: ResumeRequest,
    },
    Summarize {
        ticket: Uuid,
    },
    /// Persist the read mark and send the detached notification.
    MarkRead {
        item_id: String,
    },
    ClearReadMarks,
}

impl Effect {
    pub fn ticket(&self) -> Option<Uuid> {
        match self {
            Effect::ListPending { ticket }
            | Effect::Process { ticket, .. }
            | Effect::Resume { ticket, .. }
            | Effect::Summarize { ticket } => Some(*ticket),
            Effect::MarkRead { .. } | Effect::ClearReadMarks => None,
        }
    }
}

#[derive(Debug)]
pub struct RemoteCompletion {
    pub ticket: Uuid,
    pub outcome: RemoteOutcome,
}

#[derive(Debug)]
pub enum RemoteOutcome {
    Listed(Result<Vec<PendingItemRecord>, ClientError>),
    Processed(Result<StepResponse, ClientError>),
    Resumed(Result<StepResponse, ClientError>),
    Summarized(Result<String, ClientError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDisposition {
    Applied,
    /// The ticket no longer matches; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("a session is already open")]
    SessionAlreadyOpen,
    #[error("not available while {0:?}")]
    WrongPhase(WorkflowPhase),
    #[error("a request is already in flight")]
    RequestInFlight,
    #[error("{} is not permitted for this action", .0.as_str())]
    DecisionNotPermitted(DecisionKind),
    #[error("this action cannot be edited")]
    EditNotAvailable,
    #[error("not in edit mode")]
    NotEditing,
    #[error("unknown email: {0}")]
    UnknownItem(String),
    #[error("cannot summarize while a session is open")]
    SummarizeWhileSessionOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("command rejected: {0}")]
    Rejected(#[from] Rejection),
}
