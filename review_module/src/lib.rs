//! Human-in-the-loop review of actions proposed by the inbox agent.

pub mod config;
pub mod decision;
pub mod interrupt;
pub mod mark_read;
pub mod pending;
pub mod read_marks;
pub mod report;
pub mod runner;
pub mod workflow;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::ReviewConfig;
pub use decision::{encode, Decision, DecisionArgs};
pub use interrupt::{
    normalize, normalize_payload, ActionFamily, Capabilities, HumanDescription, PauseDescriptor,
};
pub use mark_read::MarkReadNotifier;
pub use pending::{ItemFilter, PendingItem, PendingItemStore};
pub use read_marks::{ReadMark, ReadMarkStore, ReadMarkStoreError};
pub use report::{
    classify, report_completion, summary_report, ReportDescriptor, ReportIcon, ReportKind,
    ReportTone, ServerOutcome,
};
pub use runner::WorkflowRunner;
pub use workflow::{
    apply_command, apply_completion, Command, CompletionDisposition, Effect, Rejection,
    RemoteCompletion, RemoteOutcome, WorkflowError, WorkflowPhase, WorkflowState,
};
