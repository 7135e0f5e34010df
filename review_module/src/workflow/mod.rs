//! The review workflow controller.
//!
//! A pure transition function over an owned `WorkflowState`: commands and
//! remote completions go in, effects come out. Nothing here performs I/O.

mod transition;
mod types;

pub use transition::{apply_command, apply_completion};
pub use types::{
    Command, CompletionDisposition, EditDraft, Effect, InFlight, InFlightAction, Rejection,
    RemoteCompletion, RemoteOutcome, Session, WorkflowError, WorkflowPhase, WorkflowState,
};
