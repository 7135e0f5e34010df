//! Client boundary for the remote inbox agent.
//!
//! Four workflow operations (list, process, resume, summarize) plus the
//! best-effort mark-read notification. No workflow logic lives here.

mod client;
mod config;
mod errors;
mod types;

pub use client::{HttpAgentClient, RemoteAgentClient};
pub use config::{AgentApiConfig, DEFAULT_AGENT_API_BASE_URL};
pub use errors::ClientError;
pub use types::{
    DecisionKind, ListOrder, PendingItemRecord, ResumeRequest, StepResponse, STATUS_COMPLETED,
    STATUS_INTERRUPTED, STATUS_SUCCESS,
};
