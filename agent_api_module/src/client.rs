use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AgentApiConfig;
use crate::errors::ClientError;
use crate::types::{
    ListOrder, ListPendingResponse, MarkReadBody, PendingItemRecord, ProcessBody, ResumeBody,
    ResumeRequest, StepResponse, SummarizeBody, SummaryResponse, STATUS_COMPLETED,
    STATUS_INTERRUPTED, STATUS_SUCCESS,
};

const LIST_PENDING_PATH: &str = "/api/agent/get-unread-emails";
const PROCESS_PATH: &str = "/api/agent/process-email";
const RESUME_PATH: &str = "/api/agent/resume";
const SUMMARIZE_PATH: &str = "/api/agent/summarize";
const MARK_READ_PATH: &str = "/api/agent/mark-read";

const ERROR_BODY_EXCERPT_CHARS: usize = 300;

/// The remote inbox agent.
///
/// Pure I/O: implementations must not retry, and must not interpret the
/// interrupt payload beyond checking the top-level `status`.
pub trait RemoteAgentClient: Send + Sync {
    fn list_pending(
        &self,
        user_id: &str,
        order: ListOrder,
    ) -> Result<Vec<PendingItemRecord>, ClientError>;

    fn process(
        &self,
        user_id: &str,
        item_id: &str,
        order: ListOrder,
    ) -> Result<StepResponse, ClientError>;

    fn resume(&self, session_id: &str, request: &ResumeRequest)
        -> Result<StepResponse, ClientError>;

    fn summarize(&self, user_id: &str) -> Result<String, ClientError>;

    fn mark_read(&self, user_id: &str, item_id: &str) -> Result<(), ClientError>;
}

/// Blocking HTTP client for the agent backend.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    config: AgentApiConfig,
    http: Client,
}

impl HttpAgentClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, ClientError> {
        // Agent runs can take minutes; the caller decides when to give up.
        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(AgentApiConfig::from_env()?)
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }
}

impl RemoteAgentClient for HttpAgentClient {
    fn list_pending(
        &self,
        user_id: &str,
        order: ListOrder,
    ) -> Result<Vec<PendingItemRecord>, ClientError> {
        debug!("listing pending emails for user {}", user_id);
        let response = self
            .http
            .get(self.config.url(LIST_PENDING_PATH))
            .query(&[("user_id", user_id), ("order", order.as_str())])
            .send()?;
        let value = read_json(response)?;
        require_status(&value, &[STATUS_SUCCESS])?;
        let parsed: ListPendingResponse = serde_json::from_value(value)?;
        info!(
            "fetched {} pending emails for user {}",
            parsed.emails.len(),
            user_id
        );
        Ok(parsed.emails)
    }

    fn process(
        &self,
        user_id: &str,
        item_id: &str,
        order: ListOrder,
    ) -> Result<StepResponse, ClientError> {
        debug!("starting agent run for email {} (user {})", item_id, user_id);
        let body = ProcessBody {
            user_id,
            email_id: item_id,
            order,
        };
        let response = self
            .http
            .post(self.config.url(PROCESS_PATH))
            .json(&body)
            .send()?;
        let step = parse_step_response(read_json(response)?)?;
        info!("agent run for email {} returned {}", item_id, step.status);
        Ok(step)
    }

    fn resume(
        &self,
        session_id: &str,
        request: &ResumeRequest,
    ) -> Result<StepResponse, ClientError> {
        debug!(
            "resuming thread {} with decision {}",
            session_id,
            request.kind.as_str()
        );
        let body = ResumeBody {
            thread_id: session_id,
            user_response: request,
        };
        let response = self
            .http
            .post(self.config.url(RESUME_PATH))
            .json(&body)
            .send()?;
        let step = parse_step_response(read_json(response)?)?;
        info!("resume of thread {} returned {}", session_id, step.status);
        Ok(step)
    }

    fn summarize(&self, user_id: &str) -> Result<String, ClientError> {
        debug!("requesting inbox summary for user {}", user_id);
        let response = self
            .http
            .post(self.config.url(SUMMARIZE_PATH))
            .json(&SummarizeBody { user_id })
            .send()?;
        let value = read_json(response)?;
        require_status(&value, &[STATUS_SUCCESS])?;
        let parsed: SummaryResponse = serde_json::from_value(value)?;
        parsed.summary.ok_or(ClientError::MissingField("summary"))
    }

    fn mark_read(&self, user_id: &str, item_id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.config.url(MARK_READ_PATH))
            .json(&MarkReadBody {
                user_id,
                email_id: item_id,
            })
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: excerpt(&response.text().unwrap_or_default()),
            });
        }
        Ok(())
    }
}

fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

fn require_status(value: &Value, expected: &[&str]) -> Result<(), ClientError> {
    match value.get("status").and_then(Value::as_str) {
        None => Err(ClientError::MissingStatus),
        Some(status) if expected.contains(&status) => Ok(()),
        Some(status) => Err(ClientError::ServerStatus(status.to_string())),
    }
}

pub(crate) fn parse_step_response(value: Value) -> Result<StepResponse, ClientError> {
    require_status(&value, &[STATUS_INTERRUPTED, STATUS_COMPLETED])?;
    let step: StepResponse = serde_json::from_value(value)?;
    if step.is_interrupted() && step.thread_id.is_none() {
        return Err(ClientError::MissingField("thread_id"));
    }
    Ok(step)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_step_response_requires_status() {
        let result = parse_step_response(json!({"thread_id": "t1"}));
        assert!(matches!(result, Err(ClientError::MissingStatus)));
    }

    #[test]
    fn parse_step_response_rejects_unknown_status() {
        let result = parse_step_response(json!({"status": "error", "detail": "boom"}));
        match result {
            Err(ClientError::ServerStatus(status)) => assert_eq!(status, "error"),
            other => panic!("expected server status error, got {:?}", other),
        }
    }

    #[test]
    fn parse_step_response_requires_thread_id_when_interrupted() {
        let result = parse_step_response(json!({"status": "interrupted", "interrupt_payload": []}));
        assert!(matches!(result, Err(ClientError::MissingField("thread_id"))));
    }

    #[test]
    fn parse_step_response_accepts_completed_without_thread() {
        let step = parse_step_response(json!({
            "status": "completed",
            "classification_decision": "notify"
        }))
        .expect("step");
        assert!(step.is_completed());
        assert_eq!(step.classification_decision.as_deref(), Some("notify"));
        assert!(step.interrupt_payload.is_null());
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(ERROR_BODY_EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), ERROR_BODY_EXCERPT_CHARS + 3);
    }
}
