mod test_support;

use std::sync::Arc;
use std::time::Duration;

use agent_api_module::{AgentApiConfig, HttpAgentClient, ListOrder};
use mockito::{Matcher, Mock, ServerGuard};
use review_module::{
    Command, Decision, ReadMarkStore, ReportKind, WorkflowPhase, WorkflowRunner,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use test_support::start_mockito_server;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn pause_object() -> Value {
    json!({
        "action_request": {
            "action": "send_email",
            "args": {"to_email": "ana@example.com", "subject": "Re: Lunch", "body_text": "Sure"}
        },
        "config": {"allow_respond": true, "allow_edit": true, "allow_ignore": true, "allow_accept": true},
        "description": {"author": "Ana", "subject": "Lunch", "body": "Lunch on Friday?"}
    })
}

fn mock_list(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/api/agent/get-unread-emails")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "user-1".into()),
            Matcher::UrlEncoded("order".into(), "newest".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "emails": [
                    {"id": 42, "from": "Ana <ana@example.com>", "subject": "Lunch", "body": "Lunch on Friday?", "time": "2024-10-02T10:00:00Z"},
                    {"id": "43", "from": "news@example.com", "subject": "Deals", "body": "", "time": "not a date"}
                ]
            })
            .to_string(),
        )
        .create()
}

fn mock_process_pause(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/api/agent/process-email")
        .match_body(Matcher::Json(
            json!({"user_id": "user-1", "email_id": "42", "order": "newest"}),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "interrupted",
                "thread_id": "s1",
                "interrupt_payload": [{"value": [pause_object()]}]
            })
            .to_string(),
        )
        .expect(1)
        .create()
}

fn mock_mark_read(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/api/agent/mark-read")
        .with_status(200)
        .with_body("{}")
        .create()
}

fn runner_for(server: &ServerGuard, read_marks: Option<ReadMarkStore>) -> Result<WorkflowRunner, Box<dyn std::error::Error>> {
    let client = HttpAgentClient::new(AgentApiConfig::new(server.url())?)?;
    Ok(WorkflowRunner::new(
        "user-1",
        ListOrder::Newest,
        Arc::new(client),
        read_marks,
    ))
}

fn settle(runner: &mut WorkflowRunner) {
    assert!(
        runner.settle_timeout(Duration::from_secs(10)),
        "requests did not finish"
    );
}

fn open_42(runner: &mut WorkflowRunner) -> TestResult {
    runner.handle(Command::Refresh)?;
    settle(runner);
    runner.handle(Command::StartSession {
        item_id: "42".to_string(),
    })?;
    settle(runner);
    Ok(())
}

#[test]
fn edit_decision_round_trip_reports_sent() -> TestResult {
    let Some(mut server) = start_mockito_server("edit_decision_round_trip_reports_sent") else {
        return Ok(());
    };
    let list = mock_list(&mut server);
    let process = mock_process_pause(&mut server);
    let _mark_read = mock_mark_read(&mut server);
    let pause = pause_object();
    let resume = server
        .mock("POST", "/api/agent/resume")
        .match_body(Matcher::Json(json!({
            "thread_id": "s1",
            "user_response": {
                "type": "edit",
                "args": {"to_email": "a@b.com"},
                "action_request": pause["action_request"],
                "config": pause["config"],
                "description": pause["description"]
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"completed","classification_decision":"respond"}"#)
        .expect(1)
        .create();

    let temp = TempDir::new()?;
    let store = ReadMarkStore::new(temp.path().join("read_marks.db"))?;
    let mut runner = runner_for(&server, Some(store.clone()))?;
    open_42(&mut runner)?;

    let state = runner.state();
    assert_eq!(state.phase, WorkflowPhase::AwaitingDecision);
    assert_eq!(
        state.pause.as_ref().map(|pause| pause.action_kind.as_str()),
        Some("send_email")
    );
    assert_eq!(store.item_ids_for_user("user-1")?, vec!["42".to_string()]);

    let mut fields = Map::new();
    fields.insert("to_email".to_string(), json!("a@b.com"));
    runner.handle(Command::SubmitDecision(Decision::Edit(fields)))?;
    settle(&mut runner);

    list.assert();
    process.assert();
    resume.assert();
    let state = runner.state();
    assert_eq!(state.phase, WorkflowPhase::Reporting);
    assert_eq!(
        state.report.as_ref().map(|report| report.kind),
        Some(ReportKind::Sent)
    );
    assert!(!state.pending.contains("42"));
    assert!(state.pending.contains("43"));
    Ok(())
}

#[test]
fn failed_resume_keeps_the_pause() -> TestResult {
    let Some(mut server) = start_mockito_server("failed_resume_keeps_the_pause") else {
        return Ok(());
    };
    let _list = mock_list(&mut server);
    let _process = mock_process_pause(&mut server);
    let _mark_read = mock_mark_read(&mut server);
    let resume = server
        .mock("POST", "/api/agent/resume")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create();

    let mut runner = runner_for(&server, None)?;
    open_42(&mut runner)?;
    let pause_before = runner.state().pause.clone();

    runner.handle(Command::SubmitDecision(Decision::Accept))?;
    settle(&mut runner);

    resume.assert();
    let state = runner.state();
    assert_eq!(state.phase, WorkflowPhase::AwaitingDecision);
    assert_eq!(state.pause, pause_before);
    assert_eq!(
        state.session.as_ref().map(|session| session.session_id.as_str()),
        Some("s1")
    );
    assert_eq!(state.error.as_deref(), Some("Failed to process response"));
    Ok(())
}

#[test]
fn completed_process_removes_item() -> TestResult {
    let Some(mut server) = start_mockito_server("completed_process_removes_item") else {
        return Ok(());
    };
    let _list = mock_list(&mut server);
    let _mark_read = mock_mark_read(&mut server);
    let _process = server
        .mock("POST", "/api/agent/process-email")
        .with_status(200)
        .with_body(r#"{"status":"completed","classification_decision":"ignore"}"#)
        .create();

    let mut runner = runner_for(&server, None)?;
    open_42(&mut runner)?;

    let state = runner.state();
    assert_eq!(state.phase, WorkflowPhase::Reporting);
    assert_eq!(
        state.report.as_ref().map(|report| report.kind),
        Some(ReportKind::AutoSkipped)
    );
    assert_eq!(state.pending.len(), 1);

    runner.handle(Command::Dismiss)?;
    assert_eq!(runner.state().phase, WorkflowPhase::Listing);
    Ok(())
}

#[test]
fn summarize_reports_server_text() -> TestResult {
    let Some(mut server) = start_mockito_server("summarize_reports_server_text") else {
        return Ok(());
    };
    let summarize = server
        .mock("POST", "/api/agent/summarize")
        .match_body(Matcher::Json(json!({"user_id": "user-1"})))
        .with_status(200)
        .with_body(r#"{"status":"success","summary":"Two invoices and an invite."}"#)
        .expect(1)
        .create();

    let mut runner = runner_for(&server, None)?;
    runner.handle(Command::Summarize)?;
    settle(&mut runner);

    summarize.assert();
    let report = runner.state().report.clone().ok_or("missing report")?;
    assert_eq!(report.kind, ReportKind::Summary);
    assert_eq!(report.message, "Two invoices and an invite.");
    Ok(())
}

#[test]
fn unreachable_agent_surfaces_network_error() -> TestResult {
    let client = HttpAgentClient::new(AgentApiConfig::new("http://127.0.0.1:9")?)?;
    let mut runner = WorkflowRunner::new("user-1", ListOrder::Newest, Arc::new(client), None);

    runner.handle(Command::Summarize)?;
    settle(&mut runner);

    let state = runner.state();
    assert_eq!(state.phase, WorkflowPhase::Listing);
    assert_eq!(
        state.error.as_deref(),
        Some("Network error during summarization")
    );
    Ok(())
}
