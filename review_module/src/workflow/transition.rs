use agent_api_module::{ClientError, DecisionKind, StepResponse};
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decision::{encode, Decision};
use crate::interrupt::normalize_payload;
use crate::pending::PendingItem;
use crate::report::{report_completion, summary_report, ServerOutcome};

use super::types::{
    Command, CompletionDisposition, EditDraft, Effect, InFlight, InFlightAction, Rejection,
    RemoteCompletion, RemoteOutcome, Session, WorkflowError, WorkflowPhase, WorkflowState,
    FETCH_FAILED, PROCESS_FAILED, RESUME_FAILED, SUMMARY_FAILED, SUMMARY_NETWORK_FAILED,
};

/// Apply a user command. Rejected commands leave `state` untouched.
pub fn apply_command(
    state: &mut WorkflowState,
    command: Command,
    now: DateTime<Local>,
) -> Result<Vec<Effect>, WorkflowError> {
    dispatch(state, command, now).map_err(|rejection| {
        warn!("command rejected: {}", rejection);
        WorkflowError::from(rejection)
    })
}

fn dispatch(
    state: &mut WorkflowState,
    command: Command,
    now: DateTime<Local>,
) -> Result<Vec<Effect>, Rejection> {
    match command {
        Command::Refresh => Ok(refresh(state)),
        Command::SelectFilter(filter) => {
            state.pending.apply_filter(filter, now);
            Ok(Vec::new())
        }
        Command::StartSession { item_id } => start_session(state, item_id),
        Command::Summarize => summarize(state),
        Command::EnterEditMode => enter_edit_mode(state),
        Command::EditField { key, value } => {
            require_awaiting_decision(state)?;
            let draft = state.edit.as_mut().ok_or(Rejection::NotEditing)?;
            draft.fields.insert(key, value);
            Ok(Vec::new())
        }
        Command::ExitEditMode => {
            require_awaiting_decision(state)?;
            state.edit.take().ok_or(Rejection::NotEditing)?;
            Ok(Vec::new())
        }
        Command::SubmitEdits => {
            let fields = state
                .edit
                .as_ref()
                .map(|draft| draft.fields.clone())
                .ok_or(Rejection::NotEditing)?;
            submit_decision(state, Decision::Edit(fields))
        }
        Command::SubmitDecision(decision) => submit_decision(state, decision),
        Command::Dismiss => dismiss(state, now),
        Command::Cancel => {
            close_workflow(state);
            Ok(Vec::new())
        }
        Command::Logout => {
            close_workflow(state);
            state.list_ticket = None;
            state.pending.clear_locally_read();
            Ok(vec![Effect::ClearReadMarks])
        }
    }
}

/// Apply the result of a remote call. Responses whose ticket is no longer
/// current are dropped without touching `state`.
pub fn apply_completion(
    state: &mut WorkflowState,
    completion: RemoteCompletion,
    now: DateTime<Local>,
) -> CompletionDisposition {
    let RemoteCompletion { ticket, outcome } = completion;
    match outcome {
        RemoteOutcome::Listed(result) => {
            if state.list_ticket != Some(ticket) {
                return stale(ticket, "list");
            }
            state.list_ticket = None;
            match result {
                Ok(records) => {
                    let items = records.into_iter().map(PendingItem::from_record).collect();
                    state.pending.replace_items(items, now);
                    info!("loaded {} pending emails", state.pending.len());
                }
                Err(err) => {
                    warn!("list pending failed: {}", err);
                    state.error = Some(FETCH_FAILED.to_string());
                }
            }
        }
        RemoteOutcome::Processed(result) => {
            if !take_in_flight(state, ticket, |action| action == InFlightAction::Starting) {
                return stale(ticket, "process");
            }
            on_processed(state, result);
        }
        RemoteOutcome::Resumed(result) => {
            let kind = match state.in_flight {
                Some(InFlight {
                    ticket: current,
                    action: InFlightAction::Resuming(kind),
                }) if current == ticket => kind,
                _ => return stale(ticket, "resume"),
            };
            state.in_flight = None;
            on_resumed(state, result, kind);
        }
        RemoteOutcome::Summarized(result) => {
            if !take_in_flight(state, ticket, |action| action == InFlightAction::Summarizing) {
                return stale(ticket, "summarize");
            }
            match result {
                Ok(summary) => {
                    state.report = Some(summary_report(summary));
                    state.phase = WorkflowPhase::Reporting;
                }
                Err(err) => {
                    warn!("summarize failed: {}", err);
                    let message = if err.is_transport() {
                        SUMMARY_NETWORK_FAILED
                    } else {
                        SUMMARY_FAILED
                    };
                    state.error = Some(message.to_string());
                    state.phase = WorkflowPhase::Listing;
                }
            }
        }
    }
    CompletionDisposition::Applied
}

fn refresh(state: &mut WorkflowState) -> Vec<Effect> {
    // A newer refresh supersedes an outstanding one.
    let ticket = Uuid::new_v4();
    state.list_ticket = Some(ticket);
    state.error = None;
    vec![Effect::ListPending { ticket }]
}

fn start_session(state: &mut WorkflowState, item_id: String) -> Result<Vec<Effect>, Rejection> {
    if state.session.is_some() {
        return Err(Rejection::SessionAlreadyOpen);
    }
    if state.in_flight.is_some() {
        return Err(Rejection::RequestInFlight);
    }
    if state.phase != WorkflowPhase::Listing {
        return Err(Rejection::WrongPhase(state.phase));
    }
    if !state.pending.contains(&item_id) {
        return Err(Rejection::UnknownItem(item_id));
    }

    let mut effects = Vec::new();
    if state.pending.mark_locally_read(&item_id) {
        effects.push(Effect::MarkRead {
            item_id: item_id.clone(),
        });
    }

    let ticket = Uuid::new_v4();
    state.selected_item = Some(item_id.clone());
    state.session = None;
    state.pause = None;
    state.edit = None;
    state.error = None;
    state.report = None;
    state.phase = WorkflowPhase::Processing;
    state.in_flight = Some(InFlight {
        ticket,
        action: InFlightAction::Starting,
    });
    info!("starting agent run for email {}", item_id);
    effects.push(Effect::Process { ticket, item_id });
    Ok(effects)
}

fn summarize(state: &mut WorkflowState) -> Result<Vec<Effect>, Rejection> {
    if state.session.is_some() {
        return Err(Rejection::SummarizeWhileSessionOpen);
    }
    if state.in_flight.is_some() {
        return Err(Rejection::RequestInFlight);
    }
    if state.phase != WorkflowPhase::Listing {
        return Err(Rejection::WrongPhase(state.phase));
    }
    let ticket = Uuid::new_v4();
    state.selected_item = None;
    state.error = None;
    state.report = None;
    state.phase = WorkflowPhase::Processing;
    state.in_flight = Some(InFlight {
        ticket,
        action: InFlightAction::Summarizing,
    });
    Ok(vec![Effect::Summarize { ticket }])
}

/// The edit draft is only touched while a pause is waiting on the reviewer.
fn require_awaiting_decision(state: &WorkflowState) -> Result<(), Rejection> {
    if state.phase != WorkflowPhase::AwaitingDecision {
        return Err(Rejection::WrongPhase(state.phase));
    }
    Ok(())
}

fn enter_edit_mode(state: &mut WorkflowState) -> Result<Vec<Effect>, Rejection> {
    require_awaiting_decision(state)?;
    let pause = state.pause.as_ref().ok_or(Rejection::EditNotAvailable)?;
    if !pause.allows(DecisionKind::Edit) {
        return Err(Rejection::EditNotAvailable);
    }
    if state.edit.is_none() {
        state.edit = Some(EditDraft {
            fields: pause.arguments.clone(),
        });
    }
    Ok(Vec::new())
}

fn submit_decision(state: &mut WorkflowState, decision: Decision) -> Result<Vec<Effect>, Rejection> {
    if state.in_flight.is_some() {
        return Err(Rejection::RequestInFlight);
    }
    if state.phase != WorkflowPhase::AwaitingDecision {
        return Err(Rejection::WrongPhase(state.phase));
    }
    let (Some(pause), Some(session)) = (state.pause.as_ref(), state.session.as_ref()) else {
        return Err(Rejection::WrongPhase(state.phase));
    };
    let kind = decision.kind();
    if !pause.allows(kind) {
        return Err(Rejection::DecisionNotPermitted(kind));
    }

    let request = encode(&decision, pause);
    let session_id = session.session_id.clone();
    let ticket = Uuid::new_v4();
    state.error = None;
    state.phase = WorkflowPhase::Processing;
    state.in_flight = Some(InFlight {
        ticket,
        action: InFlightAction::Resuming(kind),
    });
    info!("resuming session {} with {}", session_id, kind.as_str());
    Ok(vec![Effect::Resume {
        ticket,
        session_id,
        request,
    }])
}

fn dismiss(state: &mut WorkflowState, now: DateTime<Local>) -> Result<Vec<Effect>, Rejection> {
    if state.phase != WorkflowPhase::Reporting {
        return Err(Rejection::WrongPhase(state.phase));
    }
    state.report = None;
    state.selected_item = None;
    state.phase = WorkflowPhase::Listing;
    state.pending.refresh_view(now);
    Ok(Vec::new())
}

fn close_workflow(state: &mut WorkflowState) {
    if let Some(session) = &state.session {
        info!(
            "closing workflow; session {} for email {} left paused on the server",
            session.session_id, session.item_id
        );
    }
    if let Some(in_flight) = state.in_flight.take() {
        info!(
            "closing workflow with {:?} in flight; its response will be discarded",
            in_flight.action
        );
    }
    state.phase = WorkflowPhase::Listing;
    state.selected_item = None;
    state.session = None;
    state.pause = None;
    state.edit = None;
    state.report = None;
    state.error = None;
}

fn on_processed(state: &mut WorkflowState, result: Result<StepResponse, ClientError>) {
    let item_id = state.selected_item.clone();
    match result {
        Ok(response) if response.is_interrupted() => {
            let (Some(session_id), Some(item_id)) = (response.thread_id.clone(), item_id) else {
                fail_start(state, "interrupted response without a session id");
                return;
            };
            let pause = normalize_payload(&response.interrupt_payload);
            debug!(
                "email {} paused at {} (session {})",
                item_id, pause.action_kind, session_id
            );
            state.session = Some(Session {
                session_id,
                item_id,
            });
            state.pause = Some(pause);
            state.edit = None;
            state.phase = WorkflowPhase::AwaitingDecision;
        }
        Ok(response) if response.is_completed() => {
            finish(state, &response, None);
        }
        Ok(response) => {
            fail_start(state, &format!("unexpected status {}", response.status));
        }
        Err(err) => fail_start(state, &err.to_string()),
    }
}

fn on_resumed(
    state: &mut WorkflowState,
    result: Result<StepResponse, ClientError>,
    kind: DecisionKind,
) {
    match result {
        Ok(response) if response.is_interrupted() => {
            let pause = normalize_payload(&response.interrupt_payload);
            debug!("session paused again at {}", pause.action_kind);
            if let (Some(session), Some(thread_id)) = (state.session.as_mut(), response.thread_id) {
                session.session_id = thread_id;
            }
            state.pause = Some(pause);
            state.edit = None;
            state.phase = WorkflowPhase::AwaitingDecision;
        }
        Ok(response) if response.is_completed() => {
            finish(state, &response, Some(kind));
        }
        Ok(response) => fail_resume(state, &format!("unexpected status {}", response.status)),
        Err(err) => fail_resume(state, &err.to_string()),
    }
}

fn finish(
    state: &mut WorkflowState,
    response: &StepResponse,
    decision: Option<DecisionKind>,
) {
    let outcome = ServerOutcome::from_classification(response.classification_decision.as_deref());
    let item_id = state.selected_item.take();
    let report = report_completion(&mut state.pending, item_id.as_deref(), &outcome, decision);
    state.report = Some(report);
    state.session = None;
    state.pause = None;
    state.edit = None;
    state.phase = WorkflowPhase::Reporting;
}

fn fail_start(state: &mut WorkflowState, reason: &str) {
    warn!(
        "process failed for email {}: {}",
        state.selected_item.as_deref().unwrap_or("?"),
        reason
    );
    state.error = Some(PROCESS_FAILED.to_string());
    state.phase = WorkflowPhase::Listing;
    state.selected_item = None;
    state.session = None;
    state.pause = None;
    state.edit = None;
}

fn fail_resume(state: &mut WorkflowState, reason: &str) {
    warn!("resume failed: {}", reason);
    state.error = Some(RESUME_FAILED.to_string());
    state.phase = WorkflowPhase::AwaitingDecision;
}

/// Clears the marker when `ticket` is current and `accepts` its action.
fn take_in_flight(
    state: &mut WorkflowState,
    ticket: Uuid,
    accepts: impl FnOnce(InFlightAction) -> bool,
) -> bool {
    match state.in_flight {
        Some(in_flight) if in_flight.ticket == ticket && accepts(in_flight.action) => {
            state.in_flight = None;
            true
        }
        _ => false,
    }
}

fn stale(ticket: Uuid, operation: &str) -> CompletionDisposition {
    info!("discarding stale {} response (ticket {})", operation, ticket);
    CompletionDisposition::Stale
}
