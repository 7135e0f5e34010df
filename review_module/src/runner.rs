use std::sync::Arc;
use std::thread;
use std::time::Duration;

use agent_api_module::{ListOrder, RemoteAgentClient};
use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::mark_read::MarkReadNotifier;
use crate::read_marks::ReadMarkStore;
use crate::workflow::{
    apply_command, apply_completion, Command, CompletionDisposition, Effect, RemoteCompletion,
    RemoteOutcome, WorkflowError, WorkflowState,
};

/// Drives a `WorkflowState` against a live `RemoteAgentClient`.
///
/// Each remote call runs on its own thread and reports back through a
/// channel; completions are applied only when pumped, so all state changes
/// happen on the caller's thread.
pub struct WorkflowRunner {
    state: WorkflowState,
    client: Arc<dyn RemoteAgentClient>,
    completions_tx: Sender<RemoteCompletion>,
    completions_rx: Receiver<RemoteCompletion>,
    read_marks: Option<ReadMarkStore>,
    notifier: MarkReadNotifier,
}

impl WorkflowRunner {
    pub fn new(
        user_id: impl Into<String>,
        order: ListOrder,
        client: Arc<dyn RemoteAgentClient>,
        read_marks: Option<ReadMarkStore>,
    ) -> Self {
        let mut state = WorkflowState::new(user_id, order);
        if let Some(store) = &read_marks {
            match store.item_ids_for_user(&state.user_id) {
                Ok(ids) => {
                    debug!("restored {} read marks", ids.len());
                    state.pending.restore_locally_read(ids);
                }
                Err(err) => warn!("failed to load read marks: {}", err),
            }
        }
        let (completions_tx, completions_rx) = unbounded();
        let notifier = MarkReadNotifier::spawn(client.clone());
        Self {
            state,
            client,
            completions_tx,
            completions_rx,
            read_marks,
            notifier,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn handle(&mut self, command: Command) -> Result<(), WorkflowError> {
        let effects = apply_command(&mut self.state, command, Local::now())?;
        for effect in effects {
            self.execute(effect);
        }
        Ok(())
    }

    /// Apply every completion that has already arrived.
    pub fn try_pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply(completion) == CompletionDisposition::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every outstanding request has been applied.
    ///
    /// There is no deadline: a hung remote call blocks here.
    pub fn settle(&mut self) {
        while self.state.has_outstanding_requests() {
            match self.completions_rx.recv() {
                Ok(completion) => {
                    self.apply(completion);
                }
                Err(_) => return,
            }
        }
    }

    /// Like `settle`, but gives up after `timeout`. Returns true when settled.
    pub fn settle_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.state.has_outstanding_requests() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.completions_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    self.apply(completion);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }
        true
    }

    fn apply(&mut self, completion: RemoteCompletion) -> CompletionDisposition {
        apply_completion(&mut self.state, completion, Local::now())
    }

    fn execute(&self, effect: Effect) {
        let user_id = self.state.user_id.clone();
        let order = self.state.order;
        match effect {
            Effect::ListPending { ticket } => self.spawn_request(ticket, move |client| {
                RemoteOutcome::Listed(client.list_pending(&user_id, order))
            }),
            Effect::Process { ticket, item_id } => self.spawn_request(ticket, move |client| {
                RemoteOutcome::Processed(client.process(&user_id, &item_id, order))
            }),
            Effect::Resume {
                ticket,
                session_id,
                request,
            } => self.spawn_request(ticket, move |client| {
                RemoteOutcome::Resumed(client.resume(&session_id, &request))
            }),
            Effect::Summarize { ticket } => self.spawn_request(ticket, move |client| {
                RemoteOutcome::Summarized(client.summarize(&user_id))
            }),
            Effect::MarkRead { item_id } => {
                if let Some(store) = &self.read_marks {
                    if let Err(err) = store.mark(&user_id, &item_id) {
                        warn!("failed to persist read mark for {}: {}", item_id, err);
                    }
                }
                self.notifier.notify(&user_id, &item_id);
            }
            Effect::ClearReadMarks => {
                if let Some(store) = &self.read_marks {
                    match store.clear_user(&user_id) {
                        Ok(removed) => info!("cleared {} read marks for {}", removed, user_id),
                        Err(err) => warn!("failed to clear read marks: {}", err),
                    }
                }
            }
        }
    }

    fn spawn_request<F>(&self, ticket: Uuid, call: F)
    where
        F: FnOnce(&dyn RemoteAgentClient) -> RemoteOutcome + Send + 'static,
    {
        let client = self.client.clone();
        let completions = self.completions_tx.clone();
        thread::spawn(move || {
            let outcome = call(client.as_ref());
            if completions
                .send(RemoteCompletion { ticket, outcome })
                .is_err()
            {
                debug!("runner gone; dropping response for ticket {}", ticket);
            }
        });
    }
}
