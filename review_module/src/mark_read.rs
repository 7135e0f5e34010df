use std::sync::Arc;
use std::thread;

use agent_api_module::RemoteAgentClient;
use crossbeam_channel::{bounded, Sender, TrySendError};
use tracing::{info, warn};

const MARK_READ_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MarkReadRequest {
    user_id: String,
    item_id: String,
}

/// Background sender for the best-effort "mark as read" notification.
///
/// At most one attempt per request. Failures are logged and dropped.
pub struct MarkReadNotifier {
    sender: Sender<MarkReadRequest>,
}

impl MarkReadNotifier {
    pub fn spawn(client: Arc<dyn RemoteAgentClient>) -> Self {
        let (sender, receiver) = bounded::<MarkReadRequest>(MARK_READ_QUEUE_CAPACITY);
        thread::spawn(move || {
            info!("mark-read worker started");
            for request in receiver {
                match client.mark_read(&request.user_id, &request.item_id) {
                    Ok(()) => info!("marked email {} as read", request.item_id),
                    Err(err) => warn!(
                        "failed to mark email {} as read: {}",
                        request.item_id, err
                    ),
                }
            }
            info!("mark-read worker stopped");
        });
        Self { sender }
    }

    /// Never blocks. Returns false when the request was dropped.
    pub fn notify(&self, user_id: &str, item_id: &str) -> bool {
        let request = MarkReadRequest {
            user_id: user_id.to_string(),
            item_id: item_id.to_string(),
        };
        match self.sender.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                warn!("mark-read queue full; dropping email {}", request.item_id);
                false
            }
            Err(TrySendError::Disconnected(request)) => {
                warn!("mark-read worker gone; dropping email {}", request.item_id);
                false
            }
        }
    }
}
