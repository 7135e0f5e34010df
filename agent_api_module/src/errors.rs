#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no status field")]
    MissingStatus,
    #[error("server reported status: {0}")]
    ServerStatus(String),
    #[error("response is missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid client config: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// True when the request never produced a usable HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_))
    }
}
