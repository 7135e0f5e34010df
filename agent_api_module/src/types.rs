use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_INTERRUPTED: &str = "interrupted";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    #[default]
    Newest,
    Oldest,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Newest => "newest",
            ListOrder::Oldest => "oldest",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Some(ListOrder::Newest),
            "oldest" => Some(ListOrder::Oldest),
            _ => None,
        }
    }
}

/// One unread email as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItemRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub from: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub body: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListPendingResponse {
    #[serde(default)]
    pub(crate) emails: Vec<PendingItemRecord>,
}

/// Response of both "process" and "resume".
///
/// `interrupt_payload` is kept as raw JSON; its shape differs between the
/// first pause and later ones and is normalized by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub status: String,
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub interrupt_payload: Value,
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub classification_decision: Option<String>,
}

impl StepResponse {
    pub fn is_interrupted(&self) -> bool {
        self.status == STATUS_INTERRUPTED
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(default, deserialize_with = "deserialize_lenient_opt_string")]
    pub(crate) summary: Option<String>,
}

/// Decision kinds understood by the resume endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Accept,
    Edit,
    Ignore,
    #[serde(rename = "response")]
    Respond,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Accept => "accept",
            DecisionKind::Edit => "edit",
            DecisionKind::Ignore => "ignore",
            DecisionKind::Respond => "response",
        }
    }
}

/// The `user_response` envelope sent on resume.
///
/// The three echo fields must be returned exactly as the pause delivered
/// them; the agent matches them against the suspended execution point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRequest {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    #[serde(rename = "args")]
    pub arguments: Value,
    #[serde(rename = "action_request")]
    pub action_request_echo: Value,
    #[serde(rename = "config")]
    pub capabilities_echo: Value,
    #[serde(rename = "description")]
    pub human_description_echo: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProcessBody<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) email_id: &'a str,
    pub(crate) order: ListOrder,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResumeBody<'a> {
    pub(crate) thread_id: &'a str,
    pub(crate) user_response: &'a ResumeRequest,
}

#[derive(Debug, Serialize)]
pub(crate) struct SummarizeBody<'a> {
    pub(crate) user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct MarkReadBody<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) email_id: &'a str,
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

// Ids show up as strings from Gmail and as integers from the local fixtures.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| serde::de::Error::custom("item id must be a non-empty string or number"))
}

fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn deserialize_lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(value).filter(|text| !text.is_empty()))
}
