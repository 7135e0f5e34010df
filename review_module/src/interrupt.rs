//! Interrupt payload normalization.
//!
//! The agent wraps a pause differently depending on whether it is the first
//! pause of a run or a later one:
//! - `[{"value": [{...pause...}]}]` (one-element list around a list)
//! - `[{"value": {...pause...}}]` (one-element list around an object)
//! - `{...pause...}` (bare object, seen on some resumes)
//!
//! Everything downstream works on `PauseDescriptor` only.

use agent_api_module::{DecisionKind, StepResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const QUESTION_ACTION: &str = "Question";
pub const TRIAGE_ACTION_PREFIX: &str = "Email Assistant:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFamily {
    /// Triage prompt, e.g. `Email Assistant: notify`.
    Triage,
    /// Free-text question to the human.
    Question,
    /// A proposed tool call (`send_email`, `schedule_meeting`, ...).
    Tool,
}

/// Allowed-response flags from the pause `config`.
///
/// `None` means the agent did not say; see `PauseDescriptor::allows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub allow_respond: Option<bool>,
    pub allow_ignore: Option<bool>,
    pub allow_edit: Option<bool>,
    pub allow_accept: Option<bool>,
}

impl Capabilities {
    fn from_raw(raw: &Value) -> Self {
        let flag = |key: &str| raw.get(key).and_then(Value::as_bool);
        Self {
            allow_respond: flag("allow_respond"),
            allow_ignore: flag("allow_ignore"),
            allow_edit: flag("allow_edit"),
            allow_accept: flag("allow_accept"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanDescription {
    pub author: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub question: Option<String>,
}

impl HumanDescription {
    fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::String(text) => Self {
                body: Some(text.clone()),
                ..Self::default()
            },
            Value::Object(map) => {
                let text = |key: &str| {
                    map.get(key)
                        .and_then(Value::as_str)
                        .map(|value| value.to_string())
                };
                Self {
                    author: text("author"),
                    subject: text("subject"),
                    body: text("body"),
                    question: text("question"),
                }
            }
            _ => Self::default(),
        }
    }
}

/// Canonical form of one pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseDescriptor {
    pub action_kind: String,
    pub arguments: Map<String, Value>,
    pub human_description: HumanDescription,
    pub capabilities: Capabilities,
    action_request_raw: Value,
    capabilities_raw: Value,
    human_description_raw: Value,
}

impl PauseDescriptor {
    pub fn family(&self) -> ActionFamily {
        if self.action_kind.starts_with(TRIAGE_ACTION_PREFIX) {
            ActionFamily::Triage
        } else if self.action_kind == QUESTION_ACTION {
            ActionFamily::Question
        } else {
            ActionFamily::Tool
        }
    }

    /// The agent's suggested classification for triage pauses.
    pub fn triage_suggestion(&self) -> Option<&str> {
        self.action_kind
            .strip_prefix(TRIAGE_ACTION_PREFIX)
            .map(str::trim)
    }

    /// The question text for `Question` pauses.
    pub fn question_text(&self) -> Option<&str> {
        match self.family() {
            ActionFamily::Question => self.arguments.get("content").and_then(Value::as_str),
            ActionFamily::Triage => self.human_description.question.as_deref(),
            ActionFamily::Tool => None,
        }
    }

    pub fn allows(&self, kind: DecisionKind) -> bool {
        let caps = &self.capabilities;
        match (self.family(), kind) {
            (ActionFamily::Question, DecisionKind::Respond) => caps.allow_respond != Some(false),
            (_, DecisionKind::Respond) => caps.allow_respond == Some(true),
            (ActionFamily::Triage, DecisionKind::Ignore) => caps.allow_ignore == Some(true),
            (ActionFamily::Triage, _) => false,
            (ActionFamily::Question, DecisionKind::Ignore) => caps.allow_ignore != Some(false),
            (ActionFamily::Question, _) => false,
            (ActionFamily::Tool, DecisionKind::Accept) => caps.allow_accept != Some(false),
            (ActionFamily::Tool, DecisionKind::Edit) => caps.allow_edit != Some(false),
            (ActionFamily::Tool, DecisionKind::Ignore) => caps.allow_ignore != Some(false),
        }
    }

    pub fn allowed_decisions(&self) -> Vec<DecisionKind> {
        [
            DecisionKind::Accept,
            DecisionKind::Edit,
            DecisionKind::Respond,
            DecisionKind::Ignore,
        ]
        .into_iter()
        .filter(|kind| self.allows(*kind))
        .collect()
    }

    pub fn action_request_raw(&self) -> &Value {
        &self.action_request_raw
    }

    pub fn capabilities_raw(&self) -> &Value {
        &self.capabilities_raw
    }

    pub fn human_description_raw(&self) -> &Value {
        &self.human_description_raw
    }
}

/// Returns `None` when the response says the run has completed.
pub fn normalize(response: &StepResponse) -> Option<PauseDescriptor> {
    if response.is_completed() {
        return None;
    }
    Some(normalize_payload(&response.interrupt_payload))
}

/// Never fails: every missing piece defaults to an empty object. Present
/// pieces are kept as received, whatever their shape.
pub fn normalize_payload(raw: &Value) -> PauseDescriptor {
    let container = match raw {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(raw),
        _ => None,
    };
    let pause = container.and_then(|container| match container.get("value") {
        Some(Value::Array(values)) if !values.is_empty() => values.first(),
        Some(value @ Value::Object(_)) => Some(value),
        _ => Some(container),
    });

    let field = |key: &str| pause.and_then(|pause| pause.get(key));

    let action_request_raw = field("action_request").cloned().unwrap_or_else(empty_object);
    let action_kind = action_request_raw
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let arguments = action_request_raw
        .get("args")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let capabilities_raw = field("config").cloned().unwrap_or_else(empty_object);
    let human_description_raw = field("description").cloned().unwrap_or_else(empty_object);

    PauseDescriptor {
        action_kind,
        arguments,
        human_description: HumanDescription::from_raw(&human_description_raw),
        capabilities: Capabilities::from_raw(&capabilities_raw),
        action_request_raw,
        capabilities_raw,
        human_description_raw,
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
