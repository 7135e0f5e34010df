use agent_api_module::{DecisionKind, ResumeRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::interrupt::PauseDescriptor;

/// Arguments of a respond decision.
///
/// Question pauses are answered with bare text; everything else sends a
/// field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecisionArgs {
    Fields(Map<String, Value>),
    Text(String),
}

impl Default for DecisionArgs {
    fn default() -> Self {
        DecisionArgs::Fields(Map::new())
    }
}

impl DecisionArgs {
    fn to_value(&self) -> Value {
        match self {
            DecisionArgs::Fields(fields) => Value::Object(fields.clone()),
            DecisionArgs::Text(text) => Value::String(text.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Edit(Map<String, Value>),
    Ignore,
    Respond(DecisionArgs),
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::Accept => DecisionKind::Accept,
            Decision::Edit(_) => DecisionKind::Edit,
            Decision::Ignore => DecisionKind::Ignore,
            Decision::Respond(_) => DecisionKind::Respond,
        }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Decision::Respond(DecisionArgs::Text(text.into()))
    }
}

/// Build the resume envelope for `decision` against the pause it answers.
pub fn encode(decision: &Decision, pause: &PauseDescriptor) -> ResumeRequest {
    let arguments = match decision {
        Decision::Accept | Decision::Ignore => Value::Object(Map::new()),
        Decision::Edit(fields) => Value::Object(fields.clone()),
        Decision::Respond(args) => args.to_value(),
    };
    ResumeRequest {
        kind: decision.kind(),
        arguments,
        action_request_echo: pause.action_request_raw().clone(),
        capabilities_echo: pause.capabilities_raw().clone(),
        human_description_echo: pause.human_description_raw().clone(),
    }
}
