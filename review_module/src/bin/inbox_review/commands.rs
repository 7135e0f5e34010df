use review_module::{Command, Decision, DecisionArgs, ItemFilter};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Input {
    Command(Command),
    Help,
    Quit,
    Empty,
}

pub(crate) fn print_usage() {
    println!(
        r##"Commands:
  list                      Refresh the unread list
  filter <all|today|week>   Filter the list
  open <id>                 Start the agent on an email
  summarize                 Summarize the inbox
  accept                    Accept the proposed action
  edit                      Edit the proposed action's fields
  set <field> <value>       Change a field while editing
  save                      Submit the edited fields
  cancel-edit               Leave edit mode without submitting
  ignore                    Ignore the proposed action
  respond [text]            Respond (the answer text for questions)
  back                      Close the current workflow
  dismiss                   Dismiss the result and return to the list
  logout                    Forget local read marks and close
  quit                      Exit"##
    );
}

pub(crate) fn parse_line(line: &str) -> Result<Input, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Empty);
    }
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => return Ok(Input::Quit),
        "list" | "refresh" => Command::Refresh,
        "filter" => {
            let filter = ItemFilter::parse(rest)
                .ok_or_else(|| format!("unknown filter '{}' (all, today, week)", rest))?;
            Command::SelectFilter(filter)
        }
        "open" => {
            if rest.is_empty() {
                return Err("open needs an email id".to_string());
            }
            Command::StartSession {
                item_id: rest.to_string(),
            }
        }
        "summarize" => Command::Summarize,
        "accept" => Command::SubmitDecision(Decision::Accept),
        "edit" => Command::EnterEditMode,
        "set" => {
            let (key, value) = rest
                .split_once(char::is_whitespace)
                .map(|(key, value)| (key, value.trim()))
                .unwrap_or((rest, ""));
            if key.is_empty() {
                return Err("set needs a field name".to_string());
            }
            Command::EditField {
                key: key.to_string(),
                value: Value::String(value.to_string()),
            }
        }
        "save" => Command::SubmitEdits,
        "cancel-edit" => Command::ExitEditMode,
        "ignore" => Command::SubmitDecision(Decision::Ignore),
        "respond" => {
            if rest.is_empty() {
                Command::SubmitDecision(Decision::Respond(DecisionArgs::default()))
            } else {
                Command::SubmitDecision(Decision::answer(rest))
            }
        }
        "back" | "close" => Command::Cancel,
        "dismiss" => Command::Dismiss,
        "logout" => Command::Logout,
        other => return Err(format!("unknown command '{}'; try help", other)),
    };
    Ok(Input::Command(command))
}
