#[path = "inbox_review/commands.rs"]
mod commands;
#[path = "inbox_review/render.rs"]
mod render;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use agent_api_module::HttpAgentClient;
use review_module::{BoxError, Command, ReadMarkStore, ReviewConfig, WorkflowRunner};
use tracing::{info, warn};

use commands::{parse_line, print_usage, Input};
use render::render;

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = ReviewConfig::from_env()?;
    info!(
        "agent api {} (user {}, order {})",
        config.api.base_url,
        config.user_id,
        config.list_order.as_str()
    );

    let client = Arc::new(HttpAgentClient::new(config.api.clone())?);
    let read_marks = match ReadMarkStore::new(&config.read_marks_db_path) {
        Ok(store) => Some(store),
        Err(err) => {
            warn!(
                "read marks disabled ({}): {}",
                config.read_marks_db_path.display(),
                err
            );
            None
        }
    };
    let mut runner = WorkflowRunner::new(
        config.user_id.clone(),
        config.list_order,
        client,
        read_marks,
    );

    runner.handle(Command::Refresh)?;
    runner.settle();
    print!("{}", render(runner.state()));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        runner.try_pump();
        match parse_line(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Help) => print_usage(),
            Ok(Input::Empty) => {}
            Ok(Input::Command(command)) => match runner.handle(command) {
                Ok(()) => runner.settle(),
                Err(err) => println!("{}", err),
            },
            Err(message) => println!("{}", message),
        }
        print!("{}", render(runner.state()));
    }
    Ok(())
}
