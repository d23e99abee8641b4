//! Interactive and piped input loops
//!
//! ## Input Handling
//!
//! Both loops trim each line and treat a few words specially before handing
//! the rest to the [`Dispatcher`]:
//!
//! - `exit` leaves the loop
//! - `help` / `commands` print the help text
//! - blank lines are ignored
//!
//! The interactive loop reads through rustyline and keeps its history in
//! `~/.influx_history`.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{Dispatcher, HELP};

pub const PROMPT: &str = "influx> ";

/// What to do with one input line
#[derive(Debug, PartialEq, Eq)]
pub enum LineAction<'a> {
    Exit,
    Help,
    Skip,
    Run(&'a str),
}

/// Classify a raw input line
pub fn classify(line: &str) -> LineAction<'_> {
    match line.trim() {
        "" => LineAction::Skip,
        "exit" => LineAction::Exit,
        "help" | "commands" => LineAction::Help,
        command => LineAction::Run(command),
    }
}

/// Read commands from a terminal until `exit` or Ctrl-D
pub async fn run_interactive(
    dispatcher: &mut Dispatcher,
    history: Option<&Path>,
) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;

    if let Some(path) = history {
        if let Err(e) = editor.load_history(path) {
            tracing::debug!(path = %path.display(), error = %e, "No history loaded");
        }
    }

    loop {
        // rustyline blocks, keep the committer's worker threads free
        let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => return Err(e),
        };

        let action = classify(&line);
        if action != LineAction::Skip {
            editor.add_history_entry(line.trim())?;
        }

        match action {
            LineAction::Exit => break,
            LineAction::Help => println!("{HELP}"),
            LineAction::Skip => {}
            LineAction::Run(command) => dispatcher.handle_line(command).await,
        }
    }

    if let Some(path) = history {
        if let Err(e) = editor.save_history(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not save history");
        }
    }
    Ok(())
}

/// Read one command per line from stdin until EOF or `exit`
pub async fn run_stdin(dispatcher: &mut Dispatcher) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match classify(&line) {
            LineAction::Exit => break,
            LineAction::Help => println!("{HELP}"),
            LineAction::Skip => {}
            LineAction::Run(command) => dispatcher.handle_line(command).await,
        }
    }
    Ok(())
}
