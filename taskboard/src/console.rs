//! Line-oriented console view over a [`TaskBoard`](crate::board::TaskBoard).
//!
//! Each input line is one command; commands map onto the grid events the
//! board understands:
//!
//! | Command         | Grid event                                  |
//! |-----------------|---------------------------------------------|
//! | `new <title>`   | create                                      |
//! | `edit <id>`     | cell edit started on row `id`               |
//! | `title <text>`  | cell value changed on the row being edited  |
//! | `done`          | cell edit stopped                           |
//! | `rm <id>`       | delete                                      |
//! | `list`          | redraw                                      |
//! | `help`, `quit`  |                                             |

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use taskboard_proto::task::{Task, TaskId};
use thiserror::Error;

/// Placeholder shown for a task whose owner is unknown.
pub const NO_USER: &str = "---";

/// Placeholder shown for a stamp the timestamp format cannot render.
pub const BAD_TIMESTAMP: &str = "??";

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Redraw the current rows.
    List,
    /// Create a task with this title.
    New(String),
    /// Start editing the row with this id.
    Edit(TaskId),
    /// Change the title of the row being edited.
    Title(String),
    /// Stop editing.
    Done,
    /// Delete the row with this id.
    Rm(TaskId),
    /// Print the command list.
    Help,
    /// Exit.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Blank input.
    #[error("empty command")]
    Empty,
    /// The first word is not a command.
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    /// The command needs an argument that was not given.
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    /// The argument is not a task id.
    #[error("not a task id: {0}")]
    BadId(String),
}

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  list           show tasks
  new <title>    create a task
  edit <id>      start editing a task
  title <text>   change the title of the task being edited
  done           stop editing
  rm <id>        delete a task
  help           show this help
  quit           exit";

/// Parses one input line.
///
/// # Errors
///
/// Returns [`ParseError`] when the line is blank, names no known command,
/// or is missing (or has a malformed) argument.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(Command::List),
        "new" => text_arg(rest, "new").map(Command::New),
        "edit" => id_arg(rest, "edit").map(Command::Edit),
        "title" => text_arg(rest, "title").map(Command::Title),
        "done" => Ok(Command::Done),
        "rm" | "delete" => id_arg(rest, "rm").map(Command::Rm),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ => Err(ParseError::Unknown(word.to_string())),
    }
}

fn text_arg(rest: &str, command: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument(command))
    } else {
        Ok(rest.to_string())
    }
}

fn id_arg(rest: &str, command: &'static str) -> Result<TaskId, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }
    rest.parse::<u64>()
        .map(TaskId::new)
        .map_err(|_| ParseError::BadId(rest.to_string()))
}

/// Renders rows as a fixed-width table.
///
/// `updateDate` is formatted with the chrono `timestamp_format`; a task with
/// no owner shows [`NO_USER`]. A stamp the format cannot render shows
/// [`BAD_TIMESTAMP`].
#[must_use]
pub fn render_rows(rows: &[Task], timestamp_format: &str) -> String {
    let mut out = format!("{:>5}  {:<32}  {:<10}  {}\n", "id", "title", "updated", "user");
    for task in rows {
        let id = task.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let updated = task.update_date.map_or_else(
            || NO_USER.to_string(),
            |d| format_stamp(d, timestamp_format),
        );
        let user = task
            .user
            .as_ref()
            .map_or_else(|| NO_USER.to_string(), taskboard_proto::user::User::display_name);
        let _ = writeln!(out, "{id:>5}  {:<32}  {updated:<10}  {user}", task.title);
    }
    if rows.is_empty() {
        out.push_str("  (no tasks)\n");
    }
    out
}

fn format_stamp(stamp: DateTime<Utc>, timestamp_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", stamp.format(timestamp_format)).is_err() {
        return BAD_TIMESTAMP.to_string();
    }
    out
}

/// Banner shown while the edited row has changed on the server.
#[must_use]
pub fn conflict_banner(conflict: Option<&Task>) -> Option<String> {
    let task = conflict?;
    let id = task.id.map_or_else(|| "?".to_string(), |id| id.to_string());
    Some(format!(
        "!! task {id} has changes on the server; `done` to reload"
    ))
}

/// Prompt prefix reflecting the board's state.
#[must_use]
pub fn prompt(editing: Option<TaskId>, saving: bool) -> String {
    let mut prompt = String::new();
    if let Some(id) = editing {
        let _ = write!(prompt, "[editing {id}] ");
    }
    if saving {
        prompt.push_str("[saving] ");
    }
    prompt.push_str("> ");
    prompt
}
