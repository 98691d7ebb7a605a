//! Taskboard console client.
//!
//! Polls the task and user endpoints, shows the denormalized task list, and
//! lets you create, edit and delete tasks. While a task is being edited the
//! list is frozen and a banner appears if the task changes on the server.
//!
//! ```bash
//! # Against a local mock backend
//! cargo run --bin taskboard-mock &
//! cargo run --bin taskboard
//!
//! # Against another backend, polling faster
//! TASKBOARD_URL=http://10.0.0.5:4200 cargo run --bin taskboard -- --task-poll-ms 1000
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::api::TaskApi;
use taskboard::api::http::HttpApi;
use taskboard::board::TaskBoard;
use taskboard::config::{CliArgs, ClientConfig};
use taskboard::console::{self, Command, HELP};
use taskboard::tasks::TaskService;
use taskboard::users::UserService;
use taskboard_proto::task::Task;
use taskboard_proto::user::UserId;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; stdout belongs to the console view.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(base_url = %config.base_url, "taskboard starting");

    let api = match HttpApi::new(&config.base_url, config.request_timeout) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("Invalid base URL {}: {e}", config.base_url);
            std::process::exit(1);
        }
    };

    let users = Arc::new(UserService::new(Arc::clone(&api), config.user_poll_interval));
    let tasks = Arc::new(TaskService::new(api, users, config.task_poll_interval));
    let board = Arc::new(TaskBoard::new(tasks));

    let result = run_console(&board, &config).await;

    board.shutdown();
    board.service().stop();
    board.service().user_service().stop();

    tracing::info!("taskboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Reads commands from stdin and redraws on every board update.
async fn run_console<A: TaskApi>(board: &Arc<TaskBoard<A>>, config: &ClientConfig) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rows = board.rows();
    let mut conflicts = board.conflicts();
    let mut current: Vec<Task> = Vec::new();

    println!("taskboard: connected to {} (type `help`)", config.base_url);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match console::parse_command(&line) {
                    Ok(Command::Quit) => return Ok(()),
                    Ok(Command::List) => print!("{}", console::render_rows(&current, &config.timestamp_format)),
                    Ok(command) => dispatch(board, command, config),
                    Err(console::ParseError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
                print_prompt(board);
            }
            Some(update) = rows.recv() => {
                current = update;
                print!("\n{}", console::render_rows(&current, &config.timestamp_format));
                print_prompt(board);
            }
            Some(conflict) = conflicts.recv() => {
                if let Some(banner) = console::conflict_banner(conflict.as_ref()) {
                    println!("\n{banner}");
                    print_prompt(board);
                }
            }
        }
    }
}

fn print_prompt<A: TaskApi>(board: &TaskBoard<A>) {
    let editing = board.editor().editing().and_then(|t| t.id);
    print!("{}", console::prompt(editing, board.saving()));
    let _ = io::Write::flush(&mut io::stdout());
}

/// Maps a command onto a board event. Requests run in the background so
/// the console keeps redrawing while they are in flight.
fn dispatch<A: TaskApi>(board: &Arc<TaskBoard<A>>, command: Command, config: &ClientConfig) {
    match command {
        Command::New(title) => {
            let task = Task::new(title, Utc::now(), UserId::new(config.default_user_id));
            let board = Arc::clone(board);
            tokio::spawn(async move {
                match board.create(&task).await {
                    Ok(created) => println!("\ncreated task {}", display_id(&created)),
                    Err(e) => println!("\ncreate failed: {e}"),
                }
            });
        }
        Command::Edit(id) => match board.service().find(id) {
            Some(task) => {
                board.begin_edit(task);
                println!("editing task {id}; `title <text>` to change, `done` to finish");
            }
            None => println!("no task {id}"),
        },
        Command::Title(title) => {
            let Some(mut task) = board.editor().editing() else {
                println!("not editing; use `edit <id>` first");
                return;
            };
            task.title = title;
            let board = Arc::clone(board);
            tokio::spawn(async move {
                if let Err(e) = board.cell_value_changed(&task).await {
                    println!("\nsave failed: {e}");
                }
            });
        }
        Command::Done => board.end_edit(),
        Command::Rm(id) => match board.service().find(id) {
            Some(task) => {
                let board = Arc::clone(board);
                tokio::spawn(async move {
                    if let Err(e) = board.delete(&task).await {
                        println!("\ndelete failed: {e}");
                    }
                });
            }
            None => println!("no task {id}"),
        },
        Command::Help => println!("{HELP}"),
        Command::List | Command::Quit => {}
    }
}

fn display_id(task: &Task) -> String {
    task.id.map_or_else(|| "?".to_string(), |id| id.to_string())
}
