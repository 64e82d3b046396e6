use clap::{CommandFactory, Parser};
use planner_cli::cli::{Cli, Command, build_overrides};
use planner_core::clock;
use planner_core::config::{self, Config};
use planner_core::error::AppError;
use planner_core::model::{Task, TaskInput};
use planner_core::stats::Stats;
use planner_core::task_api::{TaskFilter, TaskStore};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::Date;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Due")]
    due_date: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Note")]
    note: String,
}

fn status_label(task: &Task, today: Date) -> String {
    if task.is_overdue(today) {
        format!("{} (overdue)", task.status)
    } else {
        task.status.to_string()
    }
}

fn print_tasks_plain(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found. Add your first task with `planner add`.");
        return;
    }

    let today = clock::today();
    let rows = tasks.iter().enumerate().map(|(index, task)| TaskRow {
        position: index + 1,
        id: task.id.clone(),
        title: task.title.clone(),
        priority: task.priority.to_string(),
        due_date: task.due_date.clone(),
        status: status_label(task, today),
        note: task.note.clone(),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(task).map_err(|err| AppError::invalid_data(err.to_string()))
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    println!("{}", task_json(task)?);
    Ok(())
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let payload = tasks.iter().map(task_json).collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::Value::Array(payload));
    Ok(())
}

fn print_task_details(task: &Task) {
    let today = clock::today();
    println!("{} ({})", task.title, task.id);
    println!("  Priority:  {}", task.priority);
    println!("  Due:       {}", task.due_date);
    println!("  Status:    {}", status_label(task, today));
    println!("  Created:   {}", task.created);
    println!(
        "  Completed: {}",
        task.completed_at.as_deref().unwrap_or("-")
    );
    if !task.note.is_empty() {
        println!("  Note:      {}", task.note);
    }
}

fn print_stats_plain(stats: &Stats) {
    let unit = if stats.streak == 1 { "day" } else { "days" };
    println!("Streak: {} {}", stats.streak, unit);
    println!(
        "Last 30 days: {} done, {} missed",
        stats.summary.done, stats.summary.missed
    );
    println!(
        "Tasks: {} total, {} pending, {} completed, {} overdue",
        stats.total, stats.pending, stats.completed, stats.overdue
    );
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let load = config::load_config_with_fallback();
    if let Some(err) = load.error {
        tracing::warn!(error = %err, "using default configuration");
        eprintln!("WARNING: config ignored: {}", err);
    }

    let overrides = build_overrides(&cli.config_override)?;
    Ok(config::merge_overrides(&load.config, &overrides))
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let store = TaskStore::from_config(&config)?;
    tracing::debug!(store = %store.path().display(), "opened task store");

    match cli.command {
        Command::Add {
            title,
            priority,
            due,
            note,
        } => {
            let input = TaskInput {
                title: title.unwrap_or_default(),
                priority,
                due_date: due.unwrap_or_else(clock::today),
                note,
            };
            let task = store.add(&input)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::List {
            status,
            priority,
            search,
            overdue,
        } => {
            let filter = TaskFilter {
                status,
                priority,
                search,
                overdue_only: overdue,
            };
            let tasks = store.list(&filter)?;
            if cli.json {
                print_tasks_json(&tasks)?;
            } else {
                print_tasks_plain(&tasks);
            }
        }
        Command::Show { id } => {
            let task = store.get(&id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                print_task_details(&task);
            }
        }
        Command::Done { id } => {
            let task = store.complete(&id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Completed task: {} ({})", task.title, task.id);
            }
        }
        Command::DoneAll => {
            let tasks = store.complete_all_pending()?;
            if cli.json {
                print_tasks_json(&tasks)?;
            } else {
                println!("Completed {} task(s)", tasks.len());
            }
        }
        Command::Edit {
            id,
            title,
            priority,
            due,
            note,
        } => {
            let current = store.get(&id)?;
            let due_date = match due {
                Some(date) => date,
                None => current.due_on().ok_or_else(|| {
                    AppError::invalid_input("stored due date is invalid; pass --due")
                })?,
            };
            let input = TaskInput {
                title: title.unwrap_or(current.title),
                priority: priority.unwrap_or(current.priority),
                due_date,
                note: note.unwrap_or(current.note),
            };
            let task = store.edit(&id, &input)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = store.delete(&id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::ClearCompleted => {
            let removed = store.delete_all_completed()?;
            if cli.json {
                println!("{}", serde_json::json!({ "deleted": removed }));
            } else {
                println!("Deleted {} completed task(s)", removed);
            }
        }
        Command::Stats => {
            let stats = store.stats()?;
            if cli.json {
                let value = serde_json::to_value(stats)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                println!("{value}");
            } else {
                print_stats_plain(&stats);
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("planner".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing() {
    // Opt-in via RUST_LOG; invalid filters fall back to silence.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
