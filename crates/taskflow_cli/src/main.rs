use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use taskflow_cli::cli::{
    CONFIG_OVERRIDE_FLAG, Cli, Command, ViewArgs, collect_config_overrides, split_command_line,
};
use taskflow_cli::render;
use taskflow_core::TaskStore;
use taskflow_core::config::{self, Config, ConfigOverrides};
use taskflow_core::error::AppError;
use taskflow_core::model::{Task, TaskDraft, parse_due_date};
use taskflow_core::notify::{Notice, Notifier};
use taskflow_core::query::now_local;
use taskflow_core::storage::{JsonFileStore, KeyValueStore, store_path};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKFLOW_LOG";

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: &Notice) {
        eprintln!("{notice}");
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn resolve_config(overrides: &ConfigOverrides) -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: ignoring configuration: {err}");
    }
    config::merge_overrides(&loaded.config, overrides)
}

fn open_store(config: &Config) -> Result<TaskStore<JsonFileStore>, AppError> {
    let storage = JsonFileStore::new(store_path()?);
    debug!(path = %storage.path().display(), "using task store");
    Ok(TaskStore::open(storage, config.features)
        .with_default_sort(config.default_sort)
        .with_notifier(StderrNotifier))
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

/// `--help` and `--version` come back from clap as errors but are not failures.
fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
    )
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_task(task: &Task, json: bool, verb: &str) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(task)?);
    } else {
        println!("{verb} task: {} ({})", task.text, task.id);
    }
    Ok(())
}

fn print_count(count: usize, json: bool, message: String) {
    if json {
        println!("{}", serde_json::json!({ "affected": count }));
    } else {
        println!("{message}");
    }
}

fn apply_view<S: KeyValueStore>(store: &mut TaskStore<S>, view: ViewArgs) {
    if let Some(search) = view.search {
        store.set_search(&search);
    }
    if let Some(status) = view.filter {
        store.set_status_filter(status);
    }
    if let Some(category) = view.category {
        store.set_category_filter(category);
    }
    if let Some(sort) = view.sort {
        store.set_sort(sort);
    }
}

fn run_command<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    command: Command,
    json: bool,
) -> Result<(), AppError> {
    let now = now_local();

    match command {
        Command::Add {
            text,
            due,
            category,
        } => {
            let due_date = due.as_deref().map(parse_due_date).transpose()?;
            let draft = TaskDraft {
                due_date,
                category,
            };
            let task = store.create(text.as_deref().unwrap_or_default(), draft)?;
            print_task(&task, json, "Added")?;
        }
        Command::Delete { id } => {
            let task = store.delete(id)?;
            print_task(&task, json, "Deleted")?;
        }
        Command::Toggle { id } => {
            let task = store.toggle(id)?;
            let verb = if task.completed {
                "Completed"
            } else {
                "Reopened"
            };
            print_task(&task, json, verb)?;
        }
        Command::Edit { id, new_text } => {
            let task = store.edit(id, &new_text)?;
            print_task(&task, json, "Updated")?;
        }
        Command::Clear { force } => {
            if !force {
                return Err(AppError::invalid_input(
                    "refusing to delete all tasks without --force",
                ));
            }
            let removed = store.clear();
            print_count(
                removed,
                json,
                format!("Cleared {}", render::count_label(removed, "task")),
            );
        }
        Command::DeleteCompleted => {
            let removed = store.delete_completed();
            let message = if removed == 0 {
                "No completed tasks to delete".to_string()
            } else {
                format!("Deleted {}", render::count_label(removed, "completed task"))
            };
            print_count(removed, json, message);
        }
        Command::CompleteAll { view } => {
            apply_view(store, view);
            let affected = store.mark_all_visible_completed(now);
            let message = if affected == 0 {
                "No pending tasks to complete".to_string()
            } else {
                format!("Marked {} as completed", render::count_label(affected, "task"))
            };
            print_count(affected, json, message);
        }
        Command::List { view } => {
            apply_view(store, view);
            let visible = store.visible_tasks(now);
            if json {
                println!("{}", serde_json::to_string(&visible)?);
                return Ok(());
            }

            if visible.is_empty() {
                println!("No tasks found");
            } else {
                println!(
                    "{}",
                    render::task_table(&visible, store.features(), now)?
                );
            }
            let narrowed = !store.query().is_unfiltered();
            if let Some(summary) = render::view_summary(visible.len(), store.tasks().len(), narrowed)
            {
                println!("{summary}");
            }
        }
        Command::Stats { view } => {
            apply_view(store, view);
            let stats = store.statistics(now);
            if json {
                println!("{}", serde_json::to_string(&stats)?);
            } else {
                println!("{}", render::statistics_text(&stats));
            }
        }
        Command::Export { output } => {
            let document = store.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{document}\n"))?;
                    println!(
                        "Exported {} to {}",
                        render::count_label(store.tasks().len(), "task"),
                        path.display()
                    );
                }
                None => println!("{document}"),
            }
        }
        Command::Reset => {
            store.clear_filters();
            if !json {
                println!("Filters cleared");
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let config = resolve_config(&ConfigOverrides::default());
    let mut store = open_store(&config)?;
    debug!("starting interactive session");

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

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
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskflow".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if is_informational(&err) => {
                let _ = err.print();
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input(format!(
                    "{CONFIG_OVERRIDE_FLAG} is only accepted when starting taskflow"
                ))
            );
            continue;
        }

        if let Err(err) = run_command(&mut store, cli.command, cli.json) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let overrides = collect_config_overrides(&cli.config_override)?;
    let config = resolve_config(&overrides);
    let mut store = open_store(&config)?;
    run_command(&mut store, cli.command, cli.json)
}

fn main() {
    install_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
