use clap::{CommandFactory, Parser};
use std::io::{self, BufRead, IsTerminal};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;
use weekly_cli::cli::{
    Cli, Command, collect_overrides, expand_alias, parse_link_data, scan_config_overrides,
    split_command_line,
};
use weekly_core::board::Board;
use weekly_core::config::{Config, load_config_with_fallback, merge_overrides};
use weekly_core::error::AppError;
use weekly_core::links::{Dispatcher, LinkRegistry, SystemDispatcher};
use weekly_core::model::{LinkData, SettingsPatch, Task, TaskPatch};
use weekly_core::notify::{Feedback, Notifier, notifier_from_env};
use weekly_core::storage::JsonFileBackend;
use weekly_core::store::Store;

const LOG_ENV_VAR: &str = "WEEKLY_LOG";
const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

struct Session {
    store: Store<JsonFileBackend>,
    registry: LinkRegistry,
    notifier: Box<dyn Notifier>,
    config: Config,
}

impl Session {
    fn open(config: Config) -> Result<Self, AppError> {
        Ok(Self {
            store: Store::open_default()?,
            registry: LinkRegistry::builtin(),
            notifier: notifier_from_env()?,
            config,
        })
    }

    /// Runs the once-per-session week check before anything is shown.
    /// With `document_on_stdout` the reset message goes to stderr.
    fn start(&self, json: bool, document_on_stdout: bool) -> Result<(), AppError> {
        if self.store.check_weekly_reset()? {
            let feedback = Feedback::WeekReset {
                week: self.store.current_week(),
            };
            if document_on_stdout {
                eprintln!("{}", feedback.message());
            } else if !json {
                println!("{}", feedback.message());
            }
            self.announce(&feedback);
        }
        Ok(())
    }

    fn announce(&self, feedback: &Feedback) {
        if let Err(err) = self.notifier.notify(feedback) {
            tracing::warn!(error = %err, "notification failed");
        }
    }

    /// Accepts a task id or a 1-based list position.
    fn resolve_task(&self, reference: &str) -> Result<Task, AppError> {
        let reference = reference.trim();
        let tasks = self.store.get_tasks()?;
        if let Some(task) = tasks.iter().find(|task| task.id == reference) {
            return Ok(task.clone());
        }

        reference
            .parse::<usize>()
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| tasks.get(index).cloned())
            .ok_or_else(|| AppError::not_found(format!("task {reference} not found")))
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Link")]
    link: String,
    #[tabled(rename = "Id")]
    id: String,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Type")]
    tag: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Label")]
    label: String,
}

fn progress_line(board: &Board) -> String {
    format!("{} of {} done", board.completed(), board.total())
}

fn print_board_plain(board: &Board, config: &Config) {
    let palette = config.palette();
    println!(
        "{}  {}",
        palette.muted(&format!("Week {}", board.week.week())),
        palette.done(&progress_line(board))
    );

    if board.rows.is_empty() {
        println!("No tasks yet. Add one with: weekly add \"Go for a walk\"");
        return;
    }

    let rows = board.rows.iter().enumerate().map(|(index, row)| TaskRow {
        position: index + 1,
        done: if row.checked { "[x]" } else { "[ ]" },
        text: row.task.text.clone(),
        link: if row.task.has_link() {
            format!("{} {}", row.icon, row.label)
        } else {
            String::new()
        },
        id: row.task.id.clone(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_board_json(board: &Board) {
    let tasks: Vec<serde_json::Value> = board
        .rows
        .iter()
        .map(|row| {
            serde_json::json!({
                "id": row.task.id,
                "text": row.task.text,
                "linkType": row.task.link_type,
                "linkData": row.task.link_data,
                "order": row.task.order,
                "checked": row.checked,
                "icon": row.icon,
                "label": row.label,
                "url": row.url,
            })
        })
        .collect();

    let json = serde_json::json!({
        "week": board.week.to_string(),
        "weekNumber": board.week.week(),
        "completed": board.completed(),
        "total": board.total(),
        "ratio": board.ratio(),
        "allComplete": board.all_complete(),
        "tasks": tasks,
    });
    println!("{json}");
}

fn print_task_json(task: &Task) {
    println!("{}", serde_json::json!(task));
}

fn print_tasks_json(tasks: &[Task]) {
    println!("{}", serde_json::json!(tasks));
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

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn link_data_arg(entries: &[String]) -> Result<LinkData, AppError> {
    parse_link_data(entries).map_err(AppError::invalid_input)
}

fn run_command(session: &Session, cli: Cli) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let config = merge_overrides(&session.config, &overrides);
    let store = &session.store;

    match cli.command {
        Command::List => {
            let board = store.board(&session.registry)?;
            if cli.json {
                print_board_json(&board);
            } else {
                print_board_plain(&board, &config);
            }
        }
        Command::Add { text, link, data } => {
            let text = match text {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("text is required")),
            };
            if !session.registry.is_known(link.trim()) {
                tracing::warn!(link = %link, "unknown link type, it will not open anything");
            }

            let task = store.add_task(&text, &link, link_data_arg(&data)?)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        Command::Edit {
            task,
            text,
            link,
            data,
            clear_data,
        } => {
            let target = session.resolve_task(&task)?;
            let link_data = if clear_data {
                Some(LinkData::new())
            } else if data.is_empty() {
                None
            } else {
                Some(link_data_arg(&data)?)
            };
            let patch = TaskPatch {
                text,
                link_type: link,
                link_data,
            };
            if patch.is_empty() {
                return Err(AppError::invalid_input("nothing to change"));
            }

            let task = store.update_task(&target.id, patch)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Updated task: {} ({})", task.text, task.id);
            }
        }
        Command::Delete { task } => {
            let target = session.resolve_task(&task)?;
            let task = store.delete_task(&target.id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.text, task.id);
            }
        }
        Command::Check { task } => {
            let target = session.resolve_task(&task)?;
            let checked = store.toggle_checked(&target.id)?;
            let board = store.board(&session.registry)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "id": target.id,
                        "checked": checked,
                        "completed": board.completed(),
                        "total": board.total(),
                        "allComplete": board.all_complete(),
                    })
                );
            } else {
                let verb = if checked { "Checked" } else { "Unchecked" };
                println!("{verb} task: {} ({})", target.text, target.id);
                println!("{}", config.palette().done(&progress_line(&board)));
            }

            if checked && board.all_complete() {
                let feedback = Feedback::AllComplete {
                    total: board.total(),
                };
                if !cli.json {
                    println!("{}", feedback.message());
                }
                session.announce(&feedback);
            }
        }
        Command::Move { task, position } => {
            let index = position
                .checked_sub(1)
                .ok_or_else(|| AppError::invalid_input("position starts at 1"))?;
            let target = session.resolve_task(&task)?;
            let tasks = store.move_task(&target.id, index)?;
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                let placed = tasks
                    .iter()
                    .position(|task| task.id == target.id)
                    .unwrap_or(index);
                println!("Moved task: {} to position {}", target.text, placed + 1);
            }
        }
        Command::Reorder { tasks } => {
            let ids = tasks
                .iter()
                .map(|reference| session.resolve_task(reference).map(|task| task.id))
                .collect::<Result<Vec<_>, _>>()?;
            let tasks = store.reorder_tasks(&ids)?;
            if cli.json {
                print_tasks_json(&tasks);
            } else {
                println!("Reordered {} tasks", tasks.len());
            }
        }
        Command::Open { task, print } => {
            let target = session.resolve_task(&task)?;
            let url = session.registry.resolve_task(&target).ok_or_else(|| {
                AppError::invalid_input(format!("task {} has no link to open", target.id))
            })?;

            if !print {
                SystemDispatcher.dispatch(Some(&url))?;
            }
            if cli.json {
                println!("{}", serde_json::json!({ "id": target.id, "url": url }));
            } else if print {
                println!("{url}");
            } else {
                println!("Opened: {url}");
            }
        }
        Command::Reset => {
            let week = store.manual_reset()?;
            let feedback = Feedback::ManualReset { week };
            if cli.json {
                println!("{}", serde_json::json!({ "week": week.to_string() }));
            } else {
                println!("{}", feedback.message());
            }
            session.announce(&feedback);
        }
        Command::Settings { reset_day } => {
            let settings = match reset_day {
                Some(day) => store.update_settings(SettingsPatch {
                    reset_day: Some(day),
                })?,
                None => store.get_settings()?,
            };
            if cli.json {
                println!("{}", serde_json::json!(settings));
            } else {
                let name = DAY_NAMES
                    .get(usize::from(settings.reset_day))
                    .copied()
                    .unwrap_or("?");
                println!("Reset day: {name} ({})", settings.reset_day);
            }
        }
        Command::Export { output } => {
            let snapshot = store.export_snapshot()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &snapshot)
                        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
                    if cli.json {
                        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
                    } else {
                        println!("Exported to {}", path.display());
                    }
                }
                None => println!("{snapshot}"),
            }
        }
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|err| AppError::io(format!("{}: {}", file.display(), err)))?;
            let count = store.import_snapshot(&content)?;
            if cli.json {
                println!("{}", serde_json::json!({ "imported": count }));
            } else {
                println!("Imported {count} tasks from {}", file.display());
            }
            session.start(cli.json, false)?;
        }
        Command::Links => {
            if cli.json {
                let kinds: Vec<serde_json::Value> = session
                    .registry
                    .kinds()
                    .map(|kind| {
                        serde_json::json!({
                            "type": kind.tag,
                            "icon": kind.icon,
                            "label": kind.label,
                        })
                    })
                    .collect();
                println!("{}", serde_json::Value::Array(kinds));
            } else {
                let rows = session.registry.kinds().map(|kind| LinkRow {
                    tag: kind.tag.clone(),
                    icon: kind.icon.clone(),
                    label: kind.label.clone(),
                });
                let mut table = Table::new(rows);
                table.with(Style::rounded());
                println!("{table}");
            }
        }
        Command::Week => {
            let week = store.current_week();
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "week": week.to_string(), "weekNumber": week.week() })
                );
            } else {
                println!("Week {} ({week})", week.week());
            }
        }
    }

    Ok(())
}

fn parse_line(line: &str, config: &Config) -> Result<Cli, AppError> {
    let args = split_command_line(line).map_err(AppError::invalid_input)?;
    let args = expand_alias(args, &config.aliases).map_err(AppError::invalid_input)?;

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("weekly".to_string());
    argv.extend(args);
    Cli::try_parse_from(argv).map_err(normalize_parse_error)
}

fn run_interactive(config: Config) -> Result<(), AppError> {
    let session = Session::open(config)?;
    if let Err(err) = session.start(false, false) {
        eprintln!("ERROR: {}", err);
    }

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

        let cli = match parse_line(line, &session.config) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if let Err(err) = run_command(&session, cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run_once(args: Vec<String>, config: Config) -> Result<(), AppError> {
    let overrides = collect_overrides(&scan_config_overrides(&args)).map_err(AppError::invalid_input)?;
    let aliases = merge_overrides(&config, &overrides).aliases;
    let args = expand_alias(args, &aliases).map_err(AppError::invalid_input)?;

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("weekly".to_string());
    argv.extend(args);
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help / --version
            return err.print().map_err(|err| AppError::io(err.to_string()));
        }
        Err(err) => return Err(normalize_parse_error(err)),
    };

    let session = Session::open(config)?;
    // import replaces the stored document without reading it and runs the
    // week check itself afterwards
    if !matches!(cli.command, Command::Import { .. }) {
        session.start(cli.json, prints_document(&cli.command))?;
    }
    run_command(&session, cli)
}

fn prints_document(command: &Command) -> bool {
    matches!(command, Command::Export { output: None })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "config ignored");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = if args.is_empty() {
        run_interactive(loaded.config)
    } else {
        run_once(args, loaded.config)
    };

    if let Err(err) = outcome {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
