pub mod render;
pub mod watch;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use render::{paint_balance, render_projects, render_status, render_summary};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use watch::{detect_shutdown, WatchModule, DEFAULT_REFRESH_INTERVAL};

use crate::{
    tracking::{
        storage::{
            entities::ActivityKind,
            state_storage::{StateFileStorage, StateStorage},
        },
        BalanceUpdate, Tracker, DEFAULT_BREAK_LABEL,
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Timeio", version, long_about = None)]
#[command(about = "Tracks worked time against a daily target", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Start working on a project. Uses the selected project if none is given")]
    Start { project: Option<String> },
    #[command(about = "Start a break")]
    Break { label: Option<String> },
    #[command(about = "Stop the current activity")]
    Stop {},
    #[command(about = "Close the day and add the difference to the target to the balance")]
    Close {},
    #[command(about = "Select the current project. Running work continues on it")]
    Select { name: String },
    #[command(about = "Manage projects")]
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    #[command(about = "Show or override the balance")]
    Balance {
        #[command(subcommand)]
        command: Option<BalanceCommand>,
    },
    #[command(about = "Show today's activities and the balance")]
    Status {},
    #[command(about = "Show closed days")]
    History {
        #[arg(short = 'n', long, default_value_t = 7, help = "Number of days to show")]
        days: usize,
    },
    #[command(about = "Keep printing the status until interrupted")]
    Watch {
        #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs(), help = "Seconds between refreshes")]
        interval: u64,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    #[command(about = "Register a new project")]
    Add { name: String },
    #[command(about = "List projects. The selected one is marked with *")]
    List {},
}

#[derive(Subcommand, Debug)]
enum BalanceCommand {
    #[command(about = "Replace the balance with a number of minutes")]
    Set {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let storage = StateFileStorage::new(app_dir)?;
    info!("Using state {:?}", storage.path());

    if let Commands::Watch { interval } = args.commands {
        return run_watch(storage, Duration::from_secs(interval.max(1))).await;
    }

    let (mut tracker, closed) = Tracker::open(storage, Box::new(DefaultClock)).await?;
    if let Some(summary) = closed {
        println!("Closed previous day");
        println!("{}", render_summary(&summary));
    }
    process_command(&mut tracker, args.commands).await
}

async fn run_watch(storage: StateFileStorage, interval: Duration) -> Result<()> {
    let shutdown_token = CancellationToken::new();
    let mut module = WatchModule::new(
        storage,
        std::io::stdout(),
        shutdown_token.clone(),
        interval,
        Box::new(DefaultClock),
    );
    let (_, result) = tokio::join!(detect_shutdown(shutdown_token), module.run());
    result
}

async fn process_command<S: StateStorage>(
    tracker: &mut Tracker<S>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Start { project } => {
            let Some(project) = project.or_else(|| tracker.default_project().map(String::from))
            else {
                println!("No project to start, add one with `project add`");
                return Ok(());
            };
            tracker.start(ActivityKind::Project, &project).await?;
            println!("Working on {project}");
        }
        Commands::Break { label } => {
            let label = label.unwrap_or_else(|| DEFAULT_BREAK_LABEL.to_string());
            tracker.start(ActivityKind::Break, &label).await?;
            println!("On break: {label}");
        }
        Commands::Stop {} => match tracker.stop().await? {
            Some(segment) => println!("Stopped {}: {}", segment.kind, segment.name),
            None => println!("Nothing is running"),
        },
        Commands::Close {} => {
            let summary = tracker.close_day().await?;
            println!("{}", render_summary(&summary));
            println!("Balance: {}", paint_balance(tracker.state().total_balance_minutes));
        }
        Commands::Select { name } => {
            if tracker.select_project(&name).await? {
                println!("Selected {name}");
            } else {
                println!("Unknown project {name}");
            }
        }
        Commands::Project { command } => match command {
            ProjectCommand::Add { name } => {
                if tracker.add_project(&name).await? {
                    println!("Added {}", name.trim());
                } else {
                    println!("Project is empty or already exists");
                }
            }
            ProjectCommand::List {} => print!("{}", render_projects(tracker.state())),
        },
        Commands::Balance { command } => {
            if let Some(BalanceCommand::Set { value }) = command {
                if tracker.set_balance(&value).await? == BalanceUpdate::Rejected {
                    println!("Balance must be a whole number of minutes, got {value:?}");
                    return Ok(());
                }
                println!("Balance updated!");
            }
            println!("Balance: {}", paint_balance(tracker.state().total_balance_minutes));
        }
        Commands::Status {} => print!("{}", render_status(tracker.state(), tracker.now())),
        Commands::History { days } => {
            let history = &tracker.state().history;
            for summary in &history[history.len().saturating_sub(days)..] {
                println!("{}", render_summary(summary));
            }
        }
        Commands::Watch { .. } => bail!("Watch doesn't run on an opened tracker"),
    }
    Ok(())
}
