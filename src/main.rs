use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sigsel::banner::{BannerInfo, print_banner};
use sigsel::commands::{CommandRegistry, CommandResult, SessionInfo};
use sigsel::config::{
    ConfigError, ConfigOverrides, DashboardConfig, SETTING_KEYS, Settings, display_value,
};
use sigsel::consts::default_db_path;
use sigsel::dashboard::{Action, Dashboard, View};
use sigsel::data::Repository;
use sigsel::data::memory::InMemoryStore;
use sigsel::data::rest::RestStore;
use sigsel::present::render::render;
use sigsel::spinner::Spinner;
use sigsel::trigger::Evaluator;
use sigsel::trigger::edge::EdgeFunctionScorer;
use sigsel::trigger::simulated::SimulatedScorer;

#[derive(Parser)]
#[command(
    name = "sigsel",
    version,
    about = "Committee dashboard for automatic bid evaluation."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base URL of the procurement store
    #[arg(long, env = "SIGSEL_STORE_URL")]
    store_url: Option<String>,

    /// Read-only access key for the store
    #[arg(long, env = "SIGSEL_READ_KEY", hide_env_values = true)]
    read_key: Option<String>,

    /// Write-authorized key for the scoring function
    #[arg(long, env = "SIGSEL_WRITE_KEY", hide_env_values = true)]
    write_key: Option<String>,

    /// Scoring function URL (default: <store-url>/functions/v1/evaluar_ofertas_sigsel)
    #[arg(long, env = "SIGSEL_TRIGGER_ENDPOINT")]
    trigger_endpoint: Option<String>,

    /// Dashboard title
    #[arg(long, env = "SIGSEL_TITLE")]
    title: Option<String>,

    /// Phase a case must be in to be listed
    #[arg(long, env = "SIGSEL_PHASE")]
    phase: Option<String>,

    /// Seconds cached reads stay fresh
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// Seconds to wait for the scoring function
    #[arg(long)]
    trigger_timeout: Option<u64>,

    /// SQLite database path for persisted settings
    #[arg(short, long)]
    db: Option<String>,

    /// Use built-in sample data and a simulated scorer
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Show one case and exit (non-interactive)
    #[arg(short, long)]
    case: Option<String>,

    /// With --case: run the evaluation before showing results
    #[arg(short, long, default_value_t = false, requires = "case")]
    evaluate: bool,

    /// Log debug output to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Manage persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Store a setting
    Set { key: String, value: String },
    /// Print a setting
    Get { key: String },
    /// Remove a setting
    Unset { key: String },
    /// Print all stored settings (keys redacted)
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "sigsel=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(Command::Config { action }) = &cli.command {
        let path = settings_path(cli.db.as_deref())?;
        handle_config(&path, action)?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = match settings_path(cli.db.as_deref()).and_then(|p| Settings::open(&p)) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("persisted settings unavailable: {e:#}");
            None
        }
    };

    let overrides = ConfigOverrides {
        store_url: cli.store_url.clone(),
        read_key: cli.read_key.clone(),
        write_key: cli.write_key.clone(),
        trigger_endpoint: cli.trigger_endpoint.clone(),
        title: cli.title.clone(),
        pending_phase: cli.phase.clone(),
        cache_ttl: cli.cache_ttl.map(Duration::from_secs),
        trigger_timeout: cli.trigger_timeout.map(Duration::from_secs),
    };
    let config = DashboardConfig::resolve(overrides, settings.as_ref())?;

    let mut dashboard = build_dashboard(&config, cli.demo);

    // Single case mode
    if let Some(case) = &cli.case {
        let (mut view, selected) = dashboard.select_only(case).await;
        if cli.evaluate && selected {
            view = run_action(&mut dashboard, Action::Evaluate).await;
        }
        print!("{}", render(&view));
        let failed = !selected || view.notices.iter().any(|n| n.is_error());
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let mode = if cli.demo { "demo" } else { "live" };
    let banner = BannerInfo::from_config(&config, mode);
    print_banner(&banner);

    let view = dashboard.update(Action::Rerun).await;
    print!("{}", render(&view));

    let registry = CommandRegistry::new();

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nsigsel> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let result = {
            let info = SessionInfo {
                banner: &banner,
                state: dashboard.state(),
                evaluating: dashboard.is_evaluating(),
            };
            registry.dispatch(input, &info).await
        };

        let action = match result {
            CommandResult::Quit => break,
            CommandResult::Handled => continue,
            CommandResult::Dispatch(action) => action,
            CommandResult::NotACommand => Action::Select(input.to_string()),
        };

        let view = run_action(&mut dashboard, action).await;
        print!("{}", render(&view));
    }

    println!("goodbye.");
    Ok(ExitCode::SUCCESS)
}

/// Wire the store and the scorer from the resolved configuration.
fn build_dashboard(config: &DashboardConfig, demo: bool) -> Dashboard {
    if demo {
        let repo = Repository::with_ttl(Arc::new(InMemoryStore::demo()), config.cache_ttl);
        let evaluator = Evaluator::new(
            Arc::new(SimulatedScorer::new(Duration::from_millis(800))),
            config.trigger_timeout,
        );
        return Dashboard::new(&config.title, &config.pending_phase, Ok(repo), evaluator);
    }

    let data: Result<Repository, ConfigError> = config
        .store_url()
        .and_then(|url| RestStore::new(url, config.read_key()?))
        .map(|store| Repository::with_ttl(Arc::new(store), config.cache_ttl));

    let evaluator = match EdgeFunctionScorer::from_config(config) {
        Ok(scorer) => Evaluator::new(Arc::new(scorer), config.trigger_timeout),
        Err(e) => Evaluator::unconfigured(e),
    };

    Dashboard::new(&config.title, &config.pending_phase, data, evaluator)
}

/// Apply an action. Evaluation shows a spinner and can be abandoned with Ctrl+C.
async fn run_action(dashboard: &mut Dashboard, action: Action) -> View {
    if action != Action::Evaluate {
        return dashboard.update(action).await;
    }

    let label = dashboard
        .state()
        .selected_case()
        .map(|c| format!("evaluating {}", c.process_code))
        .unwrap_or_else(|| "evaluating".to_string());
    let spinner = Spinner::start(&label);

    let outcome = tokio::select! {
        view = dashboard.update(Action::Evaluate) => Some(view),
        _ = tokio::signal::ctrl_c() => None,
    };
    spinner.stop().await;

    match outcome {
        Some(view) => view,
        None => {
            println!("\n  interrupted: stopped waiting for the scoring service.");
            println!("  scores may still be updated upstream; use /refresh to reload.");
            dashboard.update(Action::Rerun).await
        }
    }
}

fn settings_path(explicit: Option<&str>) -> anyhow::Result<String> {
    if let Some(path) = explicit {
        return Ok(path.to_string());
    }
    let path = default_db_path().context("cannot determine home directory, pass --db")?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    path.to_str()
        .map(str::to_string)
        .context("settings path is not valid UTF-8")
}

fn handle_config(path: &str, action: &ConfigAction) -> anyhow::Result<()> {
    let settings = Settings::open(path)?;
    match action {
        ConfigAction::Set { key, value } => {
            settings.set(key, value)?;
            println!("✓ {key} = {}", display_value(key, value));
        }
        ConfigAction::Get { key } => match settings.get(key)? {
            Some(value) => println!("{}", display_value(key, &value)),
            None => {
                if !SETTING_KEYS.contains(&key.as_str()) {
                    bail!("unknown setting: {key}");
                }
                println!("(not set)");
            }
        },
        ConfigAction::Unset { key } => {
            settings.remove(key)?;
            println!("✓ {key} removed");
        }
        ConfigAction::List => {
            let pairs = settings.list()?;
            if pairs.is_empty() {
                println!("no settings stored in {path}");
            }
            for (key, value) in pairs {
                println!("{key:<22} {}", display_value(&key, &value));
            }
        }
    }
    Ok(())
}
