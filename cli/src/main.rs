//! CLI entrypoint for quest-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    AttemptLogger, CreateQuestRequest, DispatchCouncilUseCase, DispatchInput, EngineParams,
    NoAttemptLog, QuestEngine, QuestManager, QuestService, QuestStore,
};
use council_domain::{QuestStatus, WarriorRegistry, aggregate};
use council_infrastructure::{
    ConfigLoader, FileConfig, HttpCompletionGateway, JsonlAttemptLogger, SqliteQuestStore,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, QuestCommand,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("loading configuration")?
    };

    let Some(command) = cli.command else {
        bail!("No command given. Try `quest-council ask \"...\"` or `quest-council quest --help`.");
    };

    // === Dependency Injection ===
    let registry = Arc::new(config.council.registry()?);
    let mut gateway = HttpCompletionGateway::new(&config.gateway.base_url)?;
    if let Some(api_key) = config.gateway.api_key() {
        gateway = gateway.with_api_key(api_key);
    }
    let gateway = Arc::new(gateway);
    let params = config.engine.engine_params();

    match command {
        Command::Ask { question, output } => {
            run_ask(question, output, cli.quiet, registry, gateway, params).await
        }
        Command::Quest { command } => {
            run_quest(command, &config, registry, gateway, params).await
        }
    }
}

/// One-shot council dispatch without any quest state.
async fn run_ask(
    question: String,
    output: OutputFormat,
    quiet: bool,
    registry: Arc<WarriorRegistry>,
    gateway: Arc<HttpCompletionGateway>,
    params: EngineParams,
) -> Result<()> {
    info!("Dispatching one-shot question to {} warriors", registry.len());

    let use_case = DispatchCouncilUseCase::new(gateway);
    let input = DispatchInput::new(question, registry.all().to_vec())
        .with_per_call_timeout(params.per_call_timeout)
        .with_max_retries(params.max_retries)
        .with_retry_backoff_base(params.retry_backoff_base);

    let cancel = CancellationToken::new();
    let results = if quiet {
        use_case.execute(input, &cancel).await?
    } else {
        let progress = ProgressReporter::new();
        use_case
            .execute_with_progress(input, &cancel, &progress)
            .await?
    };

    let consensus = aggregate(&results);
    let text = match output {
        OutputFormat::Full => ConsoleFormatter::format(&results, &consensus),
        OutputFormat::Answer => ConsoleFormatter::format_consensus(&consensus),
        OutputFormat::Json => ConsoleFormatter::format_json(&results, &consensus),
    };
    println!("{}", text);
    Ok(())
}

/// Quest subcommands over the durable store.
async fn run_quest(
    command: QuestCommand,
    config: &FileConfig,
    registry: Arc<WarriorRegistry>,
    gateway: Arc<HttpCompletionGateway>,
    params: EngineParams,
) -> Result<()> {
    let store: Arc<dyn QuestStore> = Arc::new(SqliteQuestStore::open(&config.store.path)?);
    let manager_running = Arc::new(AtomicBool::new(false));
    let service = QuestService::new(Arc::clone(&store), Arc::clone(&manager_running));

    match command {
        QuestCommand::Create {
            goal,
            strategy,
            priority,
            max_attempts,
            timeout_minutes,
            start,
        } => {
            let created = service
                .create(CreateQuestRequest {
                    goal,
                    strategy,
                    priority,
                    max_attempts,
                    timeout_minutes,
                })
                .await?;
            if start {
                let response = service.start(created.quest_id).await?;
                println!("{}", response.message);
            } else {
                println!("quest {} created", created.quest_id);
            }
        }

        QuestCommand::List { status } => {
            let status = match status {
                Some(text) => Some(
                    text.parse::<QuestStatus>()
                        .map_err(|e| anyhow::anyhow!(e))?,
                ),
                None => None,
            };
            let response = service.list(status).await?;
            print!("{}", ConsoleFormatter::format_quest_list(&response));
        }

        QuestCommand::Show { id } => {
            let response = service.get(id).await?;
            print!("{}", ConsoleFormatter::format_quest_detail(&response));
        }

        QuestCommand::Start { id } => {
            println!("{}", service.start(id).await?.message);
        }

        QuestCommand::Pause { id } => {
            println!("{}", service.pause(id).await?.message);
        }

        QuestCommand::Stop { id } => {
            println!("{}", service.stop(id).await?.message);
        }

        QuestCommand::History { id, limit } => {
            let response = service.history(id, limit).await?;
            print!("{}", ConsoleFormatter::format_history(&response));
        }

        QuestCommand::Stats => {
            let response = service.stats().await?;
            print!("{}", ConsoleFormatter::format_stats(&response));
        }

        QuestCommand::Health => {
            let health = service.health();
            println!("{}", serde_json::to_string_pretty(&health)?);
        }

        QuestCommand::Run => {
            let audit: Arc<dyn AttemptLogger> = match &config.logging.attempt_log {
                Some(path) => match JsonlAttemptLogger::new(path) {
                    Some(logger) => Arc::new(logger),
                    None => Arc::new(NoAttemptLog),
                },
                None => Arc::new(NoAttemptLog),
            };

            let engine = Arc::new(
                QuestEngine::new(
                    Arc::clone(&store),
                    registry,
                    gateway,
                    params.clone(),
                )
                .with_audit(audit),
            );
            let manager = QuestManager::new(engine, Arc::clone(&store), params.pass_interval);

            let cancel = CancellationToken::new();
            let signal_cancel = cancel.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Interrupt received, stopping after the current attempt");
                signal_cancel.cancel();
            });

            println!("quest manager running; ctrl-c to stop");
            manager.run(cancel).await;
        }
    }

    Ok(())
}
