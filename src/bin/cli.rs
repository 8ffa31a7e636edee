//! GeekJudge CLI
//!
//! Runs the judge worker and its operational commands.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use geekjudge::config::{
    apply_env_overrides, load_config, load_config_from_path, validate_config, Config, LogConfig,
    LogFormat,
};
use geekjudge::database::{init_pool, migrations, PgJudgeStore};
use geekjudge::model::{Language, Problem};
use geekjudge::queue::{JobQueue, RedisQueue};
use geekjudge::sandbox::create_executor;
use geekjudge::{synth, Worker, WorkerContext, VERSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "geekjudge",
    author = "GeekJudge Contributors",
    version = VERSION,
    about = "GeekJudge - submission-execution worker",
    long_about = None
)]
struct Cli {
    /// Configuration file (JSON5 or TOML)
    #[arg(long, short, global = true, env = "GEEKJUDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the work queue until interrupted (default)
    Run,

    /// Create the problems and submissions tables
    Migrate,

    /// Validate configuration and check PostgreSQL, Redis and Docker
    Check,

    /// Push a submission id onto the work queue
    Enqueue {
        /// Submission id
        submission_id: Uuid,
    },

    /// Print the program synthesized for one test case
    Synth {
        /// Problem record as JSON
        #[arg(long)]
        problem: PathBuf,
        /// Submission language
        #[arg(long, short)]
        language: String,
        /// File holding the submitted source
        #[arg(long)]
        code: PathBuf,
        /// Test case number, starting at 1
        #[arg(long, short, default_value_t = 1)]
        test: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load(cli.config.as_deref())?;
    init_tracing(&config.log)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_worker(config).await,
        Commands::Migrate => run_migrations(&config).await,
        Commands::Check => check_status(&config).await,
        Commands::Enqueue { submission_id } => enqueue(&config, submission_id).await,
        Commands::Synth {
            problem,
            language,
            code,
            test,
        } => print_program(&problem, &language, &code, test),
    }
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            config
        }
        None => load_config()?,
    };
    Ok(config)
}

/// Log to stderr so `synth` output stays clean
fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("geekjudge={}", log.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

/// Start the job consumer
async fn run_worker(config: Config) -> anyhow::Result<()> {
    info!("Starting GeekJudge worker v{}", VERSION);

    let validation = validate_config(&config);
    for warning in &validation.warnings {
        warn!("Config: {}", warning);
    }
    if !validation.valid {
        for issue in &validation.errors {
            error!("Config: {}", issue);
        }
        bail!("invalid configuration ({} errors)", validation.errors.len());
    }

    let postgres = config
        .storage
        .postgres
        .as_ref()
        .context("PostgreSQL is not configured")?;
    let pool = init_pool(postgres).await?;
    let queue = RedisQueue::connect(&config.queue).await?;
    let executor = create_executor(&config.sandbox).await?;

    let worker = Worker::new(WorkerContext {
        config,
        store: Arc::new(PgJudgeStore::new(pool)),
        queue: Arc::new(queue),
        executor: Arc::new(executor),
    });

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested, finishing current job"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = stop.send(true);
    });

    worker.run(shutdown).await?;
    Ok(())
}

/// Run database migrations
async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    println!("Running database migrations...\n");

    let postgres = config
        .storage
        .postgres
        .as_ref()
        .context("PostgreSQL not configured for migrations")?;
    let pool = init_pool(postgres).await?;
    migrations::run(&pool).await?;

    println!("✅ Migrations complete!");
    Ok(())
}

/// Check configuration and every backing service
async fn check_status(config: &Config) -> anyhow::Result<()> {
    println!("🔍 GeekJudge Status\n");

    let validation = validate_config(config);
    if validation.valid {
        println!("Configuration: ✅ Valid");
    } else {
        println!("Configuration: ❌ {} errors", validation.errors.len());
    }
    for issue in &validation.errors {
        println!("  error: {}", issue);
    }
    for issue in &validation.warnings {
        println!("  warning: {}", issue);
    }
    println!("  Queue: {}", config.queue.name);
    println!("  Timeout: {:?}", config.sandbox.timeout);

    match &config.storage.postgres {
        Some(postgres) => match init_pool(postgres).await {
            Ok(_) => println!("PostgreSQL: ✅ Connected"),
            Err(e) => println!("PostgreSQL: ❌ {}", e),
        },
        None => println!("PostgreSQL: ❌ Not configured"),
    }

    match RedisQueue::connect(&config.queue).await {
        Ok(queue) => match queue.len().await {
            Ok(waiting) => println!("Redis: ✅ Connected ({} jobs waiting)", waiting),
            Err(e) => println!("Redis: ❌ {}", e),
        },
        Err(e) => println!("Redis: ❌ {}", e),
    }

    match create_executor(&config.sandbox).await {
        Ok(_) => println!("Docker: ✅ Connected"),
        Err(e) => println!("Docker: ❌ {}", e),
    }

    Ok(())
}

/// Push one submission id, as the intake API does
async fn enqueue(config: &Config, submission_id: Uuid) -> anyhow::Result<()> {
    let queue = RedisQueue::connect(&config.queue).await?;
    queue.push(&submission_id.to_string()).await?;
    println!("Enqueued {} on {}", submission_id, queue.name());
    Ok(())
}

/// Print the synthesized program without running it
fn print_program(problem: &Path, language: &str, code: &Path, test: usize) -> anyhow::Result<()> {
    let problem_json = std::fs::read_to_string(problem)
        .with_context(|| format!("reading {}", problem.display()))?;
    let problem: Problem = serde_json::from_str(&problem_json)
        .with_context(|| format!("parsing {}", problem.display()))?;
    problem.validate()?;

    let source = std::fs::read_to_string(code).with_context(|| format!("reading {}", code.display()))?;
    let language: Language = language.parse()?;

    // Synthesized as a suite so numeric widths match what the worker runs
    let mut programs =
        synth::synthesize_all(language, &source, &problem.function_metadata, &problem.test_cases)?;
    let count = programs.len();
    let Some(program) = test.checked_sub(1).filter(|i| *i < count).map(|i| programs.swap_remove(i)) else {
        bail!("test {} is out of range; {} has {} test cases", test, problem.title, count);
    };
    print!("{}", program.source);
    Ok(())
}
