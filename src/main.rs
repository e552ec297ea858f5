use anyhow::Result;
use clap::Parser;
use reconf::{
    EventBus, KbSeed, LocalTransport, MemoryKnowledgeBase, MockLifecycleNode, ReconfConfig,
    ReconfigurationEngine,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

#[derive(Parser, Debug)]
#[command(name = "reconf")]
#[command(about = "Reconfiguration execution engine for self-adaptive component systems")]
#[command(version)]
#[command(long_about = "Executes reconfiguration plans against a running fleet of components: \
stops, starts and reparametrizes processes and lifecycle-managed components, records the outcome \
in the knowledge base and terminates every component process on shutdown.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "reconf.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the engine")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Seed the in-memory knowledge base from a TOML file
    #[arg(long, value_name = "FILE")]
    kb_seed: Option<PathBuf>,

    /// Serve lifecycle endpoints in-process for every managed component of the seed
    #[arg(long, help = "Answer lifecycle calls of seeded managed components in-process")]
    mock_lifecycle: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting reconf v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match ReconfConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let seed = match &args.kb_seed {
        Some(path) => KbSeed::from_file(path).map_err(|e| {
            error!("Failed to load KB seed {}: {}", path.display(), e);
            e
        })?,
        None => KbSeed::default(),
    };

    let transport = LocalTransport::new();
    let events = EventBus::new(config.engine.event_bus_capacity);

    if args.mock_lifecycle {
        for component in seed.components.iter().filter(|c| c.is_managed()) {
            let node = Arc::new(MockLifecycleNode::new(component.name.clone()));
            node.register(&transport);
            info!("Serving mock lifecycle endpoints for {}", node.name());
        }
    }

    let store = Arc::new(MemoryKnowledgeBase::from_seed(seed, Some(events.clone())));
    store.register(&transport, &config.kb);

    let mut engine = ReconfigurationEngine::new(config, Arc::new(transport), events);

    engine.configure().await.map_err(|e| {
        error!("Failed to configure engine: {}", e);
        e
    })?;
    engine.activate().await.map_err(|e| {
        error!("Failed to activate engine: {}", e);
        e
    })?;

    // Plans seeded before start-up raised no event
    if let Some(result) = engine.execute().await {
        info!("Pending plan executed with result {}", result);
    }

    let exit_code = engine.run().await.map_err(|e| {
        error!("Engine error during execution: {}", e);
        e
    })?;

    info!("reconf exited with code: {}", exit_code);
    // exit() skips destructors; flush the file writer first
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("reconf={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Daily-rolling log file in `dir`; lines are written until the guard is dropped
fn file_writer(dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, "reconf.log");
    tracing_appender::non_blocking(appender)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# reconf configuration file");
    println!("# Every option with its default value. Environment variables override");
    println!("# file values, e.g. RECONF_GATEWAY__CALL_TIMEOUT_MS=2000");
    println!();
    println!("{}", toml::to_string_pretty(&ReconfConfig::default())?);
    Ok(())
}
