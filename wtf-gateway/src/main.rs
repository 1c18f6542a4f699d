use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use wtf::chat::{reply_for, WtfGateway};
use wtf::import::import_files;
use wtf::store::GlossaryStore;
use wtf::{Interpreter, SqliteGlossary, WtfConfig};

#[derive(Parser)]
#[command(name = "wtf-gateway")]
#[command(version)]
#[command(about = "A database of explanations for words, acronyms and initialisms")]
struct Cli {
    /// TOML configuration file; missing file means defaults.
    #[arg(long, short, global = true, default_value = "wtf.toml", env = "WTF_CONFIG")]
    config: PathBuf,

    /// Override `general.db_path` from the config file.
    #[arg(long, global = true, env = "WTF_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer chat messages delivered by the loopback webhook connector.
    Serve(ServeArgs),
    /// Import `term<TAB>explanation` files, such as the BSD wtf acronym lists.
    Import(ImportArgs),
    /// Run one command line locally, e.g. `lookup -- is BRB`.
    Lookup(LookupArgs),
    /// Show every explanation ever stored for a term, deleted ones included.
    History(HistoryArgs),
}

#[derive(Parser)]
struct ServeArgs {
    #[arg(long)]
    bind_addr: Option<String>,

    #[arg(long, env = "WTF_CONNECTOR_SECRET")]
    connector_secret: Option<String>,

    #[arg(long)]
    outbound_url: Option<String>,

    #[arg(long)]
    min_send_interval_ms: Option<u64>,
}

#[derive(Parser)]
struct ImportArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Parser)]
struct LookupArgs {
    #[arg(long, default_value = "cli")]
    sender: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

#[derive(Parser)]
struct HistoryArgs {
    term: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wtf=info,wtf_gateway=info".into()),
        )
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = WtfConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(db) = cli.db {
        config.general.db_path = db;
    }

    match cli.command {
        Commands::Serve(args) => serve(config, args).await,
        Commands::Import(args) => import(&config, args),
        Commands::Lookup(args) => lookup(&config, args),
        Commands::History(args) => history(&config, args),
    }
}

async fn serve(mut config: WtfConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind_addr) = args.bind_addr {
        config.gateway.bind_addr = bind_addr;
    }
    if let Some(secret) = args.connector_secret {
        config.gateway.shared_secret = Some(secret);
    }
    if let Some(url) = args.outbound_url {
        config.gateway.outbound_url = Some(url);
    }
    if let Some(ms) = args.min_send_interval_ms {
        config.gateway.min_send_interval_ms = ms;
    }

    info!("Database: {}", config.general.db_path.display());
    info!("Outbound URL: {:?}", config.gateway.outbound_url);
    WtfGateway::serve(config).await?;
    Ok(())
}

fn import(config: &WtfConfig, args: ImportArgs) -> anyhow::Result<()> {
    let store = SqliteGlossary::open(&config.general.db_path)?;
    let report = import_files(&store, &args.files)?;
    println!(
        "Imported {} explanations ({} lines skipped)",
        report.added, report.skipped
    );
    Ok(())
}

fn lookup(config: &WtfConfig, args: LookupArgs) -> anyhow::Result<()> {
    let store = SqliteGlossary::open(&config.general.db_path)?;
    let interpreter = Interpreter::from_config(Arc::new(store), &config.general);
    let text = format!("{} {}", interpreter.command(), args.words.join(" "));
    if let Some(reply) = reply_for(&interpreter, &text, &args.sender) {
        println!("{}", reply);
    }
    Ok(())
}

fn history(config: &WtfConfig, args: HistoryArgs) -> anyhow::Result<()> {
    let store = SqliteGlossary::open(&config.general.db_path)?;
    let records = store.history(&args.term)?;
    if records.is_empty() {
        println!("No explanations for {:?}", args.term);
    }
    for r in records {
        let marker = if r.deleted { " [deleted]" } else { "" };
        println!(
            "{}: {} — {} (by {}){}",
            r.id, r.term, r.explanation, r.author, marker
        );
    }
    Ok(())
}
