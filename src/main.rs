use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paycode::application::cards::CardService;
use paycode::application::credential::CredentialTokenizer;
use paycode::application::engine::PaymentEngine;
use paycode::application::notifier::Notifier;
use paycode::application::replay::ScriptRunner;
use paycode::config::Settings;
use paycode::domain::card::{NetworkType, normalize_card_number};
use paycode::domain::ports::{CardStoreRef, ClockRef, TransactionStoreBox};
use paycode::domain::role::Role;
use paycode::infrastructure::auth::AllowAllPasswords;
use paycode::infrastructure::bus::InMemoryBus;
use paycode::infrastructure::clock::SystemClock;
use paycode::interfaces::csv::operation_reader::OperationReader;
use paycode::interfaces::csv::transaction_writer::{TransactionRow, TransactionWriter};
use paycode::telemetry::init_tracing;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./paycode.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify card numbers by payment network
    Classify {
        #[arg(required = true)]
        numbers: Vec<String>,
    },
    /// Issue or decode payment credentials
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// Replay a CSV script of card and transaction operations
    Replay {
        /// Input operations CSV file
        script: PathBuf,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// List the transactions visible to a client or tenant
    List {
        role: Role,
        id: String,

        /// Path to persistent database (optional). If provided, uses RocksDB.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Issue a credential for a client
    Issue { client_id: String },
    /// Resolve a credential back to its client
    Decode { token: String },
}

struct Stores {
    transactions: TransactionStoreBox,
    cards: CardStoreRef,
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    use paycode::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Stores {
                transactions: Box::new(store.clone()),
                cards: Arc::new(store),
            })
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> Stores {
    use paycode::infrastructure::in_memory::{InMemoryCardStore, InMemoryTransactionStore};

    Stores {
        transactions: Box::new(InMemoryTransactionStore::new()),
        cards: Arc::new(InMemoryCardStore::new()),
    }
}

fn build_services(settings: &Settings, stores: Stores) -> Result<(PaymentEngine, CardService)> {
    let clock: ClockRef = Arc::new(SystemClock);
    let tokenizer =
        CredentialTokenizer::from_settings(&settings.credential, clock.clone()).into_diagnostic()?;
    let notifier = Notifier::new(
        Box::new(InMemoryBus::new()),
        settings.notification.wait_timeout(),
    );

    let cards = CardService::new(stores.cards.clone(), clock.clone());
    let engine = PaymentEngine::new(
        stores.transactions,
        stores.cards,
        Box::new(AllowAllPasswords),
        tokenizer,
        notifier,
        clock,
    );
    Ok((engine, cards))
}

fn write_rows(rows: Vec<TransactionRow>) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = TransactionWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).into_diagnostic()?;
    init_tracing(&settings.log);

    match cli.command {
        Command::Classify { numbers } => {
            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            writer.write_record(["number", "network"]).into_diagnostic()?;
            for raw in &numbers {
                let network = NetworkType::classify(raw).map_or("invalid", |n| n.as_str());
                writer
                    .write_record([normalize_card_number(raw).as_str(), network])
                    .into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        Command::Credential { action } => {
            let tokenizer =
                CredentialTokenizer::from_settings(&settings.credential, Arc::new(SystemClock))
                    .into_diagnostic()?;
            match action {
                CredentialAction::Issue { client_id } => {
                    println!("{}", tokenizer.encode(&client_id).into_diagnostic()?);
                }
                CredentialAction::Decode { token } => {
                    println!("{}", tokenizer.decode(&token).into_diagnostic()?);
                }
            }
        }
        Command::Replay { script, db_path } => {
            let stores = open_stores(db_path.as_deref())?;
            let (engine, cards) = build_services(&settings, stores)?;
            let mut runner = ScriptRunner::new(engine, cards);

            let file = File::open(script).into_diagnostic()?;
            let reader = OperationReader::new(file);
            for op_result in reader.operations() {
                match op_result {
                    Ok(op) => {
                        if let Err(e) = runner.process(op).await {
                            eprintln!("Error processing operation: {}", e);
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading operation: {}", e);
                    }
                }
            }

            let rows = runner.into_results().await.into_diagnostic()?;
            write_rows(rows)?;
        }
        Command::List { role, id, db_path } => {
            let stores = open_stores(db_path.as_deref())?;
            let (engine, _) = build_services(&settings, stores)?;
            let transactions = engine.list(&id, role).await.into_diagnostic()?;
            write_rows(transactions.iter().map(TransactionRow::from).collect())?;
        }
    }

    Ok(())
}
