use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use salon_qr::application::machine::PaymentSessionMachine;
use salon_qr::config::AccountConfig;
use salon_qr::domain::amount::Amount;
use salon_qr::domain::payload::{PaymentPayload, SpdEncoder};
use salon_qr::domain::ports::{PaymentLogBox, QrRenderer};
use salon_qr::domain::service::{ServiceCatalog, ServiceSelection};
use salon_qr::infrastructure::in_memory::{InMemoryPaymentLog, InMemorySessionStore};
use salon_qr::infrastructure::qr::PngQrRenderer;
use salon_qr::interfaces::csv::service_reader::ServiceReader;
use salon_qr::interfaces::telegram::{self, TelegramMessenger};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::Bot;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Czech SPD payment QR codes for a beauty salon", long_about = None)]
struct Cli {
    #[command(flatten)]
    account: AccountArgs,

    /// Service catalog CSV (key,label,bracket). The built-in salon list is used otherwise.
    #[arg(long, env = "SERVICE_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AccountArgs {
    /// Account owner, printed upper-cased into the RN field
    #[arg(long, env = "OWNER_NAME")]
    owner_name: String,

    /// Receiving IBAN
    #[arg(long, env = "IBAN")]
    iban: String,

    /// Domestic account number shown to staff (number/bank code)
    #[arg(long, env = "ACCOUNT_NUMBER", default_value = "")]
    account_number: String,
}

#[derive(Args)]
struct PaymentArgs {
    /// Amount in CZK, e.g. 1500 or 1234,50
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    /// Catalog service key to put into the message
    #[arg(long, conflicts_with = "message")]
    service: Option<String>,

    /// Free-text message (2-50 characters)
    #[arg(long)]
    message: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Run {
        #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Path to persistent payment log (optional). If provided, uses RocksDB.
        #[arg(long, env = "PAYMENT_DB_PATH")]
        db_path: Option<PathBuf>,
    },
    /// Print the SPD payload string
    Payload(PaymentArgs),
    /// Write the payment QR code as PNG
    Render {
        #[command(flatten)]
        payment: PaymentArgs,

        /// Output PNG file
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let account = AccountConfig::new(
        &cli.account.owner_name,
        &cli.account.iban,
        &cli.account.account_number,
    )
    .into_diagnostic()?;

    let catalog = match &cli.catalog {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            ServiceReader::new(file).into_catalog().into_diagnostic()?
        }
        None => ServiceCatalog::salon_default(),
    };

    match cli.command {
        Commands::Run { token, db_path } => {
            let payments = payment_log(db_path)?;
            let token = token.ok_or_else(|| miette::miette!("BOT_TOKEN is not set"))?;
            let bot = Bot::new(token);

            let machine = PaymentSessionMachine::new(
                account,
                catalog,
                Box::new(InMemorySessionStore::new()),
                Box::new(PngQrRenderer::new()),
                Box::new(TelegramMessenger::new(bot.clone())),
                payments,
            );
            telegram::run(bot, Arc::new(machine)).await;
        }
        Commands::Payload(args) => {
            let spd = encode(&account, &catalog, &args)?;
            println!("{spd}");
        }
        Commands::Render { payment, output } => {
            let spd = encode(&account, &catalog, &payment)?;
            let png = PngQrRenderer::new().render(&spd).into_diagnostic()?;
            std::fs::write(&output, png).into_diagnostic()?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

fn encode(account: &AccountConfig, catalog: &ServiceCatalog, args: &PaymentArgs) -> Result<String> {
    let amount = Amount::parse(&args.amount).into_diagnostic()?;
    let selection = match (&args.service, &args.message) {
        (Some(key), _) => ServiceSelection::from_service(catalog.resolve(key).into_diagnostic()?),
        (None, Some(text)) => ServiceSelection::custom(text).into_diagnostic()?,
        (None, None) => ServiceSelection::none(),
    };
    let payload = PaymentPayload::new(amount, selection.wire_text).into_diagnostic()?;
    Ok(SpdEncoder::new(account.beneficiary()).encode(&payload))
}

fn payment_log(db_path: Option<PathBuf>) -> Result<PaymentLogBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            // Use persistent storage (RocksDB)
            let log = salon_qr::infrastructure::rocksdb::RocksDbPaymentLog::open(db_path)
                .into_diagnostic()?;
            Ok(Box::new(log))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryPaymentLog::new()))
        }
        None => Ok(Box::new(InMemoryPaymentLog::new())),
    }
}
