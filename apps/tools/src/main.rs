use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{domain::InvitationRecord, phone::PhoneMatch};
use storage::{StoreHandle, SQLITE_SCHEMA};
use tracing_subscriber::EnvFilter;

/// Read-only operator access to the invitation record store.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://invitations.db")]
    database_url: String,
    #[arg(long)]
    database_name: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the record stored under a phone number.
    Lookup {
        phone_number: String,
        /// Strip non-digits before querying.
        #[arg(long)]
        digits_only: bool,
    },
    /// Connect and ping the store.
    Ping,
    /// Print the table layout the SQLite backend expects.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let store = StoreHandle::from_url(cli.database_url, cli.database_name);

    match cli.command {
        Command::Lookup {
            phone_number,
            digits_only,
        } => {
            let phone_match = if digits_only {
                PhoneMatch::DigitsOnly
            } else {
                PhoneMatch::Exact
            };
            let key = phone_match
                .query_key(&phone_number)
                .context("phone number is empty")?;
            match store.get().await?.find_by_phone(&key).await? {
                Some(stored) => {
                    println!("id={}", stored.id);
                    let record = InvitationRecord::from(stored);
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                None => println!("no record for {key:?}"),
            }
        }
        Command::Ping => {
            let store = store.get().await?;
            store.health_check().await?;
            println!("{} store is reachable", store.backend());
        }
        Command::Schema => print!("{}", SQLITE_SCHEMA.trim_start()),
    }

    Ok(())
}
