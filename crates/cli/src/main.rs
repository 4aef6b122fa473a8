//! RadaPOS terminal - sell, queue and reconcile from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Sign in as a cashier
//! rada login -e cashier@example.com -p secret
//!
//! # Ring up two sodas and a samosa, then take cash
//! rada cart add 12
//! rada cart add 12
//! rada cart add 7
//! rada checkout 500
//!
//! # Sales captured offline are sent when asked
//! rada queue sync
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `whoami`, `route` - Session and navigation
//! - `products`, `cart`, `checkout`, `queue` - Selling
//! - `notifications` - Unread alerts, optionally kept refreshed
//! - `wallet`, `withdrawals` - Vendor payouts and admin review
//! - `theme` - Display preference
//!
//! # Environment Variables
//!
//! See [`radapos_client::config`]. `RUST_LOG` sets the log filter and
//! `RADAPOS_LOG_FORMAT=json` switches to JSON log lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use radapos_client::ClientConfig;
use radapos_core::{ProductId, ReviewAction, WithdrawalId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{CliError, Terminal};

#[derive(Parser)]
#[command(name = "rada")]
#[command(author, version, about = "RadaPOS point-of-sale terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show what a path would render for the current session
    Route {
        /// Path such as `/pos/terminal`
        path: String,
    },
    /// List products for sale
    Products {
        /// Only the signed-in vendor's own inventory
        #[arg(long)]
        vendor: bool,
    },
    /// Edit the current sale
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Take a cash payment for the cart
    Checkout {
        /// Amount tendered
        amount: String,

        /// Skip the connectivity probe and queue the sale
        #[arg(long)]
        offline: bool,
    },
    /// Sales captured while offline
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Show notifications
    Notifications {
        /// Keep refreshing the unread count until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Vendor wallet
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Review vendor withdrawal requests (admin)
    Withdrawals {
        #[command(subcommand)]
        action: WithdrawalAction,
    },
    /// Display theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add { id: ProductId },
    /// Print the cart and its total
    Show,
    /// Change a line's quantity by a signed amount
    Qty {
        id: ProductId,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Drop a product from the cart
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum QueueAction {
    /// Show queued sales
    List,
    /// Submit queued sales, oldest first
    Sync,
}

#[derive(Subcommand)]
enum WalletAction {
    /// Balance and recent activity
    Show,
    /// Ask for a payout to the registered M-Pesa number
    Withdraw { amount: String },
}

#[derive(Subcommand)]
enum WithdrawalAction {
    /// All withdrawal requests
    List {
        /// Filter by vendor name or M-Pesa number
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Approve and pay out a pending request
    Approve { id: WithdrawalId },
    /// Reject a pending request
    Reject { id: WithdrawalId },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "radapos_cli=info,radapos_client=info".into());

    let json = std::env::var("RADAPOS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be up before the subscriber that forwards to it.
    let sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let terminal = Terminal::open(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&terminal, &email, password).await?;
        }
        Commands::Logout => commands::session::logout(&terminal)?,
        Commands::Whoami => commands::session::whoami(&terminal),
        Commands::Route { path } => commands::session::route(&terminal, &path),
        Commands::Products { vendor } => commands::sales::products(&terminal, vendor).await?,
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::sales::cart_add(&terminal, id).await?,
            CartAction::Show => commands::sales::cart_show(&terminal)?,
            CartAction::Qty { id, delta } => commands::sales::cart_qty(&terminal, id, delta)?,
            CartAction::Remove { id } => commands::sales::cart_remove(&terminal, id)?,
            CartAction::Clear => commands::sales::cart_clear(&terminal)?,
        },
        Commands::Checkout { amount, offline } => {
            commands::sales::checkout(&terminal, &amount, offline).await?;
        }
        Commands::Queue { action } => match action {
            QueueAction::List => commands::sales::queue_list(&terminal)?,
            QueueAction::Sync => commands::sales::queue_sync(&terminal).await?,
        },
        Commands::Notifications { watch } => {
            commands::notifications::show(&terminal, watch).await?;
        }
        Commands::Wallet { action } => match action {
            WalletAction::Show => commands::wallet::show(&terminal).await?,
            WalletAction::Withdraw { amount } => commands::wallet::withdraw(&terminal, &amount).await?,
        },
        Commands::Withdrawals { action } => match action {
            WithdrawalAction::List { search } => {
                commands::wallet::list_withdrawals(&terminal, search.as_deref()).await?;
            }
            WithdrawalAction::Approve { id } => {
                commands::wallet::review(&terminal, id, ReviewAction::Approve).await?;
            }
            WithdrawalAction::Reject { id } => {
                commands::wallet::review(&terminal, id, ReviewAction::Reject).await?;
            }
        },
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::session::theme(&terminal, false)?,
            ThemeAction::Toggle => commands::session::theme(&terminal, true)?,
        },
    }
    Ok(())
}
