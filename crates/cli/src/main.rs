//! ClicLeitura CLI - the storefront's cart and PIX checkout in a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from --password or CLICLEITURA_PASSWORD)
//! clicleitura login -e ana@example.com
//!
//! # Show the cart, add and remove books
//! clicleitura cart
//! clicleitura add 3
//! clicleitura remove 12
//!
//! # Buy one book, or the whole cart, with PIX
//! clicleitura buy 3
//! clicleitura checkout
//!
//! # Interactive session (one page lifetime)
//! clicleitura shell
//! ```
//!
//! # Environment Variables
//!
//! - `CLICLEITURA_BASE_URL` - Backend origin (required)
//! - `CLICLEITURA_TIMEOUT_SECS` - Per-request timeout (default 15)
//! - `CLICLEITURA_SESSION_FILE` - Cached identity record
//! - `CLICLEITURA_QR_DIR` - Where QR code images are saved
//! - `SENTRY_DSN` - Optional error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Stdout};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clicleitura_client::{
    CartCheckoutController, ClientConfig, ClientError, ConfigError, HttpApi, SessionStore,
};
use clicleitura_core::{BookId, CartItemId, Email, EmailError};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod terminal;

use terminal::TerminalView;

type Controller = CartCheckoutController<HttpApi, TerminalView<Stdout>>;

#[derive(Parser)]
#[command(name = "clicleitura")]
#[command(author, version, about = "ClicLeitura e-book storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Cart,
    /// Add a book to the cart
    Add {
        /// Book id
        book_id: BookId,
    },
    /// Remove an item from the cart
    Remove {
        /// Cart item id
        item_id: CartItemId,
    },
    /// Buy a single book with PIX
    Buy {
        /// Book id
        book_id: BookId,

        /// Receipt email (defaults to the logged-in user's)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Turn the whole cart into one PIX order
    Checkout,
    /// Show the profile and order history
    Profile,
    /// Log in and cache the identity
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (falls back to `CLICLEITURA_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the cached identity
    Logout,
    /// Interactive session
    Shell,
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Missing password: use --password or CLICLEITURA_PASSWORD")]
    MissingPassword,

    #[error("Terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clicleitura_cli=info,clicleitura_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let api = HttpApi::new(config)?;
    let view = TerminalView::new(io::stdout(), config.qr_dir.clone());
    let store = SessionStore::open(&config.session_file);
    let mut ctl: Controller = CartCheckoutController::new(api, view, store);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Commands::Cart => {
            ctl.open_cart()?;
            ctl.load_cart().await?;
        }
        Commands::Add { book_id } => ctl.add_to_cart(book_id).await?,
        Commands::Remove { item_id } => ctl.remove_item(item_id).await?,
        Commands::Buy { book_id, email } => {
            let email = email.as_deref().map(Email::parse).transpose()?;
            ctl.checkout_item(book_id, email).await?;
            commands::payment_prompt(&mut ctl, &mut input).await?;
        }
        Commands::Checkout => {
            ctl.checkout_cart().await?;
            commands::payment_prompt(&mut ctl, &mut input).await?;
        }
        Commands::Profile => {
            ctl.show_profile().await?;
        }
        Commands::Login { email, password } => {
            let email = Email::parse(&email)?;
            let password = password
                .or_else(|| std::env::var("CLICLEITURA_PASSWORD").ok())
                .map(SecretString::from)
                .ok_or(CliError::MissingPassword)?;
            commands::login(&mut ctl, &email, &password).await?;
        }
        Commands::Logout => ctl.logout()?,
        Commands::Shell => commands::shell::run(&mut ctl, &mut input).await?,
    }
    Ok(())
}
