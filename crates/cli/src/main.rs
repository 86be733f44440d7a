//! Greenshoes CLI - Shop the Greenshoes storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse as a guest
//! gs-cli products --category sneakers --sort price-asc
//! gs-cli cart add <product-id> --color Blue --size 9
//!
//! # Sign in; the guest cart is merged server-side
//! gs-cli login ada@example.com --password 'Abcdef1!'
//! gs-cli cart show
//!
//! # Check out with the saved card
//! gs-cli checkout saved-card --address <address-id> --cvc 123
//! ```
//!
//! # Environment Variables
//!
//! - `GREENSHOES_API_URL` - Storefront API base URL (required)
//! - `GREENSHOES_SESSION_FILE` - Durable session file
//!   (default: `~/.greenshoes/session.json`)
//! - `GREENSHOES_GUEST_FILE` - Guest session file
//!   (default: `$TMPDIR/greenshoes-guest.json`)
//! - `GREENSHOES_LOG_FORMAT` - `json` for structured logs
//! - `SENTRY_DSN` - Enables error reporting when set

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    AddressAction, CardAction, CartAction, CheckoutFlow, CommandError, OrderAction, WishlistAction,
};

#[derive(Parser)]
#[command(name = "gs-cli")]
#[command(author, version, about = "Greenshoes storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an email or username
    Login {
        /// Email address or username
        login: String,

        #[arg(short, long, env = "GREENSHOES_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat the password
        #[arg(short, long)]
        confirm: String,
    },
    /// Sign out and start a fresh guest session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Check whether an account uses an email
    CheckEmail { email: String },
    /// List products
    Products {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        search: Option<String>,

        /// name-asc, name-desc, price-asc, price-desc or newest
        #[arg(long)]
        sort: Option<String>,

        /// Only products on sale
        #[arg(long)]
        on_sale: bool,
    },
    /// Show one product with its colors, sizes and stock
    Product { id: greenshoes_core::ProductId },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Show or change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Place an order
    Checkout {
        #[command(subcommand)]
        flow: CheckoutFlow,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    /// Saved shipping addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Saved payment card
    Card {
        #[command(subcommand)]
        action: Option<CardAction>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
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
        .unwrap_or_else(|_| "greenshoes_client=info,greenshoes_cli=info".into());
    let json = std::env::var("GREENSHOES_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    // Logs go to stderr; stdout is for command output.
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "Command failed");
        commands::output::failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let store = commands::open_storefront()?;

    match cli.command {
        Commands::Login { login, password } => {
            commands::auth::login(&store, &login, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
            confirm,
        } => commands::auth::register(&store, name, email, password, confirm).await,
        Commands::Logout => {
            commands::auth::logout(&store);
            Ok(())
        }
        Commands::Whoami => {
            commands::auth::whoami(&store);
            Ok(())
        }
        Commands::CheckEmail { email } => commands::auth::check_email(&store, &email).await,
        Commands::Products {
            category,
            search,
            sort,
            on_sale,
        } => commands::catalog::list(&store, category, search, sort.as_deref(), on_sale).await,
        Commands::Product { id } => commands::catalog::show(&store, id).await,
        Commands::Cart { action } => commands::cart::run(&store, action).await,
        Commands::Wishlist { action } => commands::wishlist::run(&store, action).await,
        Commands::Checkout { flow } => commands::checkout::run(&store, flow).await,
        Commands::Orders { action } => commands::account::orders(&store, action).await,
        Commands::Addresses { action } => commands::account::addresses(&store, action).await,
        Commands::Card { action } => commands::account::card(&store, action).await,
    }
}
