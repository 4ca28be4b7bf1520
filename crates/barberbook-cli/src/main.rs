//! barberbook - command-line client for booking barbershop appointments.
//!
//! Every screen command first runs the session guard for its route, so a
//! signed-out user is pointed at `barberbook login` instead of seeing a
//! failed request.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use barberbook_core::{ApiClient, Config, RouteTable, SessionContext, SessionGuard};

const USAGE: &str = "\
Usage: barberbook <command> [args]

Commands:
  login [email]                 Sign in
  register                      Create an account
  logout                        Sign out
  reset-password <email>        Send a password reset e-mail
  status                        Show the current session
  open <route>                  Run the guard for a route (e.g. /profile)
  services                      List services
  appointments                  List appointments
  book <customer> <user> <when> <total>
                                Book an appointment (when: RFC 3339)
  cancel <appointment-id>       Cancel an appointment
";

/// Initialize the tracing subscriber for logging.
/// Logs go to stderr and to a daily file in the cache directory.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "barberbook.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

pub struct App {
    pub config: Config,
    pub session: Arc<SessionContext>,
    pub guard: SessionGuard,
    pub api: ApiClient,
}

impl App {
    async fn new(config: Config) -> Result<Self> {
        let session = SessionContext::from_config(&config).await?;
        let guard = SessionGuard::new(session.clone(), RouteTable::default());
        let api = ApiClient::new(&config, session.clone())?;
        Ok(Self {
            config,
            session,
            guard,
            api,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _log_guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprint!("{}", USAGE);
        return Ok(());
    };
    if command == "--help" || command == "-h" || command == "help" {
        print!("{}", USAGE);
        return Ok(());
    }

    info!(command = %command, "barberbook starting");
    let mut app = App::new(config).await?;
    let rest = &args[1..];

    let result = match command.as_str() {
        "login" => commands::login(&mut app, rest.first().map(String::as_str)).await,
        "register" => commands::register(&app).await,
        "logout" => commands::logout(&app).await,
        "reset-password" => commands::reset_password(&app, rest).await,
        "status" => commands::status(&app).await,
        "open" => commands::open(&app, rest).await,
        "services" => commands::services(&app).await,
        "appointments" => commands::appointments(&app).await,
        "book" => commands::book(&app, rest).await,
        "cancel" => commands::cancel(&app, rest).await,
        other => {
            eprint!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
