//! check42 - A multi-user to-do list service.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use check42::{
    api::{create_router, RouterConfig, Server},
    config::Config,
    store::{MemoryStore, MySqlStore, TodoStore, UserStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let auth = match config.auth_config() {
        Ok(auth) => auth,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Print startup banner and info
    print_banner();

    info!("Configuration:");
    info!("  Session lifetime: {}s", auth.token_ttl.as_secs());
    if auth.password_salt.is_empty() {
        warn!("  Password salt: not set (PW_SALT)");
    }
    if !auth.secure_cookies {
        info!("  Session cookie: not marked Secure (enable with --secure-cookies behind HTTPS)");
    }

    // Connect storage
    let (users, todos): (Arc<dyn UserStore>, Arc<dyn TodoStore>) = if config.in_memory {
        warn!("  Storage: IN MEMORY - all data is lost on exit");
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store)
    } else {
        info!(
            "  Storage: mysql://{}@{}:{}/{}",
            config.db_user, config.db_host, config.db_port, config.db_name
        );
        info!("");
        info!("Connecting to database...");
        match MySqlStore::connect(config.mysql_options(), config.db_retries).await {
            Ok(store) => {
                let store = Arc::new(store);
                (store.clone(), store)
            }
            Err(e) => {
                error!("  Failed to connect to database: {}", e);
                error!("");
                error!("  Please check:");
                error!("    - The database server is running and reachable");
                error!("    - DB_USER / DB_PASSWORD are correct");
                error!("    - The database '{}' exists", config.db_name);
                return ExitCode::FAILURE;
            }
        }
    };

    // Build the route table; any misconfiguration is fatal
    let server = Arc::new(Server::new(users, todos, auth));
    let router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    let router = match create_router(server, router_config) {
        Ok(router) => router,
        Err(e) => {
            error!("Route configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl -X POST http://{}/auth/signin \\", addr);
    info!("         -H 'content-type: application/json' \\");
    info!("         -d '{{\"name\":\"ada\",\"email\":\"ada@example.com\",\"password\":\"...\"}}'");
    info!("    curl -X POST -u ada:... -c jar http://{}/auth/login", addr);
    info!("    curl -b jar http://{}/api/todo", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!(" ██████╗██╗  ██╗███████╗ ██████╗██╗  ██╗██╗  ██╗██████╗ ");
    info!("██╔════╝██║  ██║██╔════╝██╔════╝██║ ██╔╝██║  ██║╚════██╗");
    info!("██║     ███████║█████╗  ██║     █████╔╝ ███████║ █████╔╝");
    info!("██║     ██╔══██║██╔══╝  ██║     ██╔═██╗ ╚════██║██╔═══╝ ");
    info!("╚██████╗██║  ██║███████╗╚██████╗██║  ██╗     ██║███████╗");
    info!(" ╚═════╝╚═╝  ╚═╝╚══════╝ ╚═════╝╚═╝  ╚═╝     ╚═╝╚══════╝");
    info!("");
    info!("                                                  v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "check42=debug,tower_http=debug"
    } else {
        "check42=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
