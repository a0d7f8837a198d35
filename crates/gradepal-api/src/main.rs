//! GradePal CLI and REST API entry point.
//!
//! Binary name: `gradepal`
//!
//! Parses CLI arguments, initializes tracing, then either starts the REST
//! API server, runs a client command against a server, or performs an
//! operator command on the local database.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::client::ApiClient;
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,gradepal=debug",
        _ => "trace",
    };
    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    // Serving always logs requests at info unless asked to be quiet.
    let filter = match (&cli.command, cli.verbose, cli.quiet) {
        (Commands::Serve { .. }, 0, false) => "info",
        _ => filter,
    };
    gradepal_observe::tracing_setup::init_tracing(filter, otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let result = run(cli).await;
    gradepal_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host, .. } => {
            let state = AppState::init().await?;
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} GradePal API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let shutdown = state.shutdown.clone();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    // Open streams end so graceful shutdown can finish.
                    shutdown.cancel();
                })
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Chat { server, thread } => {
            let (config, _) = state::load_settings().await?;
            let client = ApiClient::new(&server.server, &server.token);
            cli::chat::loop_runner::run_chat_loop(&client, &server.server, &config.client, thread)
                .await?;
        }

        Commands::Threads { server } => {
            let client = ApiClient::new(&server.server, &server.token);
            cli::threads::list_threads(&client, cli.json).await?;
        }

        Commands::History { server, thread } => {
            let client = ApiClient::new(&server.server, &server.token);
            cli::threads::show_history(&client, thread, cli.json).await?;
        }

        Commands::AddUser {
            username,
            full_name,
            role,
            student_number,
        } => {
            let pool = local_database().await?;
            cli::admin::add_user(
                pool,
                &username,
                &full_name,
                role,
                student_number.as_deref(),
                cli.json,
            )
            .await?;
        }

        Commands::IssueToken { username } => {
            let pool = local_database().await?;
            cli::admin::issue_token(pool, &username, cli.json).await?;
        }

        Commands::SeedDemo => {
            let pool = local_database().await?;
            cli::admin::seed_demo(pool, cli.json).await?;
        }
    }

    Ok(())
}

async fn local_database() -> anyhow::Result<gradepal_infra::sqlite::pool::DatabasePool> {
    let (_, data_dir) = state::load_settings().await?;
    state::open_database(&data_dir).await
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
