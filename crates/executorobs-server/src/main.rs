use anyhow::Result;
use clap::Parser;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use executorobs::DrainStatus;
use executorobs_server::server::config::{Config, ConfigArgs};
use executorobs_server::server::interceptor::LoggingInterceptor;
use executorobs_server::server::utils::{self, port_in_range};
use executorobs_server::server::{init_router, ServerState};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct App {
    #[clap(flatten)]
    pub config_args: ConfigArgs,

    #[arg(value_parser = port_in_range)]
    #[clap(short, long, default_value = "3000")]
    pub port: u16,

    #[clap(long, default_value = "127.0.0.1")]
    pub host: IpAddr,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<ExitCode> {
    let args = App::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                eprintln!("No environment variables found that can initialize tracing_subscriber::EnvFilter. Using defaults.");

                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                "executorobs=trace,executorobs_server=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    let config = Config::load(&args.config_args)?;
    tracing::info!("Using {:?}", config);

    let grace = config.shutdown_grace();
    let state = Arc::new(ServerState::new(config)?);
    let executor = state.executor().clone();

    let router = init_router(state, Arc::new(LoggingInterceptor));

    let listener = TcpListener::bind((args.host, args.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await?;

    // Blocks for up to the grace period, keep it off the async workers
    let status = tokio::task::spawn_blocking(move || executor.shutdown(grace)).await?;
    match status {
        DrainStatus::Drained => tracing::info!("Worker drained, exiting"),
        DrainStatus::TimedOut { pending } => {
            tracing::warn!("Exiting with {} unit(s) discarded", pending)
        }
    }

    Ok(ExitCode::SUCCESS)
}
