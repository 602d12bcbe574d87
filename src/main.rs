use anyhow::Context;
use bullsai::cli::commands::{Cli, Commands};
use bullsai::config::Settings;
use bullsai::BullsAi;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `ask`/`quote` output on stdout stays pipeable JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bullsai=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("loading settings")?;
    let app = BullsAi::new(&settings).context("initializing BullsAI")?;

    run_command(app, &settings, cli.command).await
}

async fn run_command(app: BullsAi, settings: &Settings, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;
            tracing::info!(
                ai_service = app.ai_service_available(),
                stock_service = app.stock_service_available(),
                symbol = %settings.symbol,
                "starting BullsAI"
            );
            bullsai::server::serve(Arc::new(app), addr, &settings.cors_origin).await?;
        }
        Commands::Ask { message, session } => {
            let reply = app.chat(&message, &session).await;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Quote => {
            let overview = app
                .stock_overview()
                .await
                .context("stock service not available")?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        Commands::History { period, interval } => {
            let bars = app
                .historical(&period, &interval)
                .await
                .context("stock service not available")?;
            println!("{}", serde_json::to_string_pretty(&bars)?);
        }
        Commands::Classify { query } => {
            println!("{}", serde_json::to_string_pretty(&app.classify(&query))?);
        }
    }
    Ok(())
}
