// ticket-gateway-rs/src/main.rs
// Ticket Gateway - HTTP entry point for diagnostic reports
//
// Wires the Jira client, optional S3 screenshot storage and the optional
// NDJSON ticket store into the ticket engine and serves the HTTP routes.

use std::sync::Arc;

use config_rs::GatewaySettings;
use ticket_engine::{AssigneeSelector, EngineConfig, TicketOrchestrator};
use ticket_gateway::TicketGateway;
use ticket_sdk::{FileTicketStore, ObjectStorage, ServiceClient, TicketStore, TicketSystem};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_path = config_rs::load_dotenv();

    let settings = GatewaySettings::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.log_level.as_str())).init();

    log::info!("Starting {} ({})", ticket_gateway::SERVICE_NAME, settings.environment);
    match dotenv_path {
        Some(path) => log::debug!("Loaded environment from {}", path.display()),
        None => log::debug!("No .env file found, using process environment"),
    }

    let jira = Arc::new(ticket_sdk::jira_client()?);
    log::info!("Jira project {} at {}", jira.project_key(), jira.base_url());

    if settings.support_team.is_empty() {
        log::warn!("SUPPORT_TEAM_MEMBERS is empty, tickets will be unassigned");
    } else {
        log::info!("Assigning tickets across {} support team members", settings.support_team.len());
    }

    let mut orchestrator = TicketOrchestrator::new(
        EngineConfig::new(jira.project_key()),
        jira.clone() as Arc<dyn TicketSystem>,
        AssigneeSelector::with_thread_rng(settings.support_team.clone()),
    );

    match FileTicketStore::from_env() {
        Ok(store) => {
            log::info!("Persisting tickets to {}", store.path().display());
            orchestrator = orchestrator.with_store(Arc::new(store) as Arc<dyn TicketStore>);
        }
        Err(err) => log::warn!("Ticket store disabled: {}", err),
    }

    let mut gateway = TicketGateway::new(Arc::new(orchestrator)).with_jira_probe(jira as Arc<dyn ServiceClient>);

    match ticket_sdk::s3_client() {
        Ok(s3) => {
            let s3 = Arc::new(s3);
            log::info!("Uploading screenshots to {}", s3.base_url());
            gateway = gateway
                .with_storage(s3.clone() as Arc<dyn ObjectStorage>)
                .with_storage_probe(s3 as Arc<dyn ServiceClient>);
        }
        Err(err) => log::warn!("Screenshot storage disabled: {}", err),
    }

    let app = Arc::new(gateway).create_router(&settings);

    let listener = tokio::net::TcpListener::bind(settings.bind_address).await?;
    log::info!("Ticket gateway listening on {}", settings.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Ticket gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
