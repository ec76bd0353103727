//! Inquisitor service entrypoint.
//!
//! Mirrors tracked pull requests into chat threads on a fixed cadence and
//! serves the GitHub webhook and chat interaction endpoints.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use inquisitor::chat::{ChannelId, ChatError, ChatGateway, DiscordRestGateway};
use inquisitor::config::ConfigError;
use inquisitor::github::{GitHubError, OctocrabGateway, PersonalAccessToken, PullRequestGateway};
use inquisitor::interaction::{
    InteractionEndpoint, InteractionError, InteractionHandler, RESPONSE_DEADLINE,
};
use inquisitor::persistence::{
    LinkedAccountStore, PersistenceError, SqliteSnapshotStore, TokenCipher, migrate_database,
};
use inquisitor::sync::{DiffNotifyEngine, PullRequestTracker, SyncScheduler};
use inquisitor::telemetry::{TelemetrySink, TracingTelemetrySink};
use inquisitor::tracking::TrackedSet;
use inquisitor::webhook::{PingHandler, PushHandler, WebhookDispatcher};
use inquisitor::{InquisitorConfig, logging, server};
use ortho_config::OrthoConfig;
use thiserror::Error;

/// Failures that stop the service from starting or keep it from serving.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error("invalid webhook_bind address {address}: {message}")]
    Bind { address: String, message: String },
    #[error("server failed: {0}")]
    Serve(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "inquisitor stopped");
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = load_config()?;
    logging::init(&config.log_filter);
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(TracingTelemetrySink);

    let database_url = config.require_database_url()?.to_owned();
    let schema = migrate_database(&database_url, telemetry.as_ref())?;
    if config.migrate_db {
        tracing::info!(schema_version = schema.as_str(), "database migrated");
        return Ok(());
    }

    let accounts = linked_accounts(&config, &database_url)?;
    let token = PersonalAccessToken::new(config.resolve_github_token()?)?;
    let github: Arc<dyn PullRequestGateway> =
        Arc::new(OctocrabGateway::for_token(&token, &config.github_api_base)?);
    let chat: Arc<dyn ChatGateway> = Arc::new(DiscordRestGateway::new(
        config.require_discord_token()?,
        &config.discord_api_base,
        application_id(&config)?,
    )?);
    let channel = ChannelId::new(config.require_channel_id()?);

    let store = Arc::new(SqliteSnapshotStore::new(database_url)?);
    let tracked = Arc::new(TrackedSet::load(store)?);
    tracing::info!(tracked = tracked.len(), "tracked pull requests loaded");

    let engine = Arc::new(DiffNotifyEngine::new(
        Arc::clone(&tracked),
        Arc::clone(&github),
        Arc::clone(&chat),
        channel,
    ));
    let scheduler = Arc::new(SyncScheduler::new(
        engine,
        config.sync_settings()?,
        Arc::clone(&telemetry),
    ));
    let sync_task = scheduler.spawn();

    let dispatcher = WebhookDispatcher::new(config.webhook_secret.clone(), telemetry)
        .with_handler(Arc::new(PingHandler))
        .with_handler(Arc::new(PushHandler::new(
            Arc::clone(&tracked),
            Arc::clone(&chat),
        )));
    let interactions = interaction_endpoint(
        &config,
        InteractionParts {
            tracked,
            github,
            chat,
            channel,
            accounts,
        },
    )?;

    let address = bind_address(&config.webhook_bind)?;
    let app = server::router(Arc::new(dispatcher), interactions);
    server::serve(address, app, shutdown_signal()).await?;

    sync_task.abort();
    tracing::info!("inquisitor shut down");
    Ok(())
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when ortho-config fails to parse arguments
/// or load configuration files.
fn load_config() -> Result<InquisitorConfig, ConfigError> {
    InquisitorConfig::load().map_err(|error| ConfigError::Load {
        message: error.to_string(),
    })
}

fn application_id(config: &InquisitorConfig) -> Result<u64, ConfigError> {
    match (config.discord_application_id, &config.discord_public_key) {
        (Some(id), _) => Ok(id),
        (None, Some(_)) => Err(ConfigError::Missing("discord_application_id")),
        (None, None) => Ok(0),
    }
}

/// Opens the linked-account store when an encryption password is set.
fn linked_accounts(
    config: &InquisitorConfig,
    database_url: &str,
) -> Result<Option<LinkedAccountStore>, PersistenceError> {
    let Some(password) = config.encryption_password.as_deref() else {
        tracing::info!("encryption_password is unset; chat edits are made as the bot");
        return Ok(None);
    };
    let cipher = TokenCipher::from_password(password)?;
    LinkedAccountStore::new(database_url, cipher).map(Some)
}

struct InteractionParts {
    tracked: Arc<TrackedSet>,
    github: Arc<dyn PullRequestGateway>,
    chat: Arc<dyn ChatGateway>,
    channel: ChannelId,
    accounts: Option<LinkedAccountStore>,
}

fn interaction_endpoint(
    config: &InquisitorConfig,
    parts: InteractionParts,
) -> Result<Option<Arc<InteractionEndpoint>>, StartupError> {
    let Some(public_key) = config.discord_public_key.as_deref() else {
        tracing::warn!("discord_public_key is unset; /interactions is disabled");
        return Ok(None);
    };
    let InteractionParts {
        tracked,
        github,
        chat,
        channel,
        accounts,
    } = parts;
    let organization = config.require_organization()?;
    let tracker = Arc::new(PullRequestTracker::new(
        Arc::clone(&tracked),
        Arc::clone(&github),
        Arc::clone(&chat),
        channel,
        organization,
    ));
    let mut handler = InteractionHandler::new(tracked, tracker, github, chat);
    if let Some(store) = accounts {
        let api_base = config.github_api_base.clone();
        handler = handler.with_linked_accounts(store, move |token| {
            let gateway = OctocrabGateway::for_token(token, &api_base)?;
            Ok(Arc::new(gateway) as Arc<dyn PullRequestGateway>)
        });
    }
    let endpoint = InteractionEndpoint::new(public_key, Arc::new(handler), RESPONSE_DEADLINE)?;
    Ok(Some(Arc::new(endpoint)))
}

fn bind_address(raw: &str) -> Result<SocketAddr, StartupError> {
    raw.parse().map_err(|error: std::net::AddrParseError| StartupError::Bind {
        address: raw.to_owned(),
        message: error.to_string(),
    })
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
}
