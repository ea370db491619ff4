//! Worker entry-point: loads settings, wires adapters and runs one pass over
//! every stored credential.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use review_sync::config::{SettingsError, SyncSettings};
use review_sync::domain::ports::KeyValueStoreError;
use review_sync::domain::{
    CredentialSource, ReconcilerConfig, ReviewReconciler, RunSummary, SyncRunError, SyncRunner,
};
use review_sync::outbound::AdapterBuildError;
use review_sync::outbound::orcid::OrcidHttpClient;
use review_sync::outbound::rate_gate::GovernorRateGate;
use review_sync::outbound::redis_store::{RedisKeyValueStore, RedisPoolConfig};
use review_sync::outbound::zenodo::ZenodoHttpSource;
use review_sync::telemetry;

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load settings: {0}")]
    Load(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to connect to Redis: {0}")]
    Store(#[from] KeyValueStoreError),
    #[error(transparent)]
    Adapter(#[from] AdapterBuildError),
    #[error(transparent)]
    Run(#[from] SyncRunError),
}

/// Application bootstrap.
#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_or_report(io::stderr().lock());

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    match run(&shutdown).await {
        Ok(summary) => {
            if summary.users_failed > 0 || summary.decisions_failed > 0 {
                warn!(
                    users_failed = summary.users_failed,
                    decisions_failed = summary.decisions_failed,
                    "Run finished with failures"
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Review sync failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(shutdown: &CancellationToken) -> Result<RunSummary, StartupError> {
    let settings = SyncSettings::load().map_err(|err| StartupError::Load(err.to_string()))?;
    let config = settings.validate()?;

    let store = RedisKeyValueStore::connect(
        RedisPoolConfig::new(config.redis_url.as_str())
            .with_max_size(config.redis_pool_size)
            .with_connection_timeout(config.http_timeout),
    )
    .await?;
    let Some(rate_gate) = GovernorRateGate::new(config.zenodo_interval) else {
        return Err(SettingsError::NotPositive {
            name: "zenodo_interval_millis",
        }
        .into());
    };
    let repository = ZenodoHttpSource::new(
        &config.zenodo_url,
        config.http_timeout,
        Arc::new(rate_gate),
    )?;
    let profile = OrcidHttpClient::new(&config.orcid_url, config.http_timeout)?;

    let runner = SyncRunner::new(
        CredentialSource::new(Arc::new(store)),
        ReviewReconciler::new(
            Arc::new(repository),
            Arc::new(profile),
            ReconcilerConfig {
                max_concurrent_writes: config.max_concurrent_writes,
            },
        ),
    );

    info!(
        zenodo_url = %config.zenodo_url,
        orcid_url = %config.orcid_url,
        "Starting review sync"
    );
    Ok(runner.run(shutdown).await?)
}

fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received; finishing the current user");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "SIGTERM handler unavailable; listening for Ctrl-C only");
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Ctrl-C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
