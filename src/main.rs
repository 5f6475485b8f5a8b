use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Error, Result};
use futures_util::future::join_all;
use notification_service::{
    api::run_api_server,
    clients::{
        fcm::FcmClient,
        health::HealthChecker,
        rbmq::RabbitMqClient,
        sender::{EmailSender, LogEmailSender, LogPushSender, PushSender},
    },
    config::Config,
    handlers::dispatcher::Dispatcher,
    utils::init_tracing,
    worker::run_consumer,
};
use tokio::{task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Notification service stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Config::load()?;
    let topology = config.topology();

    info!(exchange = %topology.exchange_name, "Starting notification service");

    let broker = Arc::new(RabbitMqClient::connect(&config).await?);
    broker.declare_topology(&topology).await?;

    let email_sender: Arc<dyn EmailSender> = Arc::new(LogEmailSender);
    let push_sender: Arc<dyn PushSender> = match config.fcm_project() {
        Some(project_id) => Arc::new(FcmClient::new(&config, project_id).await?),
        None => {
            warn!("FCM_PROJECT_ID not set, push notifications will only be logged");
            Arc::new(LogPushSender)
        }
    };
    let dispatcher = Dispatcher::new(email_sender, push_sender);

    let shutdown = CancellationToken::new();
    let mut health_checker = HealthChecker::new(Some(Arc::clone(&broker)));
    let mut workers: Vec<JoinHandle<Result<(), Error>>> = Vec::new();

    for queue in &topology.queues {
        let consumer = broker
            .create_consumer(&queue.name, config.prefetch_count)
            .await?;
        let (deliveries, acknowledger) = consumer.into_parts();
        let dispatcher = dispatcher.clone().scoped(&queue.channels);
        let health = health_checker.track_consumer(&queue.name);
        let queue_name = queue.name.clone();
        let shutdown = shutdown.clone();

        workers.push(tokio::spawn(async move {
            let outcome = run_consumer(
                &queue_name,
                deliveries,
                &acknowledger,
                &dispatcher,
                shutdown.clone(),
            )
            .await;

            health.mark_stopped();

            if let Err(e) = acknowledger.cancel().await {
                warn!(queue = %queue_name, error = %e, "Consumer cancel failed");
            }

            if outcome.is_err() {
                // A dead loop means the worker is no longer serving its queue.
                shutdown.cancel();
            }

            outcome.map(|_| ())
        }));
    }

    let api_shutdown = shutdown.clone();
    let server_port = config.server_port;
    let api = tokio::spawn(async move {
        if let Err(e) = run_api_server(server_port, health_checker, api_shutdown).await {
            error!(error = %e, "Health check server failed");
        }
    });

    info!("Notification service started, waiting for messages");

    tokio::select! {
        _ = wait_for_signal() => info!("Shutdown signal received"),
        _ = shutdown.cancelled() => warn!("A consumer loop stopped, shutting down"),
    }
    shutdown.cancel();

    let grace = Duration::from_secs(config.shutdown_grace_seconds);
    let mut failure: Option<Error> = None;

    match timeout(grace, join_all(workers)).await {
        Ok(results) => {
            for result in results {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => failure = Some(e),
                    Err(e) => failure = Some(Error::new(e)),
                }
            }
        }
        Err(_) => warn!(
            grace_seconds = config.shutdown_grace_seconds,
            "Grace period expired, abandoning in-flight messages to broker redelivery"
        ),
    }

    let _ = api.await;

    if let Err(e) = broker.close().await {
        warn!(error = %e, "RabbitMQ connection close failed");
    }

    info!("Notification service stopped");

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
