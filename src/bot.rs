use log::{ error, info, warn };
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::gateway::{ BotIdentity, ChatGateway, GatewayError };

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct LaunchPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Verifies the gateway until it answers or `policy.attempts` run out.
pub async fn launch(
    gateway: &dyn ChatGateway,
    policy: LaunchPolicy
) -> Result<BotIdentity, GatewayError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match gateway.verify().await {
            Ok(identity) => {
                return Ok(identity);
            }
            Err(e) if attempt < attempts => {
                error!("Failed to start bot (attempt {}/{}): {}", attempt, attempts, e);
                info!("Retrying in {} seconds...", policy.delay.as_secs());
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Failed to start bot (attempt {}/{}): {}", attempt, attempts, e);
                error!(
                    "All retry attempts failed. Please check your internet connection and bot token."
                );
                return Err(e);
            }
        }
    }
}

/// Polls `gateway` and feeds the dispatcher until `shutdown` resolves, then
/// drains the per-user workers.
pub async fn run_until<F>(gateway: Arc<dyn ChatGateway>, mut dispatcher: Dispatcher, shutdown: F)
    where F: Future<Output = ()>
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            batch = gateway.poll() => match batch {
                Ok(events) => {
                    for event in events {
                        dispatcher.dispatch(event);
                    }
                }
                Err(e) => {
                    warn!("Polling failed: {}", e);
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            },
        }
    }

    info!("👋 Shutting down bot...");
    dispatcher.shutdown().await;
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
