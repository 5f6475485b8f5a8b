use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    handlers::{
        dispatcher::Dispatcher,
        router::{Route, route},
    },
    models::{dispatch::DispatchResult, retry::RetryConfig, validation::decode_envelope},
};

/// Decode, route and dispatch one broker body. Never fails: every problem is
/// folded into the returned result so the consumer loop can settle the message.
pub async fn process_message(body: &[u8], dispatcher: &Dispatcher) -> DispatchResult {
    let envelope = match decode_envelope(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(
                error = %e,
                raw_body = %String::from_utf8_lossy(body),
                "Dropping undecodable message"
            );
            return DispatchResult::PermanentFailure;
        }
    };

    info!(
        notification_type = %envelope.notification_type,
        user_id = %envelope.recipient.user_id,
        receive_push = envelope.recipient.prefs.receive_push,
        receive_email = envelope.recipient.prefs.receive_email,
        sender_service = envelope.sender_service.as_deref().unwrap_or_default(),
        "Decoded notification message"
    );

    let strategy = match route(&envelope.notification_type) {
        Route::Handler(strategy) => strategy,
        Route::Unrecognized => {
            warn!(
                notification_type = %envelope.notification_type,
                "Unrecognized notification type, acknowledging without delivery"
            );
            return DispatchResult::Success;
        }
    };

    strategy.log_event(&envelope);

    let result = dispatcher.dispatch(strategy, &envelope).await;

    if result == DispatchResult::PermanentFailure {
        error!(
            notification_type = %envelope.notification_type,
            user_id = %envelope.recipient.user_id,
            "Dispatch failed permanently, operator attention required"
        );
    }

    result
}

pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        attempt,
                        max_attempts = config.max_attempts,
                        "Retry succeeded"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(
                        max_attempts = config.max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                debug!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms,
                    error = %e,
                    "Retry attempt failed, backing off"
                );

                let jitter = rand::random_range(-0.1..=0.1);

                let jittered_delay = (delay_ms as f64 * (1.0 + jitter)) as u64;

                sleep(Duration::from_millis(jittered_delay)).await;

                delay_ms = std::cmp::min(
                    delay_ms.saturating_mul(config.backoff_multiplier),
                    config.max_delay_ms,
                );
            }
        }
    }
}

/// JSON logs filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().json().with_env_filter(filter).with_target(false).init();
}
