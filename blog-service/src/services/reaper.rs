use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use super::auth::AuthService;

const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically remove expired verification codes.
///
/// The first pass runs immediately. Failures are logged and the loop keeps
/// going; abort the returned handle to stop it.
pub fn spawn_code_reaper(auth: AuthService, every: Duration) -> JoinHandle<()> {
    let period = every.max(MIN_REAP_INTERVAL);

    tokio::spawn(async move {
        tracing::info!(interval_secs = period.as_secs(), "Starting verification code reaper");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = auth.reap_expired_codes().await {
                tracing::warn!(error = %e, "Verification code reap failed");
            }
        }
    })
}
