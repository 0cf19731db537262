//! Periodic expiry sweep.
//!
//! One background task drives both batch jobs: clearing lapsed trials
//! (plan reset + family cascade) and transitioning stale pending invites.
//! Each tick is independent; a failing sweep logs and waits for the next
//! interval.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{info, warn};

use vidra_core::family::service::FamilyService;

pub fn spawn_expiry_job(
    family: Arc<FamilyService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = interval.as_secs(), "expiry sweep started");

        loop {
            ticker.tick().await;
            let now = Utc::now();

            match family.expire_trials(now).await {
                Ok(processed) if processed > 0 => {
                    info!(processed, "trial expiry sweep completed");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "trial expiry sweep failed"),
            }

            if let Err(err) = family.expire_invites(now).await {
                warn!(error = %err, "invite expiry sweep failed");
            }
        }
    })
}
