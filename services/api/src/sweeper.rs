//! Periodic sweep moving ended bets from `Open` to `Pending`

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::{error::ApiResult, lifecycle::BetLifecycle};

#[derive(Clone)]
pub struct ExpirySweeper {
    lifecycle: BetLifecycle,
}

impl ExpirySweeper {
    pub fn new(lifecycle: BetLifecycle) -> Self {
        Self { lifecycle }
    }

    /// Run one sweep now; returns how many bets moved
    pub async fn run_once(&self) -> ApiResult<usize> {
        self.lifecycle.sweep_expired(Utc::now()).await
    }

    /// Schedule the sweep; the returned scheduler must be kept alive
    pub async fn start(self, schedule: &str) -> Result<JobScheduler> {
        let sweeper = self;
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let sweeper = sweeper.clone();
            Box::pin(async move {
                if let Err(e) = sweeper.run_once().await {
                    error!("Expiry sweep failed: {}", e);
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started expiry sweeper with schedule: {}", schedule);
        Ok(scheduler)
    }
}
