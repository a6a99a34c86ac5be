use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::MaintenanceSettings;
use crate::database::{connection::DatabaseManager, models::*};
use crate::utils::logging::log_system_event;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_profiles: u64,
    pub expired_ride_requests: u64,
}

/// Garbage collection of idle profiles and stale ride requests.
pub struct MaintenanceService {
    db: Arc<DatabaseManager>,
    settings: MaintenanceSettings,
    scheduler: JobScheduler,
}

impl MaintenanceService {
    pub async fn new(
        db: Arc<DatabaseManager>,
        settings: MaintenanceSettings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            db,
            settings,
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Sweep once daily at 3 AM UTC
        let db = self.db.clone();
        let settings = self.settings.clone();

        let sweep_job = Job::new_async("0 0 3 * * *", move |_uuid, _l| {
            let db = db.clone();
            let settings = settings.clone();
            Box::pin(async move {
                if let Err(e) = run_sweep(&db, &settings, Utc::now()).await {
                    tracing::error!("Maintenance sweep failed: {}", e);
                }
            })
        })?;

        self.scheduler.add(sweep_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Maintenance service started - sweeping daily at 3 AM UTC");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    pub async fn sweep_now(&self) -> Result<SweepReport, sqlx::Error> {
        run_sweep(&self.db, &self.settings, Utc::now()).await
    }
}

/// Deletes profiles idle for longer than the profile TTL (their courses,
/// ride requests and notification markers cascade) and ride requests older
/// than the request TTL. Running it twice in a row is a no-op the second time.
pub async fn run_sweep(
    db: &DatabaseManager,
    settings: &MaintenanceSettings,
    now: DateTime<Utc>,
) -> Result<SweepReport, sqlx::Error> {
    let profile_cutoff = now - Duration::days(settings.profile_ttl_days);
    let request_cutoff = now - Duration::hours(settings.ride_request_ttl_hours);

    let expired_profiles = Profile::delete_inactive_since(&db.pool, profile_cutoff).await?;
    let expired_ride_requests = RideRequest::delete_created_before(&db.pool, request_cutoff).await?;

    let report = SweepReport {
        expired_profiles,
        expired_ride_requests,
    };

    log_system_event(
        "maintenance sweep",
        Some(&format!(
            "{} profiles and {} ride requests expired",
            report.expired_profiles, report.expired_ride_requests
        )),
    );

    Ok(report)
}
