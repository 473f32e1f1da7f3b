//! Subscription renewal scheduler
//!
//! Cron-driven keepalive for the Graph change-notification subscription.
//! Join handles are tracked, cancellation is explicit, and every job run is
//! wrapped in a timeout. Renewal failures are logged and retried on the next
//! tick rather than propagated.

use std::sync::Arc;
use std::time::Duration;

use meetbridge_core::{EnsureOutcome, SubscriptionManager};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the renewal scheduler.
#[derive(Debug, Clone)]
pub struct RenewalSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single renewal run.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for RenewalSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 0 3 * * *".into(), // daily at 03:00
            job_timeout: Duration::from_secs(120),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Subscription renewal scheduler with explicit lifecycle management.
pub struct RenewalScheduler {
    scheduler: Option<JobScheduler>,
    config: RenewalSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    manager: Arc<SubscriptionManager>,
}

impl RenewalScheduler {
    /// Create a scheduler with the default configuration and the given cron
    /// expression.
    pub fn new(cron_expression: String, manager: Arc<SubscriptionManager>) -> Self {
        let config = RenewalSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, manager)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: RenewalSchedulerConfig, manager: Arc<SubscriptionManager>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            manager,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!(cron = %self.config.cron_expression, "Renewal scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??
        }

        info!("Renewal scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        let cron_expr = self.config.cron_expression.clone();
        let manager = self.manager.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let manager = manager.clone();

            Box::pin(async move {
                match tokio::time::timeout(job_timeout, manager.ensure_subscription()).await {
                    Ok(Ok(EnsureOutcome::Renewed(id))) => {
                        debug!(subscription_id = %id, "scheduled renewal extended subscription");
                    }
                    Ok(Ok(EnsureOutcome::Created(id))) => {
                        info!(subscription_id = %id, "scheduled renewal created fresh subscription");
                    }
                    Ok(Ok(EnsureOutcome::NotAuthenticated)) => {
                        debug!("scheduled renewal skipped; not authenticated");
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "scheduled subscription renewal failed");
                    }
                    Err(elapsed) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "subscription renewal timed out");
                        debug!(elapsed = ?elapsed, "Timeout details");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered renewal job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Renewal scheduler monitor cancelled");
    }
}

impl Drop for RenewalScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("RenewalScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use meetbridge_core::{AccessTokenProvider, SettingsStore};
    use meetbridge_domain::Result;

    use super::*;

    struct NoTokens;

    #[async_trait]
    impl AccessTokenProvider for NoTokens {
        async fn access_token(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct NoSettings;

    #[async_trait]
    impl SettingsStore for NoSettings {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    struct UnreachableApi;

    #[async_trait]
    impl meetbridge_core::CalendarApi for UnreachableApi {
        async fn fetch_event_resource(
            &self,
            _token: &str,
            _url: &str,
        ) -> Result<meetbridge_domain::GraphEvent> {
            unreachable!("unauthenticated scheduler never reaches the API")
        }

        async fn get_event(
            &self,
            _token: &str,
            _event_id: &str,
        ) -> Result<meetbridge_domain::GraphEvent> {
            unreachable!()
        }

        async fn create_event(
            &self,
            _token: &str,
            _body: &meetbridge_domain::EventCreateRequest,
        ) -> Result<meetbridge_domain::GraphEvent> {
            unreachable!()
        }

        async fn patch_event_attendees(
            &self,
            _token: &str,
            _event_id: &str,
            _body: &meetbridge_domain::EventAttendeesPatch,
        ) -> Result<()> {
            unreachable!()
        }

        async fn patch_event_times(
            &self,
            _token: &str,
            _event_id: &str,
            _body: &meetbridge_domain::EventTimesPatch,
        ) -> Result<()> {
            unreachable!()
        }

        async fn delete_event(&self, _token: &str, _event_id: &str) -> Result<()> {
            unreachable!()
        }

        async fn find_event_id_by_join_url(
            &self,
            _token: &str,
            _join_url: &str,
        ) -> Result<Option<String>> {
            unreachable!()
        }

        async fn get_online_meeting(
            &self,
            _token: &str,
            _meeting_id: &str,
        ) -> Result<meetbridge_domain::GraphOnlineMeeting> {
            unreachable!()
        }

        async fn patch_online_meeting_participants(
            &self,
            _token: &str,
            _meeting_id: &str,
            _body: &meetbridge_domain::OnlineMeetingParticipantsPatch,
        ) -> Result<()> {
            unreachable!()
        }

        async fn patch_online_meeting_times(
            &self,
            _token: &str,
            _meeting_id: &str,
            _body: &meetbridge_domain::OnlineMeetingTimesPatch,
        ) -> Result<()> {
            unreachable!()
        }

        async fn delete_online_meeting(&self, _token: &str, _meeting_id: &str) -> Result<()> {
            unreachable!()
        }

        async fn find_online_meeting_id_by_join_url(
            &self,
            _token: &str,
            _join_url: &str,
        ) -> Result<Option<String>> {
            unreachable!()
        }

        async fn create_subscription(
            &self,
            _token: &str,
            _request: &meetbridge_domain::SubscriptionRequest,
        ) -> Result<meetbridge_domain::GraphSubscription> {
            unreachable!()
        }

        async fn renew_subscription(
            &self,
            _token: &str,
            _subscription_id: &str,
            _expires_at: &str,
        ) -> Result<bool> {
            unreachable!()
        }
    }

    fn manager() -> Arc<SubscriptionManager> {
        Arc::new(SubscriptionManager::new(
            Arc::new(NoTokens),
            Arc::new(UnreachableApi),
            Arc::new(NoSettings),
            "https://bridge.example.com/webhook/graph",
        ))
    }

    fn fast_config() -> RenewalSchedulerConfig {
        RenewalSchedulerConfig {
            cron_expression: "*/1 * * * * *".into(),
            job_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let mut scheduler = RenewalScheduler::with_config(fast_config(), manager());

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        tokio::time::sleep(Duration::from_millis(1200)).await;
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let mut scheduler = RenewalScheduler::with_config(fast_config(), manager());

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_is_rejected() {
        let mut scheduler = RenewalScheduler::with_config(fast_config(), manager());

        let err = scheduler.stop().await.expect_err("stop fails");
        assert!(matches!(err, SchedulerError::NotRunning));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let mut scheduler = RenewalScheduler::with_config(fast_config(), manager());

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }
}
