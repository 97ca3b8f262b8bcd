//! Modification-time polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{ConfigError, Result};
use crate::observability::metrics;
use crate::store::Configuration;

/// Unit of [`PollingConfig::interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

/// Polling settings, typically embedded in a host application's own config.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Number of `unit`s between checks. Must be positive.
    pub interval: u64,

    /// Unit of `interval`. Required.
    pub unit: Option<TimeUnit>,
}

impl PollingConfig {
    pub fn new(interval: u64, unit: TimeUnit) -> Self {
        Self {
            interval,
            unit: Some(unit),
        }
    }

    /// The polling period, or `InvalidArgument` for a zero interval, a
    /// missing unit, or a period too long to schedule.
    pub fn period(&self) -> Result<Duration> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidArgument(
                "polling interval must be greater than 0".to_string(),
            ));
        }
        let unit = self.unit.ok_or_else(|| {
            ConfigError::InvalidArgument("no polling time unit specified".to_string())
        })?;
        let period = match unit {
            TimeUnit::Milliseconds => Duration::from_millis(self.interval),
            TimeUnit::Seconds => Duration::from_secs(self.interval),
            TimeUnit::Minutes => Duration::from_secs(self.interval.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(self.interval.saturating_mul(3600)),
        };
        // the ticker computes deadlines as `now + period`
        if Instant::now().checked_add(period).is_none() {
            return Err(ConfigError::InvalidArgument(format!(
                "polling interval of {} {:?} is too large",
                self.interval, unit
            )));
        }
        Ok(period)
    }
}

/// A recurring task that reloads a store when its bound file changes.
pub struct ReloadScheduler {
    shutdown: broadcast::Sender<()>,
    stopped: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ReloadScheduler {
    /// Validate `polling` and spawn the polling task on the current Tokio
    /// runtime. The first check happens one period after start.
    pub fn start(store: Weak<Configuration>, polling: &PollingConfig) -> Result<Self> {
        let period = polling.period()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ConfigError::InvalidArgument("polling requires a running Tokio runtime".to_string())
        })?;

        let (shutdown, rx) = broadcast::channel(1);
        let stopped = Arc::new(AtomicBool::new(false));
        let task = runtime.spawn(run(store, period, rx, stopped.clone()));

        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(period_ms, "Reload scheduler started");
        Ok(Self { shutdown, stopped, task })
    }

    /// Cancel future ticks. A reload already in progress completes.
    pub fn stop_polling(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.shutdown.send(());
            tracing::info!("Reload scheduler stopping");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

impl Drop for ReloadScheduler {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

async fn run(
    store: Weak<Configuration>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    stopped: Arc<AtomicBool>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    tracing::debug!("Configuration dropped, reload scheduler exiting");
                    break;
                };
                poll_once(store).await;
            }
            _ = shutdown.recv() => {
                tracing::info!("Reload scheduler received stop signal, exiting loop");
                break;
            }
        }
    }
    stopped.store(true, Ordering::SeqCst);
}

async fn poll_once(store: Arc<Configuration>) {
    metrics::record_poll_tick();
    // file I/O and the store lock both block
    let outcome = tokio::task::spawn_blocking(move || store.reload_if_modified()).await;
    match outcome {
        Ok(Ok(true)) => tracing::info!("Reload complete"),
        Ok(Ok(false)) => {
            tracing::debug!("Not reloading file as no change has been detected since last load")
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Scheduled reload failed; will retry on next tick")
        }
        Err(e) => tracing::error!(error = %e, "Scheduled reload task panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Format;

    #[test]
    fn test_period_conversion() {
        assert_eq!(
            PollingConfig::new(250, TimeUnit::Milliseconds).period().unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            PollingConfig::new(2, TimeUnit::Minutes).period().unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            PollingConfig::new(1, TimeUnit::Hours).period().unwrap(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn test_invalid_polling_parameters() {
        let zero = PollingConfig::new(0, TimeUnit::Seconds);
        assert!(matches!(zero.period(), Err(ConfigError::InvalidArgument(_))));

        let no_unit = PollingConfig { interval: 5, unit: None };
        assert!(matches!(no_unit.period(), Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn test_unrepresentable_period_rejected() {
        for unit in [TimeUnit::Seconds, TimeUnit::Minutes, TimeUnit::Hours] {
            let huge = PollingConfig::new(u64::MAX, unit);
            assert!(
                matches!(huge.period(), Err(ConfigError::InvalidArgument(_))),
                "{unit:?} accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_huge_interval_fails_before_spawning() {
        let store = Arc::new(Configuration::for_format(Format::Yaml));
        let result = store.start_polling(&PollingConfig::new(u64::MAX, TimeUnit::Seconds));
        assert!(matches!(result, Err(ConfigError::InvalidArgument(_))));
        assert!(!store.is_polling());
    }

    #[test]
    fn test_polling_config_from_toml() {
        let polling: PollingConfig = toml::from_str("interval = 30\nunit = \"seconds\"\n").unwrap();
        assert_eq!(polling.period().unwrap(), Duration::from_secs(30));

        let missing: PollingConfig = toml::from_str("interval = 30\n").unwrap();
        assert!(missing.period().is_err());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let store = Arc::new(Configuration::for_format(Format::Yaml));
        let polling = PollingConfig::new(1, TimeUnit::Seconds);
        let result = ReloadScheduler::start(Arc::downgrade(&store), &polling);
        assert!(matches!(result, Err(ConfigError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_invalid_parameters_spawn_nothing() {
        let store = Arc::new(Configuration::for_format(Format::Yaml));
        let result = store.start_polling(&PollingConfig::new(0, TimeUnit::Seconds));
        assert!(matches!(result, Err(ConfigError::InvalidArgument(_))));
        assert!(!store.is_polling());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let store = Arc::new(Configuration::for_format(Format::Yaml));
        let polling = PollingConfig::new(10, TimeUnit::Milliseconds);
        let scheduler = ReloadScheduler::start(Arc::downgrade(&store), &polling).unwrap();
        assert!(scheduler.is_running());

        scheduler.stop_polling();
        scheduler.stop_polling();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_task_exits_when_store_dropped() {
        let store = Arc::new(Configuration::for_format(Format::Yaml));
        let polling = PollingConfig::new(5, TimeUnit::Milliseconds);
        let scheduler = ReloadScheduler::start(Arc::downgrade(&store), &polling).unwrap();
        drop(store);

        for _ in 0..100 {
            if scheduler.task.is_finished() {
                break;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        assert!(scheduler.task.is_finished());
        assert!(!scheduler.is_running());
    }
}
