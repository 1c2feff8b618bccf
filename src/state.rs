use crate::application::ports::local_store::{LedgerStore, LocalStore};
use crate::application::ports::remote_api::RemoteApi;
use crate::application::services::{
    ConnectivityMonitor, DrainReport, LedgerService, MutationQueue, PayrollService,
    SyncOrchestrator, SyncTrigger, TimeClockService,
};
use crate::domain::entities::PayrollPolicy;
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::remote::TimeBoundedRemote;
use crate::infrastructure::store::{FallbackLedgerStore, SqliteLedgerStore};
use crate::shared::config::{AppConfig, DatabaseConfig};
use crate::shared::error::AppError;
use anyhow::Context;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The wired-up ledger: store, queue, connectivity, sync and the business
/// services on top.
#[derive(Clone)]
pub struct LedgerEngine {
    pub config: AppConfig,
    pub store: Arc<FallbackLedgerStore>,
    pub queue: Arc<MutationQueue>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub sync: Arc<SyncOrchestrator>,
    pub ledger: Arc<LedgerService>,
    pub time_clock: Arc<TimeClockService>,
    pub payroll: Arc<PayrollService>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl LedgerEngine {
    pub async fn initialize(
        config: AppConfig,
        remote: Arc<dyn RemoteApi>,
        initially_online: bool,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let policy = PayrollPolicy::try_from(&config.payroll)?;

        let store = Arc::new(Self::open_store(&config.database).await?);
        store.initialize().await?;
        let ledger_store: Arc<dyn LedgerStore> = store.clone();

        let remote: Arc<dyn RemoteApi> = Arc::new(TimeBoundedRemote::new(
            remote,
            Duration::from_millis(config.sync.remote_timeout_ms),
        ));
        let queue = Arc::new(MutationQueue::new(Arc::clone(&ledger_store)));
        let connectivity = Arc::new(ConnectivityMonitor::new(initially_online));
        let sync = Arc::new(SyncOrchestrator::new(
            Arc::clone(&ledger_store),
            Arc::clone(&queue),
            remote,
        ));
        connectivity.register(sync.clone());

        let ledger = Arc::new(
            LedgerService::new(
                ledger_store,
                Arc::clone(&queue),
                Arc::clone(&connectivity),
                Arc::clone(&sync),
            )
            .with_standard_shift_hours(policy.standard_shift_hours),
        );
        let time_clock = Arc::new(TimeClockService::new(
            Arc::clone(&ledger),
            policy.standard_shift_hours,
        ));
        let payroll = Arc::new(PayrollService::new(Arc::clone(&ledger), policy));

        let mut tasks = Vec::new();
        if config.sync.auto_sync {
            tasks.push(sync.schedule(
                Arc::clone(&connectivity),
                Duration::from_secs(config.sync.sync_interval),
            ));
        }

        tracing::info!(
            target: "ledger::store",
            degraded = store.is_degraded(),
            online = initially_online,
            auto_sync = config.sync.auto_sync,
            "ledger engine initialized"
        );

        Ok(Self {
            config,
            store,
            queue,
            connectivity,
            sync,
            ledger,
            time_clock,
            payroll,
            tasks: Arc::new(Mutex::new(tasks)),
        })
    }

    /// Reads `LEDGER_*` settings from the environment and initializes online.
    pub async fn from_env(remote: Arc<dyn RemoteApi>) -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let engine = Self::initialize(config, remote, true)
            .await
            .context("failed to initialize ledger engine")?;
        Ok(engine)
    }

    async fn open_store(config: &DatabaseConfig) -> Result<FallbackLedgerStore, AppError> {
        match ConnectionPool::connect(config).await {
            Ok(connection) => Ok(FallbackLedgerStore::new(Arc::new(
                SqliteLedgerStore::from_connection(&connection),
            ))),
            Err(err) if err.is_storage_unavailable() => {
                tracing::warn!(
                    target: "ledger::store",
                    error = %err,
                    "durable storage unavailable; running memory-only"
                );
                Ok(FallbackLedgerStore::memory_only())
            }
            Err(err) => Err(err),
        }
    }

    /// Reports what survived the last run and drains it when online.
    pub async fn recover(&self) -> Result<Option<DrainReport>, AppError> {
        let pending = self.queue.pending_count().await?;
        tracing::info!(
            target: "ledger::queue",
            pending,
            "recovered pending mutations"
        );
        if pending == 0 || !self.connectivity.is_online() {
            return Ok(None);
        }
        self.sync.drain(SyncTrigger::Startup).await.map(Some)
    }

    /// Feeds a platform reachability signal into the connectivity monitor.
    pub fn attach_connectivity(&self, signal: watch::Receiver<bool>) {
        let handle = self.connectivity.attach(signal);
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(handle);
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.store.is_degraded()
    }

    /// Stops background drains and signal listeners.
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}
