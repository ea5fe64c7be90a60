//! Wires configuration, storage and the engine services together.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use fintrack_config::{Config, ConfigManager};
use fintrack_core::{
    aggregation::{self, CategoryShare, MonthlySummary, PeriodFlow, TransactionFilter},
    simulation::{self, SimulationBaseline, SimulationResult},
    storage::{collections, BALANCE_KEY},
    CategoryService, Clock, GenerationReport, GoalService, Ledger, LedgerSettings, MemoryStore,
    NotificationService, RecordStore, RecurrenceScheduler, SchedulerSettings, SystemClock,
    WriteBatch,
};
use fintrack_domain::{Transaction, TransactionKind};
use fintrack_storage_json::{BackupInfo, JsonRecordStore, StoragePaths};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{sample, FintrackError};

/// One open data set plus every service operating on it.
pub struct Session {
    config: Config,
    config_manager: Option<ConfigManager>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    ledger: Arc<Ledger>,
    scheduler: RecurrenceScheduler,
    categories: CategoryService,
    goals: GoalService,
    notifications: NotificationService,
    files: Option<Arc<JsonRecordStore>>,
}

impl Session {
    /// Opens the data set of the default application folder, reading its
    /// stored config first.
    pub fn open_default() -> Result<Self, FintrackError> {
        Self::open_from(Config::default().resolve_data_dir())
    }

    /// Loads `<base>/config/config.json` (defaults when absent, saved on first
    /// use) and opens the data set it points at, or `base` itself when the
    /// config leaves `data_dir` unset.
    pub fn open_from(base: PathBuf) -> Result<Self, FintrackError> {
        let manager = ConfigManager::with_base_dir(base.clone())?;
        let config = manager.load()?;
        if !manager.config_path().exists() {
            manager.save(&config)?;
            info!(path = %manager.config_path().display(), "Default config written");
        }
        let data_dir = config.data_dir.clone().unwrap_or(base);
        let mut session = Self::open_at(config, &data_dir)?;
        session.config_manager = Some(manager);
        Ok(session)
    }

    /// Opens the JSON data set under `config.resolve_data_dir()`.
    pub fn open(config: Config) -> Result<Self, FintrackError> {
        let data_dir = config.resolve_data_dir();
        Self::open_at(config, &data_dir)
    }

    fn open_at(config: Config, data_dir: &Path) -> Result<Self, FintrackError> {
        let paths = StoragePaths::under(data_dir);
        let store = Arc::new(JsonRecordStore::with_retention(
            paths,
            config.backup_retention,
        )?);
        info!(path = %store.paths().data_file.display(), "Opened data file");
        let mut session = Self::with_store(config, store.clone(), Arc::new(SystemClock));
        session.files = Some(store);
        Ok(session)
    }

    /// A session backed by process memory only.
    pub fn in_memory(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()), clock)
    }

    pub fn with_store(config: Config, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        let ledger = Arc::new(Ledger::with_settings(
            store.clone(),
            clock.clone(),
            LedgerSettings {
                deposit_description: config.deposit_category.clone(),
                deposit_category: config.deposit_category.clone(),
                transfer_category: config.transfer_category.clone(),
            },
        ));
        let scheduler = RecurrenceScheduler::with_settings(
            store.clone(),
            ledger.clone(),
            clock.clone(),
            SchedulerSettings {
                description_suffix: config.recurring_suffix.clone(),
            },
        );
        Self {
            categories: CategoryService::new(store.clone(), clock.clone()),
            goals: GoalService::new(store.clone(), clock.clone()),
            notifications: NotificationService::new(store.clone(), clock.clone()),
            config,
            config_manager: None,
            store,
            clock,
            ledger,
            scheduler,
            files: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn scheduler(&self) -> &RecurrenceScheduler {
        &self.scheduler
    }

    pub fn categories(&self) -> &CategoryService {
        &self.categories
    }

    pub fn goals(&self) -> &GoalService {
        &self.goals
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    /// Materialises every recurring rule due now.
    pub fn generate_due(&self) -> Result<GenerationReport, FintrackError> {
        Ok(self.scheduler.generate_due()?)
    }

    /// Transactions accepted by `filter`, newest first.
    pub fn find_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, FintrackError> {
        let transactions = self.ledger.list_transactions()?;
        Ok(aggregation::filter_transactions(&transactions, filter))
    }

    pub fn monthly_summary(&self) -> Result<MonthlySummary, FintrackError> {
        let transactions = self.ledger.list_transactions()?;
        Ok(aggregation::monthly_summary(&transactions, self.clock.now()))
    }

    pub fn category_breakdown(
        &self,
        kind: TransactionKind,
    ) -> Result<Vec<CategoryShare>, FintrackError> {
        let transactions = self.ledger.list_transactions()?;
        Ok(aggregation::category_breakdown(
            &transactions,
            kind,
            &self.config.fallback_category,
        ))
    }

    pub fn period_flow(&self, period_days: u32) -> Result<PeriodFlow, FintrackError> {
        let transactions = self.ledger.list_transactions()?;
        Ok(aggregation::period_flow(
            &transactions,
            period_days,
            self.clock.now(),
        ))
    }

    pub fn simulation_baseline(&self) -> Result<SimulationBaseline, FintrackError> {
        let transactions = self.ledger.list_transactions()?;
        Ok(simulation::simulation_baseline(
            &transactions,
            self.clock.now(),
            &self.config.fallback_category,
        ))
    }

    /// Projects this month's figures under the given percentage adjustments.
    pub fn simulate(
        &self,
        income_pct: Decimal,
        per_category_pct: &HashMap<String, Decimal>,
    ) -> Result<SimulationResult, FintrackError> {
        let baseline = self.simulation_baseline()?;
        Ok(simulation::simulate(
            &baseline.category_totals,
            baseline.income_total,
            income_pct,
            per_category_pct,
        ))
    }

    /// Loads demo transactions and notifications into an empty ledger.
    ///
    /// Returns `false` without writing anything when transactions already exist.
    pub fn seed_sample_data(&self) -> Result<bool, FintrackError> {
        if !self.ledger.list_transactions()?.is_empty() {
            return Ok(false);
        }
        self.categories.list()?;
        for input in sample::transactions(self.clock.now()) {
            self.ledger.create(input)?;
        }
        for (title, message, read) in sample::notifications() {
            let notification = self.notifications.push(title, message)?;
            if read {
                self.notifications.mark_as_read(notification.id)?;
            }
        }
        info!("Sample data loaded");
        Ok(true)
    }

    /// Empties every collection, zeroes the balance and reloads the sample data.
    ///
    /// File-backed sessions write a backup first. Callers must not run other
    /// operations on this session while the reset is in progress.
    pub fn clear_data(&self) -> Result<(), FintrackError> {
        if let Some(files) = &self.files {
            let backup = files.backup(Some("before-clear"))?;
            info!(backup = %backup.id, "Backup taken before clearing data");
        }
        let mut batch = WriteBatch::new();
        for name in collections::ALL {
            batch.put_collection(name, Vec::new());
        }
        batch.put_scalar(BALANCE_KEY, Decimal::ZERO);
        self.store.commit(batch)?;
        warn!("All data cleared");
        self.seed_sample_data()?;
        Ok(())
    }

    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, FintrackError> {
        Ok(self.files()?.backup(note)?)
    }

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, FintrackError> {
        Ok(self.files()?.list_backups()?)
    }

    /// Restores a backup and re-derives the balance from the restored transactions.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<(), FintrackError> {
        self.files()?.restore_backup(backup)?;
        self.ledger.reconcile()?;
        Ok(())
    }

    pub fn backup_config(&self, note: Option<&str>) -> Result<String, FintrackError> {
        Ok(self.config_files()?.backup(&self.config, note)?)
    }

    pub fn list_config_backups(&self) -> Result<Vec<String>, FintrackError> {
        Ok(self.config_files()?.list_backups()?)
    }

    /// Makes a config backup current on disk. The running session keeps its
    /// labels until it is reopened.
    pub fn restore_config(&self, name: &str) -> Result<Config, FintrackError> {
        Ok(self.config_files()?.restore(name)?)
    }

    fn config_files(&self) -> Result<&ConfigManager, FintrackError> {
        self.config_manager
            .as_ref()
            .ok_or(FintrackError::ConfigUnavailable)
    }

    fn files(&self) -> Result<&JsonRecordStore, FintrackError> {
        self.files
            .as_deref()
            .ok_or(FintrackError::BackupsUnavailable)
    }
}
