//! Application context - dependency injection container

use std::sync::Arc;

use lexbook_core::{
    AvailabilityService, BookingRepository, BookingService, Clock, NotificationSender,
    RuleRepository, SlotRepository, SweeperService, WalletLedger,
};
use lexbook_domain::Result;
use lexbook_infra::{
    Config, DbManager, ExpirationScheduler, ExpirationSchedulerConfig, SqliteBookingRepository,
    SqliteNotificationSender, SqliteRuleRepository, SqliteSlotRepository, SqliteWalletLedger,
    SystemClock,
};

/// Application context - holds the wired services shared by the handlers.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub availability: Arc<AvailabilityService>,
    pub bookings: Arc<BookingService>,
    pub sweeper: Arc<SweeperService>,
}

impl AppContext {
    /// Wire the repositories and services on top of a migrated database.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        Ok(Self::with_database(config, db))
    }

    /// Wire the services against an already prepared database. Used by the
    /// integration tests to point the context at a scratch file.
    pub fn with_database(config: Config, db: Arc<DbManager>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let rules: Arc<dyn RuleRepository> = Arc::new(SqliteRuleRepository::new(db.clone()));
        let slots: Arc<dyn SlotRepository> = Arc::new(SqliteSlotRepository::new(db.clone()));
        let bookings: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db.clone()));
        let wallets: Arc<dyn WalletLedger> = Arc::new(SqliteWalletLedger::new(db.clone()));
        let notifier: Arc<dyn NotificationSender> =
            Arc::new(SqliteNotificationSender::new(db.clone()));

        let availability =
            Arc::new(AvailabilityService::new(rules, slots.clone(), clock.clone()));
        let booking_service = Arc::new(BookingService::new(
            slots.clone(),
            bookings.clone(),
            wallets,
            notifier,
            clock.clone(),
        ));
        let sweeper = Arc::new(SweeperService::new(slots, bookings, clock));

        Self { config, db, availability, bookings: booking_service, sweeper }
    }

    /// Build the hourly expiration scheduler around the sweeper. The caller
    /// owns its lifecycle.
    pub fn expiration_scheduler(&self) -> ExpirationScheduler {
        let config = ExpirationSchedulerConfig {
            cron_expression: self.config.sweeper.cron_expression.clone(),
            ..Default::default()
        };
        ExpirationScheduler::with_config(config, self.sweeper.clone())
    }
}
