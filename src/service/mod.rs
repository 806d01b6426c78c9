pub mod account_service;
pub mod admin_service;
pub mod payment_service;
pub mod quota_service;
pub mod reconciler;
pub mod settings_service;
pub mod settlement_service;

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::notify::{ChangeBus, Notifier};
use crate::rails::{BankRail, CardRail, CryptoRail, CryptoRateFeed, RailTiming};
use crate::repository::*;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use payment_service::PaymentService;
pub use quota_service::QuotaService;
pub use reconciler::{InFlightSet, Reconciler};
pub use settings_service::SettingsService;
pub use settlement_service::SettlementService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub ledger_repo: Arc<dyn LedgerRepository>,
    pub credits_repo: Arc<dyn CreditsRepository>,
    pub method_repo: Arc<dyn PaymentMethodRepository>,
    pub settlement_service: Arc<SettlementService>,
    pub payment_service: Arc<PaymentService>,
    pub quota_service: Arc<QuotaService>,
    pub admin_service: Arc<AdminService>,
    pub account_service: Arc<AccountService>,
    pub settings_service: Arc<SettingsService>,
    pub reconciler: Arc<Reconciler>,
    pub bus: ChangeBus,
    pub rates: Arc<CryptoRateFeed>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        settings: &Settings,
        notifier: Arc<dyn Notifier>,
        rates: Arc<CryptoRateFeed>,
        bus: ChangeBus,
    ) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let ledger_repo: Arc<dyn LedgerRepository> =
            Arc::new(SqliteLedgerRepository::new(db_pool.clone()));
        let credits_repo: Arc<dyn CreditsRepository> =
            Arc::new(SqliteCreditsRepository::new(db_pool.clone()));
        let method_repo: Arc<dyn PaymentMethodRepository> =
            Arc::new(SqlitePaymentMethodRepository::new(db_pool.clone()));

        let settings_service = Arc::new(SettingsService::new(
            db_pool.clone(),
            bus.clone(),
            settings.billing.plan_price_cents,
        ));

        let settlement_service = Arc::new(SettlementService::new(
            user_repo.clone(),
            payment_repo.clone(),
            ledger_repo.clone(),
            credits_repo.clone(),
            notifier.clone(),
            bus.clone(),
            &settings.billing,
        ));

        let card = CardRail::from_config(&settings.rails.card);
        let crypto = CryptoRail::new(
            RailTiming::from_config(&settings.rails.crypto),
            rates.clone(),
            payment_repo.clone(),
        );
        let bank = BankRail::from_config(&settings.rails.bank);

        let payment_service = Arc::new(PaymentService::new(
            user_repo.clone(),
            payment_repo.clone(),
            method_repo.clone(),
            ledger_repo.clone(),
            settlement_service.clone(),
            settings_service.clone(),
            notifier.clone(),
            bus.clone(),
            card,
            crypto,
        ));

        let quota_service = Arc::new(QuotaService::new(
            user_repo.clone(),
            credits_repo.clone(),
            ledger_repo.clone(),
            settlement_service.clone(),
            bus.clone(),
            &settings.billing,
        ));

        let reconciler = Arc::new(Reconciler::new(
            payment_repo.clone(),
            settlement_service.clone(),
            bank,
            Duration::from_secs(settings.reconciler.interval_secs),
        ));

        let admin_service = Arc::new(AdminService::new(
            payment_repo.clone(),
            user_repo.clone(),
            ledger_repo.clone(),
            settlement_service.clone(),
            reconciler.clone(),
            bus.clone(),
        ));

        let account_service = Arc::new(AccountService::new(
            user_repo.clone(),
            ledger_repo.clone(),
            credits_repo.clone(),
            settlement_service.clone(),
            bus.clone(),
            &settings.billing,
        ));

        Self {
            user_repo,
            payment_repo,
            ledger_repo,
            credits_repo,
            method_repo,
            settlement_service,
            payment_service,
            quota_service,
            admin_service,
            account_service,
            settings_service,
            reconciler,
            bus,
            rates,
            db_pool,
        }
    }
}
