use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    domain::{PaymentStatus, RailKind},
    error::Result,
    rails::BankRail,
    repository::PaymentRepository,
    service::SettlementService,
};

/// Per-payment mutual exclusion for bank verification. A permit must be
/// held for the whole verify-and-settle sequence; dropping it releases the
/// id no matter how the sequence ended.
#[derive(Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, id: Uuid) -> Option<InFlightPermit> {
        let mut set = self.inner.lock().expect("in-flight lock poisoned");
        if set.insert(id) {
            Some(InFlightPermit { id, set: Arc::clone(&self.inner) })
        } else {
            None
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.inner.lock().expect("in-flight lock poisoned").contains(&id)
    }
}

pub struct InFlightPermit {
    id: Uuid,
    set: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.set.lock().expect("in-flight lock poisoned").remove(&self.id);
    }
}

/// Background reconciliation for the asynchronous bank rail. A fixed-period
/// scan picks up every pending bank payment and runs it through the bank
/// rail and the shared settlement primitive. Scans may overlap slow
/// verifications; the in-flight set guarantees at most one concurrent
/// verification per payment id, including against the manual trigger.
pub struct Reconciler {
    payments: Arc<dyn PaymentRepository>,
    settlement: Arc<SettlementService>,
    bank: BankRail,
    in_flight: InFlightSet,
    interval: Duration,
}

impl Reconciler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        settlement: Arc<SettlementService>,
        bank: BankRail,
        interval: Duration,
    ) -> Self {
        Self { payments, settlement, bank, in_flight: InFlightSet::new(), interval }
    }

    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = this.scan().await {
                    tracing::error!("Reconciliation scan failed: {}", e);
                }
            }
        })
    }

    /// One scan pass: dispatch a verification task for every pending bank
    /// payment not already in flight.
    pub async fn scan(self: &Arc<Self>) -> Result<()> {
        let pending = self.payments.list_pending_bank().await?;
        for payment in pending {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.verify_one(payment.id).await;
            });
        }
        Ok(())
    }

    /// Manual trigger used by the administrative revalidate action. Shares
    /// the in-flight set with the periodic scan so the two can never
    /// process the same payment concurrently.
    pub fn verify_now(self: &Arc<Self>, payment_id: Uuid) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.verify_one(payment_id).await;
        });
    }

    pub async fn verify_one(&self, payment_id: Uuid) {
        let Some(_permit) = self.in_flight.try_acquire(payment_id) else {
            return;
        };

        if let Err(e) = self.process(payment_id).await {
            tracing::error!("Bank verification for payment {} failed: {}", payment_id, e);
        }
        // _permit drops here, releasing the id whatever happened above.
    }

    async fn process(&self, payment_id: Uuid) -> Result<()> {
        let Some(payment) = self.payments.find_by_id(payment_id).await? else {
            return Ok(());
        };
        // Re-check under the permit; the record may have settled or been
        // requeued to another rail since the scan enumerated it.
        if payment.status != PaymentStatus::Pending || payment.rail != RailKind::Bank {
            return Ok(());
        }

        let outcome = self.bank.verify(&payment).await;
        self.settlement.settle(&payment, outcome).await?;
        Ok(())
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }
}
