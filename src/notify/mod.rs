use tokio::sync::broadcast;
use uuid::Uuid;

pub mod email;

pub use email::{LogNotifier, Notifier, SmtpNotifier};

/// One event is published per mutating operation so presentation layers can
/// refresh derived views. Delivery is best-effort; a bus with no
/// subscribers simply drops events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    LedgerAppended { user_id: Uuid },
    PaymentChanged { payment_id: Uuid },
    UserChanged { user_id: Uuid },
    CreditsChanged { user_id: Uuid },
    MethodsChanged,
    SettingsChanged,
}

#[derive(Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // Err means no live subscribers, which is fine.
        if self.tx.send(event).is_err() {
            tracing::trace!("Change event dropped, no subscribers: {:?}", event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(256)
    }
}
