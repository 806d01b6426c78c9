use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub subscription_start_date: Option<DateTime<Utc>>,
    pub plan_expiration_date: Option<DateTime<Utc>>,
    /// Set once at signup, never changed afterwards.
    pub referred_by: Option<Uuid>,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl User {
    /// A Pro plan whose expiration date has elapsed is treated as lapsed;
    /// the actual downgrade happens on the next read through the coordinator.
    pub fn plan_is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.plan == Plan::Pro
            && self
                .plan_expiration_date
                .map(|expires| expires < now)
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub referred_by: Option<Uuid>,
    pub country: String,
    pub phone: String,
}
