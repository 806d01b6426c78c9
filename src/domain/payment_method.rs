use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::RailKind;

/// Rail configuration entity. Mutated only through administrative settings,
/// never by the settlement flow itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodConfig {
    pub id: Uuid,
    pub name: String,
    pub rail: RailKind,
    pub description: String,
    pub is_enabled: bool,
    // Bank details
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub iban: Option<String>,
    pub swift: Option<String>,
    // Crypto details
    pub address: Option<String>,
    pub network: Option<String>,
    pub crypto_symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdatePaymentMethodRequest {
    pub description: Option<String>,
    pub is_enabled: Option<bool>,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub iban: Option<String>,
    pub swift: Option<String>,
    pub address: Option<String>,
    pub network: Option<String>,
    pub crypto_symbol: Option<String>,
}
