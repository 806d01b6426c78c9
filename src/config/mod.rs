use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub rails: RailsConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Default Pro plan price in cents; the stored billing setting wins once set.
    pub plan_price_cents: i64,
    pub pro_duration_days: i64,
    pub image_token_cost: i64,
    pub video_token_cost: i64,
    pub referral_signup_bonus: i64,
    pub referral_upgrade_bonus: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            plan_price_cents: 999,
            pro_duration_days: 30,
            image_token_cost: 10,
            video_token_cost: 20,
            referral_signup_bonus: 1,
            referral_upgrade_bonus: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RailsConfig {
    #[serde(default = "RailConfig::card_default")]
    pub card: RailConfig,
    #[serde(default = "RailConfig::crypto_default")]
    pub crypto: RailConfig,
    #[serde(default = "RailConfig::bank_default")]
    pub bank: RailConfig,
}

impl Default for RailsConfig {
    fn default() -> Self {
        Self {
            card: RailConfig::card_default(),
            crypto: RailConfig::crypto_default(),
            bank: RailConfig::bank_default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RailConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Probability of a simulated decline for inputs that pass validation.
    pub decline_rate: f64,
}

impl RailConfig {
    fn card_default() -> Self {
        Self { min_delay_ms: 1_000, max_delay_ms: 2_000, decline_rate: 0.15 }
    }

    fn crypto_default() -> Self {
        Self { min_delay_ms: 1_500, max_delay_ms: 2_500, decline_rate: 0.0 }
    }

    fn bank_default() -> Self {
        Self { min_delay_ms: 5_000, max_delay_ms: 10_000, decline_rate: 0.15 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcilerConfig {
    pub interval_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DemoConfig {
    /// Drifts simulated crypto exchange rates on a timer when enabled.
    #[serde(default)]
    pub simulate_market: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with LUMINA__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("LUMINA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://lumina.db".to_string(),
                max_connections: 10,
            },
            billing: BillingConfig::default(),
            rails: RailsConfig::default(),
            reconciler: ReconcilerConfig::default(),
            smtp: SmtpConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}
