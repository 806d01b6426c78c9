use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Simulated exchange-rate feed standing in for a market-data API. Rates
/// drift on a timer only when demo mode enables it; otherwise they stay at
/// their base values.
pub struct CryptoRateFeed {
    rates: RwLock<HashMap<&'static str, f64>>,
}

impl CryptoRateFeed {
    pub fn new() -> Self {
        let mut rates = HashMap::new();
        rates.insert("BTC", 65_000.0);
        rates.insert("ETH", 3_500.0);
        rates.insert("USDT", 1.0);
        rates.insert("SOL", 150.0);
        rates.insert("LTC", 75.0);
        Self { rates: RwLock::new(rates) }
    }

    pub fn rate(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.to_uppercase();
        self.rates.read().expect("rate lock poisoned").get(symbol.as_str()).copied()
    }

    /// Decimal places used when quoting an amount in the given currency.
    pub fn decimals(symbol: &str) -> u32 {
        match symbol.to_uppercase().as_str() {
            "BTC" => 8,
            "ETH" => 6,
            "USDT" => 2,
            "SOL" => 4,
            _ => 5,
        }
    }

    pub fn convert_usd(&self, usd_amount: f64, symbol: &str) -> Option<f64> {
        let rate = self.rate(symbol)?;
        let decimals = Self::decimals(symbol);
        let scale = 10f64.powi(decimals as i32);
        Some((usd_amount / rate * scale).round() / scale)
    }

    /// One market tick: each rate drifts within a small band, stablecoins
    /// barely at all.
    pub fn tick(&self) {
        let mut rng = rand::thread_rng();
        let mut rates = self.rates.write().expect("rate lock poisoned");
        for (symbol, rate) in rates.iter_mut() {
            let band = match *symbol {
                "USDT" => 0.0002,
                "SOL" => 0.008,
                "LTC" => 0.006,
                _ => 0.005,
            };
            *rate *= 1.0 + (rng.gen::<f64>() - 0.5) * band;
        }
    }
}

impl Default for CryptoRateFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the demo-mode market drift timer.
pub fn spawn_market_drift(feed: Arc<CryptoRateFeed>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            feed.tick();
        }
    })
}
