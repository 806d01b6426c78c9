use serde::{Deserialize, Serialize};

/// Per-user consumable counters for generation actions. These sit alongside
/// the token ledger, not inside it: decrementing a credit never produces a
/// ledger transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credits {
    pub image: i64,
    pub video: i64,
    pub no_watermark: i64,
}

impl Credits {
    pub const FREE_TIER: Credits = Credits { image: 5, video: 2, no_watermark: 2 };
    pub const PRO_TIER: Credits = Credits { image: 9_999, video: 9_999, no_watermark: 9_999 };

    /// Downgrade reset. Counters already below the free-tier allotment are
    /// kept as-is so a user never gains credits by being downgraded.
    pub fn clamped_to_free_tier(self) -> Credits {
        Credits {
            image: self.image.min(Self::FREE_TIER.image),
            video: self.video.min(Self::FREE_TIER.video),
            no_watermark: self.no_watermark.min(Self::FREE_TIER.no_watermark),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Video,
}
