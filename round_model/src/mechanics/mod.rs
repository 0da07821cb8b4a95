//! Round mechanics: kill streak tiers.

use serde::{Deserialize, Serialize};

/// Named kill streak tiers, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTier {
    /// 3 kills.
    KillingSpree,
    /// 5 kills.
    Rampage,
    /// 7 kills.
    Dominating,
    /// 10 kills.
    Unstoppable,
    /// 15 kills.
    Godlike,
}

impl StreakTier {
    /// All tiers, highest first.
    pub const DESCENDING: [StreakTier; 5] = [
        StreakTier::Godlike,
        StreakTier::Unstoppable,
        StreakTier::Dominating,
        StreakTier::Rampage,
        StreakTier::KillingSpree,
    ];

    /// Minimum streak that reaches this tier.
    pub fn threshold(&self) -> u32 {
        match self {
            StreakTier::KillingSpree => 3,
            StreakTier::Rampage => 5,
            StreakTier::Dominating => 7,
            StreakTier::Unstoppable => 10,
            StreakTier::Godlike => 15,
        }
    }

    /// Announcer label for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            StreakTier::KillingSpree => "KILLING SPREE",
            StreakTier::Rampage => "RAMPAGE",
            StreakTier::Dominating => "DOMINATING",
            StreakTier::Unstoppable => "UNSTOPPABLE",
            StreakTier::Godlike => "GODLIKE",
        }
    }

    /// Resolve a streak to the highest tier whose threshold it reaches.
    pub fn resolve(streak: u32) -> Option<StreakTier> {
        Self::DESCENDING
            .into_iter()
            .find(|tier| streak >= tier.threshold())
    }
}

impl std::fmt::Display for StreakTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
