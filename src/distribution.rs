use crate::models::{RiskDistribution, RiskProfile, RiskTier};

pub fn distribution(profiles: &[RiskProfile]) -> RiskDistribution {
    let mut counts = RiskDistribution::default();
    for profile in profiles {
        match profile.tier {
            RiskTier::Safe => counts.safe += 1,
            RiskTier::Watchlist => counts.watchlist += 1,
            RiskTier::AtRisk => counts.at_risk += 1,
        }
    }
    counts
}

impl RiskDistribution {
    pub fn total(&self) -> usize {
        self.safe + self.watchlist + self.at_risk
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Safe => self.safe,
            RiskTier::Watchlist => self.watchlist,
            RiskTier::AtRisk => self.at_risk,
        }
    }

    /// Share of the population in `tier`, 0-100. Empty populations report 0.
    pub fn percentage(&self, tier: RiskTier) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(tier) as f64 * 100.0 / total as f64
        }
    }

    pub fn needs_alert(&self, threshold: usize) -> bool {
        self.at_risk > 0 && self.at_risk >= threshold
    }
}
