use crate::domain::coupon::{CouponKey, CouponKind};
use crate::error::{LedgerError, Result};

/// Reward added to a streak coupon's monetary value per completed workout.
pub const DEFAULT_REWARD_PER_WORKOUT: u64 = 100;

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub reward_per_workout: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reward_per_workout: DEFAULT_REWARD_PER_WORKOUT,
        }
    }
}

/// How a single coupon is set up: which ledger, what it starts at, and for
/// streak coupons how much each action earns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponConfig {
    pub key: CouponKey,
    pub initial_value: u64,
    pub reward_per_action: Option<u64>,
}

impl CouponConfig {
    /// Builds a config, using the kind's defaults for anything not given.
    pub fn new(
        key: CouponKey,
        initial_value: Option<u64>,
        reward_per_action: Option<u64>,
    ) -> Result<Self> {
        let initial_value = initial_value.unwrap_or_else(|| key.kind.default_initial_value());
        let config = Self {
            key,
            initial_value,
            reward_per_action,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.key.kind {
            CouponKind::Monetary | CouponKind::Usage if self.initial_value == 0 => {
                Err(LedgerError::Config(format!(
                    "{} needs a positive initial value",
                    self.key
                )))
            }
            CouponKind::Monetary | CouponKind::Usage if self.reward_per_action.is_some() => {
                Err(LedgerError::Config(format!(
                    "{} does not earn rewards",
                    self.key
                )))
            }
            _ => Ok(()),
        }
    }
}
