use super::history::HistoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a coupon belongs to.
///
/// The kind fixes how `balance_or_uses` is interpreted, which remote collection
/// holds the document and which prefix namespaces its local cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    /// Decrementing currency balance.
    Monetary,
    /// Decrementing count of discrete uses.
    Usage,
    /// Workout streak that accumulates a monetary value.
    Streak,
}

impl CouponKind {
    pub fn collection(&self) -> &'static str {
        match self {
            CouponKind::Monetary => "coupons",
            CouponKind::Usage => "usage-coupons",
            CouponKind::Streak => "workout-coupons",
        }
    }

    pub fn cache_prefix(&self) -> &'static str {
        match self {
            CouponKind::Monetary => "coupon",
            CouponKind::Usage => "usage_coupon",
            CouponKind::Streak => "workout_coupon",
        }
    }

    /// Name of the document field holding `balance_or_uses`.
    pub fn balance_field(&self) -> &'static str {
        match self {
            CouponKind::Monetary => "balance",
            CouponKind::Usage => "uses_remaining",
            CouponKind::Streak => "monetary_value",
        }
    }

    pub fn default_initial_value(&self) -> u64 {
        match self {
            CouponKind::Monetary => 15000,
            CouponKind::Usage => 1,
            CouponKind::Streak => 0,
        }
    }

    /// The state a coupon of this kind starts in.
    pub fn initial_state(&self, initial_value: u64) -> CouponState {
        match self {
            CouponKind::Monetary => CouponState::Monetary {
                balance: initial_value,
            },
            CouponKind::Usage => CouponState::Usage {
                uses_remaining: initial_value,
            },
            CouponKind::Streak => CouponState::Streak {
                monetary_value: initial_value,
                current_streak: 0,
                highest_streak: 0,
            },
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CouponKind::Monetary => "monetary",
            CouponKind::Usage => "usage",
            CouponKind::Streak => "streak",
        };
        f.write_str(name)
    }
}

/// Addresses one ledger: a coupon id inside its kind's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CouponKey {
    pub kind: CouponKind,
    pub id: String,
}

impl CouponKey {
    pub fn new(kind: CouponKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn monetary(id: impl Into<String>) -> Self {
        Self::new(CouponKind::Monetary, id)
    }

    pub fn usage(id: impl Into<String>) -> Self {
        Self::new(CouponKind::Usage, id)
    }

    pub fn streak(id: impl Into<String>) -> Self {
        Self::new(CouponKind::Streak, id)
    }

    pub fn balance_cache_key(&self) -> String {
        let suffix = match self.kind {
            CouponKind::Monetary => "balance",
            CouponKind::Usage => "uses",
            CouponKind::Streak => "value",
        };
        format!("{}_{}_{}", self.kind.cache_prefix(), self.id, suffix)
    }

    pub fn history_cache_key(&self) -> String {
        format!("{}_{}_history", self.kind.cache_prefix(), self.id)
    }

    pub fn streak_cache_key(&self) -> String {
        format!("{}_{}_data", self.kind.cache_prefix(), self.id)
    }
}

impl fmt::Display for CouponKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.collection(), self.id)
    }
}

/// Streak counters kept alongside a streak coupon's monetary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakCounters {
    pub current_streak: u32,
    pub highest_streak: u32,
}

/// Kind-specific coupon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CouponState {
    Monetary {
        balance: u64,
    },
    Usage {
        uses_remaining: u64,
    },
    Streak {
        monetary_value: u64,
        current_streak: u32,
        highest_streak: u32,
    },
}

impl CouponState {
    pub fn kind(&self) -> CouponKind {
        match self {
            CouponState::Monetary { .. } => CouponKind::Monetary,
            CouponState::Usage { .. } => CouponKind::Usage,
            CouponState::Streak { .. } => CouponKind::Streak,
        }
    }

    pub fn balance_or_uses(&self) -> u64 {
        match *self {
            CouponState::Monetary { balance } => balance,
            CouponState::Usage { uses_remaining } => uses_remaining,
            CouponState::Streak { monetary_value, .. } => monetary_value,
        }
    }

    /// Returns the same state with `balance_or_uses` replaced.
    pub fn with_balance(self, value: u64) -> Self {
        match self {
            CouponState::Monetary { .. } => CouponState::Monetary { balance: value },
            CouponState::Usage { .. } => CouponState::Usage {
                uses_remaining: value,
            },
            CouponState::Streak {
                current_streak,
                highest_streak,
                ..
            } => CouponState::Streak {
                monetary_value: value,
                current_streak,
                highest_streak,
            },
        }
    }

    pub fn streak_counters(&self) -> Option<StreakCounters> {
        match *self {
            CouponState::Streak {
                current_streak,
                highest_streak,
                ..
            } => Some(StreakCounters {
                current_streak,
                highest_streak,
            }),
            _ => None,
        }
    }

    pub fn status(&self) -> CouponStatus {
        if self.balance_or_uses() == 0 {
            CouponStatus::Depleted
        } else {
            CouponStatus::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Depleted,
}

impl fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponStatus::Active => f.write_str("active"),
            CouponStatus::Depleted => f.write_str("depleted"),
        }
    }
}

/// One coupon's ledger: its state plus the append-only redemption history.
///
/// This is also the shape of the remote document, so field names double as
/// document field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRecord {
    #[serde(flatten)]
    pub state: CouponState,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl CouponRecord {
    /// A fresh record with the initial value and no history.
    pub fn new(kind: CouponKind, initial_value: u64) -> Self {
        Self::from_state(kind.initial_state(initial_value))
    }

    pub fn from_state(state: CouponState) -> Self {
        Self {
            state,
            history: Vec::new(),
            created_at: None,
            last_updated: None,
            reset_at: None,
        }
    }

    pub fn balance_or_uses(&self) -> u64 {
        self.state.balance_or_uses()
    }

    pub fn kind(&self) -> CouponKind {
        self.state.kind()
    }
}
