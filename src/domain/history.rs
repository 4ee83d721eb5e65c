use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Redemption,
    WorkoutCompleted,
    StreakReset,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryAction::Redemption => f.write_str("redemption"),
            HistoryAction::WorkoutCompleted => f.write_str("workout_completed"),
            HistoryAction::StreakReset => f.write_str("streak_reset"),
        }
    }
}

/// Streak counters before and after a streak action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTransition {
    pub before: u32,
    pub after: u32,
    pub highest_after: u32,
}

/// One immutable entry of a coupon's history.
///
/// `timestamp` is the ordering key. `date` and `time` are display strings
/// derived from it and are only consulted when an entry has no timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    /// Amount redeemed, or reward earned for streak actions.
    pub amount: u64,
    /// `balance_or_uses` immediately after this entry.
    pub resulting_balance: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<StreakTransition>,
}

impl HistoryEntry {
    pub fn redemption(amount: u64, resulting_balance: u64, at: DateTime<Utc>) -> Self {
        Self::stamped(HistoryAction::Redemption, amount, resulting_balance, at, None)
    }

    pub fn workout(
        reward: u64,
        resulting_balance: u64,
        streak: StreakTransition,
        at: DateTime<Utc>,
    ) -> Self {
        Self::stamped(
            HistoryAction::WorkoutCompleted,
            reward,
            resulting_balance,
            at,
            Some(streak),
        )
    }

    pub fn streak_reset(resulting_balance: u64, streak: StreakTransition, at: DateTime<Utc>) -> Self {
        Self::stamped(
            HistoryAction::StreakReset,
            0,
            resulting_balance,
            at,
            Some(streak),
        )
    }

    fn stamped(
        action: HistoryAction,
        amount: u64,
        resulting_balance: u64,
        at: DateTime<Utc>,
        streak: Option<StreakTransition>,
    ) -> Self {
        Self {
            action,
            amount,
            resulting_balance,
            timestamp: Some(at),
            date: at.format(DATE_FORMAT).to_string(),
            time: at.format(TIME_FORMAT).to_string(),
            streak,
        }
    }

    /// The instant this entry sorts by, if one can be determined.
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        self.timestamp.or_else(|| {
            let combined = format!("{} {}", self.date, self.time);
            NaiveDateTime::parse_from_str(&combined, &format!("{DATE_FORMAT} {TIME_FORMAT}"))
                .ok()
                .map(|naive| naive.and_utc())
        })
    }
}

/// Orders history most-recent first.
///
/// Storage order is append order; this is applied only when presenting. Entries
/// without a usable instant go last and ties keep their stored order.
pub fn sorted_for_display(history: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let mut sorted = history.to_vec();
    // `None < Some(_)`, so reversing puts undated entries at the end.
    sorted.sort_by_key(|entry| Reverse(entry.sort_key()));
    sorted
}
