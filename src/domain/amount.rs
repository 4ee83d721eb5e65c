use crate::error::RedemptionError;
use std::str::FromStr;

/// A strictly positive whole amount requested for redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RedemptionAmount(u64);

impl RedemptionAmount {
    pub fn new(value: i64) -> Result<Self, RedemptionError> {
        if value > 0 {
            Ok(Self(value as u64))
        } else {
            Err(RedemptionError::InvalidAmount(format!(
                "{value} is not a positive whole number"
            )))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for RedemptionAmount {
    type Error = RedemptionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RedemptionAmount> for u64 {
    fn from(amount: RedemptionAmount) -> Self {
        amount.0
    }
}

impl FromStr for RedemptionAmount {
    type Err = RedemptionError;

    /// Accepts only whole decimal integers; fractions and text are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed.parse().map_err(|_| {
            RedemptionError::InvalidAmount(format!("{trimmed:?} is not a whole number"))
        })?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert_eq!(RedemptionAmount::new(5000).unwrap().value(), 5000);
        assert!(matches!(
            RedemptionAmount::new(0),
            Err(RedemptionError::InvalidAmount(_))
        ));
        assert!(matches!(
            RedemptionAmount::new(-1),
            Err(RedemptionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(" 12 ".parse::<RedemptionAmount>().unwrap().value(), 12);
        for bad in ["1.5", "abc", "", "-3", "0"] {
            assert!(
                matches!(
                    bad.parse::<RedemptionAmount>(),
                    Err(RedemptionError::InvalidAmount(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
