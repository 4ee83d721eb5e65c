use crate::application::engine::RedemptionEngine;
use crate::config::CouponConfig;
use crate::domain::amount::RedemptionAmount;
use crate::domain::coupon::{CouponKey, CouponKind};
use crate::error::{LedgerError, RedemptionError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Load,
    Redeem,
    Reset,
    Workout,
    StreakReset,
}

/// One row of the command file.
///
/// `amount` is kept as raw text so that fractional or non-numeric amounts are
/// rejected as invalid requests rather than as unreadable rows.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CouponCommand {
    pub r#type: CommandType,
    pub kind: CouponKind,
    pub coupon: String,
    #[serde(default)]
    pub amount: Option<String>,
}

impl CouponCommand {
    pub fn key(&self) -> CouponKey {
        CouponKey::new(self.kind, self.coupon.clone())
    }

    /// Applies the command to the engine.
    pub async fn execute(&self, engine: &RedemptionEngine) -> Result<()> {
        let key = self.key();
        match self.r#type {
            CommandType::Load => {
                let config = CouponConfig::new(key, self.optional_amount()?, None)?;
                engine.load_configured(&config).await;
            }
            CommandType::Reset => {
                let config = CouponConfig::new(key, self.optional_amount()?, None)?;
                engine.reset_coupon(&config.key, config.initial_value).await;
            }
            CommandType::Redeem => {
                let raw = self.amount.as_deref().ok_or_else(|| {
                    RedemptionError::InvalidAmount("redeem requires an amount".to_string())
                })?;
                let amount: RedemptionAmount = raw.parse()?;
                engine.redeem_amount(&key, amount).await?;
            }
            CommandType::Workout => {
                let reward = self.optional_amount()?;
                engine.record_workout(&key, reward).await?;
            }
            CommandType::StreakReset => {
                engine.reset_streak(&key).await?;
            }
        }
        Ok(())
    }

    fn optional_amount(&self) -> Result<Option<u64>> {
        match self.amount.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
                RedemptionError::InvalidAmount(format!("{raw:?} is not a whole number")).into()
            }),
        }
    }
}

/// Reads coupon commands from a CSV source.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<CouponCommand>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ledger::LedgerStore;
    use crate::infrastructure::in_memory::{InMemoryCache, InMemoryDocumentStore};

    fn engine() -> RedemptionEngine {
        RedemptionEngine::new(LedgerStore::new(
            Box::new(InMemoryDocumentStore::new()),
            Box::new(InMemoryCache::new()),
        ))
    }

    #[test]
    fn test_reader_valid_stream() {
        let data = "type, kind, coupon, amount\nload, monetary, birthday, 15000\nstreak_reset, streak, workout,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<CouponCommand>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.r#type, CommandType::Load);
        assert_eq!(first.key(), CouponKey::monetary("birthday"));
        assert_eq!(first.amount.as_deref(), Some("15000"));

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.r#type, CommandType::StreakReset);
        assert_eq!(second.amount, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "type, kind, coupon, amount\nrefund, monetary, birthday, 1\nload, voucher, x, 1";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<CouponCommand>> = reader.commands().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_fractional_redeem() {
        let engine = engine();
        let command = CouponCommand {
            r#type: CommandType::Redeem,
            kind: CouponKind::Monetary,
            coupon: "birthday".to_string(),
            amount: Some("1.5".to_string()),
        };

        let result = command.execute(&engine).await;
        assert!(matches!(
            result,
            Err(LedgerError::Redemption(RedemptionError::InvalidAmount(_)))
        ));
        assert!(engine.view(&command.key()).await.is_none());
    }

    #[tokio::test]
    async fn test_execute_rejects_zero_initial_value() {
        let engine = engine();
        for r#type in [CommandType::Load, CommandType::Reset] {
            let command = CouponCommand {
                r#type,
                kind: CouponKind::Monetary,
                coupon: "empty".to_string(),
                amount: Some("0".to_string()),
            };

            let result = command.execute(&engine).await;
            assert!(matches!(result, Err(LedgerError::Config(_))));
            assert!(engine.view(&command.key()).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_execute_load_uses_kind_default() {
        let engine = engine();
        let command = CouponCommand {
            r#type: CommandType::Load,
            kind: CouponKind::Usage,
            coupon: "massage".to_string(),
            amount: None,
        };

        command.execute(&engine).await.unwrap();
        assert_eq!(engine.view(&command.key()).await.unwrap().balance, 1);
    }
}
