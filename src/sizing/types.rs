use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::Locale;

/// One realised trade outcome, as logged by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: String,
    /// Signed profit/loss: positive = win, negative = loss, zero = breakeven.
    pub outcome: f64,
    /// Creation time; only used for display ordering.
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Create a record stamped with the current time and a fresh id.
    pub fn new(outcome: f64) -> Self {
        let timestamp = Utc::now();
        let id = format!(
            "{}-{:06x}",
            timestamp.timestamp_millis(),
            rand::random::<u32>() & 0x00ff_ffff
        );
        Self {
            id,
            outcome,
            timestamp,
        }
    }

    pub fn is_win(&self) -> bool {
        self.outcome > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.outcome < 0.0
    }

    pub fn is_breakeven(&self) -> bool {
        self.outcome == 0.0
    }
}

/// How aggressively to apply the raw Kelly fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAdjustment {
    /// Fractional Kelly multiplier in (0, 1]; 0.5 = half-Kelly.
    pub fraction_multiplier: f64,
    /// Upper bound on the final fraction, in (0, 1].
    pub max_position_fraction: f64,
}

impl RiskAdjustment {
    pub fn new(fraction_multiplier: f64, max_position_fraction: f64) -> Self {
        Self {
            fraction_multiplier,
            max_position_fraction,
        }
    }
}

impl Default for RiskAdjustment {
    fn default() -> Self {
        Self {
            fraction_multiplier: 1.0,
            max_position_fraction: 1.0,
        }
    }
}

/// Manually entered trading statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KellyFormData {
    /// Win rate as a percentage (0–100).
    pub win_rate: f64,
    pub avg_win: f64,
    /// Average loss as a positive magnitude.
    pub avg_loss: f64,
}

/// Summary statistics reduced from a trade log.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStats {
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
}

impl TradeStats {
    pub fn form_data(&self) -> KellyFormData {
        KellyFormData {
            win_rate: self.win_rate,
            avg_win: self.avg_win,
            avg_loss: self.avg_loss,
        }
    }
}

/// Where the statistics for one computation come from.
#[derive(Debug, Clone, Copy)]
pub enum KellyInput<'a> {
    Manual(KellyFormData),
    /// Borrowed for the duration of the call only.
    FromTrades(&'a [TradeRecord]),
}

/// Advisory notes that accompany a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum KellyWarning {
    /// Raw Kelly fraction was zero or negative; nothing to trade.
    NonPositiveEdge { raw_fraction: f64 },
    /// The position cap cut the multiplied fraction down.
    PositionCapped {
        uncapped_fraction: f64,
        max_position_fraction: f64,
    },
}

impl KellyWarning {
    pub fn localized(&self, locale: Locale) -> String {
        match (locale, self) {
            (Locale::En, _) => self.to_string(),
            (Locale::Zh, KellyWarning::NonPositiveEdge { raw_fraction }) => format!(
                "期望收益为负或为零（原始凯利值 {:.4}），不建议开仓",
                raw_fraction
            ),
            (
                Locale::Zh,
                KellyWarning::PositionCapped {
                    uncapped_fraction,
                    max_position_fraction,
                },
            ) => format!(
                "仓位已限制为 {:.2}%（限制前为 {:.2}%）",
                max_position_fraction * 100.0,
                uncapped_fraction * 100.0
            ),
        }
    }
}

impl fmt::Display for KellyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KellyWarning::NonPositiveEdge { raw_fraction } => write!(
                f,
                "negative or zero edge (raw Kelly {:.4}), no position recommended",
                raw_fraction
            ),
            KellyWarning::PositionCapped {
                uncapped_fraction,
                max_position_fraction,
            } => write!(
                f,
                "position capped at {:.2}% (uncapped {:.2}%)",
                max_position_fraction * 100.0,
                uncapped_fraction * 100.0
            ),
        }
    }
}

/// Output of a successful computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KellyResult {
    /// Unclamped optimal fraction; negative means "do not trade".
    pub raw_kelly_fraction: f64,
    /// After multiplier and cap, always in [0, max_position_fraction].
    pub adjusted_fraction: f64,
    pub recommended_position_percentage: f64,
    /// Average win over average loss.
    pub payoff_ratio: f64,
    /// Expected profit per trade, in the units of the inputs.
    pub expectancy: f64,
    /// The statistics the estimate was computed from.
    pub inputs: KellyFormData,
    /// Present when the statistics were aggregated from a trade log.
    pub trade_stats: Option<TradeStats>,
    pub warnings: Vec<KellyWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_record_classification() {
        assert!(TradeRecord::new(12.5).is_win());
        assert!(TradeRecord::new(-3.0).is_loss());
        let flat = TradeRecord::new(0.0);
        assert!(flat.is_breakeven());
        assert!(!flat.is_win() && !flat.is_loss());
    }

    #[test]
    fn test_trade_record_ids_are_distinct() {
        let ids: std::collections::HashSet<String> =
            (0..50).map(|_| TradeRecord::new(1.0).id).collect();
        assert!(ids.len() > 45);
    }

    #[test]
    fn test_risk_adjustment_defaults_to_full_kelly() {
        let adj = RiskAdjustment::default();
        assert_eq!(adj.fraction_multiplier, 1.0);
        assert_eq!(adj.max_position_fraction, 1.0);

        let parsed: RiskAdjustment =
            serde_json::from_str(r#"{"fractionMultiplier":0.5,"maxPositionFraction":0.2}"#)
                .unwrap();
        assert_eq!(parsed, RiskAdjustment::new(0.5, 0.2));
        // A partial policy never silently falls back to the full-Kelly cap.
        assert!(serde_json::from_str::<RiskAdjustment>(r#"{"fractionMultiplier":0.5}"#).is_err());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = KellyWarning::NonPositiveEdge { raw_fraction: -0.2 };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "nonPositiveEdge");
        assert_eq!(json["rawFraction"], -0.2);
    }
}
