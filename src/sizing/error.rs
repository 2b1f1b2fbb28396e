use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Language used when rendering error and warning messages for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

/// Machine-checkable error category.  Callers (and tests) match on this,
/// never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidRange,
    InsufficientData,
    DivisionByZero,
}

/// A user-facing numeric input that has a required range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    WinRate,
    AvgWin,
    AvgLoss,
    FractionMultiplier,
    MaxPositionFraction,
    TradeOutcome,
}

impl Field {
    /// Wire name, matching the camelCase request fields.
    pub fn name(self) -> &'static str {
        match self {
            Field::WinRate => "winRate",
            Field::AvgWin => "avgWin",
            Field::AvgLoss => "avgLoss",
            Field::FractionMultiplier => "fractionMultiplier",
            Field::MaxPositionFraction => "maxPositionFraction",
            Field::TradeOutcome => "trade outcome",
        }
    }

    fn name_zh(self) -> &'static str {
        match self {
            Field::WinRate => "胜率",
            Field::AvgWin => "平均盈利",
            Field::AvgLoss => "平均亏损",
            Field::FractionMultiplier => "凯利系数",
            Field::MaxPositionFraction => "最大仓位比例",
            Field::TradeOutcome => "交易盈亏",
        }
    }

    fn bounds(self) -> &'static str {
        match self {
            Field::WinRate => "within [0, 100]",
            Field::AvgWin | Field::AvgLoss => "a finite value >= 0",
            Field::FractionMultiplier | Field::MaxPositionFraction => "within (0, 1]",
            Field::TradeOutcome => "a finite number",
        }
    }

    fn bounds_zh(self) -> &'static str {
        match self {
            Field::WinRate => "必须在 [0, 100] 范围内",
            Field::AvgWin | Field::AvgLoss => "必须为不小于 0 的有限数值",
            Field::FractionMultiplier | Field::MaxPositionFraction => "必须在 (0, 1] 范围内",
            Field::TradeOutcome => "必须为有限数值",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why there is not enough data to estimate an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShortfall {
    /// The trade log is empty.
    NoTrades,
    /// Every logged trade closed at exactly zero.
    OnlyBreakeven,
    /// Both average win and average loss are zero.
    NoWinOrLoss,
}

impl DataShortfall {
    fn message_zh(self) -> &'static str {
        match self {
            DataShortfall::NoTrades => "没有可用的交易记录",
            DataShortfall::OnlyBreakeven => "所有交易记录均为保本交易",
            DataShortfall::NoWinOrLoss => "至少需要一个盈利或亏损金额",
        }
    }
}

impl fmt::Display for DataShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataShortfall::NoTrades => "no trade records to aggregate",
            DataShortfall::OnlyBreakeven => "every trade record is breakeven",
            DataShortfall::NoWinOrLoss => "at least one win or loss amount required",
        })
    }
}

/// A single validation or computation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KellyError {
    #[error("{field} must be {}, got {value}", .field.bounds())]
    InvalidRange { field: Field, value: f64 },

    /// A logged trade whose outcome is NaN or infinite.
    #[error("trade {id}: outcome must be a finite number, got {value}")]
    InvalidTrade { id: String, value: f64 },

    #[error("insufficient data: {0}")]
    InsufficientData(DataShortfall),

    #[error("average loss must be greater than zero to compute a payoff ratio")]
    DivisionByZero,
}

impl KellyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KellyError::InvalidRange { .. } | KellyError::InvalidTrade { .. } => {
                ErrorKind::InvalidRange
            }
            KellyError::InsufficientData(_) => ErrorKind::InsufficientData,
            KellyError::DivisionByZero => ErrorKind::DivisionByZero,
        }
    }

    /// The offending field for range errors.
    pub fn field(&self) -> Option<Field> {
        match self {
            KellyError::InvalidRange { field, .. } => Some(*field),
            KellyError::InvalidTrade { .. } => Some(Field::TradeOutcome),
            _ => None,
        }
    }

    /// Id of the trade record an error points at.
    pub fn trade_id(&self) -> Option<&str> {
        match self {
            KellyError::InvalidTrade { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Zh => match self {
                KellyError::InvalidRange { field, value } => {
                    format!("{}{}，当前值为 {}", field.name_zh(), field.bounds_zh(), value)
                }
                KellyError::InvalidTrade { id, value } => {
                    format!("交易 {}：盈亏必须为有限数值，当前值为 {}", id, value)
                }
                KellyError::InsufficientData(reason) => {
                    format!("数据不足：{}", reason.message_zh())
                }
                KellyError::DivisionByZero => "平均亏损必须大于 0 才能计算盈亏比".to_string(),
            },
        }
    }
}

/// Every problem found in one computation call.  Never empty.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_messages(.0))]
pub struct KellyErrors(Vec<KellyError>);

fn join_messages(errors: &[KellyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl KellyErrors {
    /// Wrap collected errors; `None` when nothing was collected.
    pub fn from_vec(errors: Vec<KellyError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn as_slice(&self) -> &[KellyError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KellyError> {
        self.as_slice().iter()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.0.iter().map(KellyError::kind).collect()
    }
}

impl From<KellyError> for KellyErrors {
    fn from(err: KellyError) -> Self {
        Self(vec![err])
    }
}

impl<'a> IntoIterator for &'a KellyErrors {
    type Item = &'a KellyError;
    type IntoIter = std::slice::Iter<'a, KellyError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
