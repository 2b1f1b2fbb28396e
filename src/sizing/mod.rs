//! Kelly-criterion position sizing.
//!
//! `trades → aggregate → {win rate, avg win, avg loss} → estimate → adjust`.
//! Manual entry skips aggregation.  Every call is pure: the engine holds no
//! state and only borrows the trade log for the duration of the call.

pub mod aggregate;
pub mod error;
pub mod kelly;
pub mod risk;
pub mod types;

pub use error::{ErrorKind, KellyErrors, Locale};
pub use types::{
    KellyFormData, KellyInput, KellyResult, KellyWarning, RiskAdjustment, TradeRecord,
};

use tracing::debug;

/// Validate, estimate and risk-adjust in one call.
///
/// Returns either a result (possibly carrying warnings) or the full list of
/// problems found; never both.
pub fn compute_kelly(
    input: KellyInput<'_>,
    adjustment: &RiskAdjustment,
) -> Result<KellyResult, KellyErrors> {
    risk::validate(&input, adjustment)?;

    let (inputs, trade_stats) = match input {
        KellyInput::Manual(form) => (form, None),
        KellyInput::FromTrades(trades) => {
            let stats = aggregate::aggregate_trades(trades);
            debug!(
                "Aggregated {} trades: {} wins, {} losses, {} breakeven",
                stats.total_trades, stats.wins, stats.losses, stats.breakeven
            );
            (stats.form_data(), Some(stats))
        }
    };

    let estimate = kelly::estimate(&inputs)?;
    let adjusted = risk::adjust(&estimate, adjustment);

    debug!(
        raw = estimate.raw_fraction,
        adjusted = adjusted.fraction,
        warnings = adjusted.warnings.len(),
        "Kelly fraction computed"
    );

    Ok(KellyResult {
        raw_kelly_fraction: estimate.raw_fraction,
        adjusted_fraction: adjusted.fraction,
        recommended_position_percentage: adjusted.fraction * 100.0,
        payoff_ratio: estimate.payoff_ratio,
        expectancy: estimate.expectancy,
        inputs,
        trade_stats,
        warnings: adjusted.warnings,
    })
}
