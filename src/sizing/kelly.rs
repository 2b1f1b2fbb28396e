//! Kelly Criterion estimator for a repeated trade with asymmetric payoff.
//!
//! The Kelly formula sizes a position to maximise the expected logarithm of
//! wealth, which balances risk and reward optimally over the long run.
//!
//! Formula used here:
//!   f* = W − (1 − W) / R
//! where
//!   W  = probability of a winning trade (win rate / 100)
//!   R  = payoff ratio (average win / average loss)
//!
//! The result is signed: a negative fraction means the statistics show no
//! edge.  Dampening and capping happen later, in `risk`.

use super::error::{DataShortfall, KellyError};
use super::types::KellyFormData;

/// Raw output of the Kelly formula, before any risk adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KellyEstimate {
    pub raw_fraction: f64,
    pub payoff_ratio: f64,
    /// Expected profit per trade: W·avg_win − (1 − W)·avg_loss.
    pub expectancy: f64,
}

/// Apply the Kelly formula to win rate (0–100) and average win/loss.
///
/// Only a zero average loss fails: against a positive average win it is
/// `DivisionByZero`, and two zero averages are `InsufficientData`.  A zero
/// average win against a positive average loss has no finite Kelly fraction;
/// it is reported as `-1.0`, as is a loss-to-win ratio that overflows.
pub fn estimate(stats: &KellyFormData) -> Result<KellyEstimate, KellyError> {
    let KellyFormData {
        win_rate,
        avg_win,
        avg_loss,
    } = *stats;

    if avg_loss == 0.0 {
        return Err(if avg_win > 0.0 {
            KellyError::DivisionByZero
        } else {
            KellyError::InsufficientData(DataShortfall::NoWinOrLoss)
        });
    }

    let w = win_rate / 100.0;
    let q = 1.0 - w;

    // f* = W − Q·(avg_loss / avg_win); 1/R stays finite for any huge win.
    let raw_fraction = if avg_win == 0.0 {
        -1.0
    } else if q == 0.0 {
        1.0
    } else {
        let loss_per_win = avg_loss / avg_win;
        if loss_per_win.is_finite() {
            w - q * loss_per_win
        } else {
            -1.0
        }
    };

    Ok(KellyEstimate {
        raw_fraction,
        payoff_ratio: (avg_win / avg_loss).min(f64::MAX),
        expectancy: w * avg_win - q * avg_loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::error::ErrorKind;
    use approx::assert_relative_eq;

    fn stats(win_rate: f64, avg_win: f64, avg_loss: f64) -> KellyFormData {
        KellyFormData {
            win_rate,
            avg_win,
            avg_loss,
        }
    }

    #[test]
    fn test_kelly_positive_edge() {
        // W = 0.6, R = 1.5 → f = 0.6 − 0.4 / 1.5 = 1/3
        let est = estimate(&stats(60.0, 150.0, 100.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, 1.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(est.payoff_ratio, 1.5, epsilon = 1e-9);
        assert_relative_eq!(est.expectancy, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_kelly_negative_edge() {
        // W = 0.4, R = 1 → f = 0.4 − 0.6 = −0.2
        let est = estimate(&stats(40.0, 100.0, 100.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, -0.2, epsilon = 1e-9);
        assert!(est.expectancy < 0.0);
    }

    #[test]
    fn test_kelly_no_edge() {
        let est = estimate(&stats(50.0, 100.0, 100.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_certain_win_and_certain_loss() {
        let est = estimate(&stats(100.0, 10.0, 20.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, 1.0, epsilon = 1e-9);

        // W = 0 → f = −1 / R
        let est = estimate(&stats(0.0, 10.0, 20.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_loss_with_wins_is_division_by_zero() {
        let err = estimate(&stats(60.0, 10.0, 0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_zero_win_and_zero_loss_is_insufficient() {
        let err = estimate(&stats(50.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_zero_win_with_losses_is_full_loss_bet() {
        let est = estimate(&stats(0.0, 0.0, 25.0)).unwrap();
        assert_relative_eq!(est.raw_fraction, -1.0, epsilon = 1e-9);
        assert_relative_eq!(est.payoff_ratio, 0.0, epsilon = 1e-9);
        assert!(est.raw_fraction.is_finite());
    }

    #[test]
    fn test_huge_average_win_is_not_division_by_zero() {
        // R overflows, 1/R does not: f ≈ W.
        let est = estimate(&stats(60.0, 1e308, 0.5)).unwrap();
        assert_relative_eq!(est.raw_fraction, 0.6, epsilon = 1e-9);
        assert!(est.payoff_ratio.is_finite());
        assert!(est.expectancy.is_finite());

        let est = estimate(&stats(50.0, 1e300, 1e-300)).unwrap();
        assert_relative_eq!(est.raw_fraction, 0.5, epsilon = 1e-9);
        assert_eq!(est.payoff_ratio, f64::MAX);
    }

    #[test]
    fn test_vanishing_average_win_is_full_loss_bet() {
        let est = estimate(&stats(50.0, 1e-300, 1e300)).unwrap();
        assert_relative_eq!(est.raw_fraction, -1.0, epsilon = 1e-9);
    }
}
