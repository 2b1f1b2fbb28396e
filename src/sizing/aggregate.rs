use super::types::{TradeRecord, TradeStats};

/// Reduce a trade log to win rate and average win/loss.
///
/// Breakeven trades count towards `total_trades` (and therefore dilute the
/// win rate) but are excluded from both averages.  An empty log yields
/// all-zero statistics; rejecting degenerate statistics is the estimator's job.
/// `avg_loss` is a positive magnitude.  Both averages are running means, so
/// they stay finite for any log of finite outcomes.
pub fn aggregate_trades(trades: &[TradeRecord]) -> TradeStats {
    let mut stats = TradeStats {
        total_trades: trades.len(),
        ..TradeStats::default()
    };

    for trade in trades {
        if trade.is_win() {
            stats.wins += 1;
            stats.avg_win += (trade.outcome - stats.avg_win) / stats.wins as f64;
        } else if trade.is_loss() {
            stats.losses += 1;
            stats.avg_loss += (trade.outcome.abs() - stats.avg_loss) / stats.losses as f64;
        } else {
            stats.breakeven += 1;
        }
    }

    if stats.total_trades > 0 {
        stats.win_rate = stats.wins as f64 / stats.total_trades as f64 * 100.0;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trades(outcomes: &[f64]) -> Vec<TradeRecord> {
        outcomes.iter().map(|&o| TradeRecord::new(o)).collect()
    }

    #[test]
    fn test_mixed_log_with_breakeven() {
        let stats = aggregate_trades(&trades(&[100.0, -50.0, 100.0, 0.0]));
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.breakeven, 1);
        assert_relative_eq!(stats.win_rate, 50.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_win, 100.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_loss, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_log_is_all_zero() {
        let stats = aggregate_trades(&[]);
        assert_eq!(stats, TradeStats::default());
    }

    #[test]
    fn test_loss_average_is_positive_magnitude() {
        let stats = aggregate_trades(&trades(&[-10.0, -30.0]));
        assert_relative_eq!(stats.avg_loss, 20.0, epsilon = 1e-9);
        assert_relative_eq!(stats.win_rate, 0.0, epsilon = 1e-9);
        assert_relative_eq!(stats.avg_win, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_huge_outcomes_do_not_overflow_averages() {
        let stats = aggregate_trades(&trades(&[1e308, 1e308, -10.0]));
        assert_eq!(stats.avg_win, 1e308);
        assert_relative_eq!(stats.avg_loss, 10.0, epsilon = 1e-9);
        assert!(stats.avg_win.is_finite());
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = aggregate_trades(&trades(&[5.0, -2.0, 7.5, 0.0, -1.0]));
        let b = aggregate_trades(&trades(&[-1.0, 0.0, 7.5, -2.0, 5.0]));
        assert_relative_eq!(a.win_rate, b.win_rate, epsilon = 1e-12);
        assert_relative_eq!(a.avg_win, b.avg_win, epsilon = 1e-12);
        assert_relative_eq!(a.avg_loss, b.avg_loss, epsilon = 1e-12);
    }

    #[test]
    fn test_win_rate_recovers_win_count() {
        // Deterministic pseudo-random walk of outcomes.
        let mut seed = 7u64;
        for len in 1..40usize {
            let outcomes: Vec<f64> = (0..len)
                .map(|_| {
                    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                    ((seed >> 33) % 21) as f64 - 10.0
                })
                .collect();
            let stats = aggregate_trades(&trades(&outcomes));
            let expected = outcomes.iter().filter(|&&o| o > 0.0).count();
            let recovered = stats.win_rate * stats.total_trades as f64 / 100.0;
            assert_eq!(recovered.round() as usize, expected);
        }
    }
}
