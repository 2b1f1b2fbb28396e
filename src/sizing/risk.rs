use super::error::{DataShortfall, Field, KellyError, KellyErrors};
use super::kelly::KellyEstimate;
use super::types::{KellyFormData, KellyInput, KellyWarning, RiskAdjustment, TradeRecord};

/// Final fraction after dampening and capping, plus any advisory notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjusted {
    pub fraction: f64,
    pub warnings: Vec<KellyWarning>,
}

/// Check every user-facing input and report all violations together.
pub fn validate(input: &KellyInput<'_>, adjustment: &RiskAdjustment) -> Result<(), KellyErrors> {
    let mut errors = Vec::new();
    match input {
        KellyInput::Manual(form) => check_form(form, &mut errors),
        KellyInput::FromTrades(trades) => check_trades(trades, &mut errors),
    }
    check_adjustment(adjustment, &mut errors);

    match KellyErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

/// Range-check a risk policy on its own (used for configured defaults too).
pub fn check_adjustment(adjustment: &RiskAdjustment, errors: &mut Vec<KellyError>) {
    check_unit_interval(
        Field::FractionMultiplier,
        adjustment.fraction_multiplier,
        errors,
    );
    check_unit_interval(
        Field::MaxPositionFraction,
        adjustment.max_position_fraction,
        errors,
    );
}

fn check_form(form: &KellyFormData, errors: &mut Vec<KellyError>) {
    if !(0.0..=100.0).contains(&form.win_rate) {
        errors.push(KellyError::InvalidRange {
            field: Field::WinRate,
            value: form.win_rate,
        });
    }
    check_magnitude(Field::AvgWin, form.avg_win, errors);
    check_magnitude(Field::AvgLoss, form.avg_loss, errors);
}

fn check_trades(trades: &[TradeRecord], errors: &mut Vec<KellyError>) {
    if trades.is_empty() {
        errors.push(KellyError::InsufficientData(DataShortfall::NoTrades));
        return;
    }
    for trade in trades.iter().filter(|t| !t.outcome.is_finite()) {
        errors.push(KellyError::InvalidTrade {
            id: trade.id.clone(),
            value: trade.outcome,
        });
    }
    if trades.iter().all(TradeRecord::is_breakeven) {
        errors.push(KellyError::InsufficientData(DataShortfall::OnlyBreakeven));
    }
}

fn check_magnitude(field: Field, value: f64, errors: &mut Vec<KellyError>) {
    // Negative magnitudes are malformed input, never auto-negated.
    if !(value.is_finite() && value >= 0.0) {
        errors.push(KellyError::InvalidRange { field, value });
    }
}

fn check_unit_interval(field: Field, value: f64, errors: &mut Vec<KellyError>) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(KellyError::InvalidRange { field, value });
    }
}

/// Apply the fractional multiplier and position cap to a raw estimate.
///
/// adjusted = min(max(0, raw) × multiplier, cap).  A non-positive raw
/// fraction always yields zero with a `NonPositiveEdge` warning; the cap
/// only warns when it actually cut the value.
pub fn adjust(estimate: &KellyEstimate, adjustment: &RiskAdjustment) -> Adjusted {
    let mut warnings = Vec::new();
    let raw = estimate.raw_fraction;

    if raw <= 0.0 {
        warnings.push(KellyWarning::NonPositiveEdge { raw_fraction: raw });
        return Adjusted {
            fraction: 0.0,
            warnings,
        };
    }

    let uncapped = raw * adjustment.fraction_multiplier;
    let cap = adjustment.max_position_fraction;
    let fraction = if uncapped > cap {
        warnings.push(KellyWarning::PositionCapped {
            uncapped_fraction: uncapped,
            max_position_fraction: cap,
        });
        cap
    } else {
        uncapped
    };

    Adjusted { fraction, warnings }
}
