//! Progressive bracket calculation.

use crate::brackets::types::{BracketError, TaxBracket, TaxComputation};

/// Compute tax owed and effective rate for `salary` over ordered `brackets`.
///
/// Brackets are walked in the given order and the walk stops at the first
/// bracket whose `min` is not below the salary, so the slice must be sorted
/// ascending by `min` (see [`validate`]). A zero or negative salary yields an
/// effective rate of `0`.
pub fn compute(salary: f64, brackets: &[TaxBracket]) -> TaxComputation {
    let mut tax = 0.0;

    for bracket in brackets {
        if salary <= bracket.min {
            break;
        }

        let taxable = match bracket.max {
            Some(max) if salary > max => max - bracket.min,
            _ => salary - bracket.min,
        };

        tax += taxable * bracket.rate;
    }

    let effective_rate = if salary > 0.0 {
        ((tax / salary) * 1000.0).round() / 1000.0
    } else {
        0.0
    };

    TaxComputation {
        tax,
        effective_rate,
    }
}

/// Check that `brackets` can be fed to [`compute`].
///
/// Rejects descending `min` values, bounded brackets with `max <= min`, and
/// rates outside `[0, 1]`. An empty slice is valid here; emptiness is an
/// upstream concern.
pub fn validate(brackets: &[TaxBracket]) -> Result<(), BracketError> {
    let mut previous_min: Option<f64> = None;

    for (index, bracket) in brackets.iter().enumerate() {
        if !(0.0..=1.0).contains(&bracket.rate) {
            return Err(BracketError::InvalidRate {
                index,
                rate: bracket.rate,
            });
        }

        if let Some(max) = bracket.max {
            if max <= bracket.min {
                return Err(BracketError::EmptyRange {
                    index,
                    min: bracket.min,
                    max,
                });
            }
        }

        if let Some(previous_min) = previous_min {
            if bracket.min < previous_min {
                return Err(BracketError::OutOfOrder {
                    index,
                    min: bracket.min,
                    previous_min,
                });
            }
        }
        previous_min = Some(bracket.min);
    }

    Ok(())
}
