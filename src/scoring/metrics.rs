//! Relative error metrics.

use crate::error::{IndexError, Result};

fn check_pairs(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() {
        return Err(IndexError::DataError("No values to score.".to_string()));
    }
    if actual.len() != predicted.len() {
        return Err(IndexError::DataError(format!(
            "Length mismatch: {} actual vs {} predicted.",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.iter().any(|&a| a == 0.0 || !a.is_finite()) {
        return Err(IndexError::DataError(
            "Actual values must be finite and non-zero.".to_string(),
        ));
    }
    Ok(())
}

/// Mean absolute percentage error (as a fraction, `0.1` = 10%).
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pairs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| ((a - p) / a).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared percentage error (as a fraction).
pub fn rmspe(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pairs(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&a, &p)| {
            let r = (a - p) / a;
            r * r
        })
        .sum();
    Ok((sum / actual.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_on_known_values() {
        let actual = [100.0, 200.0];
        let predicted = [110.0, 180.0];
        assert!((mape(&actual, &predicted).unwrap() - 0.1).abs() < 1e-12);
        assert!((rmspe(&actual, &predicted).unwrap() - 0.1).abs() < 1e-12);

        let predicted = [100.0, 260.0];
        assert!((mape(&actual, &predicted).unwrap() - 0.15).abs() < 1e-12);
        assert!((rmspe(&actual, &predicted).unwrap() - 0.045_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn metrics_reject_bad_input() {
        assert!(mape(&[], &[]).is_err());
        assert!(rmspe(&[1.0], &[1.0, 2.0]).is_err());
        assert!(rmspe(&[0.0], &[1.0]).is_err());
    }
}
