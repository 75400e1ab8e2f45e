//! Validation helper functions for configuration types.

use crate::core::errors::{MetricsError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(MetricsError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is greater than zero.
pub fn validate_positive_f64(value: f64, field: &str) -> Result<()> {
    if !(value > 0.0) || value.is_infinite() {
        return Err(MetricsError::validation_field(
            format!("{} must be a finite value greater than 0.0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value lies strictly inside (0.0, 1.0).
pub fn validate_open_unit_interval(value: f64, field: &str) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(MetricsError::validation_field(
            format!("{} must be between 0.0 and 1.0 (exclusive), got {}", field, value),
            field,
        ));
    }
    Ok(())
}

/// Validate that a list is not empty.
pub fn validate_non_empty<T>(values: &[T], field: &str) -> Result<()> {
    if values.is_empty() {
        return Err(MetricsError::validation_field(
            format!("{} must contain at least one entry", field),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_usize() {
        assert!(validate_positive_usize(0, "max_iterations").is_err());
        assert!(validate_positive_usize(1, "max_iterations").is_ok());
    }

    #[test]
    fn rejects_non_positive_and_nan_floats() {
        assert!(validate_positive_f64(0.0, "threshold").is_err());
        assert!(validate_positive_f64(f64::NAN, "threshold").is_err());
        assert!(validate_positive_f64(f64::INFINITY, "threshold").is_err());
        assert!(validate_positive_f64(1e-9, "threshold").is_ok());
    }

    #[test]
    fn open_unit_interval_excludes_bounds() {
        assert!(validate_open_unit_interval(0.0, "damping").is_err());
        assert!(validate_open_unit_interval(1.0, "damping").is_err());
        assert!(validate_open_unit_interval(0.85, "damping").is_ok());
    }

    #[test]
    fn empty_lists_are_rejected_with_field_name() {
        let err = validate_non_empty::<String>(&[], "coderank.strategies").unwrap_err();
        assert!(err.to_string().contains("coderank.strategies"));
    }
}
