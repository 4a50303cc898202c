use super::constants::InternalConstants;

/// Validate configured constants at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_constants(constants: &InternalConstants) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let cost = constants.automated_cost_per_invoice;
    if !cost.is_finite() || cost < 0.0 {
        errors.push(format!(
            "constants.automated_cost_per_invoice: must be a non-negative number, got {}",
            cost
        ));
    }

    let rate = constants.error_rate_auto;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        errors.push(format!(
            "constants.error_rate_auto: must be a decimal between 0 and 1, got {}",
            rate
        ));
    }

    let boost = constants.min_roi_boost_factor;
    if !boost.is_finite() || boost <= 0.0 {
        errors.push(format!(
            "constants.min_roi_boost_factor: must be a positive number, got {}",
            boost
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
