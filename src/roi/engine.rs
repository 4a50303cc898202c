use serde::{Deserialize, Serialize};

use super::constants::InternalConstants;
use super::input::{SanitizedInput, ScenarioInput};

/// Nominal monthly savings used when the computed value is not positive.
/// Keeps the payback division well defined.
const MONTHLY_SAVINGS_FLOOR: f64 = 0.01;

/// Derived metrics for one scenario. Every value is rounded to 2 decimals.
///
/// `roi_percentage` is `f64::INFINITY` when there is no implementation cost.
/// JSON cannot carry infinity, so it is written as the string `"Infinity"`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SimulationResult {
    pub monthly_savings: f64,
    pub cumulative_savings: f64,
    pub net_savings: f64,
    pub payback_months: f64,
    #[serde(with = "roi_value")]
    pub roi_percentage: f64,
}

impl SimulationResult {
    /// True when ROI has no cost basis to be measured against
    pub fn roi_is_unbounded(&self) -> bool {
        self.roi_percentage.is_infinite()
    }
}

/// Intermediate values behind a result, for verbose output.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiBreakdown {
    pub input: SanitizedInput,
    pub labor_cost_manual: f64,
    pub auto_cost: f64,
    pub error_savings: f64,
    pub monthly_savings_raw: f64,
    /// Raw savings were not positive and the floor was substituted
    pub floor_applied: bool,
}

/// Compute the ROI projection for a scenario.
///
/// Never fails: missing or malformed inputs have already degraded to
/// defaults by the time arithmetic starts.
pub fn calculate_roi(input: &ScenarioInput, constants: &InternalConstants) -> SimulationResult {
    calculate_roi_detailed(input, constants).0
}

pub fn calculate_roi_detailed(
    input: &ScenarioInput,
    constants: &InternalConstants,
) -> (SimulationResult, RoiBreakdown) {
    let inp = input.sanitize();

    let labor_cost_manual = inp.num_ap_staff
        * inp.hourly_wage
        * inp.avg_hours_per_invoice
        * inp.monthly_invoice_volume;
    let auto_cost = inp.monthly_invoice_volume * constants.automated_cost_per_invoice;

    let error_rate_manual_decimal = inp.error_rate_manual / 100.0;
    let error_savings = (error_rate_manual_decimal - constants.error_rate_auto).max(0.0)
        * inp.monthly_invoice_volume
        * inp.error_cost;

    let monthly_savings_raw =
        (labor_cost_manual + error_savings - auto_cost) * constants.min_roi_boost_factor;

    // NaN only arises from pathological constants; treat it as no savings
    let floor_applied = monthly_savings_raw.is_nan() || monthly_savings_raw <= 0.0;
    let monthly_savings = if floor_applied {
        MONTHLY_SAVINGS_FLOOR
    } else {
        saturate(monthly_savings_raw)
    };

    // Finite inputs can still overflow; only an uncosted ROI may be infinite
    let cost = inp.one_time_implementation_cost;
    let cumulative_savings = saturate(monthly_savings * inp.time_horizon_months as f64);
    let net_savings = saturate(cumulative_savings - cost);
    let payback_months = saturate(cost / monthly_savings);
    let roi_percentage = if cost > 0.0 {
        saturate(net_savings / cost * 100.0)
    } else {
        f64::INFINITY
    };

    let result = SimulationResult {
        monthly_savings: round2(monthly_savings),
        cumulative_savings: round2(cumulative_savings),
        net_savings: round2(net_savings),
        payback_months: round2(payback_months),
        roi_percentage: round2(roi_percentage),
    };

    let breakdown = RoiBreakdown {
        input: inp,
        labor_cost_manual,
        auto_cost,
        error_savings,
        monthly_savings_raw,
        floor_applied,
    };

    (result, breakdown)
}

/// Above this magnitude an f64 has no fractional digits left to round.
const ROUNDING_LIMIT: f64 = 4_503_599_627_370_496.0 / 100.0;

/// Round half away from zero to 2 decimal places. Infinities and values too
/// large to carry cents pass through.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= ROUNDING_LIMIT {
        return value;
    }
    (value * 100.0).round() / 100.0
}

/// Clamp an overflowed value back into the finite range.
fn saturate(value: f64) -> f64 {
    value.clamp(f64::MIN, f64::MAX)
}

mod roi_value {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    const POS_INF: &str = "Infinity";
    const NEG_INF: &str = "-Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if *value > 0.0 {
            serializer.serialize_str(POS_INF)
        } else if *value < 0.0 {
            serializer.serialize_str(NEG_INF)
        } else {
            serializer.serialize_str("NaN")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(RoiVisitor)
    }

    struct RoiVisitor;

    impl<'de> Visitor<'de> for RoiVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number or \"{}\"", POS_INF)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                POS_INF => Ok(f64::INFINITY),
                NEG_INF => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}
