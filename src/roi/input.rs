use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Horizon used when the caller does not supply a usable one
pub const DEFAULT_TIME_HORIZON_MONTHS: u32 = 36;

/// Business inputs for one scenario, as supplied by a caller.
///
/// Every field is optional. Decoding is lenient: numbers and numeric strings
/// are accepted, anything else (empty strings, `null`, booleans, garbage)
/// decodes to `None` and later falls back to the field's default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScenarioInput {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub monthly_invoice_volume: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub num_ap_staff: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub avg_hours_per_invoice: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub hourly_wage: Option<f64>,

    /// Manual error rate as a percentage (0.5 = 0.5%)
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub error_rate_manual: Option<f64>,

    /// Cost of one erroneous invoice
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub error_cost: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub time_horizon_months: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub one_time_implementation_cost: Option<f64>,
}

/// Inputs after default substitution. Every value is finite.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SanitizedInput {
    pub monthly_invoice_volume: f64,
    pub num_ap_staff: f64,
    pub avg_hours_per_invoice: f64,
    pub hourly_wage: f64,
    pub error_rate_manual: f64,
    pub error_cost: f64,
    pub time_horizon_months: u32,
    pub one_time_implementation_cost: f64,
}

impl Default for SanitizedInput {
    fn default() -> Self {
        ScenarioInput::default().sanitize()
    }
}

impl ScenarioInput {
    /// Decode from an arbitrary JSON value. Non-objects yield an empty input.
    pub fn from_json_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Replace missing or non-finite fields with their defaults.
    ///
    /// The horizon is floored to whole months and clamped to at least one.
    pub fn sanitize(&self) -> SanitizedInput {
        let horizon = finite_or(self.time_horizon_months, DEFAULT_TIME_HORIZON_MONTHS as f64)
            .floor()
            .max(1.0);

        SanitizedInput {
            monthly_invoice_volume: finite_or(self.monthly_invoice_volume, 0.0),
            num_ap_staff: finite_or(self.num_ap_staff, 0.0),
            avg_hours_per_invoice: finite_or(self.avg_hours_per_invoice, 0.0),
            hourly_wage: finite_or(self.hourly_wage, 0.0),
            error_rate_manual: finite_or(self.error_rate_manual, 0.0),
            error_cost: finite_or(self.error_cost, 0.0),
            // `as` saturates, so absurd horizons pin to u32::MAX
            time_horizon_months: horizon as u32,
            one_time_implementation_cost: finite_or(self.one_time_implementation_cost, 0.0),
        }
    }
}

impl From<SanitizedInput> for ScenarioInput {
    fn from(input: SanitizedInput) -> Self {
        Self {
            monthly_invoice_volume: Some(input.monthly_invoice_volume),
            num_ap_staff: Some(input.num_ap_staff),
            avg_hours_per_invoice: Some(input.avg_hours_per_invoice),
            hourly_wage: Some(input.hourly_wage),
            error_rate_manual: Some(input.error_rate_manual),
            error_cost: Some(input.error_cost),
            time_horizon_months: Some(input.time_horizon_months as f64),
            one_time_implementation_cost: Some(input.one_time_implementation_cost),
        }
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// Parse a user-typed number. Returns `None` for blank or non-finite text.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Extract a finite number from a JSON value, accepting numeric strings.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}
