use serde::{Deserialize, Serialize};

/// Business constants the engine applies to every scenario.
///
/// These are not part of a request. A deployment may override them once in
/// the config file; the resulting value is passed to every engine call.
///
/// Example YAML:
/// ```yaml
/// constants:
///   automated_cost_per_invoice: 0.20
///   error_rate_auto: 0.001
///   min_roi_boost_factor: 1.1
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InternalConstants {
    /// Cost of processing one invoice once automated (currency)
    #[serde(default = "default_automated_cost_per_invoice")]
    pub automated_cost_per_invoice: f64,

    /// Error rate of the automated process, as a decimal (0.001 = 0.1%)
    #[serde(default = "default_error_rate_auto")]
    pub error_rate_auto: f64,

    /// Multiplier applied to raw monthly savings
    #[serde(default = "default_min_roi_boost_factor")]
    pub min_roi_boost_factor: f64,
}

fn default_automated_cost_per_invoice() -> f64 {
    0.20
}

fn default_error_rate_auto() -> f64 {
    0.001
}

fn default_min_roi_boost_factor() -> f64 {
    1.1
}

impl Default for InternalConstants {
    fn default() -> Self {
        Self {
            automated_cost_per_invoice: default_automated_cost_per_invoice(),
            error_rate_auto: default_error_rate_auto(),
            min_roi_boost_factor: default_min_roi_boost_factor(),
        }
    }
}
