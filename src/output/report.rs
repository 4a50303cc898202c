use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use crate::roi::input::number_from_value;
use crate::roi::SimulationResult;
use crate::scenarios::Scenario;

pub const REPORT_TITLE: &str = "Invoicing ROI Simulation Report";
pub const REPORT_FOOTER: &str = "Generated by Invoicing ROI Simulator";
const DEFAULT_FILE_STEM: &str = "roi_report";
const MISSING: &str = "N/A";

/// What goes into a report. Metrics are optional; absent ones print as N/A.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub scenario_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub monthly_savings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub payback_months: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub roi_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub cumulative_savings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub net_savings: Option<f64>,
}

/// A rendered report and the file name to offer it under
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub file_name: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Email missing or without an '@'
    InvalidEmail,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::InvalidEmail => write!(f, "Valid email required"),
        }
    }
}

impl std::error::Error for ReportError {}

impl ReportRequest {
    pub fn from_result(
        email: &str,
        scenario_name: Option<&str>,
        result: &SimulationResult,
    ) -> Self {
        Self {
            email: Some(email.to_string()),
            scenario_name: scenario_name.map(str::to_string),
            monthly_savings: Some(result.monthly_savings),
            payback_months: Some(result.payback_months),
            roi_percentage: Some(result.roi_percentage),
            cumulative_savings: Some(result.cumulative_savings),
            net_savings: Some(result.net_savings),
        }
    }

    pub fn from_scenario(email: &str, scenario: &Scenario) -> Self {
        Self::from_result(email, Some(&scenario.scenario_name), &scenario.result)
    }
}

/// Render a plain-text report.
pub fn render_report(request: &ReportRequest) -> Result<Report, ReportError> {
    let email = request
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty() && e.contains('@'))
        .ok_or(ReportError::InvalidEmail)?;

    let name = request
        .scenario_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let mut lines = vec![
        center(REPORT_TITLE, 60),
        String::new(),
        format!("Email: {}", email),
        format!("Scenario: {}", name.unwrap_or(MISSING)),
        String::new(),
    ];

    let fields = [
        ("Monthly savings", request.monthly_savings),
        ("Payback (months)", request.payback_months),
        ("ROI (%)", request.roi_percentage),
        ("Cumulative savings", request.cumulative_savings),
        ("Net savings", request.net_savings),
    ];
    for (label, value) in fields {
        lines.push(format!("{}: {}", label, display_metric(value)));
    }

    lines.push(String::new());
    lines.push(REPORT_FOOTER.to_string());
    lines.push(String::new());

    Ok(Report {
        file_name: format!("{}.txt", file_stem(name)),
        body: lines.join("\n"),
    })
}

fn display_metric(value: Option<f64>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) if v.is_infinite() && v > 0.0 => "Infinity".to_string(),
        Some(v) if v.is_infinite() => "-Infinity".to_string(),
        Some(v) => format!("{:.2}", v),
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

/// Scenario name made safe for a file name and a Content-Disposition header
fn file_stem(name: Option<&str>) -> String {
    let Some(name) = name else {
        return DEFAULT_FILE_STEM.to_string();
    };
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.trim().is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        stem
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_metric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if s.trim() == "Infinity" => Some(f64::INFINITY),
        Some(v) => number_from_value(&v),
        None => None,
    })
}
