use std::io::IsTerminal;
use chrono::{Duration, Utc};
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::roi::{RoiBreakdown, SimulationResult};
use crate::scenarios::Scenario;

/// Shown in place of ROI when there is no implementation cost
pub const UNBOUNDED_ROI: &str = "n/a (no upfront cost)";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a currency amount with thousands separators and 2 decimals
/// (28490 -> "28,490.00", -999.88 -> "-999.88")
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Format an ROI percentage, or the unbounded marker for infinity
pub fn format_roi(roi: f64) -> String {
    if roi.is_infinite() {
        UNBOUNDED_ROI.to_string()
    } else {
        format!("{:.2}%", roi)
    }
}

/// Format an amount in compact notation (1.5k, 2.3M, 847)
pub fn format_compact(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let formatted = if abs >= 1_000_000.0 {
        format!("{:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", abs / 1_000.0)
    } else {
        format!("{:.0}", abs)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    let trimmed = formatted
        .replace(".0M", "M")
        .replace(".0k", "k");

    format!("{}{}", sign, trimmed)
}

/// Format a simulation result as a labelled block
pub fn format_result(result: &SimulationResult, use_colors: bool) -> String {
    let rows = [
        ("Monthly savings", format_money(result.monthly_savings), false),
        ("Cumulative savings", format_money(result.cumulative_savings), false),
        ("Net savings", format_money(result.net_savings), result.net_savings < 0.0),
        ("Payback (months)", format!("{:.2}", result.payback_months), false),
        ("ROI", format_roi(result.roi_percentage), result.roi_percentage < 0.0),
    ];

    rows.iter()
        .map(|(label, value, negative)| {
            let label = format!("{:<20}", format!("{}:", label));
            if use_colors {
                if *negative {
                    format!("{}{}", label.bold(), value.red())
                } else {
                    format!("{}{}", label.bold(), value.green())
                }
            } else {
                format!("{}{}", label, value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the intermediate values behind a result (verbose mode)
pub fn format_breakdown(breakdown: &RoiBreakdown) -> String {
    let inp = &breakdown.input;
    let mut lines = vec![
        "Inputs (after defaults):".to_string(),
        format!("  Monthly invoice volume: {}", inp.monthly_invoice_volume),
        format!("  AP staff: {}", inp.num_ap_staff),
        format!("  Hours per invoice: {}", inp.avg_hours_per_invoice),
        format!("  Hourly wage: {}", format_money(inp.hourly_wage)),
        format!("  Manual error rate: {}%", inp.error_rate_manual),
        format!("  Cost per error: {}", format_money(inp.error_cost)),
        format!("  Time horizon: {} months", inp.time_horizon_months),
        format!(
            "  Implementation cost: {}",
            format_money(inp.one_time_implementation_cost)
        ),
        "Monthly figures:".to_string(),
        format!("  Manual labor cost: {}", format_money(breakdown.labor_cost_manual)),
        format!("  Automation cost: {}", format_money(breakdown.auto_cost)),
        format!("  Error savings: {}", format_money(breakdown.error_savings)),
        format!("  Raw savings (boosted): {}", format_money(breakdown.monthly_savings_raw)),
    ];
    if breakdown.floor_applied {
        lines.push("  Savings were not positive; using the 0.01 floor".to_string());
    }
    lines.join("\n")
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

/// Format scenarios as a table with columns: Id, Monthly, ROI, Age, Name
/// No headers. Name takes whatever width is left.
pub fn format_scenario_table(scenarios: &[&Scenario], use_colors: bool) -> String {
    if scenarios.is_empty() {
        return "No saved scenarios.".to_string();
    }

    let term_width = get_terminal_width();
    let now = Utc::now();

    // id(4) + monthly(7) + roi(10) + age(4), each column followed by two spaces
    let id_width = 4;
    let monthly_width = 7;
    let roi_width = 10;
    let age_width = 4;
    let separator = "  ";
    let fixed_width = id_width + monthly_width + roi_width + age_width + separator.len() * 4;

    scenarios
        .iter()
        .map(|scenario| {
            let id_str = format!("{:>width$}", format!("#{}", scenario.id), width = id_width);
            let monthly = format!(
                "{:>width$}",
                format_compact(scenario.result.monthly_savings),
                width = monthly_width
            );
            let roi = if scenario.result.roi_is_unbounded() {
                "n/a".to_string()
            } else {
                format!("{:.1}%", scenario.result.roi_percentage)
            };
            let roi = format!("{:>width$}", roi, width = roi_width);
            let age = format!(
                "{:>width$}",
                format_age(now - scenario.created_at),
                width = age_width
            );

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&scenario.scenario_name, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_name(&scenario.scenario_name, 20),
                // No terminal (pipe), don't truncate
                None => scenario.scenario_name.clone(),
            };

            if use_colors {
                format!(
                    "{}{}{}{}{}{}{}{}{}",
                    id_str.dimmed(),
                    separator,
                    monthly.bold(),
                    separator,
                    roi.green(),
                    separator,
                    age.dimmed(),
                    separator,
                    name
                )
            } else {
                format!(
                    "{}{}{}{}{}{}{}{}{}",
                    id_str, separator, monthly, separator, roi, separator, age, separator, name
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single scenario with inputs and results
pub fn format_scenario_detail(scenario: &Scenario, use_colors: bool) -> String {
    let inp = &scenario.input;
    let header = format!("#{} {}", scenario.id, scenario.scenario_name);
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    format!(
        "{}\n  Created: {}\n  Invoices/month: {}\n  AP staff: {}\n  Hours/invoice: {}\n  Hourly wage: {}\n  Manual error rate: {}%\n  Cost per error: {}\n  Horizon: {} months\n  Implementation cost: {}\n\n{}",
        header,
        scenario.created_at.format("%Y-%m-%d %H:%M UTC"),
        inp.monthly_invoice_volume,
        inp.num_ap_staff,
        inp.avg_hours_per_invoice,
        format_money(inp.hourly_wage),
        inp.error_rate_manual,
        format_money(inp.error_cost),
        inp.time_horizon_months,
        format_money(inp.one_time_implementation_cost),
        format_result(&scenario.result, use_colors)
    )
}

/// Format scenarios as tab-separated values for scripting
/// Columns: id, name, monthly_savings, roi_percentage, payback_months (no headers, no colors)
pub fn format_tsv(scenarios: &[&Scenario]) -> String {
    scenarios
        .iter()
        .map(|s| {
            let roi = if s.result.roi_is_unbounded() {
                "Infinity".to_string()
            } else {
                format!("{:.2}", s.result.roi_percentage)
            };
            format!(
                "{}\t{}\t{:.2}\t{}\t{:.2}",
                s.id, s.scenario_name, s.result.monthly_savings, roi, s.result.payback_months
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
