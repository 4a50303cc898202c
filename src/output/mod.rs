pub mod formatter;
pub mod report;

pub use formatter::{
    format_age, format_breakdown, format_compact, format_money, format_result, format_roi,
    format_scenario_detail, format_scenario_table, format_tsv, should_use_colors,
};
pub use report::{render_report, Report, ReportError, ReportRequest};
