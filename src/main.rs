use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use invoice_roi::config::{self, Config};
use invoice_roi::output::{self, ReportRequest};
use invoice_roi::roi::{self, input::parse_number, InternalConstants, ScenarioInput};
use invoice_roi::scenarios;
use invoice_roi::server::{self, AppState};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 4;
const EXIT_NOT_FOUND: i32 = 5;

/// Scenario inputs as typed on the command line. Values that do not parse
/// fall back to their defaults, exactly like API input.
#[derive(Args, Debug, Default)]
struct ScenarioFields {
    /// Invoices processed per month
    #[arg(long, allow_hyphen_values = true)]
    monthly_invoice_volume: Option<String>,

    /// Accounts-payable staff handling invoices
    #[arg(long, allow_hyphen_values = true)]
    num_ap_staff: Option<String>,

    /// Hours spent per invoice
    #[arg(long, allow_hyphen_values = true)]
    avg_hours_per_invoice: Option<String>,

    /// Hourly wage of AP staff
    #[arg(long, allow_hyphen_values = true)]
    hourly_wage: Option<String>,

    /// Manual error rate in percent (0.5 = 0.5%)
    #[arg(long, allow_hyphen_values = true)]
    error_rate_manual: Option<String>,

    /// Cost of one erroneous invoice
    #[arg(long, allow_hyphen_values = true)]
    error_cost: Option<String>,

    /// Projection horizon in months (default 36)
    #[arg(long, allow_hyphen_values = true)]
    time_horizon_months: Option<String>,

    /// One-time implementation cost
    #[arg(long, allow_hyphen_values = true)]
    one_time_implementation_cost: Option<String>,
}

impl ScenarioFields {
    fn to_input(&self) -> ScenarioInput {
        let num = |v: &Option<String>| v.as_deref().and_then(parse_number);
        ScenarioInput {
            monthly_invoice_volume: num(&self.monthly_invoice_volume),
            num_ap_staff: num(&self.num_ap_staff),
            avg_hours_per_invoice: num(&self.avg_hours_per_invoice),
            hourly_wage: num(&self.hourly_wage),
            error_rate_manual: num(&self.error_rate_manual),
            error_cost: num(&self.error_cost),
            time_horizon_months: num(&self.time_horizon_months),
            one_time_implementation_cost: num(&self.one_time_implementation_cost),
        }
    }
}

/// Arguments that only make sense for an ad-hoc report
const REPORT_AD_HOC_ARGS: [&str; 9] = [
    "name",
    "monthly_invoice_volume",
    "num_ap_staff",
    "avg_hours_per_invoice",
    "hourly_wage",
    "error_rate_manual",
    "error_cost",
    "time_horizon_months",
    "one_time_implementation_cost",
];

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the ROI projection without saving it
    Simulate {
        #[command(flatten)]
        fields: ScenarioFields,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute and save a named scenario
    Save {
        /// Scenario name (defaults to "Untitled")
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ScenarioFields,
    },
    /// List saved scenarios, newest first
    List {
        /// Print as JSON
        #[arg(long, conflicts_with = "tsv")]
        json: bool,

        /// Print as tab-separated values
        #[arg(long)]
        tsv: bool,
    },
    /// Show one saved scenario
    Show {
        id: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved scenario
    Delete { id: u64 },
    /// Export a plain-text report for a saved scenario or ad-hoc inputs
    Report {
        /// Recipient email shown on the report
        #[arg(long)]
        email: String,

        /// Saved scenario id to report on
        #[arg(long, conflicts_with_all = REPORT_AD_HOC_ARGS)]
        scenario: Option<u64>,

        /// Scenario name for an ad-hoc report
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ScenarioFields,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Write a config file
    Init {
        /// Accept all defaults without prompting
        #[arg(short, long)]
        yes: bool,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "invoice-roi")]
#[command(about = "ROI projections for automating invoice processing", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/invoice-roi/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the scenario store (overrides config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool, serving: bool) {
    let default_level = if verbose {
        "debug"
    } else if serving {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Serve { .. }));

    let config_path = cli.config.map(PathBuf::from);

    // Init runs before loading so a broken config can be replaced
    if let Commands::Init { yes, force } = cli.command {
        if let Err(e) = config::run_init_wizard(config_path, yes, force) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate constants at startup
    let constants = config.effective_constants();
    if let Err(errors) = roi::validate_constants(&constants) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let store_path = match scenarios::resolve_store_path(cli.store, &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    log::debug!("Using scenario store {}", store_path.display());

    let use_colors = !cli.no_color && output::should_use_colors();
    let app = App {
        config,
        constants,
        store_path,
        use_colors,
        verbose: cli.verbose,
    };

    let outcome = match cli.command {
        Commands::Simulate { fields, json } => app.simulate(&fields.to_input(), json),
        Commands::Save { name, fields } => app.save(name.as_deref(), &fields.to_input()),
        Commands::List { json, tsv } => app.list(json, tsv),
        Commands::Show { id, json } => app.show(id, json),
        Commands::Delete { id } => app.delete(id),
        Commands::Report {
            email,
            scenario,
            name,
            fields,
            output,
        } => app.report(&email, scenario, name.as_deref(), &fields.to_input(), output),
        Commands::Serve { bind } => app.serve(bind).await,
        // Handled before the config is loaded
        Commands::Init { .. } => Ok(Outcome::Done),
    };

    match outcome {
        Ok(Outcome::Done) => std::process::exit(EXIT_SUCCESS),
        Ok(Outcome::NotFound(id)) => {
            eprintln!("No scenario with id {}", id);
            std::process::exit(EXIT_NOT_FOUND);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

enum Outcome {
    Done,
    NotFound(u64),
}

struct App {
    config: Config,
    constants: InternalConstants,
    store_path: PathBuf,
    use_colors: bool,
    verbose: bool,
}

impl App {
    fn simulate(&self, input: &ScenarioInput, json: bool) -> anyhow::Result<Outcome> {
        let (result, breakdown) = roi::calculate_roi_detailed(input, &self.constants);

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            if self.verbose {
                println!("{}", output::format_breakdown(&breakdown));
                println!();
            }
            println!("{}", output::format_result(&result, self.use_colors));
        }
        Ok(Outcome::Done)
    }

    fn save(&self, name: Option<&str>, input: &ScenarioInput) -> anyhow::Result<Outcome> {
        let mut store = scenarios::load_store(&self.store_path)?;
        let saved = store
            .add(name, input, &self.constants, chrono::Utc::now())
            .clone();
        scenarios::save_store(&self.store_path, &store)?;

        println!("Saved scenario #{} ({})", saved.id, saved.scenario_name);
        println!("{}", output::format_result(&saved.result, self.use_colors));
        Ok(Outcome::Done)
    }

    fn list(&self, json: bool, tsv: bool) -> anyhow::Result<Outcome> {
        let store = scenarios::load_store(&self.store_path)?;
        let list = store.list_newest_first();

        if json {
            println!("{}", serde_json::to_string_pretty(&list)?);
        } else if tsv {
            let text = output::format_tsv(&list);
            if !text.is_empty() {
                println!("{}", text);
            }
        } else {
            println!("{}", output::format_scenario_table(&list, self.use_colors));
        }

        if self.verbose {
            eprintln!("Total: {} scenarios in {}", list.len(), self.store_path.display());
        }
        Ok(Outcome::Done)
    }

    fn show(&self, id: u64, json: bool) -> anyhow::Result<Outcome> {
        let store = scenarios::load_store(&self.store_path)?;
        let Some(scenario) = store.get(id) else {
            return Ok(Outcome::NotFound(id));
        };

        if json {
            println!("{}", serde_json::to_string_pretty(scenario)?);
        } else {
            println!("{}", output::format_scenario_detail(scenario, self.use_colors));
        }
        Ok(Outcome::Done)
    }

    fn delete(&self, id: u64) -> anyhow::Result<Outcome> {
        let mut store = scenarios::load_store(&self.store_path)?;
        if !store.remove(id) {
            return Ok(Outcome::NotFound(id));
        }
        scenarios::save_store(&self.store_path, &store)?;
        println!("Deleted scenario #{}", id);
        Ok(Outcome::Done)
    }

    fn report(
        &self,
        email: &str,
        scenario_id: Option<u64>,
        name: Option<&str>,
        input: &ScenarioInput,
        output_path: Option<PathBuf>,
    ) -> anyhow::Result<Outcome> {
        let request = match scenario_id {
            Some(id) => {
                let store = scenarios::load_store(&self.store_path)?;
                let Some(scenario) = store.get(id) else {
                    return Ok(Outcome::NotFound(id));
                };
                ReportRequest::from_scenario(email, scenario)
            }
            None => {
                let result = roi::calculate_roi(input, &self.constants);
                ReportRequest::from_result(email, name, &result)
            }
        };

        let report = output::render_report(&request)?;
        match output_path {
            Some(path) => {
                std::fs::write(&path, &report.body)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                println!("Report written to {}", path.display());
            }
            None => print!("{}", report.body),
        }
        Ok(Outcome::Done)
    }

    async fn serve(&self, bind: Option<String>) -> anyhow::Result<Outcome> {
        let bind = bind.unwrap_or_else(|| self.config.effective_bind());
        let state = Arc::new(AppState::new(self.constants, self.store_path.clone()));
        server::serve(&bind, state).await?;
        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_report_scenario_rejects_field_flags() {
        let err = Cli::try_parse_from([
            "invoice-roi",
            "report",
            "--email",
            "ap@example.com",
            "--scenario",
            "3",
            "--hourly-wage",
            "25",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = Cli::try_parse_from([
            "invoice-roi",
            "report",
            "--email",
            "ap@example.com",
            "--scenario",
            "3",
            "--name",
            "Q3",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_report_accepts_either_source() {
        let saved = Cli::try_parse_from([
            "invoice-roi",
            "report",
            "--email",
            "ap@example.com",
            "--scenario",
            "3",
        ])
        .unwrap();
        assert!(matches!(
            saved.command,
            Commands::Report { scenario: Some(3), .. }
        ));

        let ad_hoc = Cli::try_parse_from([
            "invoice-roi",
            "report",
            "--email",
            "ap@example.com",
            "--name",
            "Q3",
            "--monthly-invoice-volume",
            "2000",
        ])
        .unwrap();
        match ad_hoc.command {
            Commands::Report { scenario, fields, .. } => {
                assert_eq!(scenario, None);
                assert_eq!(fields.to_input().monthly_invoice_volume, Some(2000.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
