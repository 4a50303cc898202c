use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use super::{ensure_parent_dir, get_config_path, Config, ServerConfig, DEFAULT_BIND};
use crate::roi::{validate_constants, InternalConstants};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Keep asking until the answer parses as a number accepted by `check`.
fn prompt_number(message: &str, default: f64, check: impl Fn(f64) -> bool) -> Result<f64> {
    loop {
        let input = prompt_with_default(message, &default.to_string())?;
        match input.parse::<f64>() {
            Ok(v) if v.is_finite() && check(v) => return Ok(v),
            _ => println!("  Invalid value. Try again."),
        }
    }
}

/// Serialize `config` to YAML at `path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_config(path: &Path, config: &Config, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let constants = config.effective_constants();
    if let Err(errors) = validate_constants(&constants) {
        anyhow::bail!("Refusing to write invalid constants: {}", errors.join("; "));
    }

    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    ensure_parent_dir(path)?;
    std::fs::write(path, &yaml)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a config file, interactively unless `accept_defaults` is set.
pub fn run_init_wizard(path: Option<PathBuf>, accept_defaults: bool, force: bool) -> Result<()> {
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    let defaults = InternalConstants::default();
    if accept_defaults {
        let config = build(defaults, DEFAULT_BIND.to_string());
        return finish(&config_path, &config, force);
    }

    println!();
    println!("Invoice ROI Configuration");
    println!("=========================");
    println!();

    let constants = if prompt_yes_no("Customize business constants? (n accepts defaults)", false)? {
        println!("Cost of handling one invoice once automated.");
        let automated_cost_per_invoice = prompt_number(
            "Automated cost per invoice",
            defaults.automated_cost_per_invoice,
            |v| v >= 0.0,
        )?;
        println!("Error rate of the automated process as a decimal (0.001 = 0.1%).");
        let error_rate_auto = prompt_number("Automated error rate", defaults.error_rate_auto, |v| {
            (0.0..=1.0).contains(&v)
        })?;
        println!("Multiplier applied to raw monthly savings.");
        let min_roi_boost_factor = prompt_number(
            "Savings boost factor",
            defaults.min_roi_boost_factor,
            |v| v > 0.0,
        )?;
        InternalConstants {
            automated_cost_per_invoice,
            error_rate_auto,
            min_roi_boost_factor,
        }
    } else {
        defaults
    };

    println!();
    let bind = prompt_with_default("Address for `invoice-roi serve`", DEFAULT_BIND)?;

    let mut force = force;
    if config_path.exists() && !force {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
        force = true;
    }

    finish(&config_path, &build(constants, bind), force)
}

fn build(constants: InternalConstants, bind: String) -> Config {
    Config {
        constants: Some(constants),
        store_path: None,
        server: Some(ServerConfig { bind }),
    }
}

fn finish(path: &Path, config: &Config, force: bool) -> Result<()> {
    write_config(path, config, force)?;
    println!("Config written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_write_config_roundtrip() {
        let path = env::temp_dir().join("invoice_roi_test_write_config.yaml");
        let _ = std::fs::remove_file(&path);

        let config = build(InternalConstants::default(), "127.0.0.1:9000".to_string());
        write_config(&path, &config, false).unwrap();

        let loaded = crate::config::load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let path = env::temp_dir().join("invoice_roi_test_no_overwrite.yaml");
        std::fs::write(&path, "{}\n").unwrap();

        let config = Config::default();
        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_write_config_rejects_invalid_constants() {
        let path = env::temp_dir().join("invoice_roi_test_invalid_constants.yaml");
        let _ = std::fs::remove_file(&path);

        let config = Config {
            constants: Some(InternalConstants {
                min_roi_boost_factor: -1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(write_config(&path, &config, false).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_accept_defaults_writes_file() {
        let path = env::temp_dir().join("invoice_roi_test_init_defaults.yaml");
        let _ = std::fs::remove_file(&path);

        run_init_wizard(Some(path.clone()), true, false).unwrap();
        let loaded = crate::config::load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded.effective_constants(), InternalConstants::default());
        assert_eq!(loaded.effective_bind(), DEFAULT_BIND);

        let _ = std::fs::remove_file(&path);
    }
}
