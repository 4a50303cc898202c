use super::types::{ScenarioStore, STORE_VERSION};
use crate::config::{ensure_parent_dir, get_config_dir, Config};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default store file path (~/.config/invoice-roi/scenarios.json)
pub fn get_store_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("scenarios.json"))
}

/// Pick the store file: explicit override, then config, then the default path.
pub fn resolve_store_path(override_path: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    match override_path.or_else(|| config.store_path.clone()) {
        Some(path) => Ok(path),
        None => get_store_path(),
    }
}

/// Load the scenario store from a JSON file
///
/// If the file doesn't exist, returns a new empty store.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> Result<ScenarioStore> {
    if !path.exists() {
        return Ok(ScenarioStore::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open scenario store at {}", path.display()))?;

    let store: ScenarioStore =
        serde_json::from_reader(file).context("Failed to load scenario store")?;

    if store.version != STORE_VERSION {
        anyhow::bail!("Unsupported scenario store version: {}", store.version);
    }

    log::debug!(
        "Loaded {} scenarios from {}",
        store.scenarios.len(),
        path.display()
    );
    Ok(store)
}

/// Save the scenario store to a JSON file atomically
///
/// The file is never left half-written. Creates the parent directory if needed.
pub fn save_store(path: &Path, store: &ScenarioStore) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, store).context("Failed to serialize scenario store")?;

    file.commit().context("Failed to save scenario store")?;

    log::debug!(
        "Saved {} scenarios to {}",
        store.scenarios.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::{InternalConstants, ScenarioInput};
    use chrono::Utc;
    use std::env;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_path = env::temp_dir().join("invoice_roi_test_missing_store.json");
        let _ = std::fs::remove_file(&temp_path);

        let store = load_store(&temp_path).unwrap();
        assert_eq!(store.version, 1);
        assert!(store.scenarios.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_path = env::temp_dir().join("invoice_roi_test_store_roundtrip.json");
        let _ = std::fs::remove_file(&temp_path);

        let constants = InternalConstants::default();
        let mut store = ScenarioStore::new();
        store.add(Some("no cost"), &ScenarioInput::default(), &constants, Utc::now());
        store.add(
            Some("with cost"),
            &ScenarioInput {
                monthly_invoice_volume: Some(2000.0),
                num_ap_staff: Some(3.0),
                avg_hours_per_invoice: Some(0.17),
                hourly_wage: Some(25.0),
                one_time_implementation_cost: Some(50000.0),
                ..Default::default()
            },
            &constants,
            Utc::now(),
        );

        save_store(&temp_path, &store).unwrap();
        let loaded = load_store(&temp_path).unwrap();

        assert_eq!(loaded.next_id, 3);
        assert_eq!(loaded.scenarios, store.scenarios);
        assert!(loaded.get(1).unwrap().result.roi_is_unbounded());

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_extreme_scenarios_roundtrip() {
        let temp_path = env::temp_dir().join("invoice_roi_test_store_extreme.json");
        let _ = std::fs::remove_file(&temp_path);

        let constants = InternalConstants::default();
        let mut store = ScenarioStore::new();
        store.add(
            Some("huge cost"),
            &ScenarioInput {
                one_time_implementation_cost: Some(1e307),
                ..Default::default()
            },
            &constants,
            Utc::now(),
        );
        store.add(
            Some("huge volume"),
            &ScenarioInput {
                monthly_invoice_volume: Some(f64::MAX),
                num_ap_staff: Some(1e200),
                avg_hours_per_invoice: Some(1e200),
                hourly_wage: Some(1e200),
                time_horizon_months: Some(1e12),
                one_time_implementation_cost: Some(1.0),
                ..Default::default()
            },
            &constants,
            Utc::now(),
        );

        save_store(&temp_path, &store).unwrap();
        let mut loaded = load_store(&temp_path).unwrap();
        assert_eq!(loaded.scenarios, store.scenarios);
        assert_eq!(loaded.get(1).unwrap().result.net_savings, -1e307);
        assert_eq!(loaded.get(2).unwrap().result.monthly_savings, f64::MAX);

        // The store keeps working after holding extreme values
        loaded.add(None, &ScenarioInput::default(), &constants, Utc::now());
        save_store(&temp_path, &loaded).unwrap();
        assert_eq!(load_store(&temp_path).unwrap().len(), 3);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_unsupported_version() {
        let temp_path = env::temp_dir().join("invoice_roi_test_store_version.json");
        std::fs::write(&temp_path, r#"{"version": 9, "next_id": 1, "scenarios": []}"#).unwrap();

        let err = load_store(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported scenario store version"));

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_resolve_store_path_precedence() {
        let config = Config {
            store_path: Some(PathBuf::from("/from/config.json")),
            ..Default::default()
        };

        let explicit = resolve_store_path(Some(PathBuf::from("/explicit.json")), &config).unwrap();
        assert_eq!(explicit, PathBuf::from("/explicit.json"));

        let configured = resolve_store_path(None, &config).unwrap();
        assert_eq!(configured, PathBuf::from("/from/config.json"));
    }
}
