use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roi::{calculate_roi, InternalConstants, SanitizedInput, ScenarioInput, SimulationResult};

pub const STORE_VERSION: u32 = 1;

/// Name given to scenarios saved without one
pub const UNTITLED: &str = "Untitled";

/// A saved scenario: sanitized inputs plus the result computed at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: u64,
    pub scenario_name: String,
    #[serde(flatten)]
    pub input: SanitizedInput,
    #[serde(flatten)]
    pub result: SimulationResult,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStore {
    pub version: u32,
    /// Next id to hand out. Ids are never reused, even after deletion.
    pub next_id: u64,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

impl Default for ScenarioStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioStore {
    /// Create a new empty store with version 1
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: 1,
            scenarios: Vec::new(),
        }
    }

    /// Compute and store a scenario. Blank names become "Untitled".
    pub fn add(
        &mut self,
        name: Option<&str>,
        input: &ScenarioInput,
        constants: &InternalConstants,
        now: DateTime<Utc>,
    ) -> &Scenario {
        let scenario_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNTITLED)
            .to_string();

        let scenario = Scenario {
            id: self.next_id,
            scenario_name,
            input: input.sanitize(),
            result: calculate_roi(input, constants),
            created_at: now,
        };
        self.next_id += 1;
        self.scenarios.push(scenario);

        let last = self.scenarios.len() - 1;
        &self.scenarios[last]
    }

    pub fn get(&self, id: u64) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Remove a scenario
    /// Returns true if it existed, false otherwise
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.scenarios.len();
        self.scenarios.retain(|s| s.id != id);
        self.scenarios.len() != before
    }

    /// All scenarios, highest id first
    pub fn list_newest_first(&self) -> Vec<&Scenario> {
        let mut list: Vec<&Scenario> = self.scenarios.iter().collect();
        list.sort_by(|a, b| b.id.cmp(&a.id));
        list
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
