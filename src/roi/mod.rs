pub mod constants;
pub mod engine;
pub mod input;
pub mod validation;

pub use constants::InternalConstants;
pub use engine::{calculate_roi, calculate_roi_detailed, round2, RoiBreakdown, SimulationResult};
pub use input::{SanitizedInput, ScenarioInput, DEFAULT_TIME_HORIZON_MONTHS};
pub use validation::validate_constants;
