pub mod storage;
pub mod types;

pub use storage::{get_store_path, load_store, resolve_store_path, save_store};
pub use types::{Scenario, ScenarioStore, STORE_VERSION, UNTITLED};
