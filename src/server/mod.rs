pub mod api;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::output::{render_report, ReportRequest};
use crate::roi::{calculate_roi, InternalConstants, ScenarioInput, SimulationResult};
use crate::scenarios::{load_store, save_store, Scenario};
use api::{attachment, lenient_json, parse_id, ApiError, MessageResponse};

/// Shared handler state. The mutex serializes every store read-modify-write,
/// and the file I/O itself runs on tokio's blocking pool.
pub struct AppState {
    pub constants: InternalConstants,
    pub store_path: PathBuf,
    store_lock: Mutex<()>,
}

impl AppState {
    pub fn new(constants: InternalConstants, store_path: PathBuf) -> Self {
        Self {
            constants,
            store_path,
            store_lock: Mutex::new(()),
        }
    }
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/simulate", post(simulate))
        .route("/scenarios", post(save_scenario).get(list_scenarios))
        .route("/scenarios/:id", get(get_scenario).delete(delete_scenario))
        .route("/report/generate", post(generate_report))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(bind: &str, state: SharedState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let local_addr = listener.local_addr()?;

    log::info!(
        "Serving ROI API on http://{} (store: {})",
        local_addr,
        state.store_path.display()
    );
    println!("Serving ROI API: http://{}", local_addr);
    println!(
        "Try: curl -X POST http://{}/simulate -H 'Content-Type: application/json' -d '{{\"monthly_invoice_volume\":2000}}'",
        local_addr
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn simulate(State(state): State<SharedState>, body: Bytes) -> Json<SimulationResult> {
    let input = ScenarioInput::from_json_value(&lenient_json(&body));
    Json(calculate_roi(&input, &state.constants))
}

/// Run a store operation on the blocking pool while holding the store lock.
async fn with_store<T, F>(state: &SharedState, op: F) -> Result<T>
where
    F: FnOnce(&std::path::Path) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let _guard = state.store_lock.lock().await;
    let path = state.store_path.clone();
    tokio::task::spawn_blocking(move || op(&path))
        .await
        .context("Store task did not complete")?
}

pub async fn save_scenario(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let value = lenient_json(&body);
    let input = ScenarioInput::from_json_value(&value);
    let name = value
        .get("scenario_name")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let constants = state.constants;

    let id = with_store(&state, move |path| {
        let mut store = load_store(path)?;
        let id = store.add(name.as_deref(), &input, &constants, Utc::now()).id;
        save_store(path, &store)?;
        Ok(id)
    })
    .await
    .map_err(|e| ApiError::internal("Save scenario failed", e))?;

    log::info!("Saved scenario #{}", id);
    Ok(Json(MessageResponse {
        message: "Scenario saved successfully".to_string(),
        id: Some(id),
    }))
}

pub async fn list_scenarios(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Scenario>>, ApiError> {
    let scenarios = with_store(&state, |path| {
        let store = load_store(path)?;
        let list: Vec<Scenario> = store.list_newest_first().into_iter().cloned().collect();
        Ok(list)
    })
    .await
    .map_err(|e| ApiError::internal("Failed to fetch scenarios", e))?;
    Ok(Json(scenarios))
}

pub async fn get_scenario(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Scenario>, ApiError> {
    let id = parse_id(&raw_id)?;

    let found = with_store(&state, move |path| {
        let store = load_store(path)?;
        Ok(store.get(id).cloned())
    })
    .await
    .map_err(|e| ApiError::internal("Failed to fetch scenario", e))?;
    found.map(Json).ok_or_else(ApiError::not_found)
}

/// Deleting an id that does not exist still reports success.
pub async fn delete_scenario(
    State(state): State<SharedState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;

    let removed = with_store(&state, move |path| {
        let mut store = load_store(path)?;
        let removed = store.remove(id);
        if removed {
            save_store(path, &store)?;
        }
        Ok(removed)
    })
    .await
    .map_err(|e| ApiError::internal("Delete failed", e))?;

    if removed {
        log::info!("Deleted scenario #{}", id);
    }
    Ok(Json(MessageResponse::new("Deleted")))
}

pub async fn generate_report(body: Bytes) -> Result<Response, ApiError> {
    let request: ReportRequest = serde_json::from_value(lenient_json(&body)).unwrap_or_default();
    let report =
        render_report(&request).map_err(|e| ApiError::bad_request(&e.to_string()))?;
    Ok(attachment(&report.file_name, report.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use std::env;

    fn test_state(name: &str) -> SharedState {
        let path = env::temp_dir().join(format!("invoice_roi_test_server_{}.json", name));
        let _ = std::fs::remove_file(&path);
        Arc::new(AppState::new(InternalConstants::default(), path))
    }

    fn cleanup(state: &SharedState) {
        let _ = std::fs::remove_file(&state.store_path);
    }

    const REFERENCE_BODY: &str = r#"{
        "scenario_name": "Reference",
        "monthly_invoice_volume": "2000",
        "num_ap_staff": 3,
        "avg_hours_per_invoice": "0.17",
        "hourly_wage": 25,
        "error_rate_manual": 0.5,
        "error_cost": 100,
        "time_horizon_months": 36,
        "one_time_implementation_cost": 50000
    }"#;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_simulate_reference() {
        let state = test_state("simulate");
        let Json(result) = simulate(State(state), Bytes::from(REFERENCE_BODY)).await;
        assert_eq!(result.monthly_savings, 28490.0);
        assert_eq!(result.payback_months, 1.76);
        assert_eq!(result.roi_percentage, 1951.28);
    }

    #[tokio::test]
    async fn test_simulate_garbage_body_uses_defaults() {
        let state = test_state("simulate_garbage");
        let Json(result) = simulate(State(state), Bytes::from("<<not json>>")).await;
        assert_eq!(result.monthly_savings, 0.01);
        assert_eq!(result.cumulative_savings, 0.36);
        assert!(result.roi_is_unbounded());

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["roi_percentage"], "Infinity");
    }

    #[tokio::test]
    async fn test_save_list_get_delete() {
        let state = test_state("crud");

        let Json(saved) = save_scenario(State(state.clone()), Bytes::from(REFERENCE_BODY))
            .await
            .unwrap();
        assert_eq!(saved.message, "Scenario saved successfully");
        assert_eq!(saved.id, Some(1));

        save_scenario(State(state.clone()), Bytes::from("{}"))
            .await
            .unwrap();

        let Json(list) = list_scenarios(State(state.clone())).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, 2);
        assert_eq!(list[0].scenario_name, "Untitled");
        assert_eq!(list[1].scenario_name, "Reference");

        let Json(one) = get_scenario(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(one.result.net_savings, 975640.0);
        assert_eq!(one.input.monthly_invoice_volume, 2000.0);

        let Json(deleted) = delete_scenario(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap();
        assert_eq!(deleted.message, "Deleted");

        let missing = get_scenario(State(state.clone()), Path("1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        cleanup(&state);
    }

    #[tokio::test]
    async fn test_huge_cost_keeps_store_usable() {
        let state = test_state("huge_cost");
        let body = r#"{"scenario_name":"Huge","one_time_implementation_cost":1e307}"#;

        let Json(result) = simulate(State(state.clone()), Bytes::from(body)).await;
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["net_savings"], -1e307);
        assert!(json["payback_months"].is_number());
        assert_eq!(json["roi_percentage"], -100.0);

        save_scenario(State(state.clone()), Bytes::from(body))
            .await
            .unwrap();
        let Json(list) = list_scenarios(State(state.clone())).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].result.net_savings, -1e307);

        let Json(next) = save_scenario(State(state.clone()), Bytes::from("{}"))
            .await
            .unwrap();
        assert_eq!(next.id, Some(2));

        cleanup(&state);
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let state = test_state("invalid_id");
        let err = get_scenario(State(state.clone()), Path("abc".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = delete_scenario(State(state), Path("x1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Invalid id");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let state = test_state("delete_missing");
        let Json(response) = delete_scenario(State(state.clone()), Path("99".to_string()))
            .await
            .unwrap();
        assert_eq!(response.message, "Deleted");
        assert!(!state.store_path.exists());
    }

    #[tokio::test]
    async fn test_report_generate() {
        let body = r#"{"email":"ap@example.com","scenario_name":"Q3","monthly_savings":28490,"roi_percentage":"Infinity"}"#;
        let response = generate_report(Bytes::from(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Q3.txt\""
        );

        let text = body_string(response).await;
        assert!(text.contains("Monthly savings: 28490.00"));
        assert!(text.contains("ROI (%): Infinity"));
        assert!(text.contains("Net savings: N/A"));
    }

    #[tokio::test]
    async fn test_report_requires_email() {
        let err = match generate_report(Bytes::from(r#"{"email":"nope"}"#)).await {
            Ok(_) => panic!("report without a valid email should fail"),
            Err(e) => e,
        };
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let response = err.into_response();
        let text = body_string(response).await;
        assert!(text.contains("Valid email required"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(value) = health().await;
        assert_eq!(value["status"], "ok");
    }
}
